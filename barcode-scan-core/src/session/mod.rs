pub mod arbiter;
pub mod scan_session;
pub mod subscription;
