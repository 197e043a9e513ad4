pub mod config;
pub mod error;
pub mod platform;
pub mod scan_result;
pub mod state;
