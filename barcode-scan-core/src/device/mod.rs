pub mod stream_handle;
pub(crate) mod watchdog;
