pub mod camera_source;
pub mod decode_engine;
pub mod scan_delegate;
pub mod video_sink;
