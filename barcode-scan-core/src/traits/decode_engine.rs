use std::sync::Arc;

use crate::models::platform::PlatformError;

use super::video_sink::VideoSink;

/// Callback invoked once per analyzed frame.
///
/// Parameters:
/// - decoded text, when the frame contained a readable barcode;
/// - the engine's error for this frame, if any. Most frames report a
///   "not found" error, which is not a failure.
pub type FrameCallback = Arc<dyn Fn(Option<&str>, Option<&PlatformError>) + Send + Sync + 'static>;

/// External barcode decoding engine.
///
/// Symbol decoding is a black box here; the engine samples frames from the
/// sink on its own schedule and reports every attempt.
pub trait DecodeEngine: Send + Sync {
    /// Start the decode loop against `sink`.
    ///
    /// Returns an error when the engine cannot run at all (e.g. unsupported
    /// platform). Per-frame failures go through `on_frame` instead.
    fn begin_decoding(&self, sink: Arc<dyn VideoSink>, on_frame: FrameCallback) -> Result<(), PlatformError>;

    /// Stop the decode loop. Must be idempotent and safe to call from inside
    /// `on_frame`.
    fn end_decoding(&self);
}
