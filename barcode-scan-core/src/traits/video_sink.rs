use crate::models::platform::{PlatformError, StreamId};

/// Receives the sink's readiness report for one attachment. Called at most once.
pub type ReadyCallback = Box<dyn FnOnce(Result<(), PlatformError>) + Send + 'static>;

/// Renderable target for the camera preview (a `<video>` element, a texture,
/// a terminal preview...).
pub trait VideoSink: Send + Sync {
    /// Bind `stream` and start playback. `on_ready` fires once the first
    /// frame metadata is available, or with an error if playback fails.
    fn attach(&self, stream: StreamId, on_ready: ReadyCallback);

    /// Unbind `stream`. Detaching a stream that is not attached does nothing.
    fn detach(&self, stream: StreamId);
}
