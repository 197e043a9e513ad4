use crate::models::platform::{PlatformError, StreamConstraints, TrackKind};

/// One track of an acquired camera stream.
pub trait MediaTrack: Send {
    fn kind(&self) -> TrackKind;

    /// Human-readable device label, if the platform exposes one.
    fn label(&self) -> String;

    /// Stop the track and turn the hardware off. Stopping twice is harmless.
    fn stop(&mut self);

    fn is_live(&self) -> bool;
}

/// A failed stream request.
///
/// Some platforms open tracks before failing (e.g. video granted, then a
/// constraint rejected). Those tracks are handed back in `opened_tracks` so
/// the caller can stop them.
pub struct StreamFailure {
    pub error: PlatformError,
    pub opened_tracks: Vec<Box<dyn MediaTrack>>,
}

impl StreamFailure {
    pub fn new(error: PlatformError) -> Self {
        Self {
            error,
            opened_tracks: Vec::new(),
        }
    }

    pub fn with_opened_tracks(error: PlatformError, opened_tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        Self { error, opened_tracks }
    }
}

/// Receives the outcome of a stream request. Called exactly once.
pub type StreamCompletion =
    Box<dyn FnOnce(Result<Vec<Box<dyn MediaTrack>>, StreamFailure>) + Send + 'static>;

/// Access to the platform camera API (`getUserMedia` and friends).
///
/// Injected into the session so tests and simulators can replace the
/// ambient camera without touching global state.
pub trait CameraSource: Send + Sync {
    /// Request a camera stream matching `constraints`.
    ///
    /// `completion` may fire before this returns (synchronous platforms,
    /// fakes) or later from another thread.
    fn request_stream(&self, constraints: &StreamConstraints, completion: StreamCompletion);
}
