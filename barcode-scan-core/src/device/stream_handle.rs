use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::models::config::ScanConfiguration;
use crate::models::error::ScanError;
use crate::models::platform::{StreamConstraints, StreamId, TrackKind};
use crate::processing::classify::{allows_fallback, classify_camera_failure};
use crate::traits::camera_source::{CameraSource, MediaTrack, StreamFailure};
use crate::traits::video_sink::VideoSink;

use super::watchdog::Watchdog;

static NEXT_STREAM_ID: AtomicU64 = AtomicU64::new(1);

/// Receives the outcome of `DeviceStreamHandle::acquire`. Called exactly once.
pub type AcquireCallback = Box<dyn FnOnce(Result<DeviceStreamHandle, ScanError>) + Send + 'static>;

/// Receives the outcome of `DeviceStreamHandle::attach_to`. Called at most
/// once, and never after the handle has been released.
pub type AttachCallback = Box<dyn FnOnce(Result<(), ScanError>) + Send + 'static>;

/// First of {ready, sink error, timeout} wins the callback.
struct AttachWaiter {
    done: Option<AttachCallback>,
    watchdog: Option<Watchdog>,
}

impl AttachWaiter {
    fn finish(&mut self) -> Option<AttachCallback> {
        self.watchdog.take();
        self.done.take()
    }
}

/// Sink call prepared by `DeviceStreamHandle::attach_to`.
///
/// Holds no tracks. Sending after the handle was released still calls the
/// sink, but its readiness answer no longer reaches the callback.
#[must_use = "the sink is not attached until the request is sent"]
pub struct AttachRequest {
    sink: Arc<dyn VideoSink>,
    stream: StreamId,
    waiter: Arc<Mutex<AttachWaiter>>,
}

impl AttachRequest {
    /// Hand the stream to the sink. May block for as long as the sink does.
    pub fn send(self) {
        let Self { sink, stream, waiter } = self;
        sink.attach(
            stream,
            Box::new(move |ready| {
                let done = waiter.lock().finish();
                if let Some(done) = done {
                    done(ready.map_err(|e| {
                        log::error!("Preview sink failed for stream {}: {}", stream.0, e);
                        classify_camera_failure(&e)
                    }));
                }
            }),
        );
    }
}

/// Exclusive owner of one camera stream and its tracks.
///
/// Once released, every track is stopped, the sink is detached and the
/// handle is dead. Releasing again does nothing. Dropping the handle
/// releases it.
pub struct DeviceStreamHandle {
    id: StreamId,
    tracks: Vec<Box<dyn MediaTrack>>,
    sink: Option<Arc<dyn VideoSink>>,
    pending_attach: Option<Arc<Mutex<AttachWaiter>>>,
    released: bool,
}

impl DeviceStreamHandle {
    /// Request a camera stream as described by `config`.
    ///
    /// Asks for the preferred facing mode and resolution first. If the
    /// platform cannot satisfy those constraints and fallback is enabled,
    /// asks once more for any camera. Tracks opened by a failed request are
    /// stopped before the error is reported.
    pub fn acquire(camera: Arc<dyn CameraSource>, config: &ScanConfiguration, done: AcquireCallback) {
        let constraints = config.preferred_constraints();
        let fallback = config.fallback_to_any_camera && constraints.is_constrained();
        let fallback_camera = Arc::clone(&camera);

        camera.request_stream(
            &constraints,
            Box::new(move |outcome| match outcome {
                Err(failure) if fallback && allows_fallback(&failure.error) => {
                    log::warn!(
                        "Preferred camera unavailable ({}), falling back to any camera",
                        failure.error
                    );
                    stop_tracks(failure.opened_tracks);
                    fallback_camera.request_stream(
                        &StreamConstraints::any_camera(),
                        Box::new(move |outcome| done(Self::from_outcome(outcome))),
                    );
                }
                outcome => done(Self::from_outcome(outcome)),
            }),
        );
    }

    fn from_outcome(outcome: Result<Vec<Box<dyn MediaTrack>>, StreamFailure>) -> Result<Self, ScanError> {
        match outcome {
            Ok(tracks) => {
                if !tracks.iter().any(|t| t.kind() == TrackKind::Video) {
                    log::error!("Camera stream has no video track ({} tracks)", tracks.len());
                    stop_tracks(tracks);
                    return Err(ScanError::DeviceNotFound);
                }
                Ok(Self::from_tracks(tracks))
            }
            Err(failure) => {
                let error = classify_camera_failure(&failure.error);
                if !failure.opened_tracks.is_empty() {
                    log::warn!(
                        "Stopping {} track(s) opened before failure: {}",
                        failure.opened_tracks.len(),
                        failure.error
                    );
                }
                stop_tracks(failure.opened_tracks);
                log::error!("Camera acquisition failed: {} -> {}", failure.error, error);
                Err(error)
            }
        }
    }

    fn from_tracks(tracks: Vec<Box<dyn MediaTrack>>) -> Self {
        let id = StreamId(NEXT_STREAM_ID.fetch_add(1, Ordering::Relaxed));
        log::debug!(
            "Acquired stream {} ({} track(s), label {:?})",
            id.0,
            tracks.len(),
            tracks.first().map(|t| t.label()).unwrap_or_default()
        );
        Self {
            id,
            tracks,
            sink: None,
            pending_attach: None,
            released: false,
        }
    }

    pub fn id(&self) -> StreamId {
        self.id
    }

    pub fn track_count(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_released(&self) -> bool {
        self.released
    }

    pub fn is_attached(&self) -> bool {
        self.sink.is_some()
    }

    /// Bind the stream to `sink` and arm the playback readiness wait.
    ///
    /// The sink itself is only called by [`AttachRequest::send`], so the
    /// owner can put the handle somewhere a concurrent `release()` reaches it
    /// before the platform gets involved. `done` receives
    /// `Err(ScanError::Timeout)` when the sink stays silent for `timeout`. A
    /// sink playback error is classified like a camera failure.
    pub fn attach_to(
        &mut self,
        sink: Arc<dyn VideoSink>,
        timeout: Duration,
        done: AttachCallback,
    ) -> Result<AttachRequest, ScanError> {
        if self.released {
            return Err(ScanError::Unknown("stream already released".into()));
        }
        self.detach();

        let waiter = Arc::new(Mutex::new(AttachWaiter {
            done: Some(done),
            watchdog: None,
        }));

        let expired = Arc::clone(&waiter);
        let stream = self.id;
        let watchdog = Watchdog::arm("camera-attach-watchdog", timeout, move || {
            let done = expired.lock().finish();
            if let Some(done) = done {
                log::warn!("Stream {} not ready after {:?}", stream.0, timeout);
                done(Err(ScanError::Timeout));
            }
        })?;
        waiter.lock().watchdog = Some(watchdog);

        self.sink = Some(Arc::clone(&sink));
        self.pending_attach = Some(Arc::clone(&waiter));

        Ok(AttachRequest { sink, stream, waiter })
    }

    /// Stop every track and detach from the sink. Idempotent.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        let track_count = self.tracks.len();
        stop_tracks(std::mem::take(&mut self.tracks));
        self.detach();

        log::debug!("Released stream {} ({} track(s) stopped)", self.id.0, track_count);
    }

    fn detach(&mut self) {
        if let Some(waiter) = self.pending_attach.take() {
            // Cancels the readiness wait; `done` is dropped without being called.
            drop(waiter.lock().finish());
        }
        if let Some(sink) = self.sink.take() {
            sink.detach(self.id);
        }
    }
}

impl Drop for DeviceStreamHandle {
    fn drop(&mut self) {
        self.release();
    }
}

fn stop_tracks(tracks: Vec<Box<dyn MediaTrack>>) {
    for mut track in tracks {
        track.stop();
    }
}
