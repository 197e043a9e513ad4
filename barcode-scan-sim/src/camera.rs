//! Simulated camera source.

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use barcode_scan_core::models::platform::{PlatformError, StreamConstraints, TrackKind};
use barcode_scan_core::traits::camera_source::{CameraSource, MediaTrack, StreamCompletion, StreamFailure};

/// What the simulated camera does with a stream request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CameraBehavior {
    /// Open one video track.
    Grant,
    /// Refuse with this platform error name (e.g. `NotAllowedError`).
    Deny(String),
    /// Open one track, then fail with this platform error name.
    PartialThenFail(String),
    /// Refuse constrained requests with `OverconstrainedError` and grant
    /// unconstrained ones, like a device with only a front camera.
    FrontOnly,
}

/// A video track on the simulated camera. Stopping it turns the
/// camera "light" off.
pub struct SimulatedTrack {
    label: String,
    live: bool,
    live_tracks: Arc<AtomicUsize>,
}

impl SimulatedTrack {
    fn open(label: &str, live_tracks: &Arc<AtomicUsize>) -> Self {
        live_tracks.fetch_add(1, Ordering::SeqCst);
        Self {
            label: label.to_string(),
            live: true,
            live_tracks: Arc::clone(live_tracks),
        }
    }
}

impl MediaTrack for SimulatedTrack {
    fn kind(&self) -> TrackKind {
        TrackKind::Video
    }

    fn label(&self) -> String {
        self.label.clone()
    }

    fn stop(&mut self) {
        if self.live {
            self.live = false;
            self.live_tracks.fetch_sub(1, Ordering::SeqCst);
            log::debug!("Track {:?} stopped", self.label);
        }
    }

    fn is_live(&self) -> bool {
        self.live
    }
}

impl Drop for SimulatedTrack {
    fn drop(&mut self) {
        if self.live {
            log::warn!("Track {:?} dropped while live", self.label);
            self.stop();
        }
    }
}

/// Camera source that answers each request on a background thread after
/// `latency` (inline when the latency is zero).
pub struct SimulatedCamera {
    behavior: Mutex<CameraBehavior>,
    latency: Duration,
    label: String,
    requests: AtomicUsize,
    live_tracks: Arc<AtomicUsize>,
    answering: Arc<AtomicBool>,
}

impl SimulatedCamera {
    /// A rear camera that grants every request after 150ms.
    pub fn new() -> Arc<Self> {
        Self::with_behavior(CameraBehavior::Grant, Duration::from_millis(150))
    }

    pub fn with_behavior(behavior: CameraBehavior, latency: Duration) -> Arc<Self> {
        Arc::new(Self {
            behavior: Mutex::new(behavior),
            latency,
            label: "Simulated Back Camera".into(),
            requests: AtomicUsize::new(0),
            live_tracks: Arc::new(AtomicUsize::new(0)),
            answering: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn set_behavior(&self, behavior: CameraBehavior) {
        *self.behavior.lock() = behavior;
    }

    /// Number of stream requests received so far.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }

    /// Tracks opened and not yet stopped.
    pub fn live_tracks(&self) -> usize {
        self.live_tracks.load(Ordering::SeqCst)
    }

    /// True while a delayed answer is still in flight.
    pub fn is_answering(&self) -> bool {
        self.answering.load(Ordering::SeqCst)
    }

    fn outcome(
        behavior: &CameraBehavior,
        constraints: &StreamConstraints,
        label: &str,
        live_tracks: &Arc<AtomicUsize>,
    ) -> Result<Vec<Box<dyn MediaTrack>>, StreamFailure> {
        let open = || Box::new(SimulatedTrack::open(label, live_tracks)) as Box<dyn MediaTrack>;
        match behavior {
            CameraBehavior::Grant => Ok(vec![open()]),
            CameraBehavior::Deny(name) => Err(StreamFailure::new(PlatformError::new(
                name.clone(),
                format!("simulated {}", name),
            ))),
            CameraBehavior::PartialThenFail(name) => Err(StreamFailure::with_opened_tracks(
                PlatformError::new(name.clone(), format!("simulated {} after open", name)),
                vec![open()],
            )),
            CameraBehavior::FrontOnly if constraints.is_constrained() => Err(StreamFailure::new(PlatformError::new(
                "OverconstrainedError",
                "no camera satisfies facingMode",
            ))),
            CameraBehavior::FrontOnly => Ok(vec![open()]),
        }
    }
}

impl CameraSource for SimulatedCamera {
    fn request_stream(&self, constraints: &StreamConstraints, completion: StreamCompletion) {
        let request = self.requests.fetch_add(1, Ordering::SeqCst) + 1;
        let behavior = self.behavior.lock().clone();
        log::debug!("Camera request {} ({:?}): {:?}", request, constraints.facing, behavior);

        if self.latency.is_zero() {
            completion(Self::outcome(&behavior, constraints, &self.label, &self.live_tracks));
            return;
        }

        let constraints = constraints.clone();
        let label = self.label.clone();
        let live_tracks = Arc::clone(&self.live_tracks);
        let latency = self.latency;
        let answering = Arc::clone(&self.answering);
        answering.store(true, Ordering::SeqCst);

        let spawned = thread::Builder::new()
            .name("sim-camera-request".into())
            .spawn(move || {
                thread::sleep(latency);
                let outcome = Self::outcome(&behavior, &constraints, &label, &live_tracks);
                answering.store(false, Ordering::SeqCst);
                completion(outcome);
            });
        if let Err(e) = spawned {
            // The completion moved into the closure that failed to spawn; it
            // is dropped unanswered and the session times out.
            self.answering.store(false, Ordering::SeqCst);
            log::error!("Failed to spawn camera request thread: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    fn request(camera: &SimulatedCamera, constraints: &StreamConstraints) -> Result<Vec<Box<dyn MediaTrack>>, StreamFailure> {
        let (tx, rx) = mpsc::channel();
        camera.request_stream(
            constraints,
            Box::new(move |outcome| {
                tx.send(outcome).ok();
            }),
        );
        rx.recv_timeout(Duration::from_secs(2)).expect("camera answers")
    }

    #[test]
    fn grant_opens_a_live_video_track() {
        let camera = SimulatedCamera::with_behavior(CameraBehavior::Grant, Duration::ZERO);
        let mut tracks = request(&camera, &StreamConstraints::any_camera()).ok().expect("granted");

        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].kind(), TrackKind::Video);
        assert_eq!(camera.live_tracks(), 1);

        tracks[0].stop();
        tracks[0].stop();
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn deny_carries_platform_name() {
        let camera = SimulatedCamera::with_behavior(CameraBehavior::Deny("NotAllowedError".into()), Duration::ZERO);
        let failure = request(&camera, &StreamConstraints::any_camera()).err().unwrap();

        assert_eq!(failure.error.name, "NotAllowedError");
        assert!(failure.opened_tracks.is_empty());
    }

    #[test]
    fn partial_failure_reports_opened_track() {
        let camera =
            SimulatedCamera::with_behavior(CameraBehavior::PartialThenFail("AbortError".into()), Duration::ZERO);
        let failure = request(&camera, &StreamConstraints::any_camera()).err().unwrap();

        assert_eq!(failure.opened_tracks.len(), 1);
        assert_eq!(camera.live_tracks(), 1);
        drop(failure);
        assert_eq!(camera.live_tracks(), 0);
    }

    #[test]
    fn front_only_rejects_constrained_requests() {
        let camera = SimulatedCamera::with_behavior(CameraBehavior::FrontOnly, Duration::ZERO);
        let constrained = barcode_scan_core::ScanConfiguration::default().preferred_constraints();

        let failure = request(&camera, &constrained).err().unwrap();
        assert_eq!(failure.error.name, "OverconstrainedError");
        assert!(request(&camera, &StreamConstraints::any_camera()).is_ok());
        assert_eq!(camera.request_count(), 2);
    }

    #[test]
    fn delayed_answer_arrives_on_another_thread() {
        let camera = SimulatedCamera::with_behavior(CameraBehavior::Grant, Duration::from_millis(20));
        let caller = thread::current().id();
        let (tx, rx) = mpsc::channel();

        camera.request_stream(
            &StreamConstraints::any_camera(),
            Box::new(move |outcome| {
                tx.send((thread::current().id(), outcome.is_ok())).ok();
            }),
        );

        let (answered_on, granted) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_ne!(answered_on, caller);
        assert!(granted);
    }
}
