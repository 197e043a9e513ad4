//! Simulated preview sink.

use std::collections::HashSet;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::Mutex;

use barcode_scan_core::models::platform::{PlatformError, StreamId};
use barcode_scan_core::traits::video_sink::{ReadyCallback, VideoSink};

/// Preview sink that "plays" an attached stream after `ready_delay`.
///
/// Readiness is only reported if the stream is still attached when the
/// delay runs out, like a `<video>` element whose source was swapped.
pub struct SimulatedPreview {
    ready_delay: Duration,
    failure: Mutex<Option<String>>,
    attached: Arc<Mutex<HashSet<StreamId>>>,
}

impl SimulatedPreview {
    /// A preview that becomes ready 50ms after attach.
    pub fn new() -> Arc<Self> {
        Self::with_delay(Duration::from_millis(50))
    }

    pub fn with_delay(ready_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            ready_delay,
            failure: Mutex::new(None),
            attached: Arc::new(Mutex::new(HashSet::new())),
        })
    }

    /// Make every following attach fail with this platform error name.
    pub fn fail_with(&self, name: Option<&str>) {
        *self.failure.lock() = name.map(str::to_string);
    }

    pub fn is_attached(&self, stream: StreamId) -> bool {
        self.attached.lock().contains(&stream)
    }

    pub fn attached_count(&self) -> usize {
        self.attached.lock().len()
    }
}

impl VideoSink for SimulatedPreview {
    fn attach(&self, stream: StreamId, on_ready: ReadyCallback) {
        self.attached.lock().insert(stream);

        if let Some(name) = self.failure.lock().clone() {
            log::debug!("Preview for stream {} failing with {}", stream.0, name);
            on_ready(Err(PlatformError::new(name, "simulated playback failure")));
            return;
        }

        if self.ready_delay.is_zero() {
            on_ready(Ok(()));
            return;
        }

        let attached = Arc::clone(&self.attached);
        let delay = self.ready_delay;
        let spawned = thread::Builder::new().name("sim-preview-ready".into()).spawn(move || {
            thread::sleep(delay);
            let still_attached = attached.lock().contains(&stream);
            if still_attached {
                log::debug!("Preview for stream {} playing", stream.0);
                on_ready(Ok(()));
            }
        });
        if let Err(e) = spawned {
            log::error!("Failed to spawn preview thread: {}", e);
        }
    }

    fn detach(&self, stream: StreamId) {
        if self.attached.lock().remove(&stream) {
            log::debug!("Preview detached from stream {}", stream.0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn reports_ready_after_delay() {
        let preview = SimulatedPreview::with_delay(Duration::from_millis(10));
        let (tx, rx) = mpsc::channel();

        preview.attach(
            StreamId(1),
            Box::new(move |ready| {
                tx.send(ready).ok();
            }),
        );

        assert_eq!(rx.recv_timeout(Duration::from_secs(2)).unwrap(), Ok(()));
        assert!(preview.is_attached(StreamId(1)));
    }

    #[test]
    fn detached_stream_never_reports() {
        let preview = SimulatedPreview::with_delay(Duration::from_millis(30));
        let (tx, rx) = mpsc::channel();

        preview.attach(
            StreamId(2),
            Box::new(move |ready| {
                tx.send(ready).ok();
            }),
        );
        preview.detach(StreamId(2));

        assert!(rx.recv_timeout(Duration::from_millis(200)).is_err());
        assert_eq!(preview.attached_count(), 0);
    }

    #[test]
    fn failure_mode_reports_platform_name() {
        let preview = SimulatedPreview::with_delay(Duration::ZERO);
        preview.fail_with(Some("NotReadableError"));
        let (tx, rx) = mpsc::channel();

        preview.attach(
            StreamId(3),
            Box::new(move |ready| {
                tx.send(ready).ok();
            }),
        );

        let err = rx.try_recv().unwrap().unwrap_err();
        assert_eq!(err.name, "NotReadableError");
    }
}
