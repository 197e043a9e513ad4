//! Simulated decode engine.
//!
//! Runs a frame loop on a `sim-decoder` thread. Every frame before
//! `scan_delay` reports `NotFoundException`; after that each frame reports
//! the payload until the loop is ended.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use barcode_scan_core::models::platform::PlatformError;
use barcode_scan_core::traits::decode_engine::{DecodeEngine, FrameCallback};
use barcode_scan_core::traits::video_sink::VideoSink;

/// EAN-style code the simulator "finds": `123456789` plus three random digits.
pub fn generated_barcode() -> String {
    format!("123456789{:03}", rand::random::<u32>() % 1000)
}

struct DecodeRun {
    running: Arc<AtomicBool>,
    handle: Option<thread::JoinHandle<()>>,
}

pub struct SimulatedDecoder {
    frame_interval: Duration,
    scan_delay: Duration,
    payload: Option<String>,
    available: bool,
    run: Mutex<Option<DecodeRun>>,
}

impl SimulatedDecoder {
    /// Finds a generated barcode 2s after decoding begins, sampling every 100ms.
    pub fn new() -> Arc<Self> {
        Self::with_timing(Duration::from_millis(100), Duration::from_secs(2))
    }

    pub fn with_timing(frame_interval: Duration, scan_delay: Duration) -> Arc<Self> {
        Arc::new(Self {
            frame_interval,
            scan_delay,
            payload: None,
            available: true,
            run: Mutex::new(None),
        })
    }

    /// Decoder that always finds `payload`.
    pub fn with_payload(frame_interval: Duration, scan_delay: Duration, payload: &str) -> Arc<Self> {
        Arc::new(Self {
            frame_interval,
            scan_delay,
            payload: Some(payload.to_string()),
            available: true,
            run: Mutex::new(None),
        })
    }

    /// Decoder whose engine cannot load on this platform.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            frame_interval: Duration::from_millis(100),
            scan_delay: Duration::from_secs(2),
            payload: None,
            available: false,
            run: Mutex::new(None),
        })
    }

    pub fn is_running(&self) -> bool {
        self.run
            .lock()
            .as_ref()
            .is_some_and(|run| run.running.load(Ordering::SeqCst))
    }
}

impl DecodeEngine for SimulatedDecoder {
    fn begin_decoding(&self, _sink: Arc<dyn VideoSink>, on_frame: FrameCallback) -> Result<(), PlatformError> {
        if !self.available {
            return Err(PlatformError::new("EngineUnavailable", "simulated decoder disabled"));
        }
        // One loop at a time; a new subscription replaces the old one.
        self.end_decoding();

        let running = Arc::new(AtomicBool::new(true));
        let flag = Arc::clone(&running);
        let interval = self.frame_interval;
        let delay = self.scan_delay;
        let payload = self.payload.clone().unwrap_or_else(generated_barcode);

        let handle = thread::Builder::new()
            .name("sim-decoder".into())
            .spawn(move || {
                let started = Instant::now();
                let mut frames = 0u64;
                while flag.load(Ordering::SeqCst) {
                    thread::sleep(interval);
                    if !flag.load(Ordering::SeqCst) {
                        break;
                    }
                    frames += 1;
                    if started.elapsed() >= delay {
                        on_frame(Some(&payload), None);
                    } else {
                        on_frame(None, Some(&PlatformError::named("NotFoundException")));
                    }
                }
                log::debug!("Decoder loop exited after {} frame(s)", frames);
            })
            .map_err(|e| PlatformError::new("EngineUnavailable", format!("failed to spawn decoder thread: {}", e)))?;

        *self.run.lock() = Some(DecodeRun {
            running,
            handle: Some(handle),
        });
        log::debug!("Decoder started ({:?} interval, finds code after {:?})", interval, delay);
        Ok(())
    }

    fn end_decoding(&self) {
        let Some(mut run) = self.run.lock().take() else {
            return;
        };
        run.running.store(false, Ordering::SeqCst);

        // Called from inside `on_frame` on the decoder thread itself when a
        // frame decodes; that thread exits on its own once the flag is seen.
        if let Some(handle) = run.handle.take() {
            if handle.thread().id() != thread::current().id() {
                let _ = handle.join();
            }
        }
        log::debug!("Decoder stopped");
    }
}

impl Drop for SimulatedDecoder {
    fn drop(&mut self) {
        self.end_decoding();
    }
}
