use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use parking_lot::Mutex;

use barcode_scan_core::{CameraArbiter, ScanDelegate, ScanError, ScanResult, ScanSession, ScanState};

/// Holds the active scan session for the intake flow. Every session is
/// built on `arbiter`, so only one of them ever holds the camera.
pub struct IntakeState {
    pub session: Mutex<Option<ScanSession>>,
    pub arbiter: CameraArbiter,
}

impl IntakeState {
    pub fn new() -> Self {
        Self {
            session: Mutex::new(None),
            arbiter: CameraArbiter::new(),
        }
    }
}

/// Outcome of one scan attempt, as seen by the intake flow.
#[derive(Debug, Clone)]
pub enum IntakeEvent {
    Scanned(ScanResult),
    Failed(ScanError),
}

/// ScanDelegate that prints state changes and forwards outcomes to the
/// intake flow over a channel.
pub struct ConsoleDelegate {
    events: Mutex<Sender<IntakeEvent>>,
}

impl ConsoleDelegate {
    pub fn new() -> (Arc<Self>, Receiver<IntakeEvent>) {
        let (tx, rx) = mpsc::channel();
        (
            Arc::new(Self {
                events: Mutex::new(tx),
            }),
            rx,
        )
    }

    fn send(&self, event: IntakeEvent) {
        // The receiver is gone once the flow has what it needs.
        let _ = self.events.lock().send(event);
    }
}

impl ScanDelegate for ConsoleDelegate {
    fn on_state_changed(&self, state: ScanState) {
        println!("[scanner] {}", state.view_label());
    }

    fn on_result(&self, result: &ScanResult) {
        self.send(IntakeEvent::Scanned(result.clone()));
    }

    fn on_error(&self, error: &ScanError) {
        self.send(IntakeEvent::Failed(error.clone()));
    }
}
