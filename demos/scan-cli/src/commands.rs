use std::path::PathBuf;
use std::sync::mpsc::{Receiver, RecvTimeoutError};
use std::time::Duration;

use clap::Parser;

use barcode_scan_core::{
    InventoryStore, RetryAffordance, ScanConfiguration, ScanError, ScanResult, ScanSession, ScannedItem,
};
use barcode_scan_sim::{CameraBehavior, SimulatedCamera, SimulatedDecoder, SimulatedPreview};

use crate::intake_state::{ConsoleDelegate, IntakeEvent, IntakeState};

/// Scan (or type) one barcode and add it to the inventory.
#[derive(Parser, Debug, Default)]
#[command(name = "scan-cli", version, about = "Barcode intake demo on the simulated camera")]
pub struct IntakeOptions {
    /// Barcode to submit instead of scanning
    #[arg(long)]
    pub manual: Option<String>,

    /// Item name stored with the barcode
    #[arg(long)]
    pub name: Option<String>,

    /// Directory holding the inventory file
    #[arg(long = "store")]
    pub store_dir: Option<PathBuf>,

    /// Make the simulated camera refuse with this platform error name
    #[arg(long)]
    pub camera_error: Option<String>,

    /// Retries for transient camera failures
    #[arg(long, default_value_t = 1)]
    pub retries: u32,
}

fn inventory_dir(options: &IntakeOptions) -> PathBuf {
    options
        .store_dir
        .clone()
        .unwrap_or_else(|| std::env::temp_dir().join("barcode-scan-kit"))
}

/// Build a session on the simulated backend and install it in `state`.
pub fn open_session(state: &IntakeState, options: &IntakeOptions) -> Receiver<IntakeEvent> {
    let camera = SimulatedCamera::new();
    if let Some(name) = &options.camera_error {
        camera.set_behavior(CameraBehavior::Deny(name.clone()));
    }

    let mut session = ScanSession::with_arbiter(
        camera,
        SimulatedDecoder::new(),
        SimulatedPreview::new(),
        ScanConfiguration {
            max_scan_duration: Some(Duration::from_secs(15)),
            ..Default::default()
        },
        &state.arbiter,
    );
    let (delegate, events) = ConsoleDelegate::new();
    session.set_delegate(delegate);

    *state.session.lock() = Some(session);
    events
}

/// Run the camera until a barcode is found, retrying transient failures.
pub fn scan(state: &IntakeState, events: &Receiver<IntakeEvent>, options: &IntakeOptions) -> Result<ScanResult, String> {
    {
        let guard = state.session.lock();
        let session = guard.as_ref().ok_or("no active session")?;
        session.start().map_err(|e| e.to_string())?;
    }

    let mut retries_left = options.retries;
    loop {
        match events.recv_timeout(Duration::from_secs(30)) {
            Ok(IntakeEvent::Scanned(result)) => return Ok(result),
            Ok(IntakeEvent::Failed(error)) => {
                println!("[scanner] {} ({})", error, hint(&error));
                if retries_left == 0 || !retryable(&error) {
                    return Err(error.to_string());
                }
                retries_left -= 1;
                retry(state)?;
            }
            Err(RecvTimeoutError::Timeout) => return Err("scanner produced no outcome".into()),
            Err(RecvTimeoutError::Disconnected) => return Err("scanner went away".into()),
        }
    }
}

fn retry(state: &IntakeState) -> Result<(), String> {
    let guard = state.session.lock();
    let session = guard.as_ref().ok_or("no active session")?;
    session.retry().map_err(|e| e.to_string())
}

fn retryable(error: &ScanError) -> bool {
    matches!(error.affordance(), RetryAffordance::RetryNow | RetryAffordance::FreeCamera)
}

fn hint(error: &ScanError) -> &'static str {
    match error.affordance() {
        RetryAffordance::RetryNow => "retrying",
        RetryAffordance::GrantPermission => "allow camera access and try again",
        RetryAffordance::FreeCamera => "close other apps using the camera",
        RetryAffordance::ManualEntry => "enter the barcode with --manual",
    }
}

/// Deliver a typed barcode through the session's result path.
pub fn submit_manual(state: &IntakeState, input: &str) -> Result<ScanResult, String> {
    let guard = state.session.lock();
    let session = guard.as_ref().ok_or("no active session")?;
    session
        .submit_manual(input)
        .map_err(|e| e.to_string())?
        .ok_or_else(|| "barcode must not be empty".to_string())
}

/// Store the scanned item and return the path of the inventory file.
pub fn save_item(result: &ScanResult, options: &IntakeOptions) -> Result<(ScannedItem, PathBuf, usize), String> {
    let store = InventoryStore::new(inventory_dir(options));
    let name = options.name.as_deref().unwrap_or("Unnamed item");
    let item = ScannedItem::from_scan(result, name);
    let count = store.append_item(item.clone()).map_err(|e| e.to_string())?;
    Ok((item, store.path(), count))
}

/// Tear the session down, releasing the camera.
pub fn close_session(state: &IntakeState) {
    // Dropping the session stops it.
    *state.session.lock() = None;
}
