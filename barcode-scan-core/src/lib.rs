//! # barcode-scan-core
//!
//! Platform-agnostic barcode acquisition core.
//!
//! Owns the camera stream lifecycle, the scan state machine, failure
//! classification and the inventory record boundary. Platform backends
//! (browser media APIs, native camera stacks, the simulator in
//! `barcode-scan-sim`) implement the `CameraSource`, `VideoSink` and
//! `DecodeEngine` traits and plug into the generic `ScanSession`.
//!
//! ## Architecture
//!
//! ```text
//! barcode-scan-core (this crate)
//! ├── traits/       ← CameraSource, MediaTrack, VideoSink, DecodeEngine, ScanDelegate
//! ├── models/       ← ScanError, ScanState, ScanConfiguration, ScanResult, ScannedItem, etc.
//! ├── device/       ← DeviceStreamHandle (exclusive camera ownership), watchdog timers
//! ├── processing/   ← platform failure classification, manual entry
//! ├── session/      ← ScanSession (orchestrator), CameraArbiter, DecodeSubscription
//! └── storage/      ← InventoryStore (JSON item list)
//! ```

pub mod device;
pub mod models;
pub mod processing;
pub mod session;
pub mod storage;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export key types at crate root for convenience.
pub use device::stream_handle::DeviceStreamHandle;
pub use models::config::ScanConfiguration;
pub use models::error::{RetryAffordance, ScanError, SessionError};
pub use models::platform::{FacingMode, PlatformError, Resolution, StreamConstraints, StreamId, TrackKind};
pub use models::scan_result::{ScanResult, ScanSource, ScannedItem};
pub use models::state::ScanState;
pub use processing::manual_entry::normalize_manual_entry;
pub use session::arbiter::CameraArbiter;
pub use session::scan_session::ScanSession;
pub use storage::inventory::{InventoryStore, StorageError, INVENTORY_KEY};
pub use traits::camera_source::{CameraSource, MediaTrack, StreamCompletion, StreamFailure};
pub use traits::decode_engine::{DecodeEngine, FrameCallback};
pub use traits::scan_delegate::ScanDelegate;
pub use traits::video_sink::{ReadyCallback, VideoSink};
