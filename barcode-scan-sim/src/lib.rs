//! # barcode-scan-sim
//!
//! Simulated platform backend for barcode-scan-kit.
//!
//! Provides:
//! - `SimulatedCamera`: camera source with a configurable outcome (grant, deny, partial open)
//! - `SimulatedPreview`: preview sink that reports readiness after a delay
//! - `SimulatedDecoder`: decode loop that finds a generated barcode after a scan delay
//!
//! Every answer arrives on a background thread, the way a real platform
//! answers, so the session sees the same asynchrony it would in production.
//!
//! ## Usage
//! ```ignore
//! use barcode_scan_core::{ScanConfiguration, ScanSession};
//! use barcode_scan_sim::{SimulatedCamera, SimulatedDecoder, SimulatedPreview};
//!
//! let session = ScanSession::new(
//!     SimulatedCamera::new(),
//!     SimulatedDecoder::new(),
//!     SimulatedPreview::new(),
//!     ScanConfiguration::default(),
//! );
//! session.start()?;
//! ```

pub mod camera;
pub mod decoder;
pub mod preview;

pub use camera::{CameraBehavior, SimulatedCamera, SimulatedTrack};
pub use decoder::{generated_barcode, SimulatedDecoder};
pub use preview::SimulatedPreview;
