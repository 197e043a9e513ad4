//! Normalization of platform and decode-engine failures into `ScanError`.
//!
//! Error identities come from the underlying libraries (DOM exception names
//! for the camera, exception class names for the decoder). Nothing outside
//! this module looks at them.

use crate::models::error::ScanError;
use crate::models::platform::PlatformError;

/// Outcome of one decode-engine frame callback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameVerdict {
    /// The frame held a readable barcode.
    Decoded(String),
    /// Nothing usable in this frame; keep scanning.
    Miss,
    /// The engine cannot continue.
    Fatal(ScanError),
}

const PERMISSION_NAMES: &[&str] = &["NotAllowedError", "SecurityError", "PermissionDeniedError"];
const NOT_FOUND_NAMES: &[&str] = &[
    "NotFoundError",
    "DevicesNotFoundError",
    "OverconstrainedError",
    "ConstraintNotSatisfiedError",
    "NotSupportedError",
];
const BUSY_NAMES: &[&str] = &["NotReadableError", "TrackStartError", "AbortError"];
const TIMEOUT_NAMES: &[&str] = &["TimeoutError"];

// Per-frame decoder signals that only mean "try the next frame".
const FRAME_MISS_NAMES: &[&str] = &["NotFoundException", "ChecksumException", "FormatException"];
const ENGINE_UNAVAILABLE_NAMES: &[&str] = &[
    "EngineUnavailable",
    "NotSupportedError",
    "UnsupportedOperationException",
];

/// Map a camera or preview failure to the closed error set.
pub fn classify_camera_failure(error: &PlatformError) -> ScanError {
    let name = error.name.as_str();
    if PERMISSION_NAMES.contains(&name) {
        ScanError::PermissionDenied
    } else if NOT_FOUND_NAMES.contains(&name) {
        ScanError::DeviceNotFound
    } else if BUSY_NAMES.contains(&name) {
        ScanError::DeviceBusy
    } else if TIMEOUT_NAMES.contains(&name) {
        ScanError::Timeout
    } else {
        unknown(error)
    }
}

/// Map a decode-engine failure (fatal, not per-frame) to the closed error set.
pub fn classify_engine_failure(error: &PlatformError) -> ScanError {
    if ENGINE_UNAVAILABLE_NAMES.contains(&error.name.as_str()) {
        ScanError::DecodeEngineUnavailable
    } else {
        unknown(error)
    }
}

/// Whether a failed constrained request is worth repeating without constraints.
pub fn allows_fallback(error: &PlatformError) -> bool {
    matches!(
        error.name.as_str(),
        "OverconstrainedError" | "ConstraintNotSatisfiedError" | "NotFoundError"
    )
}

/// Interpret one `(result, error)` pair from the decode engine.
pub fn classify_frame(text: Option<&str>, error: Option<&PlatformError>) -> FrameVerdict {
    if let Some(text) = text.map(str::trim).filter(|t| !t.is_empty()) {
        return FrameVerdict::Decoded(text.to_string());
    }
    match error {
        None => FrameVerdict::Miss,
        Some(e) if FRAME_MISS_NAMES.contains(&e.name.as_str()) => FrameVerdict::Miss,
        Some(e) => FrameVerdict::Fatal(classify_engine_failure(e)),
    }
}

fn unknown(error: &PlatformError) -> ScanError {
    if error.message.is_empty() {
        ScanError::Unknown(error.name.clone())
    } else {
        ScanError::Unknown(error.message.clone())
    }
}
