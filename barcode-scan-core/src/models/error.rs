use thiserror::Error;

use super::state::ScanState;

/// Normalized failures of a scan attempt.
///
/// Platform camera errors and decode engine errors are both folded into this
/// closed set so the UI never branches on library-specific error names.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("camera permission denied")]
    PermissionDenied,

    #[error("no camera found")]
    DeviceNotFound,

    #[error("camera is in use by another application")]
    DeviceBusy,

    #[error("timed out waiting for the camera")]
    Timeout,

    #[error("barcode decoder unavailable")]
    DecodeEngineUnavailable,

    #[error("unknown error: {0}")]
    Unknown(String),
}

/// What the UI should offer the user after a failed attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryAffordance {
    /// Transient failure, a plain retry is likely to work.
    RetryNow,
    /// The user must allow camera access in the browser/OS settings first.
    GrantPermission,
    /// Another application holds the camera.
    FreeCamera,
    /// Scanning cannot work on this device; fall back to typing the code.
    ManualEntry,
}

impl ScanError {
    pub fn affordance(&self) -> RetryAffordance {
        match self {
            Self::PermissionDenied => RetryAffordance::GrantPermission,
            Self::DeviceBusy => RetryAffordance::FreeCamera,
            Self::DeviceNotFound | Self::DecodeEngineUnavailable => RetryAffordance::ManualEntry,
            Self::Timeout | Self::Unknown(_) => RetryAffordance::RetryNow,
        }
    }
}

/// Contract violations on the session API.
///
/// These are programming errors on the caller's side, not camera failures,
/// and never put the session into `Failed`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("session busy: a transition is still in flight")]
    Busy,

    #[error("cannot {operation} from {state:?} state")]
    InvalidTransition {
        operation: &'static str,
        state: ScanState,
    },

    #[error("session destroyed")]
    Destroyed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn affordance_per_variant() {
        assert_eq!(ScanError::PermissionDenied.affordance(), RetryAffordance::GrantPermission);
        assert_eq!(ScanError::DeviceBusy.affordance(), RetryAffordance::FreeCamera);
        assert_eq!(ScanError::DeviceNotFound.affordance(), RetryAffordance::ManualEntry);
        assert_eq!(ScanError::DecodeEngineUnavailable.affordance(), RetryAffordance::ManualEntry);
        assert_eq!(ScanError::Timeout.affordance(), RetryAffordance::RetryNow);
        assert_eq!(ScanError::Unknown("x".into()).affordance(), RetryAffordance::RetryNow);
    }

    #[test]
    fn invalid_transition_message_names_state() {
        let err = SessionError::InvalidTransition {
            operation: "retry",
            state: ScanState::Idle,
        };
        assert_eq!(err.to_string(), "cannot retry from Idle state");
    }
}
