use crate::models::error::ScanError;
use crate::models::scan_result::ScanResult;
use crate::models::state::ScanState;

/// Event delegate for scan session notifications.
///
/// Methods may be called from the decoder's or the platform's callback
/// thread. No session lock is held during a call, so implementations may
/// call back into the session (e.g. `start()` again from `on_result`).
pub trait ScanDelegate: Send + Sync {
    /// Called on every state transition.
    fn on_state_changed(&self, state: ScanState);

    /// Called exactly once per successful scan, after the camera is released.
    fn on_result(&self, result: &ScanResult);

    /// Called when an attempt fails; the session is in `Failed`.
    fn on_error(&self, error: &ScanError);
}
