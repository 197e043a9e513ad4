/// Scan session state machine.
///
/// State transitions:
/// ```text
/// idle → initializing → scanning → succeeded → idle
///             ↓             ↓
///           failed ←────────┘
///             ↓ retry
///        initializing
/// ```
///
/// `Succeeded` is transient. `Failed` holds until `retry()`, `start()` or
/// `stop()`; the camera is already released by then.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScanState {
    Idle,
    Initializing,
    Scanning,
    Succeeded,
    Failed,
}

impl ScanState {
    pub fn is_idle(&self) -> bool {
        matches!(self, Self::Idle)
    }

    /// Camera requested or held.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Initializing | Self::Scanning)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Label used by the scanner view: idle / loading / scanning / error.
    pub fn view_label(&self) -> &'static str {
        match self {
            Self::Idle | Self::Succeeded => "idle",
            Self::Initializing => "loading",
            Self::Scanning => "scanning",
            Self::Failed => "error",
        }
    }
}
