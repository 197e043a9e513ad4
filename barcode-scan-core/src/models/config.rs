use std::time::Duration;

use super::platform::{FacingMode, Resolution, StreamConstraints};

/// Configuration for a scan session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanConfiguration {
    /// Camera to ask for first (default: rear camera).
    pub preferred_facing: FacingMode,

    /// Resolution the platform should aim for (default: 1280x720).
    pub ideal_resolution: Resolution,

    /// Upper bound on the delivered resolution (default: 1920x1080).
    pub max_resolution: Resolution,

    /// Re-request any camera when the preferred one cannot be satisfied
    /// (default: true).
    pub fallback_to_any_camera: bool,

    /// How long the preview sink may take to report readiness (default: 10s).
    pub attach_timeout: Duration,

    /// Fail a scan that decodes nothing within this window (None = unlimited).
    pub max_scan_duration: Option<Duration>,
}

impl ScanConfiguration {
    pub fn validate(&self) -> Result<(), String> {
        if self.ideal_resolution.width == 0 || self.ideal_resolution.height == 0 {
            return Err(format!("ideal resolution must be non-zero, got {}", self.ideal_resolution));
        }
        if !self.ideal_resolution.fits_within(&self.max_resolution) {
            return Err(format!(
                "ideal resolution {} exceeds max resolution {}",
                self.ideal_resolution, self.max_resolution
            ));
        }
        if self.attach_timeout.is_zero() {
            return Err("attach timeout must be positive".into());
        }
        if self.max_scan_duration.is_some_and(|d| d.is_zero()) {
            return Err("max scan duration must be positive".into());
        }
        Ok(())
    }

    /// Constraints for the first acquisition attempt.
    pub fn preferred_constraints(&self) -> StreamConstraints {
        StreamConstraints::preferred(self.preferred_facing, self.ideal_resolution, self.max_resolution)
    }
}

impl Default for ScanConfiguration {
    fn default() -> Self {
        Self {
            preferred_facing: FacingMode::Environment,
            ideal_resolution: Resolution::new(1280, 720),
            max_resolution: Resolution::new(1920, 1080),
            fallback_to_any_camera: true,
            attach_timeout: Duration::from_secs(10),
            max_scan_duration: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = ScanConfiguration::default();
        assert!(config.validate().is_ok());

        let constraints = config.preferred_constraints();
        assert_eq!(constraints.facing, Some(FacingMode::Environment));
        assert_eq!(constraints.ideal, Some(Resolution::new(1280, 720)));
        assert!(!constraints.audio);
    }

    #[test]
    fn rejects_ideal_above_max() {
        let config = ScanConfiguration {
            ideal_resolution: Resolution::new(3840, 2160),
            ..Default::default()
        };
        assert!(config.validate().unwrap_err().contains("exceeds"));
    }

    #[test]
    fn rejects_zero_timeouts() {
        let config = ScanConfiguration {
            attach_timeout: Duration::ZERO,
            ..Default::default()
        };
        assert!(config.validate().is_err());

        let config = ScanConfiguration {
            max_scan_duration: Some(Duration::ZERO),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
