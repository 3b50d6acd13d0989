//! Application configuration value object

use serde::{Deserialize, Serialize};

use crate::domain::device::DevicePosition;
use crate::domain::duration::Duration;

/// Application configuration.
/// All fields are optional to support partial configs and merging.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub output: Option<String>,
    pub duration: Option<String>,
    pub switch_after: Option<String>,
    pub position: Option<String>,
    pub synthetic: Option<bool>,
    pub stabilize: Option<bool>,
}

impl AppConfig {
    /// Create config with default values
    pub fn defaults() -> Self {
        Self {
            output: None,
            duration: Some("10s".to_string()),
            switch_after: None,
            position: Some("front".to_string()),
            synthetic: Some(false),
            stabilize: Some(false),
        }
    }

    /// Create an empty config (all None)
    pub fn empty() -> Self {
        Self::default()
    }

    /// Merge this config with another, where other takes precedence.
    /// Only non-None values from other will override this.
    pub fn merge(self, other: Self) -> Self {
        Self {
            output: other.output.or(self.output),
            duration: other.duration.or(self.duration),
            switch_after: other.switch_after.or(self.switch_after),
            position: other.position.or(self.position),
            synthetic: other.synthetic.or(self.synthetic),
            stabilize: other.stabilize.or(self.stabilize),
        }
    }

    /// Get duration as parsed Duration, or default if not set/invalid
    pub fn duration_or_default(&self) -> Duration {
        self.duration
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or_else(Duration::default_duration)
    }

    /// Get switch_after as parsed Duration; None means never switch
    pub fn switch_after_parsed(&self) -> Option<Duration> {
        self.switch_after.as_ref().and_then(|s| s.parse().ok())
    }

    /// Get position as parsed DevicePosition, or Front if not set/invalid
    pub fn position_or_default(&self) -> DevicePosition {
        self.position
            .as_ref()
            .and_then(|s| s.parse().ok())
            .unwrap_or(DevicePosition::Front)
    }

    /// Get synthetic setting, or false if not set
    pub fn synthetic_or_default(&self) -> bool {
        self.synthetic.unwrap_or(false)
    }

    /// Get stabilize setting, or false if not set
    pub fn stabilize_or_default(&self) -> bool {
        self.stabilize.unwrap_or(false)
    }
}
