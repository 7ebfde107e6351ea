//! Bounded polling of long-running backend jobs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default delay between status checks, in milliseconds.
const fn default_interval_ms() -> u64 {
    500
}

/// Default number of status checks before giving up.
const fn default_max_attempts() -> u32 {
    20
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollingConfig {
    /// Fixed delay between job status checks.
    #[serde(default = "default_interval_ms")]
    pub interval_ms: u64,

    /// Status checks before a job is reported as timed out.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_ms: default_interval_ms(),
            max_attempts: default_max_attempts(),
        }
    }
}

impl PollingConfig {
    #[must_use]
    pub const fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if `max_attempts` is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_attempts == 0 {
            return Err(ConfigError::InvalidValue {
                field: "polling.max_attempts".into(),
                reason: "must be at least 1".into(),
            });
        }
        Ok(())
    }
}
