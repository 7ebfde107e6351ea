//! General application configuration.

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Default result limit.
const fn default_limit() -> u32 {
    50
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct GeneralConfig {
    /// Default result limit for list commands.
    #[serde(default = "default_limit")]
    pub default_limit: u32,

    /// Project used when `--project` is not given.
    #[serde(default)]
    pub default_project: Option<i64>,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            default_limit: default_limit(),
            default_project: None,
        }
    }
}

impl GeneralConfig {
    /// Resolve the active project: an explicit id wins over the configured default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::NotConfigured` when neither is set.
    pub fn project_or_default(&self, explicit: Option<i64>) -> Result<i64, ConfigError> {
        explicit
            .or(self.default_project)
            .ok_or_else(|| ConfigError::NotConfigured {
                field: "general.default_project".into(),
            })
    }
}
