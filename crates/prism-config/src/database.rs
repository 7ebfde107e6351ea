//! Local libSQL database configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Default database location, relative to the working directory.
fn default_path() -> String {
    ".prism/prism.db".into()
}

/// Path value that opens a throwaway in-memory database.
pub const IN_MEMORY: &str = ":memory:";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database file path, or `:memory:`.
    #[serde(default = "default_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_path(),
        }
    }
}

impl DatabaseConfig {
    #[must_use]
    pub fn is_in_memory(&self) -> bool {
        self.path == IN_MEMORY
    }

    /// Database path resolved against `base` when relative.
    #[must_use]
    pub fn resolved_path(&self, base: &Path) -> PathBuf {
        let path = Path::new(&self.path);
        if self.is_in_memory() || path.is_absolute() {
            path.to_path_buf()
        } else {
            base.join(path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_project_local() {
        let config = DatabaseConfig::default();
        assert_eq!(config.path, ".prism/prism.db");
        assert!(!config.is_in_memory());
    }

    #[test]
    fn relative_paths_resolve_against_base() {
        let config = DatabaseConfig::default();
        assert_eq!(
            config.resolved_path(Path::new("/work")),
            PathBuf::from("/work/.prism/prism.db")
        );
    }

    #[test]
    fn memory_path_is_left_alone() {
        let config = DatabaseConfig {
            path: IN_MEMORY.into(),
        };
        assert_eq!(config.resolved_path(Path::new("/work")), PathBuf::from(":memory:"));
    }
}
