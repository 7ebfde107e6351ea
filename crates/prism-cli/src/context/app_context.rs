use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use prism_config::PrismConfig;
use prism_db::service::PrismService;
use prism_engine::PollConfig;

use super::project_root::find_project_root;
use crate::cli::GlobalFlags;

/// Shared application resources initialized once at startup.
pub struct AppContext {
    pub service: Arc<PrismService>,
    pub config: PrismConfig,
}

/// Load `.env` (if any) and the layered configuration.
pub fn load_config() -> anyhow::Result<PrismConfig> {
    dotenvy::dotenv().ok();
    PrismConfig::load().map_err(anyhow::Error::from)
}

impl AppContext {
    /// Open the database named by the configuration, resolved against the
    /// nearest directory holding `.prism`.
    pub async fn init(config: PrismConfig) -> anyhow::Result<Self> {
        let cwd = std::env::current_dir().context("failed to read current directory")?;
        let root = if config.database.is_in_memory() || Path::new(&config.database.path).is_absolute()
        {
            cwd
        } else {
            find_project_root(&cwd)
                .context("not a prism workspace (no .prism directory found). Run 'prism init' first.")?
        };

        let db_path = config.database.resolved_path(&root);
        let db_path_str = db_path.to_string_lossy();
        tracing::debug!(path = %db_path_str, "opening prism database");
        let service = PrismService::new_local(&db_path_str)
            .await
            .with_context(|| format!("failed to open database at {db_path_str}"))?;

        Ok(Self {
            service: Arc::new(service),
            config,
        })
    }

    /// Active project: `--project`, then `general.default_project`.
    pub fn project_id(&self, flags: &GlobalFlags) -> anyhow::Result<i64> {
        self.config
            .general
            .project_or_default(flags.project)
            .context("no project selected; pass --project <id> or set general.default_project")
    }

    /// List limit: local argument, then `--limit`, then `general.default_limit`.
    #[must_use]
    pub fn limit(&self, local: Option<u32>, flags: &GlobalFlags) -> u32 {
        local
            .or(flags.limit)
            .unwrap_or(self.config.general.default_limit)
    }

    #[must_use]
    pub fn poll(&self) -> PollConfig {
        PollConfig::from(&self.config.polling)
    }
}
