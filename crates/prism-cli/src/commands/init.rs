use std::path::PathBuf;

use anyhow::Context;
use prism_config::PRISM_DIR;
use prism_db::service::PrismService;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::root_commands::InitArgs;
use crate::context::load_config;
use crate::output::output;

#[derive(Debug, Serialize)]
struct InitResponse {
    root: String,
    database: String,
    created: bool,
}

/// Handle `prism init`: create `.prism/` and run migrations. Safe to repeat.
pub async fn handle(args: &InitArgs, flags: &GlobalFlags) -> anyhow::Result<()> {
    let root = match &args.path {
        Some(path) => PathBuf::from(path),
        None => std::env::current_dir().context("failed to read current directory")?,
    };
    let prism_dir = root.join(PRISM_DIR);
    let created = !prism_dir.is_dir();
    std::fs::create_dir_all(&prism_dir)
        .with_context(|| format!("failed to create {}", prism_dir.display()))?;

    let config = load_config()?;
    let db_path = config.database.resolved_path(&root);
    if let Some(parent) = db_path
        .parent()
        .filter(|p| !config.database.is_in_memory() && !p.as_os_str().is_empty())
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let db_path_str = db_path.to_string_lossy().into_owned();
    PrismService::new_local(&db_path_str)
        .await
        .with_context(|| format!("failed to initialize database at {db_path_str}"))?;
    tracing::info!(root = %root.display(), created, "initialized prism workspace");

    output(
        &InitResponse {
            root: root.display().to_string(),
            database: db_path_str,
            created,
        },
        flags.format,
    )
}
