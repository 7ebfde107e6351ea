use anyhow::Context;
use prism_core::entities::EntityTypeDef;
use prism_core::responses::SchemaResponse;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::SchemaCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `prism schema`.
pub async fn handle(
    action: &SchemaCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let project_id = ctx.project_id(flags)?;
    match action {
        SchemaCommands::Define { file, json } => {
            let def = read_definition(file.as_deref(), json.as_deref())?;
            ctx.service.define_entity_type(project_id, &def).await?;
            show(ctx, project_id, flags).await
        }
        SchemaCommands::Show => show(ctx, project_id, flags).await,
        SchemaCommands::Export { type_slug } => {
            let registry = ctx.service.load_schema(project_id).await?;
            let schema = registry.export_json_schema(type_slug)?;
            output(&schema, flags.format)
        }
    }
}

async fn show(ctx: &AppContext, project_id: i64, flags: &GlobalFlags) -> anyhow::Result<()> {
    let registry = ctx.service.load_schema(project_id).await?;
    output(
        &SchemaResponse {
            project_id,
            entity_types: registry.types().to_vec(),
        },
        flags.format,
    )
}

fn read_definition(file: Option<&str>, json: Option<&str>) -> anyhow::Result<EntityTypeDef> {
    let raw = match (file, json) {
        (Some(path), _) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read type definition from {path}"))?,
        (None, Some(inline)) => inline.to_string(),
        (None, None) => anyhow::bail!("pass --file <path> or --json <definition>"),
    };
    serde_json::from_str(&raw).context("invalid entity type definition")
}
