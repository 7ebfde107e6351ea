use prism_core::entities::ManualLink;
use prism_core::enums::LinkType;
use prism_db::repos::link::LinkFilter;
use prism_db::service::PrismService;
use prism_engine::ReconciliationEngine;
use prism_engine::views::LinkRow;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::LinkCommands;
use crate::commands::shared::parse::parse_enum;
use crate::context::AppContext;
use crate::output::{output, output_rows};

#[derive(Debug, Serialize)]
struct ScanResponse {
    created: u32,
}

/// Handle `prism link`.
pub async fn handle(
    action: &LinkCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let mut engine = open(ctx).await?;
    match action {
        LinkCommands::Scan => {
            let created = engine.scan_for_overlaps().await?;
            output(&ScanResponse { created }, flags.format)
        }
        LinkCommands::List { entity, link_type } => {
            let link_type = link_type
                .as_deref()
                .map(|raw| parse_enum::<LinkType>(raw, "link type"))
                .transpose()?;
            engine
                .set_link_filter(LinkFilter {
                    entity_id: *entity,
                    link_type,
                    ..LinkFilter::default()
                })
                .await?;
            let rows = engine.link_rows();
            output_rows(
                &rows,
                &["id", "source", "target", "type", "origin", "confidence"],
                &table_rows(&rows),
                flags.format,
            )
        }
        LinkCommands::Stats => output(engine.stats(), flags.format),
        LinkCommands::Create {
            source,
            target,
            link_type,
            confidence,
        } => {
            let mut link = ManualLink::new(*source, *target, parse_enum(link_type, "link type")?);
            link.confidence = *confidence;
            output(&engine.create_manual_link(&link).await?, flags.format)
        }
        LinkCommands::Delete { id } => {
            engine.delete_link(*id).await?;
            output(&serde_json::json!({ "deleted": id }), flags.format)
        }
    }
}

pub async fn open(ctx: &AppContext) -> anyhow::Result<ReconciliationEngine<PrismService>> {
    Ok(ReconciliationEngine::open(ctx.service.clone(), ctx.poll()).await?)
}

fn table_rows(rows: &[LinkRow]) -> Vec<Vec<String>> {
    rows.iter()
        .map(|row| {
            vec![
                row.id.to_string(),
                row.source_entity_id.to_string(),
                row.target_entity_id.to_string(),
                row.link_type.to_string(),
                row.source.to_string(),
                row.confidence.clone(),
            ]
        })
        .collect()
}
