use prism_core::entities::NewExtractionResult;
use prism_core::enums::ExtractionStatus;
use prism_db::service::PrismService;
use prism_engine::ReviewEngine;
use prism_engine::views::{ReviewFilter, ReviewGroup};

use crate::cli::GlobalFlags;
use crate::cli::subcommands::ReviewCommands;
use crate::commands::shared::parse::{parse_enum, parse_value};
use crate::context::AppContext;
use crate::output::{output, output_rows};

/// Handle `prism review`.
pub async fn handle(
    action: &ReviewCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ReviewCommands::Submit {
            entity,
            attr,
            value,
            confidence,
            reasoning,
            evidence,
        } => {
            let result = ctx
                .service
                .submit_extraction(&NewExtractionResult {
                    entity_id: *entity,
                    attr_slug: attr.clone(),
                    extracted_value: parse_value(value),
                    confidence: *confidence,
                    reasoning: reasoning.clone(),
                    evidence_id: *evidence,
                })
                .await?;
            output(&result, flags.format)
        }
        ReviewCommands::List {
            bucket,
            status,
            needs_evidence,
        } => {
            let mut engine = open(ctx, flags).await?;
            engine.set_filter(build_filter(
                bucket.as_deref(),
                status.as_deref(),
                *needs_evidence,
            )?);
            let groups = engine.groups();
            output_rows(
                &groups,
                &["id", "entity", "attribute", "value", "confidence", "status", "evidence?"],
                &table_rows(&groups),
                flags.format,
            )
        }
        ReviewCommands::Accept { id } => {
            output(&open(ctx, flags).await?.accept(*id).await?, flags.format)
        }
        ReviewCommands::Reject { id } => {
            output(&open(ctx, flags).await?.reject(*id).await?, flags.format)
        }
        ReviewCommands::Edit { id, value } => {
            let mut engine = open(ctx, flags).await?;
            output(&engine.edit(*id, parse_value(value)).await?, flags.format)
        }
        ReviewCommands::AcceptEntity { entity_id } => {
            let mut engine = open(ctx, flags).await?;
            output(&engine.accept_entity(*entity_id).await?, flags.format)
        }
        ReviewCommands::RejectEntity { entity_id } => {
            let mut engine = open(ctx, flags).await?;
            output(&engine.reject_entity(*entity_id).await?, flags.format)
        }
        ReviewCommands::AcceptAll => {
            output(&open(ctx, flags).await?.accept_all().await?, flags.format)
        }
        ReviewCommands::RejectAll => {
            output(&open(ctx, flags).await?.reject_all().await?, flags.format)
        }
        ReviewCommands::Flag { id } => {
            let mut engine = open(ctx, flags).await?;
            output(&engine.toggle_needs_evidence(*id).await?, flags.format)
        }
    }
}

async fn open(ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<ReviewEngine<PrismService>> {
    Ok(ReviewEngine::open(ctx.service.clone(), ctx.project_id(flags)?).await?)
}

fn build_filter(
    bucket: Option<&str>,
    status: Option<&str>,
    needs_evidence: bool,
) -> anyhow::Result<ReviewFilter> {
    let status = match status {
        None => Some(ExtractionStatus::Pending),
        Some("all") => None,
        Some(raw) => Some(parse_enum(raw, "status")?),
    };
    Ok(ReviewFilter {
        bucket: bucket.map(|raw| parse_enum(raw, "bucket")).transpose()?,
        status,
        needs_evidence: needs_evidence.then_some(true),
    })
}

fn table_rows(groups: &[ReviewGroup]) -> Vec<Vec<String>> {
    groups
        .iter()
        .flat_map(|group| {
            group.items.iter().map(move |item| {
                vec![
                    item.id.to_string(),
                    group.entity_name.clone(),
                    item.attr_slug.clone(),
                    item.value.clone(),
                    format!("{:.0}%", item.confidence * 100.0),
                    item.status.as_str().to_string(),
                    if item.needs_evidence { "yes" } else { "" }.to_string(),
                ]
            })
        })
        .collect()
}
