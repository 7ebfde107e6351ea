use prism_engine::views::InsightCard;
use serde::Serialize;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::InsightCommands;
use crate::commands::link::open;
use crate::context::AppContext;
use crate::output::{output, output_rows};

#[derive(Debug, Serialize)]
struct AnalyzeResponse {
    insights: u32,
}

/// Handle `prism insight`.
pub async fn handle(
    action: &InsightCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    let mut engine = open(ctx).await?;
    match action {
        InsightCommands::Analyze => {
            let insights = engine.run_analysis().await?;
            output(&AnalyzeResponse { insights }, flags.format)
        }
        InsightCommands::List { all } => {
            engine.set_include_dismissed(*all).await?;
            let cards = engine.insight_cards();
            output_rows(
                &cards,
                &["id", "severity", "type", "title", "dismissed"],
                &table_rows(&cards),
                flags.format,
            )
        }
        InsightCommands::Dismiss { id } => {
            engine.dismiss_insight(*id).await?;
            output(&serde_json::json!({ "dismissed": id }), flags.format)
        }
        InsightCommands::Delete { id } => {
            engine.delete_insight(*id).await?;
            output(&serde_json::json!({ "deleted": id }), flags.format)
        }
    }
}

fn table_rows(cards: &[InsightCard]) -> Vec<Vec<String>> {
    cards
        .iter()
        .map(|card| {
            vec![
                card.id.to_string(),
                card.severity.to_string(),
                card.insight_type.to_string(),
                card.title.clone(),
                if card.dismissed { "yes" } else { "" }.to_string(),
            ]
        })
        .collect()
}
