use crate::cli::GlobalFlags;
use crate::cli::subcommands::EvidenceCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `prism evidence`.
pub async fn handle(
    action: &EvidenceCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        EvidenceCommands::Add {
            entity_id,
            title,
            url,
        } => {
            let evidence = ctx
                .service
                .add_evidence(*entity_id, title, url.as_deref())
                .await?;
            output(&evidence, flags.format)
        }
        EvidenceCommands::List { entity_id } => {
            output(&ctx.service.list_evidence(*entity_id).await?, flags.format)
        }
    }
}
