use crate::cli::GlobalFlags;
use crate::cli::root_commands::SyncArgs;
use crate::commands::link::open;
use crate::context::AppContext;
use crate::output::output;

/// Handle `prism sync`. Without `--attr`, copies the diff's default
/// selection (`different` and `only_a`).
pub async fn handle(args: &SyncArgs, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    let mut engine = open(ctx).await?;
    let response = if args.attrs.is_empty() {
        engine.open_diff(args.from, args.to).await?;
        engine.sync_selected().await?
    } else {
        engine.sync(args.from, args.to, &args.attrs).await?
    };
    tracing::info!(
        from = response.from_entity_id,
        to = response.to_entity_id,
        synced = response.synced.len(),
        "attributes synced"
    );
    output(&response, flags.format)
}
