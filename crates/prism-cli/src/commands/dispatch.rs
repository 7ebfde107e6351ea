use crate::cli::GlobalFlags;
use crate::cli::root_commands::Commands;
use crate::commands;
use crate::context::AppContext;

/// Dispatch a parsed command to the corresponding handler module.
pub async fn dispatch(command: Commands, ctx: &AppContext, flags: &GlobalFlags) -> anyhow::Result<()> {
    match command {
        Commands::Project { action } => commands::project::handle(&action, ctx, flags).await,
        Commands::Schema { action } => commands::schema::handle(&action, ctx, flags).await,
        Commands::Entity { action } => commands::entity::handle(&action, ctx, flags).await,
        Commands::Evidence { action } => commands::evidence::handle(&action, ctx, flags).await,
        Commands::Review { action } => commands::review::handle(&action, ctx, flags).await,
        Commands::Link { action } => commands::link::handle(&action, ctx, flags).await,
        Commands::Diff(args) => commands::diff::handle(&args, ctx, flags).await,
        Commands::Sync(args) => commands::sync::handle(&args, ctx, flags).await,
        Commands::Insight { action } => commands::insight::handle(&action, ctx, flags).await,
        Commands::Audit(args) => commands::audit::handle(&args, ctx, flags).await,
        Commands::Init(args) => commands::init::handle(&args, flags).await,
    }
}
