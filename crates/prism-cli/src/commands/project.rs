use crate::cli::GlobalFlags;
use crate::cli::subcommands::ProjectCommands;
use crate::context::AppContext;
use crate::output::output;

/// Handle `prism project`.
pub async fn handle(
    action: &ProjectCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        ProjectCommands::Create { name, description } => {
            let project = ctx
                .service
                .create_project(name, description.as_deref())
                .await?;
            output(&project, flags.format)
        }
        ProjectCommands::List => {
            let projects = ctx.service.list_projects().await?;
            output(&projects, flags.format)
        }
        ProjectCommands::Show { id } => {
            let project = ctx.service.get_project(*id).await?;
            output(&project, flags.format)
        }
    }
}
