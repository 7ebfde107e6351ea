use clap::{Args, Subcommand};

use super::subcommands::{
    EntityCommands, EvidenceCommands, InsightCommands, LinkCommands, ProjectCommands,
    ReviewCommands, SchemaCommands,
};

/// Root command tree for `prism`.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Create the `.prism` directory and database here.
    Init(InitArgs),
    /// Research projects.
    Project {
        #[command(subcommand)]
        action: ProjectCommands,
    },
    /// Entity types of the active project.
    Schema {
        #[command(subcommand)]
        action: SchemaCommands,
    },
    /// Entities of the active project.
    Entity {
        #[command(subcommand)]
        action: EntityCommands,
    },
    /// Supporting material attached to entities.
    Evidence {
        #[command(subcommand)]
        action: EvidenceCommands,
    },
    /// Review extracted attribute values.
    Review {
        #[command(subcommand)]
        action: ReviewCommands,
    },
    /// Cross-project links and overlap scans.
    Link {
        #[command(subcommand)]
        action: LinkCommands,
    },
    /// Compare two entities attribute by attribute.
    Diff(DiffArgs),
    /// Copy attribute values from one entity onto another.
    Sync(SyncArgs),
    /// Cross-project insights.
    Insight {
        #[command(subcommand)]
        action: InsightCommands,
    },
    /// Query the audit trail.
    Audit(AuditArgs),
}

#[derive(Clone, Debug, Args)]
pub struct InitArgs {
    /// Directory to initialize (defaults to the current directory).
    pub path: Option<String>,
}

#[derive(Clone, Debug, Args)]
pub struct DiffArgs {
    /// Entity A (sync source).
    pub a: i64,
    /// Entity B (sync target).
    pub b: i64,
}

#[derive(Clone, Debug, Args)]
pub struct SyncArgs {
    /// Source entity.
    pub from: i64,
    /// Target entity.
    pub to: i64,
    /// Attribute to copy; repeatable. Defaults to every `different` and
    /// `only_a` attribute.
    #[arg(long = "attr")]
    pub attrs: Vec<String>,
}

#[derive(Clone, Debug, Args)]
pub struct AuditArgs {
    /// Record kind (project, entity, extraction_result, link, ...).
    #[arg(long)]
    pub kind: Option<String>,
    /// Record id.
    #[arg(long)]
    pub record: Option<i64>,
    /// Action (created, committed, synced, ...).
    #[arg(long)]
    pub action: Option<String>,
}
