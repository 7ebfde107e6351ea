use clap::Subcommand;

/// Evidence commands.
#[derive(Clone, Debug, Subcommand)]
pub enum EvidenceCommands {
    /// Attach evidence to an entity.
    Add {
        entity_id: i64,
        title: String,
        #[arg(long)]
        url: Option<String>,
    },
    /// List an entity's evidence.
    List { entity_id: i64 },
}
