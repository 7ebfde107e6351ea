use clap::Subcommand;

/// Cross-project link commands.
#[derive(Clone, Debug, Subcommand)]
pub enum LinkCommands {
    /// Run an overlap scan across all projects.
    Scan,
    /// List links.
    List {
        /// Links touching this entity.
        #[arg(long)]
        entity: Option<i64>,
        /// same_entity, related or parent_child
        #[arg(long = "type")]
        link_type: Option<String>,
    },
    /// Link counts by type and source.
    Stats,
    /// Create a manual link.
    Create {
        source: i64,
        target: i64,
        /// same_entity, related or parent_child
        #[arg(long = "type", default_value = "same_entity")]
        link_type: String,
        #[arg(long)]
        confidence: Option<f64>,
    },
    /// Delete a link.
    Delete { id: i64 },
}
