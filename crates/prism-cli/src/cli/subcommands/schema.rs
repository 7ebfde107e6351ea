use clap::Subcommand;

/// Schema commands for the active project.
#[derive(Clone, Debug, Subcommand)]
pub enum SchemaCommands {
    /// Declare an entity type from a JSON definition.
    Define {
        /// Path to a JSON file holding the type definition.
        #[arg(long, conflicts_with = "json")]
        file: Option<String>,
        /// Inline JSON type definition.
        #[arg(long)]
        json: Option<String>,
    },
    /// Show every declared type.
    Show,
    /// Export a type's attribute set as JSON Schema.
    Export { type_slug: String },
}
