use clap::Subcommand;

/// Entity commands for the active project.
#[derive(Clone, Debug, Subcommand)]
pub enum EntityCommands {
    /// Create an entity.
    Create {
        type_slug: String,
        name: String,
        /// Parent entity id (required for child types).
        #[arg(long)]
        parent: Option<i64>,
        /// Attribute as `slug=value`; repeatable. Values parse as JSON when
        /// they can, otherwise as text.
        #[arg(long = "attr")]
        attrs: Vec<String>,
    },
    /// List entities of a type, at the root or under a parent.
    List {
        /// Entity type (defaults to the first root type).
        #[arg(long = "type")]
        type_slug: Option<String>,
        /// List the children of this entity instead of roots.
        #[arg(long)]
        parent: Option<i64>,
        /// Case-insensitive match on name or attribute values.
        #[arg(long)]
        search: Option<String>,
    },
    /// Show an entity and its direct children.
    Show { id: i64 },
    /// Rename an entity or change attribute values.
    Update {
        id: i64,
        #[arg(long)]
        name: Option<String>,
        /// Attribute as `slug=value`; repeatable.
        #[arg(long = "attr")]
        attrs: Vec<String>,
        /// Attribute slug to clear; repeatable.
        #[arg(long = "clear")]
        clear: Vec<String>,
    },
    /// Star entities.
    Star {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Unstar entities.
    Unstar {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Delete entities and their descendants.
    Delete {
        #[arg(required = true)]
        ids: Vec<i64>,
    },
    /// Per-type entity counts.
    Counts,
}
