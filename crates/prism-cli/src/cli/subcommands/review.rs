use clap::Subcommand;

/// Extraction review commands.
#[derive(Clone, Debug, Subcommand)]
pub enum ReviewCommands {
    /// Submit an extracted value for review.
    Submit {
        #[arg(long)]
        entity: i64,
        #[arg(long)]
        attr: String,
        /// Value; parsed as JSON when possible, otherwise text.
        #[arg(long)]
        value: String,
        #[arg(long)]
        confidence: f64,
        #[arg(long)]
        reasoning: Option<String>,
        #[arg(long)]
        evidence: Option<i64>,
    },
    /// List results grouped by entity.
    List {
        /// high, medium or low
        #[arg(long)]
        bucket: Option<String>,
        /// pending (default), accepted, rejected, edited, or all
        #[arg(long)]
        status: Option<String>,
        /// Only results flagged as needing evidence.
        #[arg(long)]
        needs_evidence: bool,
    },
    /// Accept a result.
    Accept { id: i64 },
    /// Reject a result.
    Reject { id: i64 },
    /// Commit a corrected value for a result.
    Edit { id: i64, value: String },
    /// Accept every pending result of an entity.
    AcceptEntity { entity_id: i64 },
    /// Reject every pending result of an entity.
    RejectEntity { entity_id: i64 },
    /// Accept every pending result of the project.
    AcceptAll,
    /// Reject every pending result of the project.
    RejectAll,
    /// Toggle the needs-evidence flag.
    Flag { id: i64 },
}
