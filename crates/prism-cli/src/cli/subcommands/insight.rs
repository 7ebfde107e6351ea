use clap::Subcommand;

/// Insight commands.
#[derive(Clone, Debug, Subcommand)]
pub enum InsightCommands {
    /// Regenerate insights from linked entities.
    Analyze,
    /// List insights, most severe first.
    List {
        /// Include dismissed insights.
        #[arg(long)]
        all: bool,
    },
    /// Hide an insight until the next analysis.
    Dismiss { id: i64 },
    /// Delete an insight.
    Delete { id: i64 },
}
