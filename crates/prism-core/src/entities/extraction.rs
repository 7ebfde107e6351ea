use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{ConfidenceBucket, ExtractionStatus};

/// A candidate attribute value proposed by an extraction job, awaiting review.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ExtractionResult {
    pub id: i64,
    pub entity_id: i64,
    pub attr_slug: String,
    pub extracted_value: serde_json::Value,
    pub confidence: f64,
    pub reasoning: Option<String>,
    pub evidence_id: Option<i64>,
    pub status: ExtractionStatus,
    pub needs_evidence: bool,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl ExtractionResult {
    #[must_use]
    pub fn bucket(&self) -> ConfidenceBucket {
        ConfidenceBucket::of(self.confidence)
    }

    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.status == ExtractionStatus::Pending
    }
}

/// Input submitted by the extraction job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewExtractionResult {
    pub entity_id: i64,
    pub attr_slug: String,
    pub extracted_value: serde_json::Value,
    pub confidence: f64,
    #[serde(default)]
    pub reasoning: Option<String>,
    #[serde(default)]
    pub evidence_id: Option<i64>,
}

/// A reviewer's decision on a pending result.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
#[serde(tag = "decision", content = "value", rename_all = "snake_case")]
pub enum ReviewDecision {
    Accept,
    Reject,
    Edit(serde_json::Value),
}

impl ReviewDecision {
    /// Status the result moves to under this decision.
    #[must_use]
    pub const fn target_status(&self) -> ExtractionStatus {
        match self {
            Self::Accept => ExtractionStatus::Accepted,
            Self::Reject => ExtractionStatus::Rejected,
            Self::Edit(_) => ExtractionStatus::Edited,
        }
    }
}
