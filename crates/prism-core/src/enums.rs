//! Data types, provenance sources, statuses, and classification enums for Prism.
//!
//! All enums use `snake_case` serialization via `#[serde(rename_all = "snake_case")]`.
//! Status enums with state machines provide `allowed_next_states()` to enforce
//! valid transitions at the application layer.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Implements `Display` by delegating to the enum's `as_str()`.
macro_rules! display_via_as_str {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl fmt::Display for $ty {
                fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                    f.write_str(self.as_str())
                }
            }
        )+
    };
}

// ---------------------------------------------------------------------------
// DataType
// ---------------------------------------------------------------------------

/// Declared data type of an attribute definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DataType {
    Text,
    Number,
    Currency,
    Boolean,
    Enum,
    Url,
    Date,
    Tags,
    Json,
}

impl DataType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::Currency => "currency",
            Self::Boolean => "boolean",
            Self::Enum => "enum",
            Self::Url => "url",
            Self::Date => "date",
            Self::Tags => "tags",
            Self::Json => "json",
        }
    }
}

// ---------------------------------------------------------------------------
// ValueSource
// ---------------------------------------------------------------------------

/// Provenance of an attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ValueSource {
    Manual,
    Extracted,
    Ai,
    Edited,
    Synced,
}

impl ValueSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Extracted => "extracted",
            Self::Ai => "ai",
            Self::Edited => "edited",
            Self::Synced => "synced",
        }
    }

    /// Whether a person typed or corrected this value.
    #[must_use]
    pub const fn is_human_asserted(self) -> bool {
        matches!(self, Self::Manual | Self::Edited)
    }
}

// ---------------------------------------------------------------------------
// ExtractionStatus
// ---------------------------------------------------------------------------

/// Review status of an extraction result.
///
/// ```text
/// pending → accepted
///         → rejected
///         → edited
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Pending,
    Accepted,
    Rejected,
    Edited,
}

impl ExtractionStatus {
    /// Valid next states from the current state.
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Pending => &[Self::Accepted, Self::Rejected, Self::Edited],
            Self::Accepted | Self::Rejected | Self::Edited => &[],
        }
    }

    /// Check whether transitioning to `next` is allowed.
    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    /// Accepted and edited results carry their value into the entity.
    #[must_use]
    pub const fn commits_value(self) -> bool {
        matches!(self, Self::Accepted | Self::Edited)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Edited => "edited",
        }
    }
}

// ---------------------------------------------------------------------------
// ConfidenceBucket
// ---------------------------------------------------------------------------

/// Lower bound (inclusive) of the high bucket.
pub const HIGH_CONFIDENCE: f64 = 0.8;

/// Lower bound (inclusive) of the medium bucket.
pub const MEDIUM_CONFIDENCE: f64 = 0.5;

/// Review filter bucket for a single result's confidence.
///
/// `[0, 0.5)` low, `[0.5, 0.8)` medium, `[0.8, 1]` high.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum ConfidenceBucket {
    High,
    Medium,
    Low,
}

impl ConfidenceBucket {
    /// Bucket for a confidence value. `NaN` lands in `Low`.
    #[must_use]
    pub fn of(confidence: f64) -> Self {
        if confidence >= HIGH_CONFIDENCE {
            Self::High
        } else if confidence >= MEDIUM_CONFIDENCE {
            Self::Medium
        } else {
            Self::Low
        }
    }

    #[must_use]
    pub fn contains(self, confidence: f64) -> bool {
        Self::of(confidence) == self
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        }
    }
}

// ---------------------------------------------------------------------------
// LinkType / LinkSource
// ---------------------------------------------------------------------------

/// Relationship asserted by a cross-project link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkType {
    SameEntity,
    Related,
    ParentChild,
}

impl LinkType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::SameEntity => "same_entity",
            Self::Related => "related",
            Self::ParentChild => "parent_child",
        }
    }
}

/// Who created a cross-project link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum LinkSource {
    Auto,
    Manual,
    Ai,
}

impl LinkSource {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "auto",
            Self::Manual => "manual",
            Self::Ai => "ai",
        }
    }
}

// ---------------------------------------------------------------------------
// InsightType / Severity
// ---------------------------------------------------------------------------

/// Category of a derived cross-project insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum InsightType {
    Overlap,
    Divergence,
    CoverageGap,
    Trend,
    Pattern,
    Contradiction,
}

impl InsightType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Overlap => "overlap",
            Self::Divergence => "divergence",
            Self::CoverageGap => "coverage_gap",
            Self::Trend => "trend",
            Self::Pattern => "pattern",
            Self::Contradiction => "contradiction",
        }
    }
}

/// Insight severity, most urgent first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Critical,
    Important,
    Notable,
    Info,
}

impl Severity {
    /// Sort rank: 0 is the most urgent.
    #[must_use]
    pub const fn rank(self) -> u8 {
        match self {
            Self::Critical => 0,
            Self::Important => 1,
            Self::Notable => 2,
            Self::Info => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Critical => "critical",
            Self::Important => "important",
            Self::Notable => "notable",
            Self::Info => "info",
        }
    }
}

// ---------------------------------------------------------------------------
// DiffClass
// ---------------------------------------------------------------------------

/// Classification of one attribute slug when diffing two entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DiffClass {
    Same,
    Different,
    OnlyA,
    OnlyB,
}

impl DiffClass {
    /// Classes whose `a` value may be synced onto `b`.
    #[must_use]
    pub const fn is_sync_eligible(self) -> bool {
        matches!(self, Self::Different | Self::OnlyA)
    }

    /// The class seen from the other side of the comparison.
    #[must_use]
    pub const fn swapped(self) -> Self {
        match self {
            Self::Same => Self::Same,
            Self::Different => Self::Different,
            Self::OnlyA => Self::OnlyB,
            Self::OnlyB => Self::OnlyA,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Same => "same",
            Self::Different => "different",
            Self::OnlyA => "only_a",
            Self::OnlyB => "only_b",
        }
    }
}

// ---------------------------------------------------------------------------
// JobKind / JobStatus
// ---------------------------------------------------------------------------

/// Long-running backend job kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    OverlapScan,
    Analysis,
}

impl JobKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::OverlapScan => "overlap_scan",
            Self::Analysis => "analysis",
        }
    }
}

/// Status of a backend job.
///
/// ```text
/// running → completed
///         → failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    #[must_use]
    pub const fn allowed_next_states(self) -> &'static [Self] {
        match self {
            Self::Running => &[Self::Completed, Self::Failed],
            Self::Completed | Self::Failed => &[],
        }
    }

    #[must_use]
    pub fn can_transition_to(self, next: Self) -> bool {
        self.allowed_next_states().contains(&next)
    }

    #[must_use]
    pub const fn is_finished(self) -> bool {
        !matches!(self, Self::Running)
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Completed => "completed",
            Self::Failed => "failed",
        }
    }
}

// ---------------------------------------------------------------------------
// RecordKind
// ---------------------------------------------------------------------------

/// Kind of persisted record, used in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Project,
    EntityType,
    Entity,
    Evidence,
    ExtractionResult,
    Link,
    Insight,
    Job,
}

impl RecordKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Project => "project",
            Self::EntityType => "entity_type",
            Self::Entity => "entity",
            Self::Evidence => "evidence",
            Self::ExtractionResult => "extraction_result",
            Self::Link => "link",
            Self::Insight => "insight",
            Self::Job => "job",
        }
    }
}

// ---------------------------------------------------------------------------
// AuditAction
// ---------------------------------------------------------------------------

/// Type of action recorded in the audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Created,
    Updated,
    Deleted,
    Starred,
    Unstarred,
    StatusChanged,
    Committed,
    Flagged,
    Linked,
    Unlinked,
    Synced,
    Dismissed,
    JobFinished,
}

impl AuditAction {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Updated => "updated",
            Self::Deleted => "deleted",
            Self::Starred => "starred",
            Self::Unstarred => "unstarred",
            Self::StatusChanged => "status_changed",
            Self::Committed => "committed",
            Self::Flagged => "flagged",
            Self::Linked => "linked",
            Self::Unlinked => "unlinked",
            Self::Synced => "synced",
            Self::Dismissed => "dismissed",
            Self::JobFinished => "job_finished",
        }
    }
}

display_via_as_str!(
    DataType,
    ValueSource,
    ExtractionStatus,
    ConfidenceBucket,
    LinkType,
    LinkSource,
    InsightType,
    Severity,
    DiffClass,
    JobKind,
    JobStatus,
    RecordKind,
    AuditAction,
);

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
