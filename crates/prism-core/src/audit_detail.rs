//! Typed audit detail payloads.
//!
//! Each audit action can carry a structured `detail` JSON blob. These types
//! provide schema validation for the most common detail shapes.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Detail for `AuditAction::StatusChanged`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct StatusChangedDetail {
    pub from: String,
    pub to: String,
    pub reason: Option<String>,
}

/// Detail for `AuditAction::Committed`: an extraction result written to an entity.
///
/// Confidence and reasoning are kept so the provenance of a committed value
/// survives even if the extraction row is later purged.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CommittedDetail {
    pub extraction_id: i64,
    pub attr_slug: String,
    pub value: serde_json::Value,
    pub source: String,
    pub confidence: f64,
    pub reasoning: Option<String>,
}

/// Detail for `AuditAction::Linked` and `AuditAction::Unlinked`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkedDetail {
    pub source_entity_id: i64,
    pub target_entity_id: i64,
    pub link_type: String,
    pub link_source: String,
}

/// Detail for `AuditAction::Synced`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncedDetail {
    pub from_entity_id: i64,
    pub attr_slugs: Vec<String>,
}

/// Detail for `AuditAction::JobFinished`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct JobFinishedDetail {
    pub kind: String,
    pub status: String,
    pub result_count: u32,
}
