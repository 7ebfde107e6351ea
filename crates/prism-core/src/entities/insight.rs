use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{InsightType, Severity};

/// A derived observation from analyzing linked entities across projects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct CrossProjectInsight {
    pub id: i64,
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub entity_id: Option<i64>,
    pub project_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub is_dismissed: bool,
}

/// An insight produced by a generator, before it is stored.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct NewInsight {
    #[serde(rename = "type")]
    pub insight_type: InsightType,
    pub severity: Severity,
    pub title: String,
    pub description: String,
    pub entity_id: Option<i64>,
    pub project_id: Option<i64>,
}
