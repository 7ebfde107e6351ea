use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::{LinkSource, LinkType};
use crate::errors::CoreError;

/// An asserted relationship between two entities, possibly in different projects.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct CrossProjectLink {
    pub id: i64,
    pub source_entity_id: i64,
    pub target_entity_id: i64,
    pub link_type: LinkType,
    pub confidence: f64,
    pub source: LinkSource,
    pub created_at: DateTime<Utc>,
}

/// A user-submitted link, checked locally before it is sent anywhere.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ManualLink {
    pub source_entity_id: i64,
    pub target_entity_id: i64,
    pub link_type: LinkType,
    /// Defaults to 1.0 when omitted.
    #[serde(default)]
    pub confidence: Option<f64>,
}

impl ManualLink {
    #[must_use]
    pub const fn new(source_entity_id: i64, target_entity_id: i64, link_type: LinkType) -> Self {
        Self {
            source_entity_id,
            target_entity_id,
            link_type,
            confidence: None,
        }
    }

    #[must_use]
    pub fn effective_confidence(&self) -> f64 {
        self.confidence.unwrap_or(1.0)
    }

    /// Check ids and confidence.
    ///
    /// # Errors
    ///
    /// Returns `CoreError::Validation` for non-positive ids, a link from an
    /// entity to itself, or a confidence outside `[0, 1]`.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.source_entity_id <= 0 || self.target_entity_id <= 0 {
            return Err(CoreError::Validation(
                "source and target must be positive entity ids".into(),
            ));
        }
        if self.source_entity_id == self.target_entity_id {
            return Err(CoreError::Validation(
                "source and target must be different entities".into(),
            ));
        }
        let confidence = self.effective_confidence();
        if !(0.0..=1.0).contains(&confidence) {
            return Err(CoreError::Validation(format!(
                "confidence must be between 0 and 1, got {confidence}"
            )));
        }
        Ok(())
    }
}

/// Link counts shown next to the link list.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct LinkStats {
    pub total: u32,
    pub by_type: BTreeMap<String, u32>,
    pub by_source: BTreeMap<String, u32>,
}
