//! Response types returned by backend operations and printed as JSON by `prism`.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::entities::{Entity, EntityTypeDef, Job};

/// One item that failed inside a best-effort bulk operation.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BulkFailure {
    pub id: i64,
    pub message: String,
}

/// Result of a bulk operation. All-or-nothing operations never report failures.
#[derive(Debug, Clone, Default, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct BulkOutcome {
    pub updated: u32,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<BulkFailure>,
}

impl BulkOutcome {
    #[must_use]
    pub const fn all(updated: u32) -> Self {
        Self {
            updated,
            failures: Vec::new(),
        }
    }

    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Response from syncing attributes between two linked entities.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SyncResponse {
    pub from_entity_id: i64,
    pub to_entity_id: i64,
    pub synced: Vec<String>,
}

/// Response from starting a scan or analysis job.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct JobStartResponse {
    pub job: Job,
}

/// Response from `prism schema show`.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct SchemaResponse {
    pub project_id: i64,
    pub entity_types: Vec<EntityTypeDef>,
}

/// Response from `prism entity show`: the entity plus its direct children.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct EntityDetailResponse {
    pub entity: Entity,
    pub children: Vec<Entity>,
}
