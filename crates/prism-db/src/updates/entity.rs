//! Entity update builder.

use std::collections::BTreeMap;

use prism_core::entities::AttributeValue;
use serde::Serialize;

#[derive(Debug, Clone, Default, Serialize)]
pub struct EntityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Attribute values to upsert.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, AttributeValue>,
    /// Attribute slugs to remove.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub clear: Vec<String>,
}

impl EntityUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.set.is_empty() && self.clear.is_empty()
    }
}

#[derive(Default)]
pub struct EntityUpdateBuilder(EntityUpdate);

impl EntityUpdateBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn name(mut self, val: impl Into<String>) -> Self {
        self.0.name = Some(val.into());
        self
    }

    #[must_use]
    pub fn set(mut self, slug: impl Into<String>, val: AttributeValue) -> Self {
        self.0.set.insert(slug.into(), val);
        self
    }

    #[must_use]
    pub fn clear(mut self, slug: impl Into<String>) -> Self {
        self.0.clear.push(slug.into());
        self
    }

    #[must_use]
    pub fn build(self) -> EntityUpdate {
        self.0
    }
}
