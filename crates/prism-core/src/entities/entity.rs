use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::ValueSource;

/// A provenance-tagged attribute value.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct AttributeValue {
    pub value: serde_json::Value,
    pub source: ValueSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reasoning: Option<String>,
}

impl AttributeValue {
    /// A value typed in by a person.
    pub fn manual(value: impl Into<serde_json::Value>) -> Self {
        Self {
            value: value.into(),
            source: ValueSource::Manual,
            confidence: None,
            reasoning: None,
        }
    }

    pub fn with_source(value: impl Into<serde_json::Value>, source: ValueSource) -> Self {
        Self {
            value: value.into(),
            source,
            confidence: None,
            reasoning: None,
        }
    }

    /// String form used for plain comparison and display fallbacks.
    ///
    /// Strings are taken verbatim, `null` becomes empty, anything else is
    /// rendered as compact JSON.
    #[must_use]
    pub fn as_plain_string(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        }
    }
}

/// An instance of a schema-defined type within a project.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Entity {
    pub id: i64,
    pub project_id: i64,
    pub type_slug: String,
    pub parent_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
    pub child_count: u32,
    pub evidence_count: u32,
    pub is_starred: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity {
    #[must_use]
    pub fn attribute(&self, slug: &str) -> Option<&AttributeValue> {
        self.attributes.get(slug)
    }
}

/// Input for creating an entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct NewEntity {
    pub project_id: i64,
    pub type_slug: String,
    pub parent_id: Option<i64>,
    pub name: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, AttributeValue>,
}

impl NewEntity {
    pub fn new(project_id: i64, type_slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            project_id,
            type_slug: type_slug.into(),
            parent_id: None,
            name: name.into(),
            attributes: BTreeMap::new(),
        }
    }

    #[must_use]
    pub const fn under(mut self, parent_id: i64) -> Self {
        self.parent_id = Some(parent_id);
        self
    }

    #[must_use]
    pub fn attribute(mut self, slug: impl Into<String>, value: AttributeValue) -> Self {
        self.attributes.insert(slug.into(), value);
        self
    }
}

/// A piece of supporting material attached to an entity.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct Evidence {
    pub id: i64,
    pub entity_id: i64,
    pub title: String,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
}
