use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::enums::DataType;

/// One attribute declared on an entity type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct AttributeDef {
    pub slug: String,
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub required: bool,
    /// Allowed values when `data_type` is `enum`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub enum_values: Vec<String>,
}

impl AttributeDef {
    pub fn new(slug: impl Into<String>, name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            data_type,
            required: false,
            enum_values: Vec::new(),
        }
    }

    #[must_use]
    pub const fn required(mut self) -> Self {
        self.required = true;
        self
    }

    #[must_use]
    pub fn with_enum_values<I, S>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.enum_values = values.into_iter().map(Into::into).collect();
        self
    }
}

/// A runtime-defined entity type. `parent_type_slug` of `None` marks a root type.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
pub struct EntityTypeDef {
    pub slug: String,
    pub name: String,
    pub parent_type_slug: Option<String>,
    /// Attribute definitions in display order.
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

impl EntityTypeDef {
    pub fn new(slug: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            slug: slug.into(),
            name: name.into(),
            parent_type_slug: None,
            attributes: Vec::new(),
        }
    }

    #[must_use]
    pub fn child_of(mut self, parent: impl Into<String>) -> Self {
        self.parent_type_slug = Some(parent.into());
        self
    }

    #[must_use]
    pub fn attribute(mut self, def: AttributeDef) -> Self {
        self.attributes.push(def);
        self
    }

    /// Look up an attribute definition by slug.
    #[must_use]
    pub fn attribute_def(&self, slug: &str) -> Option<&AttributeDef> {
        self.attributes.iter().find(|a| a.slug == slug)
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.parent_type_slug.is_none()
    }
}
