//! JSON Schema export of an entity type's attribute set.
//!
//! The exported schema describes the `attributes` payload accepted when
//! creating an entity of the type (`prism schema export <type>`), for editor
//! plugins and external extraction jobs.

use prism_core::entities::{AttributeDef, EntityTypeDef};
use prism_core::enums::DataType;
use serde_json::{Map, Value, json};

use crate::error::SchemaError;
use crate::registry::SchemaRegistry;

const DRAFT: &str = "https://json-schema.org/draft/2020-12/schema";

fn attribute_schema(def: &AttributeDef) -> Value {
    let mut schema = match def.data_type {
        DataType::Text => json!({"type": ["string", "number", "boolean"]}),
        DataType::Number | DataType::Currency => json!({"type": ["number", "string"]}),
        DataType::Boolean => json!({"type": ["boolean", "string", "integer"]}),
        DataType::Enum => json!({"enum": def.enum_values}),
        DataType::Url => json!({"type": "string", "format": "uri"}),
        DataType::Date => json!({"type": "string", "format": "date"}),
        DataType::Tags => json!({
            "type": ["array", "string"],
            "items": {"type": "string"}
        }),
        DataType::Json => json!({}),
    };
    if let Value::Object(map) = &mut schema {
        map.insert("title".into(), Value::String(def.name.clone()));
    }
    schema
}

fn type_schema(def: &EntityTypeDef) -> Value {
    let properties: Map<String, Value> = def
        .attributes
        .iter()
        .map(|a| (a.slug.clone(), attribute_schema(a)))
        .collect();
    let required: Vec<&str> = def
        .attributes
        .iter()
        .filter(|a| a.required)
        .map(|a| a.slug.as_str())
        .collect();
    json!({
        "$schema": DRAFT,
        "title": def.name,
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

impl SchemaRegistry {
    /// JSON Schema for the attribute values of `type_slug`, keyed by slug.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownType` if the type is not declared.
    pub fn export_json_schema(&self, type_slug: &str) -> Result<Value, SchemaError> {
        self.require(type_slug).map(type_schema)
    }
}
