//! Schema validation error types.

use prism_core::enums::DataType;
use prism_core::errors::CoreError;
use thiserror::Error;

/// Errors from the schema registry and attribute validation.
#[derive(Debug, Error)]
pub enum SchemaError {
    /// Requested entity type is not declared in the schema.
    #[error("Unknown entity type: {0}")]
    UnknownType(String),

    /// An entity type with this slug already exists.
    #[error("Entity type already defined: {0}")]
    DuplicateType(String),

    /// Slug is empty or contains characters other than `[a-z0-9_]`.
    #[error("Invalid slug '{0}': use lowercase letters, digits and underscores, starting with a letter")]
    InvalidSlug(String),

    /// `parent_type_slug` does not name another type in the schema.
    #[error("Entity type '{type_slug}' references unknown parent type '{parent}'")]
    UnknownParent { type_slug: String, parent: String },

    /// Following parent links from this type leads back to it.
    #[error("Entity type hierarchy contains a cycle through '{0}'")]
    Cycle(String),

    /// Two attribute definitions on one type share a slug.
    #[error("Attribute '{attr}' is declared twice on '{type_slug}'")]
    DuplicateAttribute { type_slug: String, attr: String },

    /// An `enum` attribute was declared without allowed values.
    #[error("Enum attribute '{attr}' on '{type_slug}' has no enum values")]
    MissingEnumValues { type_slug: String, attr: String },

    /// Attribute key is not declared on the entity's type.
    #[error("Attribute '{attr}' is not declared on entity type '{type_slug}'")]
    UnknownAttribute { type_slug: String, attr: String },

    /// Required attributes missing on create.
    #[error("Entity type '{type_slug}' requires attributes: {}", attrs.join(", "))]
    MissingRequired {
        type_slug: String,
        attrs: Vec<String>,
    },

    /// Value does not match the declared data type.
    #[error("Value for '{attr}' is not a valid {data_type}: {reason}")]
    InvalidValue {
        attr: String,
        data_type: DataType,
        reason: String,
    },

    /// Type has no declared child type to drill into.
    #[error("Entity type '{0}' has no child types")]
    NoChildType(String),

    /// Several child types exist and none was chosen.
    #[error("Entity type '{type_slug}' has several child types ({}); choose one", candidates.join(", "))]
    AmbiguousChildType {
        type_slug: String,
        candidates: Vec<String>,
    },

    /// Requested child type is not a child of the given type.
    #[error("'{child}' is not a child type of '{type_slug}'")]
    NotAChild { type_slug: String, child: String },
}

impl From<SchemaError> for CoreError {
    fn from(err: SchemaError) -> Self {
        Self::Validation(err.to_string())
    }
}
