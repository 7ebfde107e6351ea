//! Per-project registry of runtime entity types.
//!
//! The `SchemaRegistry` is built once per schema load. It keeps the type
//! definitions in declaration order plus a derived parent → children index,
//! and validates attribute maps against the declared types.

use std::collections::{BTreeMap, HashMap, HashSet};

use prism_core::entities::{AttributeDef, AttributeValue, EntityTypeDef};
use prism_core::enums::DataType;
use serde_json::Value;

use crate::error::SchemaError;
use crate::value;

/// Number of attribute columns shown in entity lists.
pub const MAX_COLUMNS: usize = 5;

/// Whether `slug` is a valid type or attribute slug: a lowercase ASCII letter
/// followed by lowercase letters, digits or underscores.
#[must_use]
pub fn is_valid_slug(slug: &str) -> bool {
    let mut chars = slug.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

/// Entity-type definitions of one project.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    types: Vec<EntityTypeDef>,
    index: HashMap<String, usize>,
    children: HashMap<String, Vec<String>>,
}

impl SchemaRegistry {
    /// Build a registry from a full set of definitions.
    ///
    /// # Errors
    ///
    /// Returns a `SchemaError` if any slug is invalid or duplicated, a parent
    /// type is missing, the hierarchy has a cycle, or an enum attribute has no
    /// values.
    pub fn new(types: Vec<EntityTypeDef>) -> Result<Self, SchemaError> {
        let mut index = HashMap::with_capacity(types.len());
        for (i, def) in types.iter().enumerate() {
            check_definition_shape(def)?;
            if index.insert(def.slug.clone(), i).is_some() {
                return Err(SchemaError::DuplicateType(def.slug.clone()));
            }
        }

        let mut children: HashMap<String, Vec<String>> = HashMap::new();
        for def in &types {
            if let Some(parent) = &def.parent_type_slug {
                if !index.contains_key(parent) {
                    return Err(SchemaError::UnknownParent {
                        type_slug: def.slug.clone(),
                        parent: parent.clone(),
                    });
                }
                children
                    .entry(parent.clone())
                    .or_default()
                    .push(def.slug.clone());
            }
        }

        let registry = Self {
            types,
            index,
            children,
        };
        for def in &registry.types {
            registry.check_acyclic(&def.slug)?;
        }
        Ok(registry)
    }

    fn check_acyclic(&self, start: &str) -> Result<(), SchemaError> {
        let mut seen = HashSet::new();
        let mut current = Some(start);
        while let Some(slug) = current {
            if !seen.insert(slug) {
                return Err(SchemaError::Cycle(start.to_string()));
            }
            current = self.get(slug).and_then(|d| d.parent_type_slug.as_deref());
        }
        Ok(())
    }

    /// Check that `def` could be added to this registry.
    ///
    /// # Errors
    ///
    /// Same conditions as [`SchemaRegistry::new`].
    pub fn check_new_type(&self, def: &EntityTypeDef) -> Result<(), SchemaError> {
        let mut types = self.types.clone();
        types.push(def.clone());
        Self::new(types).map(|_| ())
    }

    /// All definitions in declaration order.
    #[must_use]
    pub fn types(&self) -> &[EntityTypeDef] {
        &self.types
    }

    #[must_use]
    pub fn get(&self, slug: &str) -> Option<&EntityTypeDef> {
        self.index.get(slug).map(|&i| &self.types[i])
    }

    /// Look up a type, failing if it is not declared.
    ///
    /// # Errors
    ///
    /// Returns `SchemaError::UnknownType`.
    pub fn require(&self, slug: &str) -> Result<&EntityTypeDef, SchemaError> {
        self.get(slug)
            .ok_or_else(|| SchemaError::UnknownType(slug.to_string()))
    }

    #[must_use]
    pub fn contains(&self, slug: &str) -> bool {
        self.index.contains_key(slug)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Types with no parent, in declaration order.
    pub fn roots(&self) -> impl Iterator<Item = &EntityTypeDef> {
        self.types.iter().filter(|d| d.is_root())
    }

    /// Slugs of the types whose parent is `slug`, in declaration order.
    #[must_use]
    pub fn children_of(&self, slug: &str) -> &[String] {
        self.children.get(slug).map_or(&[], Vec::as_slice)
    }

    /// Resolve the child type to drill into from `slug`.
    ///
    /// A single child is used directly. With several children `requested`
    /// must name one of them.
    ///
    /// # Errors
    ///
    /// Returns `NoChildType`, `AmbiguousChildType` or `NotAChild`.
    pub fn child_type(&self, slug: &str, requested: Option<&str>) -> Result<&str, SchemaError> {
        self.require(slug)?;
        let children = self.children_of(slug);
        match (children, requested) {
            ([], _) => Err(SchemaError::NoChildType(slug.to_string())),
            (_, Some(child)) => children
                .iter()
                .find(|c| c.as_str() == child)
                .map(String::as_str)
                .ok_or_else(|| SchemaError::NotAChild {
                    type_slug: slug.to_string(),
                    child: child.to_string(),
                }),
            ([only], None) => Ok(only.as_str()),
            (many, None) => Err(SchemaError::AmbiguousChildType {
                type_slug: slug.to_string(),
                candidates: many.to_vec(),
            }),
        }
    }

    /// List columns for a type: its first five attributes in schema order.
    #[must_use]
    pub fn columns(&self, slug: &str) -> &[AttributeDef] {
        self.get(slug).map_or(&[], |d| {
            &d.attributes[..d.attributes.len().min(MAX_COLUMNS)]
        })
    }

    #[must_use]
    pub fn attribute(&self, type_slug: &str, attr_slug: &str) -> Option<&AttributeDef> {
        self.get(type_slug).and_then(|d| d.attribute_def(attr_slug))
    }

    /// Declared data type of an attribute, if any.
    #[must_use]
    pub fn data_type(&self, type_slug: &str, attr_slug: &str) -> Option<DataType> {
        self.attribute(type_slug, attr_slug).map(|a| a.data_type)
    }

    /// Validate one value for an attribute of a type.
    ///
    /// # Errors
    ///
    /// Returns `UnknownType`, `UnknownAttribute` or `InvalidValue`.
    pub fn validate_value(
        &self,
        type_slug: &str,
        attr_slug: &str,
        value: &Value,
    ) -> Result<(), SchemaError> {
        let def = self
            .require(type_slug)?
            .attribute_def(attr_slug)
            .ok_or_else(|| SchemaError::UnknownAttribute {
                type_slug: type_slug.to_string(),
                attr: attr_slug.to_string(),
            })?;
        value::validate_value(def, value)
    }

    /// Validate an attribute map against a type. With `require_all`, every
    /// required attribute must be present and non-blank (used on create).
    ///
    /// # Errors
    ///
    /// Returns the first undeclared or ill-typed attribute, or
    /// `MissingRequired` listing every missing required slug.
    pub fn validate_attributes(
        &self,
        type_slug: &str,
        attributes: &BTreeMap<String, AttributeValue>,
        require_all: bool,
    ) -> Result<(), SchemaError> {
        let def = self.require(type_slug)?;
        for (slug, attr) in attributes {
            self.validate_value(type_slug, slug, &attr.value)?;
        }
        if require_all {
            let missing: Vec<String> = def
                .attributes
                .iter()
                .filter(|a| a.required)
                .filter(|a| attributes.get(&a.slug).is_none_or(|v| value::is_blank(&v.value)))
                .map(|a| a.slug.clone())
                .collect();
            if !missing.is_empty() {
                return Err(SchemaError::MissingRequired {
                    type_slug: type_slug.to_string(),
                    attrs: missing,
                });
            }
        }
        Ok(())
    }
}

fn check_definition_shape(def: &EntityTypeDef) -> Result<(), SchemaError> {
    if !is_valid_slug(&def.slug) {
        return Err(SchemaError::InvalidSlug(def.slug.clone()));
    }
    if def.parent_type_slug.as_deref() == Some(def.slug.as_str()) {
        return Err(SchemaError::Cycle(def.slug.clone()));
    }
    let mut attr_slugs = HashSet::new();
    for attr in &def.attributes {
        if !is_valid_slug(&attr.slug) {
            return Err(SchemaError::InvalidSlug(attr.slug.clone()));
        }
        if !attr_slugs.insert(attr.slug.as_str()) {
            return Err(SchemaError::DuplicateAttribute {
                type_slug: def.slug.clone(),
                attr: attr.slug.clone(),
            });
        }
        if attr.data_type == DataType::Enum && attr.enum_values.is_empty() {
            return Err(SchemaError::MissingEnumValues {
                type_slug: def.slug.clone(),
                attr: attr.slug.clone(),
            });
        }
    }
    Ok(())
}
