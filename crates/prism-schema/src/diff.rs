//! Attribute-level diff between two entities.
//!
//! Every slug in the union of both attribute maps is classified exactly once
//! as `same`, `different`, `only_a` or `only_b`. Comparison uses the declared
//! data type when both sides agree on it or only one side declares the slug;
//! conflicting declarations and undeclared slugs compare as strings. The two entities may belong to different projects with
//! differently-shaped schemas.

use std::collections::{BTreeSet, HashSet};

use prism_core::entities::{AttributeValue, Entity, EntityTypeDef};
use prism_core::enums::{DataType, DiffClass};
use serde::{Deserialize, Serialize};

use crate::value::values_equivalent;

/// Classification of one attribute slug.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttributeDiff {
    pub slug: String,
    pub class: DiffClass,
    pub data_type: Option<DataType>,
    pub value_a: Option<AttributeValue>,
    pub value_b: Option<AttributeValue>,
}

/// Diff of two entities, slugs ordered by A's schema, then B's, then name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityDiff {
    pub entity_a: i64,
    pub entity_b: i64,
    pub attributes: Vec<AttributeDiff>,
}

fn ordered_union(
    a: &Entity,
    type_a: Option<&EntityTypeDef>,
    b: &Entity,
    type_b: Option<&EntityTypeDef>,
) -> Vec<String> {
    let present: BTreeSet<&String> = a.attributes.keys().chain(b.attributes.keys()).collect();
    let mut seen = HashSet::new();
    let mut ordered = Vec::with_capacity(present.len());

    let declared = type_a
        .into_iter()
        .chain(type_b)
        .flat_map(|t| t.attributes.iter().map(|d| &d.slug));
    for slug in declared.chain(present.iter().copied()) {
        if present.contains(slug) && seen.insert(slug.as_str()) {
            ordered.push(slug.clone());
        }
    }
    ordered
}

/// Symmetric in its arguments, so swapping A and B keeps `same`/`different`.
fn comparison_type(a: Option<DataType>, b: Option<DataType>) -> Option<DataType> {
    match (a, b) {
        (Some(x), Some(y)) if x == y => Some(x),
        (Some(_), Some(_)) => None,
        (Some(x), None) | (None, Some(x)) => Some(x),
        (None, None) => None,
    }
}

impl EntityDiff {
    /// Diff `a` against `b` using their (optional) type definitions.
    #[must_use]
    pub fn compute(
        a: &Entity,
        type_a: Option<&EntityTypeDef>,
        b: &Entity,
        type_b: Option<&EntityTypeDef>,
    ) -> Self {
        let attributes = ordered_union(a, type_a, b, type_b)
            .into_iter()
            .map(|slug| {
                let data_type = comparison_type(
                    type_a.and_then(|t| t.attribute_def(&slug)).map(|d| d.data_type),
                    type_b.and_then(|t| t.attribute_def(&slug)).map(|d| d.data_type),
                );
                let value_a = a.attributes.get(&slug).cloned();
                let value_b = b.attributes.get(&slug).cloned();
                let class = match (&value_a, &value_b) {
                    (Some(x), Some(y)) if values_equivalent(data_type, &x.value, &y.value) => {
                        DiffClass::Same
                    }
                    (Some(_), Some(_)) => DiffClass::Different,
                    (Some(_), None) => DiffClass::OnlyA,
                    (None, _) => DiffClass::OnlyB,
                };
                AttributeDiff {
                    slug,
                    class,
                    data_type,
                    value_a,
                    value_b,
                }
            })
            .collect();

        Self {
            entity_a: a.id,
            entity_b: b.id,
            attributes,
        }
    }

    /// Classification of `slug`, if it appears on either side.
    #[must_use]
    pub fn class_of(&self, slug: &str) -> Option<DiffClass> {
        self.attributes
            .iter()
            .find(|d| d.slug == slug)
            .map(|d| d.class)
    }

    /// Slugs with the given classification, in diff order.
    #[must_use]
    pub fn slugs(&self, class: DiffClass) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|d| d.class == class)
            .map(|d| d.slug.as_str())
            .collect()
    }

    /// Slugs preselected for syncing A onto B: `different` plus `only_a`.
    #[must_use]
    pub fn default_selection(&self) -> BTreeSet<String> {
        self.attributes
            .iter()
            .filter(|d| d.class.is_sync_eligible())
            .map(|d| d.slug.clone())
            .collect()
    }

    /// The same diff seen from B's side.
    #[must_use]
    pub fn swapped(&self) -> Self {
        Self {
            entity_a: self.entity_b,
            entity_b: self.entity_a,
            attributes: self
                .attributes
                .iter()
                .map(|d| AttributeDiff {
                    slug: d.slug.clone(),
                    class: d.class.swapped(),
                    data_type: d.data_type,
                    value_a: d.value_b.clone(),
                    value_b: d.value_a.clone(),
                })
                .collect(),
        }
    }

    /// Counts as `(same, different, only_a, only_b)`.
    #[must_use]
    pub fn counts(&self) -> (usize, usize, usize, usize) {
        self.attributes
            .iter()
            .fold((0, 0, 0, 0), |(s, d, a, b), attr| match attr.class {
                DiffClass::Same => (s + 1, d, a, b),
                DiffClass::Different => (s, d + 1, a, b),
                DiffClass::OnlyA => (s, d, a + 1, b),
                DiffClass::OnlyB => (s, d, a, b + 1),
            })
    }
}
