//! # prism-schema
//!
//! Runtime type system for Prism projects.
//!
//! This crate provides:
//! - `SchemaRegistry`: the entity-type definitions of one project, with a
//!   derived parent → children index for hierarchical drill-down
//! - Data-type validation and type-aware equivalence of attribute values
//! - `EntityDiff`: attribute-level classification between two entities
//! - JSON Schema export of an entity type's attribute set
//!
//! ## Architecture
//!
//! Model structs (`EntityTypeDef`, `Entity`, ...) live in `prism-core`. This
//! crate is pure: no IO, no async. `prism-db` persists definitions and builds a
//! registry per project with [`SchemaRegistry::new`].

pub mod diff;
pub mod error;
pub mod export;
pub mod registry;
pub mod value;

pub use diff::{AttributeDiff, EntityDiff};
pub use error::SchemaError;
pub use registry::SchemaRegistry;
