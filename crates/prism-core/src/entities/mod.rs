//! Model structs for all Prism domain objects.
//!
//! Each record maps to a table in the libSQL database (see `prism-db`
//! migrations). All structs derive `Serialize`, `Deserialize`, and `JsonSchema`
//! for JSON roundtrip and schema validation.

mod audit;
mod entity;
mod extraction;
mod insight;
mod job;
mod link;
mod project;
mod schema;

pub use audit::AuditEntry;
pub use entity::{AttributeValue, Entity, Evidence, NewEntity};
pub use extraction::{ExtractionResult, NewExtractionResult, ReviewDecision};
pub use insight::{CrossProjectInsight, NewInsight};
pub use job::Job;
pub use link::{CrossProjectLink, LinkStats, ManualLink};
pub use project::Project;
pub use schema::{AttributeDef, EntityTypeDef};
