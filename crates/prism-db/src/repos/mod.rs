//! Repository modules implementing the storage operations.
//!
//! Each module adds methods to `PrismService` via `impl PrismService` blocks.

pub mod audit;
pub mod diff;
pub mod entity;
pub mod evidence;
pub mod extraction;
pub mod insight;
pub mod job;
pub mod link;
pub mod overlap;
pub mod project;
pub mod schema;
pub mod sync;
