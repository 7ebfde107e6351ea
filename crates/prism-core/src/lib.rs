//! # prism-core
//!
//! Core types and error taxonomy for the Prism research workbench.
//!
//! This crate provides the foundational types shared across all Prism crates:
//! - Model structs for schema definitions, entities, extraction results,
//!   cross-project links, insights, evidence, and audit entries
//! - Status enums with state machine transitions
//! - Confidence bucketing for review filters
//! - The cross-cutting `CoreError` taxonomy used at the backend seam
//! - Audit detail sub-types and bulk/sync response types

pub mod audit_detail;
pub mod entities;
pub mod enums;
pub mod errors;
pub mod responses;
