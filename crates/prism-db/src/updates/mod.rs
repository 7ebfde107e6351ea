//! Update builder types for mutations.
//!
//! Each builder produces an update struct with `Option`/collection fields.
//! Only set fields generate SQL. The update is also serialized as the audit
//! `detail` payload (changed fields only).

pub mod entity;
