//! Database error types for prism-db.

use prism_core::errors::CoreError;
use prism_schema::SchemaError;
use thiserror::Error;

/// Errors from database operations.
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// A SQL query failed or returned malformed data.
    #[error("Query failed: {0}")]
    Query(String),

    /// Schema migration failed.
    #[error("Migration failed: {0}")]
    Migration(String),

    /// Expected a result row but none was returned.
    #[error("No result returned")]
    NoResult,

    /// A record looked up by id does not exist.
    #[error("{kind} {id} not found")]
    NotFound { kind: &'static str, id: i64 },

    /// The request conflicts with stored state (already reviewed, duplicate link, ...).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Input rejected before touching storage.
    #[error("Validation error: {0}")]
    Validation(String),

    /// Attribute or type definition rejected by the schema registry.
    #[error(transparent)]
    Schema(#[from] SchemaError),

    /// Underlying libSQL error.
    #[error("libSQL error: {0}")]
    LibSql(#[from] libsql::Error),

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl DatabaseError {
    #[must_use]
    pub const fn not_found(kind: &'static str, id: i64) -> Self {
        Self::NotFound { kind, id }
    }
}

impl From<DatabaseError> for CoreError {
    fn from(err: DatabaseError) -> Self {
        match err {
            DatabaseError::NotFound { kind, id } => Self::not_found(kind, id),
            DatabaseError::Conflict(msg) => Self::Conflict(msg),
            DatabaseError::Validation(msg) => Self::Validation(msg),
            DatabaseError::Schema(err) => err.into(),
            other @ (DatabaseError::Query(_)
            | DatabaseError::Migration(_)
            | DatabaseError::NoResult
            | DatabaseError::LibSql(_)
            | DatabaseError::Other(_)) => Self::Transport(other.to_string()),
        }
    }
}
