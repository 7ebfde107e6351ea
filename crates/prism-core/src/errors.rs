//! Cross-cutting error taxonomy for Prism.
//!
//! `CoreError` is the error type spoken at the backend seam: every backend call
//! made by the engines resolves to one of these variants. Storage-specific
//! errors (`DatabaseError`, `SchemaError`) are defined in their own crates and
//! mapped into `CoreError` where they cross that seam.

use std::fmt;

use thiserror::Error;

/// Errors that can be raised by any Prism crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Input failed validation before (or instead of) reaching the backend.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The request conflicts with the current state of the record, including
    /// a review transition on a result that is no longer pending.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Record lookup returned no result.
    #[error("Not found: {entity_type} {id}")]
    NotFound { entity_type: String, id: String },

    /// The backend could not be reached or failed while serving the request.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A polled backend job did not finish within the attempt cap.
    #[error("Timed out waiting for {job} after {attempts} attempts")]
    Timeout { job: String, attempts: u32 },

    /// Catch-all for unexpected errors.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse error class used to decide how an error is surfaced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Conflict,
    NotFound,
    Transport,
}

impl ErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Conflict => "conflict",
            Self::NotFound => "not_found",
            Self::Transport => "transport",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl CoreError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity_type: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    /// Classify the error into the four surfaced kinds.
    ///
    /// Timeouts and unexpected errors count as transport failures.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::NotFound { .. } => ErrorKind::NotFound,
            Self::Transport(_) | Self::Timeout { .. } | Self::Other(_) => ErrorKind::Transport,
        }
    }

    #[must_use]
    pub const fn is_transport(&self) -> bool {
        matches!(self.kind(), ErrorKind::Transport)
    }
}
