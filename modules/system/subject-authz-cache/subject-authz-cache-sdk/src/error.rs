//! Error types for the subject `AuthZ` cache module.

use thiserror::Error;

/// Errors returned by the read API ([`crate::SubjectAccessClient`]).
///
/// Recompute failures never show up here: readers observe the last
/// successfully stored answer instead.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SubjectAccessError {
    /// The verb is not one of the recognized verbs.
    #[error("unsupported verb '{verb}'")]
    UnsupportedVerb { verb: String },

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by an [`crate::AccessDecisionAccessor`].
///
/// The cache treats every variant as transient and retries with backoff.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AccessorError {
    /// The decision source cannot answer right now.
    #[error("accessor unavailable: {0}")]
    Unavailable(String),

    /// An internal error occurred.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Errors returned by an [`crate::ObjectClient`].
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ObjectClientError {
    /// The requested object does not exist.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// The backend failed to serve the request.
    #[error("backend error: {0}")]
    Backend(String),
}

impl ObjectClientError {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }
}
