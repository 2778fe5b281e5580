//! Domain errors for the subject `AuthZ` cache.

use subject_authz_cache_sdk::{AccessorError, ObjectClientError, SubjectAccessError};

/// Internal domain errors.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("unsupported verb '{verb}'")]
    UnsupportedVerb { verb: String },

    #[error("recompute for '{subject}' failed: {reason}")]
    AccessorFailure { subject: String, reason: String },

    #[error("failed to fetch {kind}: {reason}")]
    BackendFailure { kind: &'static str, reason: String },

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn accessor_failure(subject: impl Into<String>, err: &AccessorError) -> Self {
        Self::AccessorFailure {
            subject: subject.into(),
            reason: err.to_string(),
        }
    }

    pub fn backend_failure(kind: &'static str, err: &ObjectClientError) -> Self {
        Self::BackendFailure {
            kind,
            reason: err.to_string(),
        }
    }
}

impl From<SubjectAccessError> for DomainError {
    fn from(e: SubjectAccessError) -> Self {
        match e {
            SubjectAccessError::UnsupportedVerb { verb } => Self::UnsupportedVerb { verb },
            SubjectAccessError::Internal(msg) => Self::Internal(msg),
        }
    }
}

impl From<DomainError> for SubjectAccessError {
    fn from(e: DomainError) -> Self {
        match e {
            DomainError::UnsupportedVerb { verb } => Self::UnsupportedVerb { verb },
            DomainError::AccessorFailure { .. } | DomainError::BackendFailure { .. } => {
                Self::Internal(e.to_string())
            }
            DomainError::Internal(msg) => Self::Internal(msg),
        }
    }
}
