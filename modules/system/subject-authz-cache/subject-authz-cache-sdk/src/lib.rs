#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
//! Subject `AuthZ` Cache SDK
//!
//! This crate provides the public contracts for the `subject_authz_cache` module:
//!
//! - [`SubjectAccessClient`] - Read API consumed by authorization check call sites
//! - [`AccessDecisionAccessor`] - Ground-truth decision source the cache recomputes from
//! - [`ObjectClient`] - Object lookups used by the retrieval helpers
//! - [`WatchSource`], [`ResourceEventHandler`] - Watch subscription contracts
//! - [`SubjectKey`], [`Verb`], [`UserPrincipal`] and the watched resource models
//! - [`SubjectAccessError`], [`AccessorError`], [`ObjectClientError`] - Error types
//!
//! ## Usage
//!
//! ```ignore
//! use subject_authz_cache_sdk::{SubjectAccessClient, UserPrincipal};
//!
//! let principal = UserPrincipal::builder()
//!     .name("foo")
//!     .groups(vec!["bar".to_owned()])
//!     .build();
//!
//! // `cache` is an `Arc<dyn SubjectAccessClient>` handed out by the module
//! let namespaces = cache.get_namespaces_for_user(&principal, "list")?;
//! ```

pub mod api;
pub mod error;
pub mod models;
pub mod watch;

// Re-export main types at crate root
pub use api::{AccessDecisionAccessor, ObjectClient, SubjectAccessClient};
pub use error::{AccessorError, ObjectClientError, SubjectAccessError};
pub use models::{
    Account, NamedObject, Namespace, RoleBinding, RoleRef, Subject, SubjectKey, SubjectKind,
    UserPrincipal, UserPrincipalBuilder, Verb, WILDCARD,
};
pub use watch::{ResourceEventHandler, WatchSource};
