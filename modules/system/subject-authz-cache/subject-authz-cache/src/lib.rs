//! Subject `AuthZ` Cache Module
//!
//! Keeps a watch-driven index from subject keys (`user:<name>`,
//! `group:<name>`) to the namespaces and accounts each subject may act on.
//! Role-binding and account events enqueue the referenced subjects; a worker
//! loop recomputes them through an [`subject_authz_cache_sdk::AccessDecisionAccessor`]
//! and stores the answer. Request-time checks read the stores without
//! waiting on recomputation.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

pub mod config;
pub mod domain;
pub mod infra;
pub mod module;

pub use config::SubjectAuthzCacheConfig;
pub use domain::{AuthCache, DomainError, SubjectAccessLocalClient};
pub use module::SubjectAuthzCacheModule;
