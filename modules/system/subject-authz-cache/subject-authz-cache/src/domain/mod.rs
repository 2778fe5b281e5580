//! Domain layer for the subject `AuthZ` cache.

pub mod error;
pub mod local_client;
pub mod queue;
pub mod retrieval;
pub mod service;
pub mod store;
pub mod translator;
mod worker;

pub use error::DomainError;
pub use local_client::SubjectAccessLocalClient;
pub use queue::{Backoff, RecomputeQueue};
pub use retrieval::{resolve_accounts, resolve_namespaces, resolve_objects};
pub use service::AuthCache;
pub use store::SubjectStore;
pub use translator::SubjectEventTranslator;
