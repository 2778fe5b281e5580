//! Public API traits for the subject `AuthZ` cache.

use async_trait::async_trait;

use crate::error::{AccessorError, ObjectClientError, SubjectAccessError};
use crate::models::{NamedObject, SubjectKey, UserPrincipal};

/// Read API served from the cache.
///
/// Both calls are synchronous and never wait for pending recomputation:
/// they answer from whatever was last successfully stored.
///
/// ```ignore
/// let namespaces = cache.get_namespaces_for_user(&principal, "get")?;
/// ```
pub trait SubjectAccessClient: Send + Sync {
    /// Names of the namespaces the principal may act on.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVerb` if `verb` is not a recognized verb
    fn get_namespaces_for_user(
        &self,
        principal: &UserPrincipal,
        verb: &str,
    ) -> Result<Vec<String>, SubjectAccessError>;

    /// Names of the accounts the principal may act on.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVerb` if `verb` is not a recognized verb
    fn get_accounts_for_user(
        &self,
        principal: &UserPrincipal,
        verb: &str,
    ) -> Result<Vec<String>, SubjectAccessError>;
}

/// Ground-truth authorization decisions, queried by the cache on recompute.
///
/// Implementations do no caching of their own. The cache never calls
/// them concurrently for the same subject key.
#[async_trait]
pub trait AccessDecisionAccessor: Send + Sync {
    /// Namespaces `subject` may use `verb` on, in the accessor's order.
    ///
    /// # Errors
    ///
    /// Any error is treated as transient and retried with backoff.
    async fn retrieve_allowed_namespaces(
        &self,
        subject: &SubjectKey,
        verb: &str,
    ) -> Result<Vec<String>, AccessorError>;

    /// Accounts `subject` may use `verb` on, in the accessor's order.
    ///
    /// # Errors
    ///
    /// Any error is treated as transient and retried with backoff.
    async fn retrieve_allowed_accounts(
        &self,
        subject: &SubjectKey,
        verb: &str,
    ) -> Result<Vec<String>, AccessorError>;
}

/// Name-addressed access to live objects of one kind.
#[async_trait]
pub trait ObjectClient<T: NamedObject>: Send + Sync {
    /// # Errors
    ///
    /// - `NotFound` if no object has this name
    /// - `Backend` for any other failure
    async fn get(&self, name: &str) -> Result<T, ObjectClientError>;

    /// # Errors
    ///
    /// - `Backend` if the objects cannot be listed
    async fn list(&self) -> Result<Vec<T>, ObjectClientError>;
}
