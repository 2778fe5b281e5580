//! Local (in-process) client for the subject `AuthZ` cache.

use std::sync::Arc;

use subject_authz_cache_sdk::{SubjectAccessClient, SubjectAccessError, UserPrincipal};

use super::{AuthCache, DomainError};

/// Local client wrapping the cache.
pub struct SubjectAccessLocalClient {
    cache: Arc<AuthCache>,
}

impl SubjectAccessLocalClient {
    #[must_use]
    pub fn new(cache: Arc<AuthCache>) -> Self {
        Self { cache }
    }
}

fn log_and_convert(op: &str, e: DomainError) -> SubjectAccessError {
    tracing::debug!(operation = op, error = %e, "subject_authz_cache call rejected");
    e.into()
}

impl SubjectAccessClient for SubjectAccessLocalClient {
    fn get_namespaces_for_user(
        &self,
        principal: &UserPrincipal,
        verb: &str,
    ) -> Result<Vec<String>, SubjectAccessError> {
        self.cache
            .get_namespaces_for_user(principal, verb)
            .map_err(|e| log_and_convert("get_namespaces_for_user", e))
    }

    fn get_accounts_for_user(
        &self,
        principal: &UserPrincipal,
        verb: &str,
    ) -> Result<Vec<String>, SubjectAccessError> {
        self.cache
            .get_accounts_for_user(principal, verb)
            .map_err(|e| log_and_convert("get_accounts_for_user", e))
    }
}
