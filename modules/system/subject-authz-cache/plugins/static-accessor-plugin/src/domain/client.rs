//! Accessor implementation for the static accessor plugin.

use async_trait::async_trait;
use subject_authz_cache_sdk::{AccessDecisionAccessor, AccessorError, SubjectKey};

use super::service::Service;

#[async_trait]
impl AccessDecisionAccessor for Service {
    async fn retrieve_allowed_namespaces(
        &self,
        subject: &SubjectKey,
        _verb: &str,
    ) -> Result<Vec<String>, AccessorError> {
        Ok(self.namespaces_for(subject))
    }

    async fn retrieve_allowed_accounts(
        &self,
        subject: &SubjectKey,
        _verb: &str,
    ) -> Result<Vec<String>, AccessorError> {
        Ok(self.accounts_for(subject))
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn accessor_trait_ignores_verb() {
        let service = Service::new();
        service.set_namespaces(SubjectKey::user("foo"), vec!["test".to_owned()]);
        let accessor: &dyn AccessDecisionAccessor = &service;

        for verb in ["get", "delete", "*"] {
            let namespaces = accessor
                .retrieve_allowed_namespaces(&SubjectKey::user("foo"), verb)
                .await
                .unwrap();
            assert_eq!(namespaces, vec!["test"]);
        }
        assert!(accessor
            .retrieve_allowed_accounts(&SubjectKey::user("foo"), "get")
            .await
            .unwrap()
            .is_empty());
    }
}
