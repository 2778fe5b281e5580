//! Service implementation for the static accessor plugin.

use std::collections::HashMap;

use parking_lot::RwLock;
use subject_authz_cache_sdk::SubjectKey;

use crate::config::StaticAccessorPluginConfig;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct Grant {
    namespaces: Vec<String>,
    accounts: Vec<String>,
}

/// Static accessor service.
///
/// Answers from the grant table regardless of verb. The table can be
/// replaced per subject at runtime, which is what watch-driven tests use to
/// simulate permission changes.
#[derive(Default)]
pub struct Service {
    grants: RwLock<HashMap<SubjectKey, Grant>>,
}

impl Service {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the grant table. Repeated subjects are merged in config order.
    ///
    /// # Errors
    ///
    /// Returns an error if a subject is not a `user:`/`group:` key.
    pub fn from_config(cfg: &StaticAccessorPluginConfig) -> anyhow::Result<Self> {
        let mut grants: HashMap<SubjectKey, Grant> = HashMap::new();
        for g in &cfg.grants {
            let key = SubjectKey::parse(&g.subject).ok_or_else(|| {
                anyhow::anyhow!(
                    "invalid subject '{}': expected 'user:<name>' or 'group:<name>'",
                    g.subject
                )
            })?;
            let entry = grants.entry(key).or_default();
            extend_unique(&mut entry.namespaces, &g.namespaces);
            extend_unique(&mut entry.accounts, &g.accounts);
        }
        tracing::debug!(subjects = grants.len(), "Loaded static grants");
        Ok(Self {
            grants: RwLock::new(grants),
        })
    }

    #[must_use]
    pub fn namespaces_for(&self, subject: &SubjectKey) -> Vec<String> {
        self.grants
            .read()
            .get(subject)
            .map(|g| g.namespaces.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn accounts_for(&self, subject: &SubjectKey) -> Vec<String> {
        self.grants
            .read()
            .get(subject)
            .map(|g| g.accounts.clone())
            .unwrap_or_default()
    }

    /// Replace the namespaces granted to `subject`.
    pub fn set_namespaces(&self, subject: SubjectKey, namespaces: Vec<String>) {
        self.grants.write().entry(subject).or_default().namespaces = namespaces;
    }

    /// Replace the accounts granted to `subject`.
    pub fn set_accounts(&self, subject: SubjectKey, accounts: Vec<String>) {
        self.grants.write().entry(subject).or_default().accounts = accounts;
    }

    /// Drop every grant of `subject`.
    pub fn revoke(&self, subject: &SubjectKey) {
        self.grants.write().remove(subject);
    }
}

fn extend_unique(into: &mut Vec<String>, names: &[String]) {
    for name in names {
        if !into.contains(name) {
            into.push(name.clone());
        }
    }
}
