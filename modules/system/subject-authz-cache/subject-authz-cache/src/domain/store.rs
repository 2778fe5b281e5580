//! Indexed store: subject key to the ordered names granted to that subject.

use std::sync::Arc;

use dashmap::DashMap;
use subject_authz_cache_sdk::SubjectKey;

/// Thread-safe subject index.
///
/// Entries are replaced wholesale by [`SubjectStore::set`]; readers clone the
/// `Arc` and so always see one complete sequence per key.
pub struct SubjectStore {
    kind: &'static str,
    entries: DashMap<SubjectKey, Arc<[String]>>,
}

impl SubjectStore {
    #[must_use]
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            entries: DashMap::new(),
        }
    }

    /// Resource kind indexed by this store, used in logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.kind
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<Arc<[String]>> {
        self.entries.get(key).map(|e| Arc::clone(e.value()))
    }

    /// Replace the entry for `key`. An empty `names` is stored as-is so that
    /// revocation is visible.
    pub fn set(&self, key: SubjectKey, names: Vec<String>) {
        tracing::trace!(
            kind = self.kind,
            subject = %key,
            names = names.len(),
            "Store entry replaced"
        );
        self.entries.insert(key, names.into());
    }

    /// Returns `true` if an entry was removed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    #[must_use]
    pub fn list_keys(&self) -> Vec<SubjectKey> {
        self.entries.iter().map(|e| e.key().clone()).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
