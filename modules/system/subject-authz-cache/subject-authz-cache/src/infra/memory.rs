//! In-process object client and watch source.
//!
//! Used to embed the cache without a cluster API behind it, and by tests.

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use subject_authz_cache_sdk::{
    Account, NamedObject, ObjectClient, ObjectClientError, ResourceEventHandler, RoleBinding,
    WatchSource,
};

/// Object client over an in-memory list kept in insertion order.
pub struct InMemoryObjectClient<T> {
    objects: RwLock<Vec<T>>,
    failure: Mutex<Option<String>>,
}

impl<T: NamedObject> Default for InMemoryObjectClient<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: NamedObject> InMemoryObjectClient<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            objects: RwLock::new(Vec::new()),
            failure: Mutex::new(None),
        }
    }

    #[must_use]
    pub fn with_objects(objects: impl IntoIterator<Item = T>) -> Self {
        let client = Self::new();
        for obj in objects {
            client.insert(obj);
        }
        client
    }

    /// Insert `obj`, replacing any object with the same name in place.
    pub fn insert(&self, obj: T) {
        let mut objects = self.objects.write();
        if let Some(existing) = objects.iter_mut().find(|o| o.name() == obj.name()) {
            *existing = obj;
        } else {
            objects.push(obj);
        }
    }

    pub fn remove(&self, name: &str) -> Option<T> {
        let mut objects = self.objects.write();
        let idx = objects.iter().position(|o| o.name() == name)?;
        Some(objects.remove(idx))
    }

    /// Make every subsequent call fail with a backend error.
    pub fn fail_with(&self, reason: &str) {
        *self.failure.lock() = Some(reason.to_owned());
    }

    pub fn clear_failure(&self) {
        *self.failure.lock() = None;
    }

    fn check_failure(&self) -> Result<(), ObjectClientError> {
        match self.failure.lock().as_ref() {
            Some(reason) => Err(ObjectClientError::Backend(reason.clone())),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl<T: NamedObject> ObjectClient<T> for InMemoryObjectClient<T> {
    async fn get(&self, name: &str) -> Result<T, ObjectClientError> {
        self.check_failure()?;
        self.objects
            .read()
            .iter()
            .find(|o| o.name() == name)
            .cloned()
            .ok_or_else(|| ObjectClientError::NotFound {
                kind: T::KIND,
                name: name.to_owned(),
            })
    }

    async fn list(&self) -> Result<Vec<T>, ObjectClientError> {
        self.check_failure()?;
        Ok(self.objects.read().clone())
    }
}

type Handlers<T> = RwLock<Vec<Arc<dyn ResourceEventHandler<T>>>>;

/// Watch source whose events are fired by hand and delivered synchronously
/// to every registered handler.
#[derive(Default)]
pub struct InMemoryWatchSource {
    role_bindings: Handlers<RoleBinding>,
    accounts: Handlers<Account>,
}

impl InMemoryWatchSource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_role_binding(&self, obj: &RoleBinding) {
        for h in snapshot(&self.role_bindings) {
            h.on_add(obj);
        }
    }

    pub fn update_role_binding(&self, old: &RoleBinding, new: &RoleBinding) {
        for h in snapshot(&self.role_bindings) {
            h.on_update(old, new);
        }
    }

    pub fn delete_role_binding(&self, obj: &RoleBinding) {
        for h in snapshot(&self.role_bindings) {
            h.on_delete(obj);
        }
    }

    pub fn add_account(&self, obj: &Account) {
        for h in snapshot(&self.accounts) {
            h.on_add(obj);
        }
    }

    pub fn update_account(&self, old: &Account, new: &Account) {
        for h in snapshot(&self.accounts) {
            h.on_update(old, new);
        }
    }

    pub fn delete_account(&self, obj: &Account) {
        for h in snapshot(&self.accounts) {
            h.on_delete(obj);
        }
    }
}

// Handlers run outside the lock so they may register further handlers.
fn snapshot<T>(handlers: &Handlers<T>) -> Vec<Arc<dyn ResourceEventHandler<T>>> {
    handlers.read().clone()
}

impl WatchSource for InMemoryWatchSource {
    fn watch_role_bindings(&self, handler: Arc<dyn ResourceEventHandler<RoleBinding>>) {
        self.role_bindings.write().push(handler);
    }

    fn watch_accounts(&self, handler: Arc<dyn ResourceEventHandler<Account>>) {
        self.accounts.write().push(handler);
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use subject_authz_cache_sdk::Namespace;

    use super::*;

    #[tokio::test]
    async fn object_client_get_and_not_found() {
        let client = InMemoryObjectClient::with_objects([Namespace::new("a")]);

        assert_eq!(client.get("a").await.unwrap().name, "a");
        let err = client.get("b").await.unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Namespace 'b' not found");
    }

    #[tokio::test]
    async fn object_client_insert_replaces_and_remove() {
        let client =
            InMemoryObjectClient::with_objects([Namespace::new("b"), Namespace::new("a")]);
        client.insert(Namespace {
            account: Some("acc".to_owned()),
            ..Namespace::new("b")
        });

        let listed = client.list().await.unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].account.as_deref(), Some("acc"));

        assert!(client.remove("b").is_some());
        assert!(client.remove("b").is_none());
    }

    #[tokio::test]
    async fn object_client_failure_injection() {
        let client = InMemoryObjectClient::with_objects([Account::new("a")]);
        client.fail_with("boom");
        assert_eq!(
            client.list().await.unwrap_err(),
            ObjectClientError::Backend("boom".to_owned())
        );
        client.clear_failure();
        assert!(client.get("a").await.is_ok());
    }

    #[derive(Default)]
    struct Counting {
        adds: AtomicUsize,
        updates: AtomicUsize,
        deletes: AtomicUsize,
    }

    impl ResourceEventHandler<Account> for Counting {
        fn on_add(&self, _obj: &Account) {
            self.adds.fetch_add(1, Ordering::SeqCst);
        }

        fn on_update(&self, _old: &Account, _new: &Account) {
            self.updates.fetch_add(1, Ordering::SeqCst);
        }

        fn on_delete(&self, _obj: &Account) {
            self.deletes.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn watch_source_fans_out_to_all_handlers() {
        let source = InMemoryWatchSource::new();
        let first = Arc::new(Counting::default());
        let second = Arc::new(Counting::default());
        source.watch_accounts(first.clone());
        source.watch_accounts(second.clone());

        let acc = Account::new("a");
        source.add_account(&acc);
        source.update_account(&acc, &acc);
        source.delete_account(&acc);
        // no role binding handlers registered
        source.add_role_binding(&RoleBinding::default());

        for h in [&first, &second] {
            assert_eq!(h.adds.load(Ordering::SeqCst), 1);
            assert_eq!(h.updates.load(Ordering::SeqCst), 1);
            assert_eq!(h.deletes.load(Ordering::SeqCst), 1);
        }
    }
}
