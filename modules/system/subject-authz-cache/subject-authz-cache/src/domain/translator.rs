//! Watch callbacks that turn changed bindings and accounts into recompute work.

use std::sync::Arc;

use subject_authz_cache_sdk::{Account, ResourceEventHandler, RoleBinding, Subject, SubjectKey};

use super::queue::RecomputeQueue;

/// Subject keys referenced by `subjects`, skipping unrecognized kinds.
pub fn subject_keys(subjects: &[Subject]) -> impl Iterator<Item = SubjectKey> + '_ {
    subjects.iter().filter_map(SubjectKey::from_subject)
}

/// Enqueues every subject referenced by a changed object.
///
/// Deletions enqueue the same keys as additions; the recompute picks up the
/// accessor's current answer. Updates enqueue subjects of both versions so
/// that removed subjects lose their grants.
pub struct SubjectEventTranslator {
    queue: Arc<RecomputeQueue>,
}

impl SubjectEventTranslator {
    #[must_use]
    pub fn new(queue: Arc<RecomputeQueue>) -> Self {
        Self { queue }
    }

    fn enqueue(&self, kind: &'static str, name: &str, subjects: &[Subject]) {
        for key in subject_keys(subjects) {
            tracing::trace!(kind, object = name, subject = %key, "Enqueue subject");
            self.queue.add(key);
        }
    }
}

impl ResourceEventHandler<RoleBinding> for SubjectEventTranslator {
    fn on_add(&self, obj: &RoleBinding) {
        self.enqueue("RoleBinding", &obj.name, &obj.subjects);
    }

    fn on_update(&self, old: &RoleBinding, new: &RoleBinding) {
        self.enqueue("RoleBinding", &old.name, &old.subjects);
        self.enqueue("RoleBinding", &new.name, &new.subjects);
    }

    fn on_delete(&self, obj: &RoleBinding) {
        self.enqueue("RoleBinding", &obj.name, &obj.subjects);
    }
}

impl ResourceEventHandler<Account> for SubjectEventTranslator {
    fn on_add(&self, obj: &Account) {
        self.enqueue("Account", &obj.name, &obj.subjects);
    }

    fn on_update(&self, old: &Account, new: &Account) {
        self.enqueue("Account", &old.name, &old.subjects);
        self.enqueue("Account", &new.name, &new.subjects);
    }

    fn on_delete(&self, obj: &Account) {
        self.enqueue("Account", &obj.name, &obj.subjects);
    }
}
