//! Watch subscription contracts.

use std::sync::Arc;

use crate::models::{Account, RoleBinding};

/// Receives add/update/delete notifications for one resource kind.
///
/// Callbacks run on whatever thread the watch source delivers them on and
/// must not block.
pub trait ResourceEventHandler<T>: Send + Sync {
    fn on_add(&self, obj: &T);
    fn on_update(&self, old: &T, new: &T);
    fn on_delete(&self, obj: &T);
}

/// Source of watch events with at-least-once delivery.
pub trait WatchSource: Send + Sync {
    /// Subscribe to namespaced and cluster-scoped role bindings.
    fn watch_role_bindings(&self, handler: Arc<dyn ResourceEventHandler<RoleBinding>>);

    /// Subscribe to accounts.
    fn watch_accounts(&self, handler: Arc<dyn ResourceEventHandler<Account>>);
}
