//! The subject authorization cache.

use std::collections::HashSet;
use std::sync::Arc;

use subject_authz_cache_sdk::{
    AccessDecisionAccessor, SubjectKey, UserPrincipal, Verb, WatchSource,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use super::error::DomainError;
use super::queue::{Backoff, RecomputeQueue};
use super::store::SubjectStore;
use super::translator::SubjectEventTranslator;
use super::worker;
use crate::config::SubjectAuthzCacheConfig;

/// Watch-driven index from subject keys to permitted namespaces and accounts.
///
/// Watch callbacks only enqueue subject keys; the worker loop started by
/// [`AuthCache::run`] is the sole writer of both stores. Reads never wait
/// for pending recomputation.
///
/// The stores are not partitioned by verb: one recompute, made with
/// `recompute_verb`, answers for every recognized verb.
pub struct AuthCache {
    accessor: Arc<dyn AccessDecisionAccessor>,
    namespaces: SubjectStore,
    accounts: SubjectStore,
    queue: Arc<RecomputeQueue>,
    config: SubjectAuthzCacheConfig,
}

impl AuthCache {
    /// Create the cache and register its handlers on `watch`.
    #[must_use]
    pub fn new(
        accessor: Arc<dyn AccessDecisionAccessor>,
        watch: &dyn WatchSource,
        config: SubjectAuthzCacheConfig,
    ) -> Arc<Self> {
        let queue = Arc::new(RecomputeQueue::new(Backoff::new(
            config.backoff_base,
            config.backoff_max,
        )));

        let translator = Arc::new(SubjectEventTranslator::new(Arc::clone(&queue)));
        watch.watch_role_bindings(translator.clone());
        watch.watch_accounts(translator);

        Arc::new(Self {
            accessor,
            namespaces: SubjectStore::new("Namespace"),
            accounts: SubjectStore::new("Account"),
            queue,
            config,
        })
    }

    /// Namespaces the principal may use `verb` on.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVerb` if `verb` is not recognized; the stores are not read
    pub fn get_namespaces_for_user(
        &self,
        principal: &UserPrincipal,
        verb: &str,
    ) -> Result<Vec<String>, DomainError> {
        verb.parse::<Verb>()?;
        Ok(union_for(&self.namespaces, principal))
    }

    /// Accounts the principal may use `verb` on.
    ///
    /// # Errors
    ///
    /// - `UnsupportedVerb` if `verb` is not recognized; the stores are not read
    pub fn get_accounts_for_user(
        &self,
        principal: &UserPrincipal,
        verb: &str,
    ) -> Result<Vec<String>, DomainError> {
        verb.parse::<Verb>()?;
        Ok(union_for(&self.accounts, principal))
    }

    /// Enqueue `key` for recomputation.
    pub fn enqueue(&self, key: SubjectKey) {
        self.queue.add(key);
    }

    /// Recompute both entries for `key`.
    ///
    /// The stores are only written when both accessor calls succeed, so a
    /// failed attempt leaves the previous answer in place.
    ///
    /// # Errors
    ///
    /// - `AccessorFailure` if either accessor call fails
    pub async fn recompute(&self, key: &SubjectKey) -> Result<(), DomainError> {
        let verb = self.config.recompute_verb.as_str();
        let namespaces = self
            .accessor
            .retrieve_allowed_namespaces(key, verb)
            .await
            .map_err(|e| DomainError::accessor_failure(key.as_str(), &e))?;
        let accounts = self
            .accessor
            .retrieve_allowed_accounts(key, verb)
            .await
            .map_err(|e| DomainError::accessor_failure(key.as_str(), &e))?;

        debug!(
            subject = %key,
            namespaces = namespaces.len(),
            accounts = accounts.len(),
            "Recomputed subject"
        );
        self.namespaces.set(key.clone(), namespaces);
        self.accounts.set(key.clone(), accounts);
        Ok(())
    }

    /// Re-enqueue every subject currently present in either store.
    pub fn resync(&self) -> usize {
        let mut keys: HashSet<SubjectKey> = self.namespaces.list_keys().into_iter().collect();
        keys.extend(self.accounts.list_keys());
        let count = keys.len();
        for key in keys {
            self.queue.add(key);
        }
        count
    }

    /// Drive the worker pool until `cancel` fires.
    ///
    /// Items being processed when `cancel` fires are finished first.
    #[tracing::instrument(skip_all, fields(workers = self.config.workers))]
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        info!("Starting subject authz cache");

        let mut tasks: Vec<_> = (0..self.config.workers.max(1))
            .map(|id| tokio::spawn(worker::run_worker(Arc::clone(&self), id, cancel.clone())))
            .collect();
        if let Some(interval) = self.config.resync_interval {
            tasks.push(tokio::spawn(worker::run_resync(
                Arc::clone(&self),
                interval,
                cancel.clone(),
            )));
        }

        cancel.cancelled().await;
        self.queue.shut_down();

        for res in futures::future::join_all(tasks).await {
            if let Err(e) = res {
                tracing::error!(error = %e, "Cache task terminated abnormally");
            }
        }
        info!("Subject authz cache stopped");
    }

    pub(crate) fn queue(&self) -> &Arc<RecomputeQueue> {
        &self.queue
    }

    #[must_use]
    pub fn namespace_store(&self) -> &SubjectStore {
        &self.namespaces
    }

    #[must_use]
    pub fn account_store(&self) -> &SubjectStore {
        &self.accounts
    }

    #[must_use]
    pub fn config(&self) -> &SubjectAuthzCacheConfig {
        &self.config
    }

    /// Number of keys waiting for recomputation.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.queue.len()
    }
}

/// Union of the entries for every subject key of `principal`, first-seen order.
fn union_for(store: &SubjectStore, principal: &UserPrincipal) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut out = Vec::new();
    for key in principal.subject_keys() {
        let Some(names) = store.get(key.as_str()) else {
            continue;
        };
        for name in names.iter() {
            if seen.insert(name.clone()) {
                out.push(name.clone());
            }
        }
    }
    out
}
