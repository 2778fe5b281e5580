//! Subject `AuthZ` cache module lifecycle.

use std::sync::Arc;

use subject_authz_cache_sdk::{AccessDecisionAccessor, SubjectAccessClient, WatchSource};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::config::SubjectAuthzCacheConfig;
use crate::domain::{AuthCache, SubjectAccessLocalClient};

/// Running instance of the cache.
///
/// [`SubjectAuthzCacheModule::start`] wires the cache to its collaborators
/// and spawns the worker loop; [`SubjectAuthzCacheModule::stop`] cancels it
/// and waits for in-flight recomputes to finish.
pub struct SubjectAuthzCacheModule {
    cache: Arc<AuthCache>,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl SubjectAuthzCacheModule {
    pub const MODULE_NAME: &'static str = "subject-authz-cache";

    /// Validate `config`, build the cache and spawn its run loop on the
    /// current tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if `config` is invalid or no tokio runtime is running.
    #[tracing::instrument(skip_all, fields(workers = config.workers))]
    pub fn start(
        accessor: Arc<dyn AccessDecisionAccessor>,
        watch: &dyn WatchSource,
        config: SubjectAuthzCacheConfig,
    ) -> anyhow::Result<Self> {
        config.validate()?;
        let runtime = tokio::runtime::Handle::try_current().map_err(|e| {
            anyhow::anyhow!("{} must be started inside a tokio runtime: {e}", Self::MODULE_NAME)
        })?;
        info!(
            recompute_verb = %config.recompute_verb,
            resync_interval = ?config.resync_interval,
            "Initializing {} module",
            Self::MODULE_NAME
        );

        let cache = AuthCache::new(accessor, watch, config);
        let cancel = CancellationToken::new();
        let task = runtime.spawn(Arc::clone(&cache).run(cancel.clone()));

        info!("{} module initialized successfully", Self::MODULE_NAME);
        Ok(Self {
            cache,
            cancel,
            task,
        })
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<AuthCache> {
        &self.cache
    }

    /// Read API handle for authorization check call sites.
    #[must_use]
    pub fn client(&self) -> Arc<dyn SubjectAccessClient> {
        Arc::new(SubjectAccessLocalClient::new(Arc::clone(&self.cache)))
    }

    /// Signal the run loop to stop and wait for it.
    ///
    /// # Errors
    ///
    /// Returns an error if the run loop panicked.
    pub async fn stop(self) -> anyhow::Result<()> {
        self.cancel.cancel();
        self.task
            .await
            .map_err(|e| anyhow::anyhow!("{} run loop failed: {e}", Self::MODULE_NAME))
    }
}
