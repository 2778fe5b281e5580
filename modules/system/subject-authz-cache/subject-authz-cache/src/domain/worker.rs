//! Consumption loops draining the recompute queue.

use std::sync::Arc;
use std::time::Duration;

use subject_authz_cache_sdk::SubjectKey;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::service::AuthCache;

/// Process one key at a time until `cancel` fires or the queue shuts down.
pub(crate) async fn run_worker(cache: Arc<AuthCache>, id: usize, cancel: CancellationToken) {
    info!(worker = id, "Recompute worker started");
    loop {
        let next = tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            key = cache.queue().get() => key,
        };
        let Some(key) = next else {
            break;
        };
        process(&cache, &key).await;
    }
    info!(worker = id, "Recompute worker stopped");
}

async fn process(cache: &AuthCache, key: &SubjectKey) {
    let queue = cache.queue();
    match cache.recompute(key).await {
        Ok(()) => queue.forget(key),
        Err(e) => {
            let retry_in = queue.add_rate_limited(key.clone());
            warn!(
                subject = %key,
                attempt = queue.num_requeues(key),
                retry_in = ?retry_in,
                error = %e,
                "Recompute failed, will retry"
            );
        }
    }
    queue.done(key);
}

/// Periodically re-enqueue every subject known to the stores.
pub(crate) async fn run_resync(cache: Arc<AuthCache>, every: Duration, cancel: CancellationToken) {
    let mut ticker = tokio::time::interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // first tick completes immediately
    ticker.tick().await;
    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {
                let subjects = cache.resync();
                debug!(subjects, "Resync enqueued known subjects");
            }
        }
    }
}
