//! Deduplicating recompute queue with per-key exponential backoff.
//!
//! A key is in at most one of two places: pending (queued, waiting for a
//! worker) or processing (handed to a worker). The `dirty` set marks keys
//! that need another pass. An `add` for a key that is currently processing
//! only marks it dirty; [`RecomputeQueue::done`] re-queues it afterwards, so
//! a key is never processed by two workers at once.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use subject_authz_cache_sdk::SubjectKey;
use tokio::sync::Notify;
use tokio_util::sync::CancellationToken;

/// Exponential backoff: `base * 2^failures`, capped at `max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base: Duration,
    max: Duration,
}

impl Backoff {
    #[must_use]
    pub fn new(base: Duration, max: Duration) -> Self {
        Self { base, max }
    }

    /// Delay before the retry that follows `failures` earlier failures.
    #[must_use]
    pub fn delay(&self, failures: u32) -> Duration {
        1u32.checked_shl(failures)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |d| d.min(self.max))
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<SubjectKey>,
    dirty: HashSet<SubjectKey>,
    processing: HashSet<SubjectKey>,
    failures: HashMap<SubjectKey, u32>,
    shutting_down: bool,
}

/// Work queue of subject keys awaiting recomputation.
pub struct RecomputeQueue {
    state: Mutex<QueueState>,
    notify: Notify,
    backoff: Backoff,
    shutdown: CancellationToken,
}

impl RecomputeQueue {
    #[must_use]
    pub fn new(backoff: Backoff) -> Self {
        Self {
            state: Mutex::new(QueueState::default()),
            notify: Notify::new(),
            backoff,
            shutdown: CancellationToken::new(),
        }
    }

    /// Enqueue `key`. Never blocks on recomputation.
    ///
    /// Repeated adds before the key is picked up collapse into one pending
    /// item. Adds during processing are held until [`Self::done`].
    pub fn add(&self, key: SubjectKey) {
        {
            let mut st = self.state.lock();
            if st.shutting_down || !st.dirty.insert(key.clone()) {
                return;
            }
            if st.processing.contains(&key) {
                return;
            }
            st.pending.push_back(key);
        }
        self.notify.notify_one();
    }

    /// Wait for the next key and mark it processing.
    ///
    /// Returns `None` once the queue is shut down and nothing is pending.
    pub async fn get(&self) -> Option<SubjectKey> {
        loop {
            let notified = self.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            {
                let mut st = self.state.lock();
                if let Some(key) = st.pending.pop_front() {
                    st.dirty.remove(&key);
                    st.processing.insert(key.clone());
                    return Some(key);
                }
                if st.shutting_down {
                    return None;
                }
            }

            notified.await;
        }
    }

    /// Finish processing `key`, re-queueing it if it was added meanwhile.
    pub fn done(&self, key: &SubjectKey) {
        let requeued = {
            let mut st = self.state.lock();
            st.processing.remove(key);
            if st.dirty.contains(key) {
                st.pending.push_back(key.clone());
                true
            } else {
                false
            }
        };
        if requeued {
            self.notify.notify_one();
        }
    }

    /// Re-add `key` after its backoff delay and bump its failure count.
    ///
    /// Must be called from within a tokio runtime.
    pub fn add_rate_limited(self: &Arc<Self>, key: SubjectKey) -> Duration {
        let delay = {
            let mut st = self.state.lock();
            let failures = st.failures.entry(key.clone()).or_insert(0);
            let delay = self.backoff.delay(*failures);
            *failures = failures.saturating_add(1);
            delay
        };
        self.add_after(key, delay);
        delay
    }

    /// Re-add `key` once `delay` has elapsed, unless the queue shuts down first.
    pub fn add_after(self: &Arc<Self>, key: SubjectKey, delay: Duration) {
        if delay.is_zero() {
            self.add(key);
            return;
        }
        let queue = Arc::clone(self);
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            tokio::select! {
                () = shutdown.cancelled() => {}
                () = tokio::time::sleep(delay) => queue.add(key),
            }
        });
    }

    /// Reset the failure count for `key`.
    pub fn forget(&self, key: &SubjectKey) {
        self.state.lock().failures.remove(key);
    }

    #[must_use]
    pub fn num_requeues(&self, key: &SubjectKey) -> u32 {
        self.state.lock().failures.get(key).copied().unwrap_or(0)
    }

    /// Number of pending keys, excluding those being processed.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().pending.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Stop accepting keys, cancel delayed re-adds and wake every waiter.
    pub fn shut_down(&self) {
        self.state.lock().shutting_down = true;
        self.shutdown.cancel();
        self.notify.notify_waiters();
    }

    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.state.lock().shutting_down
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    fn queue() -> Arc<RecomputeQueue> {
        Arc::new(RecomputeQueue::new(Backoff::new(
            Duration::from_millis(5),
            Duration::from_millis(40),
        )))
    }

    #[test]
    fn backoff_doubles_and_caps() {
        let b = Backoff::new(Duration::from_millis(5), Duration::from_millis(40));
        assert_eq!(b.delay(0), Duration::from_millis(5));
        assert_eq!(b.delay(1), Duration::from_millis(10));
        assert_eq!(b.delay(2), Duration::from_millis(20));
        assert_eq!(b.delay(3), Duration::from_millis(40));
        assert_eq!(b.delay(4), Duration::from_millis(40));
        assert_eq!(b.delay(64), Duration::from_millis(40));
    }

    #[tokio::test]
    async fn duplicate_adds_collapse() {
        let q = queue();
        q.add(SubjectKey::user("foo"));
        q.add(SubjectKey::user("foo"));
        q.add(SubjectKey::group("foo"));
        assert_eq!(q.len(), 2);

        assert_eq!(q.get().await, Some(SubjectKey::user("foo")));
        assert_eq!(q.get().await, Some(SubjectKey::group("foo")));
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn adds_during_processing_coalesce_into_one_redelivery() {
        let q = queue();
        let key = SubjectKey::user("foo");
        q.add(key.clone());

        let got = q.get().await.unwrap();
        q.add(key.clone());
        q.add(key.clone());
        // held while processing
        assert_eq!(q.len(), 0);

        q.done(&got);
        assert_eq!(q.len(), 1);
        assert_eq!(q.get().await, Some(key.clone()));
        q.done(&key);
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn done_without_readd_does_not_requeue() {
        let q = queue();
        q.add(SubjectKey::user("foo"));
        let key = q.get().await.unwrap();
        q.done(&key);
        assert!(q.is_empty());
    }

    #[tokio::test]
    async fn get_wakes_on_add_from_another_task() {
        let q = queue();
        let waiter = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.get().await })
        };
        tokio::task::yield_now().await;
        q.add(SubjectKey::group("bar"));

        let got = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, Some(SubjectKey::group("bar")));
    }

    #[tokio::test]
    async fn shut_down_releases_waiters_and_ignores_adds() {
        let q = queue();
        let waiter = {
            let q = Arc::clone(&q);
            tokio::spawn(async move { q.get().await })
        };
        tokio::task::yield_now().await;
        q.shut_down();

        let got = tokio::time::timeout(Duration::from_secs(5), waiter)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(got, None);

        q.add(SubjectKey::user("late"));
        assert!(q.is_empty());
        assert!(q.is_shutting_down());
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limited_add_waits_for_backoff() {
        let q = queue();
        let key = SubjectKey::user("foo");

        assert_eq!(q.add_rate_limited(key.clone()), Duration::from_millis(5));
        assert_eq!(q.num_requeues(&key), 1);
        assert!(q.is_empty());

        tokio::time::sleep(Duration::from_millis(6)).await;
        assert_eq!(q.len(), 1);

        let got = q.get().await.unwrap();
        assert_eq!(q.add_rate_limited(got.clone()), Duration::from_millis(10));
        q.done(&got);

        q.forget(&key);
        assert_eq!(q.num_requeues(&key), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn shut_down_cancels_delayed_adds() {
        let q = queue();
        q.add_after(SubjectKey::user("foo"), Duration::from_millis(20));
        q.shut_down();

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(q.is_empty());
    }
}
