//! In-process coalescing cache for immutable upstream resources.
//!
//! Guarantees at most one in-flight upstream fetch per key: the first caller
//! installs a pending slot before awaiting the fetch, and every concurrent
//! caller for the same key awaits that one outcome. Successful entries are
//! kept for the process lifetime; the dataset is bounded by the number of
//! matches analyzed in a run, so there is no eviction.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::Mutex;

use tokio::sync::broadcast;
use tracing::debug;

use crate::riot::FetchError;

/// What to do with the slot when a fetch fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Drop the slot so a later call may retry fresh. Used for match data,
    /// where a transient failure should not poison the key.
    Retry,

    /// Keep a known-failure sentinel and fail fast on later calls.
    /// Avoids retry storms for pure deduplication caches.
    Remember,
}

enum Slot<V> {
    Pending(broadcast::Sender<Result<V, FetchError>>),
    Ready(V),
    Failed(FetchError),
}

/// Memoizing cache keyed by opaque resource identifiers.
pub struct Cache<K, V> {
    // std Mutex: never held across an await.
    slots: Mutex<HashMap<K, Slot<V>>>,
    policy: FailurePolicy,
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Display,
    V: Clone,
{
    pub fn new(policy: FailurePolicy) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            policy,
        }
    }

    /// Return the cached value for `key`, or run `fetch` to produce it.
    ///
    /// Concurrent callers for the same key collapse to a single upstream
    /// call; all of them observe the same outcome.
    pub async fn get_or_fetch<F, Fut>(&self, key: K, fetch: F) -> Result<V, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        enum Claim<V> {
            Hit(V),
            KnownFailure(FetchError),
            Wait(broadcast::Receiver<Result<V, FetchError>>),
            Fetch,
        }

        let claim = {
            let mut slots = self.slots.lock().expect("cache lock poisoned");
            match slots.entry(key.clone()) {
                Entry::Occupied(entry) => match entry.get() {
                    Slot::Ready(value) => Claim::Hit(value.clone()),
                    Slot::Failed(err) => Claim::KnownFailure(err.clone()),
                    Slot::Pending(tx) => Claim::Wait(tx.subscribe()),
                },
                Entry::Vacant(entry) => {
                    let (tx, _) = broadcast::channel(1);
                    entry.insert(Slot::Pending(tx));
                    Claim::Fetch
                }
            }
        };

        match claim {
            Claim::Hit(value) => {
                debug!("cache hit for {}", key);
                Ok(value)
            }
            Claim::KnownFailure(err) => Err(err),
            Claim::Wait(mut rx) => {
                debug!("awaiting in-flight fetch for {}", key);
                match rx.recv().await {
                    Ok(outcome) => outcome,
                    // Sender dropped without publishing: the fetching task
                    // was cancelled. Report it as a transport failure.
                    Err(_) => {
                        Err(FetchError::Http("coalesced fetch was cancelled".to_string()))
                    }
                }
            }
            Claim::Fetch => self.fetch_and_publish(key, fetch).await,
        }
    }

    async fn fetch_and_publish<F, Fut>(&self, key: K, fetch: F) -> Result<V, FetchError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, FetchError>>,
    {
        // The fetching caller may be cancelled mid-await (callers wrap
        // requests in their own timeouts). The guard removes the pending
        // slot in that case; dropping the sender inside it wakes every
        // waiter with the cancellation error, and the key is free for a
        // fresh attempt.
        struct PendingGuard<'a, K: Eq + Hash, V> {
            slots: &'a Mutex<HashMap<K, Slot<V>>>,
            key: Option<K>,
        }

        impl<K: Eq + Hash, V> Drop for PendingGuard<'_, K, V> {
            fn drop(&mut self) {
                if let Some(key) = self.key.take() {
                    if let Ok(mut slots) = self.slots.lock() {
                        if matches!(slots.get(&key), Some(Slot::Pending(_))) {
                            slots.remove(&key);
                        }
                    }
                }
            }
        }

        let mut guard = PendingGuard {
            slots: &self.slots,
            key: Some(key),
        };

        let outcome = fetch().await;

        let mut slots = self.slots.lock().expect("cache lock poisoned");
        // Disarm the guard: from here the outcome is published normally.
        let key = guard.key.take().expect("guard disarmed exactly once");
        let pending = match outcome {
            Ok(ref value) => slots.insert(key.clone(), Slot::Ready(value.clone())),
            Err(ref err) => match self.policy {
                FailurePolicy::Retry => slots.remove(&key),
                FailurePolicy::Remember => {
                    slots.insert(key.clone(), Slot::Failed(err.clone()))
                }
            },
        };

        if let Some(Slot::Pending(tx)) = pending {
            // Waiters may all have gone away; that is fine.
            let _ = tx.send(outcome.clone());
        }

        outcome
    }

    /// Number of resolved (successful) entries.
    pub fn len(&self) -> usize {
        self.slots
            .lock()
            .expect("cache lock poisoned")
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
