//! Coalescing queue for per-entity fetches
//!
//! `push` records interest in a key and returns a future for its value.
//! The first push after a flush schedules a task that yields once, so
//! every push made during the current turn lands in the same batch, then
//! issues a single fetch for all distinct keys.
//!
//! On a multi-threaded runtime the scheduled task can run while the caller
//! is still pushing. Callers pushing a burst take a [`FetchHold`] first;
//! the flush waits until every hold is released.
//!
//! Outside a Tokio runtime nothing is spawned: the first returned future
//! to be polled flushes everything pending at that point.

use crate::provider::{ProviderError, ProviderResult};
use futures::future::BoxFuture;
use indexmap::IndexMap;
use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex};
use tokio::sync::{oneshot, watch};
use tracing::{debug, warn};

/// Fetches a batch of keys; keys missing from the result have no value
pub type BatchFetch<K, V> =
    Arc<dyn Fn(Vec<K>) -> BoxFuture<'static, ProviderResult<HashMap<K, V>>> + Send + Sync>;

type Waiter<V> = oneshot::Sender<ProviderResult<Option<V>>>;

struct Pending<K, V> {
    waiters: IndexMap<K, Vec<Waiter<V>>>,
    scheduled: bool,
}

struct Shared<K, V> {
    kind: &'static str,
    fetch: BatchFetch<K, V>,
    pending: Mutex<Pending<K, V>>,
    holds: Arc<watch::Sender<usize>>,
}

/// Delays scheduled flushes until dropped
#[must_use = "the hold is released as soon as it is dropped"]
pub struct FetchHold {
    counters: Vec<Arc<watch::Sender<usize>>>,
}

impl FetchHold {
    fn new(counter: Arc<watch::Sender<usize>>) -> Self {
        counter.send_modify(|count| *count += 1);
        Self {
            counters: vec![counter],
        }
    }

    /// One hold covering the queues of both
    pub fn merge(mut self, mut other: FetchHold) -> Self {
        self.counters.append(&mut other.counters);
        self
    }
}

impl Drop for FetchHold {
    fn drop(&mut self) {
        for counter in &self.counters {
            counter.send_modify(|count| *count -= 1);
        }
    }
}

/// One coalescing queue for one kind of request
///
/// Cloning yields another handle to the same queue.
pub struct FetchCoalescer<K, V> {
    shared: Arc<Shared<K, V>>,
}

impl<K, V> Clone for FetchCoalescer<K, V> {
    fn clone(&self) -> Self {
        Self {
            shared: self.shared.clone(),
        }
    }
}

impl<K, V> FetchCoalescer<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    pub fn new(kind: &'static str, fetch: BatchFetch<K, V>) -> Self {
        let (holds, _) = watch::channel(0);
        Self {
            shared: Arc::new(Shared {
                kind,
                fetch,
                pending: Mutex::new(Pending {
                    waiters: IndexMap::new(),
                    scheduled: false,
                }),
                holds: Arc::new(holds),
            }),
        }
    }

    pub fn kind(&self) -> &'static str {
        self.shared.kind
    }

    /// Register interest in `key`
    ///
    /// Resolves with the fetched value, `None` when the provider had no
    /// entry for the key, or the provider error for the whole batch.
    pub fn push(&self, key: K) -> impl Future<Output = ProviderResult<Option<V>>> + Send + 'static {
        let (tx, rx) = oneshot::channel();
        let runtime = tokio::runtime::Handle::try_current().ok();
        let schedule = {
            let mut pending = self.shared.pending.lock().unwrap();
            pending.waiters.entry(key).or_default().push(tx);
            runtime.is_some() && !std::mem::replace(&mut pending.scheduled, true)
        };
        if let (true, Some(runtime)) = (schedule, &runtime) {
            let shared = self.shared.clone();
            runtime.spawn(async move {
                tokio::task::yield_now().await;
                shared.released().await;
                shared.flush().await;
            });
        }

        let flush_on_poll = runtime.is_none().then(|| self.shared.clone());
        async move {
            if let Some(shared) = flush_on_poll {
                shared.flush().await;
            }
            rx.await.unwrap_or(Err(ProviderError::Cancelled))
        }
    }

    /// Keep the scheduled flush waiting until the returned hold is dropped
    pub fn hold(&self) -> FetchHold {
        FetchHold::new(self.shared.holds.clone())
    }

    /// Number of distinct keys waiting for the next flush
    pub fn pending_len(&self) -> usize {
        self.shared.pending.lock().unwrap().waiters.len()
    }

    /// Flush pending keys now instead of waiting for the scheduled task
    pub async fn flush(&self) {
        self.shared.flush().await;
    }
}

impl<K, V> Shared<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + 'static,
{
    async fn released(&self) {
        let mut holds = self.holds.subscribe();
        while *holds.borrow_and_update() > 0 {
            if holds.changed().await.is_err() {
                return;
            }
        }
    }

    async fn flush(&self) {
        let waiters = {
            let mut pending = self.pending.lock().unwrap();
            pending.scheduled = false;
            std::mem::take(&mut pending.waiters)
        };
        if waiters.is_empty() {
            return;
        }

        let keys: Vec<K> = waiters.keys().cloned().collect();
        debug!(kind = self.kind, keys = keys.len(), "flushing coalesced fetch");
        match (self.fetch)(keys).await {
            Ok(mut values) => {
                for (key, senders) in waiters {
                    let value = values.remove(&key);
                    for sender in senders {
                        let _ = sender.send(Ok(value.clone()));
                    }
                }
            }
            Err(err) => {
                warn!(kind = self.kind, error = %err, "coalesced fetch failed");
                for sender in waiters.into_values().flatten() {
                    let _ = sender.send(Err(err.clone()));
                }
            }
        }
    }
}
