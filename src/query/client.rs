use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use chrono::Utc;
use futures::future::BoxFuture;
use futures::FutureExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::app::{ApiError, ApiResult};
use crate::query::state::{AnyValue, RawState};
use crate::query::{CacheKey, QueryConfig, QueryState, QueryStatus, Subscription};

type ErasedLoader = Arc<dyn Fn() -> BoxFuture<'static, ApiResult<AnyValue>> + Send + Sync>;

struct InFlight {
    seq: u64,
    task: JoinHandle<()>,
}

struct Slot {
    /// Unique per slot; a subscription only detaches from the slot it attached to.
    id: u64,
    tx: watch::Sender<RawState>,
    loader: ErasedLoader,
    subscribers: usize,
    in_flight: Option<InFlight>,
    /// Highest sequence number whose result has been applied.
    resolved_seq: u64,
    fetched_instant: Option<Instant>,
    invalidated: bool,
    released_at: Option<Instant>,
}

impl Slot {
    fn abort(&mut self) {
        if let Some(in_flight) = self.in_flight.take() {
            in_flight.task.abort();
        }
    }
}

#[derive(Default)]
struct Cache {
    entries: HashMap<CacheKey, Slot>,
    /// Source of slot ids and fetch sequence numbers; never reused.
    counter: u64,
}

impl Cache {
    fn next(&mut self) -> u64 {
        self.counter += 1;
        self.counter
    }
}

struct Inner {
    config: QueryConfig,
    cache: Mutex<Cache>,
}

/// Shared query cache and request coordinator.
///
/// Cloning is cheap; all clones share the same cache. Loaders run as spawned
/// tokio tasks, so methods that may start a fetch must be called from within a
/// tokio runtime.
#[derive(Clone)]
pub struct QueryClient {
    inner: Arc<Inner>,
}

impl Default for QueryClient {
    fn default() -> Self {
        Self::new(QueryConfig::default())
    }
}

impl QueryClient {
    pub fn new(config: QueryConfig) -> Self {
        Self {
            inner: Arc::new(Inner {
                config,
                cache: Mutex::new(Cache::default()),
            }),
        }
    }

    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    /// Register interest in `key`, starting `loader` if the entry is missing
    /// or stale and no fetch for it is already running.
    pub fn subscribe<T, F, Fut>(&self, key: CacheKey, loader: F) -> Subscription<T>
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ApiResult<T>> + Send + 'static,
    {
        let loader: ErasedLoader = Arc::new(move || {
            let fut = loader();
            async move { fut.await.map(|value| Arc::new(value) as AnyValue) }.boxed()
        });

        let (slot_id, rx) = self.inner.attach(&key, loader);
        Subscription::active(self.clone(), key, slot_id, rx)
    }

    /// Re-run the stored loader for `key`, superseding any fetch in progress.
    /// Returns false when the key is not cached.
    pub fn refresh(&self, key: &CacheKey) -> bool {
        let mut cache = self.inner.lock();
        let seq = cache.next();
        match cache.entries.get_mut(key) {
            Some(slot) => {
                self.inner.start_fetch(key, slot, seq);
                true
            }
            None => false,
        }
    }

    /// Mark `key` stale. Entries with subscribers refetch immediately, others
    /// on their next subscription.
    pub fn invalidate(&self, key: &CacheKey) {
        self.invalidate_where(|k| k == key);
    }

    /// Invalidate every key that starts with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &CacheKey) {
        self.invalidate_where(|k| k.starts_with(prefix));
    }

    fn invalidate_where(&self, predicate: impl Fn(&CacheKey) -> bool) {
        let mut guard = self.inner.lock();
        let cache = &mut *guard;
        for (key, slot) in cache.entries.iter_mut() {
            if !predicate(key) {
                continue;
            }
            slot.invalidated = true;
            if slot.subscribers > 0 && slot.in_flight.is_none() {
                cache.counter += 1;
                self.inner.start_fetch(key, slot, cache.counter);
            }
        }
    }

    /// Drop the entry for `key`, aborting its fetch. Live subscriptions keep
    /// their last state but receive no further updates.
    pub fn remove(&self, key: &CacheKey) -> bool {
        let mut cache = self.inner.lock();
        match cache.entries.remove(key) {
            Some(mut slot) => {
                slot.abort();
                true
            }
            None => false,
        }
    }

    pub fn clear(&self) {
        let mut cache = self.inner.lock();
        for (_, mut slot) in cache.entries.drain() {
            slot.abort();
        }
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.inner.lock().entries.contains_key(key)
    }

    pub fn subscriber_count(&self, key: &CacheKey) -> Option<usize> {
        self.inner.lock().entries.get(key).map(|slot| slot.subscribers)
    }

    /// Current state of `key` without subscribing.
    pub fn state<T: Send + Sync + 'static>(&self, key: &CacheKey) -> Option<QueryState<T>> {
        let cache = self.inner.lock();
        cache
            .entries
            .get(key)
            .map(|slot| slot.tx.borrow().typed(key))
    }

    pub(crate) fn detach(&self, key: &CacheKey, slot_id: u64) {
        self.inner.detach(key, slot_id);
    }
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, Cache> {
        // Cache state stays consistent across a panicking holder: every
        // mutation is a single field write.
        self.cache.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn attach(self: &Arc<Self>, key: &CacheKey, loader: ErasedLoader) -> (u64, watch::Receiver<RawState>) {
        let mut cache = self.lock();

        if !cache.entries.contains_key(key) {
            self.make_room(&mut cache);
        }

        let id = cache.next();
        let seq = cache.next();
        let stale_time = self.config.stale_time();
        let slot = cache.entries.entry(key.clone()).or_insert_with(|| {
            let (tx, _) = watch::channel(RawState::idle());
            Slot {
                id,
                tx,
                loader: loader.clone(),
                subscribers: 0,
                in_flight: None,
                resolved_seq: id,
                fetched_instant: None,
                invalidated: false,
                released_at: None,
            }
        });

        slot.loader = loader;
        slot.subscribers += 1;
        slot.released_at = None;
        let rx = slot.tx.subscribe();

        let status = slot.tx.borrow().status;
        let needs_fetch = match status {
            _ if slot.in_flight.is_some() => false,
            QueryStatus::Idle | QueryStatus::Loading => true,
            QueryStatus::Error => slot.invalidated,
            QueryStatus::Success => {
                slot.invalidated
                    || match (stale_time, slot.fetched_instant) {
                        (Some(stale_time), Some(at)) => at.elapsed() >= stale_time,
                        _ => false,
                    }
            }
        };

        if needs_fetch {
            self.start_fetch(key, slot, seq);
        } else {
            debug!(%key, %status, subscribers = slot.subscribers, "query served from cache");
        }

        (slot.id, rx)
    }

    fn start_fetch(self: &Arc<Self>, key: &CacheKey, slot: &mut Slot, seq: u64) {
        if let Some(previous) = slot.in_flight.take() {
            debug!(%key, superseded = previous.seq, seq, "superseding in-flight fetch");
            previous.task.abort();
        }

        slot.invalidated = false;
        slot.tx.send_modify(|state| state.status = QueryStatus::Loading);
        debug!(%key, seq, "starting fetch");

        // The loader is invoked inside the task so it never runs under the
        // cache lock and may itself subscribe.
        let loader = slot.loader.clone();
        let inner: Weak<Inner> = Arc::downgrade(self);
        let key = key.clone();
        let task = tokio::spawn(async move {
            let outcome = AssertUnwindSafe(async move { loader().await })
                .catch_unwind()
                .await
                .unwrap_or_else(|_| Err(ApiError::Task(format!("loader for {} panicked", key))));

            if let Some(inner) = inner.upgrade() {
                inner.settle(&key, seq, outcome);
            }
        });

        slot.in_flight = Some(InFlight { seq, task });
    }

    /// Apply a finished fetch unless a later-issued fetch already resolved.
    fn settle(&self, key: &CacheKey, seq: u64, outcome: ApiResult<AnyValue>) {
        let mut cache = self.lock();
        let Some(slot) = cache.entries.get_mut(key) else {
            debug!(%key, seq, "entry evicted before fetch settled");
            return;
        };

        if seq <= slot.resolved_seq {
            debug!(%key, seq, resolved = slot.resolved_seq, "discarding out-of-order result");
            return;
        }
        slot.resolved_seq = seq;

        let pending_seq = slot.in_flight.as_ref().map(|in_flight| in_flight.seq);
        let newer_pending = match pending_seq {
            Some(pending) if pending == seq => {
                slot.in_flight = None;
                false
            }
            Some(pending) => pending > seq,
            None => false,
        };

        match outcome {
            Ok(value) => {
                slot.fetched_instant = Some(Instant::now());
                slot.tx.send_modify(|state| {
                    if !newer_pending {
                        state.status = QueryStatus::Success;
                    }
                    state.data = Some(value);
                    state.error = None;
                    state.fetched_at = Some(Utc::now());
                });
            }
            Err(err) => {
                warn!(%key, error = %err, "query failed");
                slot.tx.send_modify(|state| {
                    if !newer_pending {
                        state.status = QueryStatus::Error;
                    }
                    state.error = Some(err);
                });
            }
        }
    }

    fn detach(self: &Arc<Self>, key: &CacheKey, slot_id: u64) {
        let mut cache = self.lock();
        let Some(slot) = cache.entries.get_mut(key) else {
            return;
        };
        if slot.id != slot_id {
            return;
        }

        slot.subscribers = slot.subscribers.saturating_sub(1);
        if slot.subscribers > 0 {
            return;
        }

        let released_at = Instant::now();
        slot.released_at = Some(released_at);

        let gc_time = self.config.gc_time();
        if gc_time.is_zero() {
            if let Some(mut slot) = cache.entries.remove(key) {
                slot.abort();
                debug!(%key, "evicted unused entry");
            }
            return;
        }

        // Without a runtime (e.g. during shutdown) the entry simply waits
        // for max_entries pressure.
        if let Ok(handle) = tokio::runtime::Handle::try_current() {
            let inner = Arc::downgrade(self);
            let key = key.clone();
            handle.spawn(async move {
                tokio::time::sleep(gc_time).await;
                if let Some(inner) = inner.upgrade() {
                    inner.collect(&key, slot_id, released_at);
                }
            });
        }
    }

    /// Evict `key` if it is still the same slot and has stayed unused since
    /// `released_at`.
    fn collect(&self, key: &CacheKey, slot_id: u64, released_at: Instant) {
        let mut cache = self.lock();
        let expired = cache.entries.get(key).is_some_and(|slot| {
            slot.id == slot_id && slot.subscribers == 0 && slot.released_at == Some(released_at)
        });

        if expired {
            if let Some(mut slot) = cache.entries.remove(key) {
                slot.abort();
                debug!(%key, "evicted entry after grace period");
            }
        }
    }

    /// Evict least-recently-released unused entries until one more fits.
    fn make_room(&self, cache: &mut Cache) {
        let max_entries = self.config.max_entries.max(1);

        while cache.entries.len() >= max_entries {
            let victim = cache
                .entries
                .iter()
                .filter(|(_, slot)| slot.subscribers == 0)
                .min_by_key(|(_, slot)| slot.released_at)
                .map(|(key, _)| key.clone());

            match victim {
                Some(key) => {
                    if let Some(mut slot) = cache.entries.remove(&key) {
                        slot.abort();
                    }
                    debug!(%key, "evicted entry to respect max_entries");
                }
                None => {
                    warn!(
                        entries = cache.entries.len(),
                        max_entries, "query cache full of live entries"
                    );
                    break;
                }
            }
        }
    }
}
