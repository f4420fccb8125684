//! Process-local async query cache.
//!
//! Each key owns one entry and the loader that fills it. Concurrent requests
//! for a key share a single in-flight load: callers receive clones of the same
//! [`Fetch`] and never trigger a second loader call. Loads run as tokio tasks
//! and apply their result to the cache themselves, tagged with the generation
//! that issued them, so a result that arrives after its entry was removed or
//! replaced is dropped instead of applied.

mod entry;

pub use entry::*;

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use futures::future::{BoxFuture, FutureExt, Shared};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::data_service::ServiceError;
use crate::metrics::{
    CACHE_DEDUP_JOINS, CACHE_DISCARDED_RESULTS, CACHE_FETCHES, CACHE_FETCH_DURATION,
};

/// Loader registered for a key.
pub type Loader<T> = Arc<dyn Fn() -> BoxFuture<'static, Result<T, ServiceError>> + Send + Sync>;

/// Awaitable handle on a load. Cloning it does not start another load.
pub type Fetch<T> = Shared<BoxFuture<'static, FetchOutcome<T>>>;

struct Slot<T> {
    entry: CacheEntry<T>,
    generation: u64,
    loader: Loader<T>,
    in_flight: Option<Fetch<T>>,
}

struct Inner<T> {
    slots: HashMap<QueryKey, Slot<T>>,
    last_generation: u64,
}

impl<T> Inner<T> {
    fn next_generation(&mut self) -> u64 {
        self.last_generation += 1;
        self.last_generation
    }
}

/// Keyed cache of async query results.
///
/// Cheap to clone; clones share the same entries.
pub struct QueryCache<T> {
    inner: Arc<Mutex<Inner<T>>>,
    revision: Arc<watch::Sender<u64>>,
}

impl<T> Clone for QueryCache<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            revision: Arc::clone(&self.revision),
        }
    }
}

impl<T: Send + Sync + 'static> Default for QueryCache<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + Sync + 'static> QueryCache<T> {
    pub fn new() -> Self {
        let (revision, _) = watch::channel(0);
        Self {
            inner: Arc::new(Mutex::new(Inner {
                slots: HashMap::new(),
                last_generation: 0,
            })),
            revision: Arc::new(revision),
        }
    }

    /// Current snapshot for `key`; idle if nothing was requested.
    pub fn get(&self, key: &QueryKey) -> CacheEntry<T> {
        lock(&self.inner)
            .slots
            .get(key)
            .map(|slot| slot.entry.clone())
            .unwrap_or_default()
    }

    /// Whether an entry exists for `key`.
    pub fn contains(&self, key: &QueryKey) -> bool {
        lock(&self.inner).slots.contains_key(key)
    }

    /// Start loading `key` unless it already has an entry.
    ///
    /// - no entry: the entry becomes loading and `loader` runs once on the
    ///   tokio runtime;
    /// - load in flight: the in-flight fetch is returned and `loader` is not
    ///   called;
    /// - settled entry: a ready fetch carrying the settled outcome.
    ///
    /// Must be called from within a tokio runtime.
    pub fn ensure_fetch<F, Fut>(&self, key: &QueryKey, loader: F) -> Fetch<T>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ServiceError>> + Send + 'static,
    {
        let mut inner = lock(&self.inner);

        if let Some(slot) = inner.slots.get(key) {
            if let Some(fetch) = &slot.in_flight {
                debug!(key = %key, "Attaching to in-flight fetch");
                CACHE_DEDUP_JOINS.with_label_values(&[key.as_str()]).inc();
                return fetch.clone();
            }
            return settled(&slot.entry);
        }

        let loader: Loader<T> = Arc::new(move || loader().boxed());
        let generation = inner.next_generation();
        let fetch = self.spawn_load(key.clone(), generation, Arc::clone(&loader));

        inner.slots.insert(
            key.clone(),
            Slot {
                entry: CacheEntry::loading(),
                generation,
                loader,
                in_flight: Some(fetch.clone()),
            },
        );
        drop(inner);

        self.bump_revision();
        fetch
    }

    /// Reset `key` to loading and run its registered loader again.
    ///
    /// A load already in flight is reused rather than doubled. Returns `None`
    /// when nothing was ever requested for `key`.
    pub fn invalidate(&self, key: &QueryKey) -> Option<Fetch<T>> {
        let mut inner = lock(&self.inner);

        let loader = {
            let slot = inner.slots.get(key)?;
            if let Some(fetch) = &slot.in_flight {
                debug!(key = %key, "Invalidation joins in-flight fetch");
                CACHE_DEDUP_JOINS.with_label_values(&[key.as_str()]).inc();
                return Some(fetch.clone());
            }
            Arc::clone(&slot.loader)
        };

        let generation = inner.next_generation();
        let fetch = self.spawn_load(key.clone(), generation, loader);

        if let Some(slot) = inner.slots.get_mut(key) {
            slot.entry = CacheEntry::loading();
            slot.generation = generation;
            slot.in_flight = Some(fetch.clone());
        }
        drop(inner);

        debug!(key = %key, generation, "Entry invalidated");
        self.bump_revision();
        Some(fetch)
    }

    /// Drop the entry for `key`. A load still in flight for it is discarded
    /// when it completes. Returns whether an entry existed.
    pub fn remove(&self, key: &QueryKey) -> bool {
        let removed = lock(&self.inner).slots.remove(key).is_some();
        if removed {
            debug!(key = %key, "Entry removed");
            self.bump_revision();
        }
        removed
    }

    /// Receiver whose value changes every time an entry changes.
    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.revision.subscribe()
    }

    fn bump_revision(&self) {
        self.revision.send_modify(|rev| *rev += 1);
    }

    fn spawn_load(&self, key: QueryKey, generation: u64, loader: Loader<T>) -> Fetch<T> {
        let task_inner = Arc::clone(&self.inner);
        let task_revision = Arc::clone(&self.revision);
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let (inner, revision, key) = (task_inner, task_revision, task_key);
            debug!(key = %key, generation, "Starting fetch");
            let started = Instant::now();

            // A panicking loader still settles the entry as failed.
            let outcome: FetchOutcome<T> = match AssertUnwindSafe(async { loader().await })
                .catch_unwind()
                .await
            {
                Ok(result) => result.map(Arc::new).map_err(Arc::new),
                Err(panic) => Err(Arc::new(ServiceError::Aborted(format!(
                    "loader panicked: {}",
                    panic_message(panic.as_ref())
                )))),
            };

            CACHE_FETCH_DURATION
                .with_label_values(&[key.as_str()])
                .observe(started.elapsed().as_secs_f64());
            CACHE_FETCHES
                .with_label_values(&[
                    key.as_str(),
                    if outcome.is_ok() { "success" } else { "error" },
                ])
                .inc();

            if apply(&inner, &key, generation, &outcome) {
                revision.send_modify(|rev| *rev += 1);
            }
            outcome
        });

        let inner = Arc::clone(&self.inner);
        let revision = Arc::clone(&self.revision);
        async move {
            match handle.await {
                Ok(outcome) => outcome,
                Err(e) => {
                    let outcome: FetchOutcome<T> =
                        Err(Arc::new(ServiceError::Aborted(e.to_string())));
                    if apply(&inner, &key, generation, &outcome) {
                        revision.send_modify(|rev| *rev += 1);
                    }
                    outcome
                }
            }
        }
        .boxed()
        .shared()
    }
}

/// Store a finished load if its entry still belongs to `generation`.
fn apply<T>(
    inner: &Mutex<Inner<T>>,
    key: &QueryKey,
    generation: u64,
    outcome: &FetchOutcome<T>,
) -> bool {
    let mut inner = lock(inner);

    let slot = match inner.slots.get_mut(key) {
        Some(slot) if slot.generation == generation => slot,
        _ => {
            warn!(key = %key, generation, "Discarding fetch result for a stale entry");
            CACHE_DISCARDED_RESULTS.inc();
            return false;
        }
    };

    slot.in_flight = None;
    slot.entry = match outcome {
        Ok(data) => {
            info!(key = %key, generation, "Fetch succeeded");
            CacheEntry::populated(Arc::clone(data))
        }
        Err(err) => {
            warn!(key = %key, generation, error = %err, "Fetch failed");
            CacheEntry::failed(Arc::clone(err))
        }
    };
    true
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    panic
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("unknown panic")
}

fn settled<T: Send + Sync + 'static>(entry: &CacheEntry<T>) -> Fetch<T> {
    let outcome = entry.outcome().unwrap_or_else(|| {
        Err(Arc::new(ServiceError::Aborted(
            "entry has no settled result".to_string(),
        )))
    });
    futures::future::ready(outcome).boxed().shared()
}

fn lock<T>(inner: &Mutex<Inner<T>>) -> MutexGuard<'_, Inner<T>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::sync::Semaphore;
    use tokio_test::{assert_pending, assert_ready};

    /// Loader that counts calls and blocks until the gate opens.
    #[derive(Clone)]
    struct GatedLoader {
        calls: Arc<AtomicUsize>,
        gate: Arc<Semaphore>,
        fail: bool,
    }

    impl GatedLoader {
        fn new() -> Self {
            Self {
                calls: Arc::new(AtomicUsize::new(0)),
                gate: Arc::new(Semaphore::new(0)),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn open(&self) {
            self.gate.add_permits(Semaphore::MAX_PERMITS / 2);
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        fn loader(
            &self,
        ) -> impl Fn() -> BoxFuture<'static, Result<Vec<u32>, ServiceError>> + Send + Sync + 'static
        {
            let this = self.clone();
            move || {
                let this = this.clone();
                async move {
                    let n = this.calls.fetch_add(1, Ordering::SeqCst) + 1;
                    let _permit = this.gate.acquire().await.expect("gate closed");
                    if this.fail {
                        Err(ServiceError::Api {
                            status: 500,
                            message: "boom".to_string(),
                        })
                    } else {
                        Ok(vec![n as u32])
                    }
                }
                .boxed()
            }
        }
    }

    fn key() -> QueryKey {
        QueryKey::new("/api/films")
    }

    #[tokio::test]
    async fn test_get_unknown_key_is_idle() {
        let cache: QueryCache<Vec<u32>> = QueryCache::new();
        assert!(cache.get(&key()).is_idle());
        assert!(!cache.contains(&key()));
    }

    #[tokio::test]
    async fn test_ensure_fetch_populates_entry() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();

        let fetch = cache.ensure_fetch(&key(), loader.loader());
        assert!(cache.get(&key()).is_loading);

        loader.open();
        let data = fetch.await.unwrap();
        assert_eq!(*data, vec![1]);

        let entry = cache.get(&key());
        assert!(entry.is_success());
        assert_eq!(entry.data.as_deref(), Some(&vec![1]));
        assert!(entry.updated_at.is_some());
    }

    #[tokio::test]
    async fn test_concurrent_requests_share_one_load() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();

        let first = cache.ensure_fetch(&key(), loader.loader());
        let second = cache.ensure_fetch(&key(), loader.loader());

        loader.open();
        let (a, b) = tokio::join!(first, second);
        let (a, b) = (a.unwrap(), b.unwrap());

        assert_eq!(loader.calls(), 1);
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn test_fetch_stays_pending_while_loader_blocks() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();

        let mut fetch = tokio_test::task::spawn(cache.ensure_fetch(&key(), loader.loader()));
        tokio::task::yield_now().await;
        assert_pending!(fetch.poll());

        loader.open();
        let data = fetch.await.unwrap();
        assert_eq!(*data, vec![1]);
    }

    #[tokio::test]
    async fn test_settled_entry_does_not_reload() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();
        loader.open();

        cache.ensure_fetch(&key(), loader.loader()).await.unwrap();

        let mut again = tokio_test::task::spawn(cache.ensure_fetch(&key(), loader.loader()));
        let data = assert_ready!(again.poll()).unwrap();
        assert_eq!(*data, vec![1]);
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_failure_sets_error() {
        let cache = QueryCache::new();
        let loader = GatedLoader::failing();
        loader.open();

        let err = cache
            .ensure_fetch(&key(), loader.loader())
            .await
            .unwrap_err();
        assert!(matches!(*err, ServiceError::Api { status: 500, .. }));

        let entry = cache.get(&key());
        assert!(!entry.is_loading);
        assert!(entry.data.is_none());
        assert!(entry.error.is_some());
    }

    #[tokio::test]
    async fn test_failed_refetch_discards_previous_data() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);

        // First call succeeds, every later call fails.
        let loader = move || {
            let n = counter.fetch_add(1, Ordering::SeqCst);
            async move {
                if n == 0 {
                    Ok(vec![7u32])
                } else {
                    Err(ServiceError::Unauthorized(401))
                }
            }
        };

        cache.ensure_fetch(&key(), loader).await.unwrap();
        assert!(cache.get(&key()).is_success());

        let refetch = cache.invalidate(&key()).unwrap();
        assert!(refetch.await.is_err());

        let entry = cache.get(&key());
        assert!(entry.data.is_none());
        assert!(matches!(
            entry.error.as_deref(),
            Some(ServiceError::Unauthorized(401))
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    /// Loader that panics on its first call and succeeds afterwards.
    fn panics_once(
        calls: &Arc<AtomicUsize>,
    ) -> impl Fn() -> BoxFuture<'static, Result<Vec<u32>, ServiceError>> + Send + Sync + 'static
    {
        let counter = Arc::clone(calls);
        move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move {
                if n == 1 {
                    panic!("loader exploded");
                }
                Ok::<_, ServiceError>(vec![n as u32])
            }
            .boxed()
        }
    }

    #[tokio::test]
    async fn test_panicking_loader_settles_as_error() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let err = cache
            .ensure_fetch(&key(), panics_once(&calls))
            .await
            .unwrap_err();
        match &*err {
            ServiceError::Aborted(message) => assert!(message.contains("loader exploded")),
            other => panic!("Expected aborted fetch, got {:?}", other),
        }

        let entry = cache.get(&key());
        assert!(!entry.is_loading);
        assert!(entry.error.is_some());

        // The registered loader runs again instead of joining the dead load
        let refetch = cache.invalidate(&key()).unwrap();
        assert_eq!(*refetch.await.unwrap(), vec![2]);
        assert!(cache.get(&key()).is_success());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_panicking_loader_settles_without_awaiter() {
        let cache = QueryCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let mut changes = cache.subscribe();

        drop(cache.ensure_fetch(&key(), panics_once(&calls)));

        tokio::time::timeout(std::time::Duration::from_secs(5), async {
            while cache.get(&key()).is_loading {
                changes.changed().await.unwrap();
            }
        })
        .await
        .expect("entry stayed loading");

        assert!(cache.get(&key()).error.is_some());
    }

    #[tokio::test]
    async fn test_invalidate_reruns_loader() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();

        let first = cache.ensure_fetch(&key(), loader.loader());
        loader.open();
        assert_eq!(*first.await.unwrap(), vec![1]);

        let refetch = cache.invalidate(&key()).unwrap();
        assert!(cache.get(&key()).is_loading);
        assert_eq!(*refetch.await.unwrap(), vec![2]);
        assert_eq!(cache.get(&key()).data.as_deref(), Some(&vec![2]));
        assert_eq!(loader.calls(), 2);
    }

    #[tokio::test]
    async fn test_invalidate_unknown_key() {
        let cache: QueryCache<Vec<u32>> = QueryCache::new();
        assert!(cache.invalidate(&key()).is_none());
        assert!(cache.get(&key()).is_idle());
    }

    #[tokio::test]
    async fn test_invalidate_while_in_flight_joins() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();

        let first = cache.ensure_fetch(&key(), loader.loader());
        let joined = cache.invalidate(&key()).unwrap();

        loader.open();
        let (a, b) = tokio::join!(first, joined);
        assert!(Arc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_removed_entry_discards_late_result() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();

        let fetch = cache.ensure_fetch(&key(), loader.loader());
        assert!(cache.remove(&key()));

        loader.open();
        // The load itself still completes for whoever awaits it...
        assert!(fetch.await.is_ok());
        // ...but nothing is written back.
        assert!(cache.get(&key()).is_idle());
        assert!(!cache.contains(&key()));
    }

    #[tokio::test]
    async fn test_late_result_does_not_overwrite_new_entry() {
        let cache = QueryCache::new();
        let old = GatedLoader::new();
        let new = GatedLoader::new();

        let stale = cache.ensure_fetch(&key(), old.loader());
        cache.remove(&key());
        let fresh = cache.ensure_fetch(&key(), new.loader());

        old.open();
        stale.await.unwrap();
        assert!(cache.get(&key()).is_loading);

        new.open();
        fresh.await.unwrap();
        assert_eq!(cache.get(&key()).data.as_deref(), Some(&vec![1]));
        assert_eq!(new.calls(), 1);
    }

    #[tokio::test]
    async fn test_remove_unknown_key() {
        let cache: QueryCache<Vec<u32>> = QueryCache::new();
        assert!(!cache.remove(&key()));
    }

    #[tokio::test]
    async fn test_subscribe_sees_changes() {
        let cache = QueryCache::new();
        let mut changes = cache.subscribe();
        let loader = GatedLoader::new();

        let fetch = cache.ensure_fetch(&key(), loader.loader());
        assert!(changes.has_changed().unwrap());
        changes.borrow_and_update();

        loader.open();
        fetch.await.unwrap();
        changes.changed().await.unwrap();
        assert!(cache.get(&key()).is_success());
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let cache = QueryCache::new();
        let loader = GatedLoader::new();
        loader.open();

        let other = QueryKey::new("/api/other");
        cache.ensure_fetch(&key(), loader.loader()).await.unwrap();
        cache.ensure_fetch(&other, loader.loader()).await.unwrap();

        assert_eq!(loader.calls(), 2);
        cache.remove(&other);
        assert!(cache.get(&key()).is_success());
    }
}
