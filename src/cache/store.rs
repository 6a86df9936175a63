//! Query cache storage.
//!
//! Entries hold type-erased query results stamped with their fetch time.
//! Reads that miss join an outstanding request for the same key when one is
//! in flight, otherwise they start one and every joiner shares its outcome.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use lru::LruCache;
use metrics::counter;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::application::source::SourceError;

use super::config::CacheConfig;
use super::keys::QueryKey;
use super::lock::mutex_lock;

const SOURCE: &str = "cache::store";

const METRIC_HIT: &str = "gazette_query_cache_hit_total";
const METRIC_MISS: &str = "gazette_query_cache_miss_total";
const METRIC_COALESCED: &str = "gazette_query_cache_coalesced_total";
const METRIC_EVICT: &str = "gazette_query_cache_evict_total";
const METRIC_STALE_SERVED: &str = "gazette_query_cache_stale_served_total";

type CachedValue = Arc<dyn Any + Send + Sync>;
type PendingFetch = Shared<BoxFuture<'static, Result<CachedValue, SourceError>>>;

struct CacheEntry {
    data: CachedValue,
    fetched_at: Instant,
}

struct Pending {
    ticket: u64,
    fetch: PendingFetch,
}

enum Flight {
    Joined(PendingFetch),
    Started(PendingFetch),
}

struct Inner {
    config: CacheConfig,
    entries: Mutex<LruCache<QueryKey, CacheEntry>>,
    // A fetch may store its result only while it still owns its key's
    // pending slot; invalidation releases the slot.
    pending: Mutex<HashMap<QueryKey, Pending>>,
    tickets: AtomicU64,
}

/// Memoizing wrapper around backend reads.
///
/// Cheap to clone; clones share the same store. Construct one per process
/// (or per test) and inject it where reads happen.
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let capacity = config.max_entries_non_zero();
        Self {
            inner: Arc::new(Inner {
                config,
                entries: Mutex::new(LruCache::new(capacity)),
                pending: Mutex::new(HashMap::new()),
                tickets: AtomicU64::new(0),
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Return the cached result for `key` when fresh, otherwise run `query`.
    ///
    /// A successful result is stored under `key` with the current time. A
    /// failure is returned unchanged and leaves any existing entry untouched.
    pub async fn fetch_cached<T, F, Fut>(&self, key: &QueryKey, query: F) -> Result<T, SourceError>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        if !self.inner.config.enabled {
            return query().await;
        }

        if let Some(value) = self.lookup::<T>(key, false) {
            counter!(METRIC_HIT).increment(1);
            debug!(key = %key, "query cache hit");
            return Ok(value);
        }

        let fetch = match self.join_or_start(key, query) {
            Flight::Joined(fetch) => {
                counter!(METRIC_COALESCED).increment(1);
                debug!(key = %key, "joining in-flight query");
                fetch
            }
            Flight::Started(fetch) => {
                counter!(METRIC_MISS).increment(1);
                debug!(key = %key, "query cache miss");
                fetch
            }
        };

        match fetch.await {
            Ok(value) => value.downcast_ref::<T>().cloned().ok_or_else(|| {
                warn!(key = %key, "in-flight query produced a different result type");
                SourceError::Decode(format!(
                    "query key `{key}` is shared by reads of different types"
                ))
            }),
            Err(err) => self.on_failure(key, err),
        }
    }

    /// Run `query` without reading or writing the store.
    pub async fn fetch_uncached<T, F, Fut>(&self, query: F) -> Result<T, SourceError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>>,
    {
        query().await
    }

    /// Drop the entry for `key`; the next read refetches.
    pub fn invalidate(&self, key: &QueryKey) {
        let mut pending = mutex_lock(&self.inner.pending, SOURCE, "invalidate.pending");
        pending.remove(key);
        mutex_lock(&self.inner.entries, SOURCE, "invalidate.entries").pop(key);
        debug!(key = %key, "query cache entry invalidated");
    }

    /// Drop every entry.
    pub fn invalidate_all(&self) {
        let mut pending = mutex_lock(&self.inner.pending, SOURCE, "invalidate_all.pending");
        pending.clear();
        mutex_lock(&self.inner.entries, SOURCE, "invalidate_all.entries").clear();
        debug!("query cache cleared");
    }

    /// True when an entry exists for `key`, fresh or not.
    pub fn contains(&self, key: &QueryKey) -> bool {
        mutex_lock(&self.inner.entries, SOURCE, "contains").contains(key)
    }

    /// Get the number of stored entries.
    pub fn len(&self) -> usize {
        mutex_lock(&self.inner.entries, SOURCE, "len").len()
    }

    /// Check if the cache is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lookup<T>(&self, key: &QueryKey, allow_expired: bool) -> Option<T>
    where
        T: Clone + 'static,
    {
        let ttl = self.inner.config.ttl;
        let mut entries = mutex_lock(&self.inner.entries, SOURCE, "lookup");
        let entry = entries.get(key)?;
        if !allow_expired && entry.fetched_at.elapsed() >= ttl {
            return None;
        }
        match entry.data.downcast_ref::<T>() {
            Some(value) => Some(value.clone()),
            None => {
                warn!(key = %key, "cached entry holds a different type; treating as miss");
                None
            }
        }
    }

    fn join_or_start<T, F, Fut>(&self, key: &QueryKey, query: F) -> Flight
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, SourceError>> + Send + 'static,
    {
        let mut pending = mutex_lock(&self.inner.pending, SOURCE, "join_or_start");
        if let Some(existing) = pending.get(key) {
            return Flight::Joined(existing.fetch.clone());
        }

        let ticket = self.inner.tickets.fetch_add(1, Ordering::SeqCst);
        let inner = Arc::clone(&self.inner);
        let owned_key = key.clone();
        let run = query();

        let fetch = async move {
            let outcome = run.await.map(|value| Arc::new(value) as CachedValue);
            inner.settle(&owned_key, ticket, &outcome);
            outcome
        }
        .boxed()
        .shared();

        pending.insert(
            key.clone(),
            Pending {
                ticket,
                fetch: fetch.clone(),
            },
        );
        Flight::Started(fetch)
    }

    fn on_failure<T>(&self, key: &QueryKey, err: SourceError) -> Result<T, SourceError>
    where
        T: Clone + 'static,
    {
        if !self.inner.config.stale_on_error {
            return Err(err);
        }
        match self.lookup::<T>(key, true) {
            Some(stale) => {
                counter!(METRIC_STALE_SERVED).increment(1);
                warn!(key = %key, error = %err, "query failed; serving stale cache entry");
                Ok(stale)
            }
            None => Err(err),
        }
    }
}

impl Inner {
    /// Record the outcome of the fetch identified by `ticket`.
    ///
    /// Lock order is `pending` then `entries`, matching invalidation.
    fn settle(&self, key: &QueryKey, ticket: u64, outcome: &Result<CachedValue, SourceError>) {
        let mut pending = mutex_lock(&self.pending, SOURCE, "settle.pending");
        let owned = pending.get(key).is_some_and(|current| current.ticket == ticket);
        if owned {
            pending.remove(key);
        }

        let Ok(value) = outcome else {
            return;
        };
        if !owned {
            debug!(key = %key, "discarding result fetched before invalidation");
            return;
        }

        let mut entries = mutex_lock(&self.entries, SOURCE, "settle.entries");
        let displaced = entries.push(
            key.clone(),
            CacheEntry {
                data: Arc::clone(value),
                fetched_at: Instant::now(),
            },
        );
        if let Some((evicted, _)) = displaced.filter(|(evicted, _)| evicted != key) {
            counter!(METRIC_EVICT).increment(1);
            debug!(key = %evicted, "query cache entry evicted");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    use tokio::sync::oneshot;

    use super::*;

    fn key(raw: &str) -> QueryKey {
        QueryKey::new(raw).expect("valid key")
    }

    fn counting_query(
        calls: &Arc<AtomicUsize>,
        value: Vec<&'static str>,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<Vec<&'static str>, SourceError>> {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_entry_is_served_without_refetch() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key("all-articles");

        let first = cache
            .fetch_cached(&k, counting_query(&calls, vec!["a", "b"]))
            .await
            .expect("first fetch");
        let second = cache
            .fetch_cached(&k, counting_query(&calls, vec!["changed"]))
            .await
            .expect("second fetch");

        assert_eq!(first, second);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expired_entry_is_refetched() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key("all-articles");

        cache
            .fetch_cached(&k, counting_query(&calls, vec!["old"]))
            .await
            .expect("first fetch");

        tokio::time::advance(Duration::from_secs(299)).await;
        let cached = cache
            .fetch_cached(&k, counting_query(&calls, vec!["new"]))
            .await
            .expect("within ttl");
        assert_eq!(cached, vec!["old"]);

        tokio::time::advance(Duration::from_secs(1)).await;
        let refreshed = cache
            .fetch_cached(&k, counting_query(&calls, vec!["new"]))
            .await
            .expect("after ttl");
        assert_eq!(refreshed, vec!["new"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn failure_leaves_no_entry() {
        let cache = QueryCache::new(CacheConfig::default());
        let k = key("podcasts");

        let err = cache
            .fetch_cached(&k, || async {
                Err::<Vec<u8>, _>(SourceError::Transport("connection reset".into()))
            })
            .await
            .expect_err("failure propagates");

        assert_eq!(err, SourceError::Transport("connection reset".into()));
        assert!(!cache.contains(&k));
    }

    #[tokio::test(start_paused = true)]
    async fn failure_keeps_previous_entry_without_serving_it() {
        let cache = QueryCache::new(CacheConfig::default());
        let k = key("podcasts");

        cache
            .fetch_cached(&k, || async { Ok::<_, SourceError>(vec![1_u8]) })
            .await
            .expect("seed");
        tokio::time::advance(Duration::from_secs(301)).await;

        let err = cache
            .fetch_cached(&k, || async {
                Err::<Vec<u8>, _>(SourceError::Status {
                    status: 503,
                    body: String::new(),
                })
            })
            .await
            .expect_err("no stale fallback by default");
        assert!(matches!(err, SourceError::Status { status: 503, .. }));
        assert!(cache.contains(&k));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_served_on_error_when_enabled() {
        let cache = QueryCache::new(CacheConfig {
            stale_on_error: true,
            ..Default::default()
        });
        let k = key("podcasts");

        cache
            .fetch_cached(&k, || async { Ok::<_, SourceError>(vec![1_u8]) })
            .await
            .expect("seed");
        tokio::time::advance(Duration::from_secs(301)).await;

        let stale = cache
            .fetch_cached(&k, || async {
                Err::<Vec<u8>, _>(SourceError::Transport("timeout".into()))
            })
            .await
            .expect("stale entry served");
        assert_eq!(stale, vec![1]);
    }

    #[tokio::test]
    async fn keys_are_isolated() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));

        let first = cache
            .fetch_cached(&key("k1"), counting_query(&calls, vec!["one"]))
            .await
            .expect("k1");
        let second = cache
            .fetch_cached(&key("k2"), counting_query(&calls, vec!["two"]))
            .await
            .expect("k2");

        assert_eq!(first, vec!["one"]);
        assert_eq!(second, vec!["two"]);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn invalidate_forces_refetch() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key("universes");

        cache
            .fetch_cached(&k, counting_query(&calls, vec!["a"]))
            .await
            .expect("first");
        cache.invalidate(&k);
        assert!(!cache.contains(&k));

        cache
            .fetch_cached(&k, counting_query(&calls, vec!["a"]))
            .await
            .expect("second");
        assert_eq!(calls.load(Ordering::SeqCst), 2);

        cache.invalidate_all();
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_request() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key("all-articles");
        let (release, gate) = oneshot::channel::<()>();

        let gated_calls = Arc::clone(&calls);
        let first = cache.fetch_cached(&k, move || async move {
            gated_calls.fetch_add(1, Ordering::SeqCst);
            gate.await.map_err(|_| SourceError::Transport("gate dropped".into()))?;
            Ok::<_, SourceError>(vec!["shared"])
        });
        let second = cache.fetch_cached(&k, counting_query(&calls, vec!["racing"]));
        let opener = async {
            tokio::task::yield_now().await;
            let _ = release.send(());
        };

        let (first, second, ()) = tokio::join!(first, second, opener);
        assert_eq!(first.expect("first"), vec!["shared"]);
        assert_eq!(second.expect("second"), vec!["shared"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn result_started_before_invalidation_is_not_stored() {
        let cache = QueryCache::new(CacheConfig::default());
        let k = key("club-pricing");
        let (release, gate) = oneshot::channel::<()>();

        let fetch = cache.fetch_cached(&k, move || async move {
            gate.await.map_err(|_| SourceError::Transport("gate dropped".into()))?;
            Ok::<_, SourceError>(vec![42_u32])
        });
        let invalidator = async {
            tokio::task::yield_now().await;
            cache.invalidate_all();
            let _ = release.send(());
        };

        let (value, ()) = tokio::join!(fetch, invalidator);
        assert_eq!(value.expect("caller still receives result"), vec![42]);
        assert!(!cache.contains(&k));
    }

    #[tokio::test]
    async fn invalidating_one_key_keeps_other_in_flight_results() {
        let cache = QueryCache::new(CacheConfig::default());
        let calls = Arc::new(AtomicUsize::new(0));
        let universes = key("universes");
        let podcasts = key("podcasts");
        let (release, gate) = oneshot::channel::<()>();

        let gated_calls = Arc::clone(&calls);
        let fetch = cache.fetch_cached(&podcasts, move || async move {
            gated_calls.fetch_add(1, Ordering::SeqCst);
            gate.await.map_err(|_| SourceError::Transport("gate dropped".into()))?;
            Ok::<_, SourceError>(vec!["episode"])
        });
        let invalidator = async {
            tokio::task::yield_now().await;
            cache.invalidate(&universes);
            let _ = release.send(());
        };

        let (value, ()) = tokio::join!(fetch, invalidator);
        assert_eq!(value.expect("podcasts"), vec!["episode"]);
        assert!(cache.contains(&podcasts));

        let again = cache
            .fetch_cached(&podcasts, counting_query(&calls, vec!["refetched"]))
            .await
            .expect("cached podcasts");
        assert_eq!(again, vec!["episode"]);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn invalidating_a_key_discards_its_in_flight_result() {
        let cache = QueryCache::new(CacheConfig::default());
        let k = key("universes");
        let (release, gate) = oneshot::channel::<()>();

        let fetch = cache.fetch_cached(&k, move || async move {
            gate.await.map_err(|_| SourceError::Transport("gate dropped".into()))?;
            Ok::<_, SourceError>(vec![1_u8])
        });
        let invalidator = async {
            tokio::task::yield_now().await;
            cache.invalidate(&k);
            let _ = release.send(());
        };

        let (value, ()) = tokio::join!(fetch, invalidator);
        assert_eq!(value.expect("caller still receives result"), vec![1]);
        assert!(!cache.contains(&k));
    }

    #[tokio::test]
    async fn disabled_cache_always_queries() {
        let cache = QueryCache::new(CacheConfig {
            enabled: false,
            ..Default::default()
        });
        let calls = Arc::new(AtomicUsize::new(0));
        let k = key("quotes");

        for _ in 0..3 {
            cache
                .fetch_cached(&k, counting_query(&calls, vec!["q"]))
                .await
                .expect("fetch");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn capacity_evicts_least_recently_used() {
        let cache = QueryCache::new(CacheConfig {
            max_entries: 2,
            ..Default::default()
        });

        for raw in ["k1", "k2", "k3"] {
            cache
                .fetch_cached(&key(raw), || async { Ok::<_, SourceError>(1_u8) })
                .await
                .expect("fetch");
        }

        assert!(!cache.contains(&key("k1")));
        assert!(cache.contains(&key("k2")));
        assert!(cache.contains(&key("k3")));
    }

    #[tokio::test]
    async fn mismatched_type_is_treated_as_miss() {
        let cache = QueryCache::new(CacheConfig::default());
        let k = key("shared-key");

        cache
            .fetch_cached(&k, || async { Ok::<_, SourceError>(7_u32) })
            .await
            .expect("seed");
        let text = cache
            .fetch_cached(&k, || async { Ok::<_, SourceError>(String::from("text")) })
            .await
            .expect("refetched as string");
        assert_eq!(text, "text");
    }
}
