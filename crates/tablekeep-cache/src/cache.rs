//! The query cache: keyed, typed, deduplicating, generation-checked.
//!
//! # Concurrency note
//!
//! The entry map sits behind a plain `std::sync::Mutex`. The lock is
//! only held for bookkeeping, never across an `.await`, which lets
//! [`QueryCache::read`] do its bookkeeping synchronously before the
//! returned future is first polled. Callers rely on that: after `read()`
//! returns, the entry is already marked as fetching.

use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use tablekeep_protocol::ApiError;
use tokio::sync::broadcast;
use tokio::time::Instant;
use tracing::{debug, trace, warn};

use crate::{
    CacheConfig, CacheError, CacheEvent, LoadState, QueryKey, QueryOptions, QueryState,
    RetryPolicy,
};

type AnyValue = Arc<dyn Any + Send + Sync>;
type FetchResult = Result<AnyValue, ApiError>;
type SharedFetch = Shared<BoxFuture<'static, FetchResult>>;

/// One cached resource.
#[derive(Default)]
struct Entry {
    value: Option<AnyValue>,
    updated_at: Option<Instant>,
    invalidated: bool,
    status: LoadState,
    error: Option<ApiError>,
    in_flight: Option<SharedFetch>,
    generation: u64,
}

impl Entry {
    /// The stored value, if it may be served under `stale_time`.
    fn fresh_value(&self, stale_time: std::time::Duration, now: Instant) -> Option<AnyValue> {
        if self.invalidated {
            return None;
        }
        let updated_at = self.updated_at?;
        if now.saturating_duration_since(updated_at) >= stale_time {
            return None;
        }
        self.value.clone()
    }

    /// Marks the entry stale and detaches any in-flight fetch, so the
    /// next read starts a new request instead of joining one that began
    /// before the invalidation.
    fn invalidate(&mut self) {
        self.invalidated = true;
        self.generation += 1;
        if self.in_flight.take().is_some() && self.value.is_none() {
            self.status = LoadState::Idle;
        }
    }

    fn snapshot(&self) -> QueryState {
        QueryState {
            status: self.status,
            invalidated: self.invalidated,
            fetching: self.in_flight.is_some(),
            updated_at: self.updated_at,
            error: self.error.clone(),
        }
    }
}

/// What `read` decided while holding the lock.
enum Plan {
    Hit(AnyValue),
    Wait { fetch: SharedFetch, generation: u64 },
}

struct Inner {
    entries: Mutex<HashMap<QueryKey, Entry>>,
    events: broadcast::Sender<CacheEvent>,
    config: CacheConfig,
}

impl Inner {
    fn lock(&self) -> MutexGuard<'_, HashMap<QueryKey, Entry>> {
        // The map stays structurally valid even if a holder panicked.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: CacheEvent) {
        // No subscribers is fine.
        let _ = self.events.send(event);
    }

    /// Records a completed fetch, unless it was superseded.
    fn settle(&self, key: &QueryKey, generation: u64, result: FetchResult) -> FetchResult {
        let event = {
            let mut entries = self.lock();
            let Some(entry) = entries.get_mut(key) else {
                return result;
            };

            if entry.generation != generation {
                debug!(%key, "discarding result of superseded fetch");
                // Hand the caller the value that replaced it, when there
                // is a trustworthy one.
                return match (&entry.value, entry.invalidated) {
                    (Some(value), false) => Ok(Arc::clone(value)),
                    _ => result,
                };
            }

            if entry.in_flight.take().is_none() {
                // Another waiter on the same fetch already settled it.
                return result;
            }

            match &result {
                Ok(value) => {
                    entry.value = Some(Arc::clone(value));
                    entry.updated_at = Some(Instant::now());
                    entry.invalidated = false;
                    entry.status = LoadState::Ready;
                    entry.error = None;
                    debug!(%key, "fetch stored");
                    CacheEvent::Fetched(key.clone())
                }
                Err(err) => {
                    if entry.invalidated {
                        // An invalidated value is never served again; the
                        // failure is now the settled answer.
                        entry.value = None;
                        entry.updated_at = None;
                        entry.invalidated = false;
                    }
                    entry.status = LoadState::Error;
                    entry.error = Some(err.clone());
                    debug!(%key, error = %err, "fetch failed");
                    CacheEvent::Failed(key.clone())
                }
            }
        };

        self.emit(event);
        result
    }
}

/// A process-wide cache of async resources.
///
/// `QueryCache` is a cheap handle (`Arc` inside); clone it to share the
/// same cache between the session controller and resource queries.
///
/// ## Example
///
/// ```rust
/// # async fn demo() -> Result<(), tablekeep_cache::CacheError> {
/// use tablekeep_cache::{QueryCache, QueryKey};
///
/// let cache = QueryCache::default();
/// let key = QueryKey::new("greeting");
///
/// let value = cache.read(&key, || async { Ok::<_, tablekeep_protocol::ApiError>("hello".to_string()) }).await?;
/// assert_eq!(value.as_str(), "hello");
///
/// cache.invalidate(&key); // next read re-fetches
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<Inner>,
}

impl QueryCache {
    pub fn new(config: CacheConfig) -> Self {
        let config = config.validated();
        let (events, _) = broadcast::channel(config.event_capacity);
        Self {
            inner: Arc::new(Inner {
                entries: Mutex::new(HashMap::new()),
                events,
                config,
            }),
        }
    }

    pub fn config(&self) -> &CacheConfig {
        &self.inner.config
    }

    /// Reads `key` with the default options. See [`read_with`](Self::read_with).
    pub fn read<T, F, Fut>(
        &self,
        key: &QueryKey,
        fetch: F,
    ) -> impl Future<Output = Result<Arc<T>, CacheError>> + Send + 'static
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        self.read_with(key, self.inner.config.default_options(), fetch)
    }

    /// Returns the cached value for `key`, fetching it if there is none
    /// or it is stale.
    ///
    /// The bookkeeping happens *now*, before the returned future is
    /// polled: a fresh value is captured, or a fetch is registered as
    /// in flight (or an existing one joined). The future then only waits.
    ///
    /// `fetch` may be called more than once when `options.retry` allows
    /// retries; it is never called for a cache hit or a joined fetch.
    pub fn read_with<T, F, Fut>(
        &self,
        key: &QueryKey,
        options: QueryOptions,
        fetch: F,
    ) -> impl Future<Output = Result<Arc<T>, CacheError>> + Send + 'static
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let plan = self.plan(key, options, fetch);
        let inner = Arc::clone(&self.inner);
        let key = key.clone();

        async move {
            let value = match plan {
                Plan::Hit(value) => value,
                Plan::Wait { fetch, generation } => {
                    let result = fetch.await;
                    inner.settle(&key, generation, result)?
                }
            };
            value
                .downcast::<T>()
                .map_err(|_| CacheError::TypeMismatch(key))
        }
    }

    fn plan<T, F, Fut>(&self, key: &QueryKey, options: QueryOptions, fetch: F) -> Plan
    where
        T: Send + Sync + 'static,
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
    {
        let now = Instant::now();
        let plan = {
            let mut entries = self.inner.lock();
            let entry = entries.entry(key.clone()).or_default();

            if let Some(value) = entry.fresh_value(options.stale_time, now) {
                trace!(%key, "cache hit");
                return Plan::Hit(value);
            }

            if let Some(in_flight) = &entry.in_flight {
                debug!(%key, "joining in-flight fetch");
                return Plan::Wait {
                    fetch: in_flight.clone(),
                    generation: entry.generation,
                };
            }

            entry.generation += 1;
            let shared = fetch_with_retry(key.clone(), fetch, options.retry)
                .boxed()
                .shared();
            entry.in_flight = Some(shared.clone());
            entry.error = None;
            if entry.value.is_none() {
                entry.status = LoadState::Loading;
            }

            Plan::Wait {
                fetch: shared,
                generation: entry.generation,
            }
        };

        debug!(%key, "fetch started");
        self.inner.emit(CacheEvent::Fetching(key.clone()));
        plan
    }

    /// Marks `key` stale. Never blocks and never fetches; the next read
    /// does. A fetch already in flight is detached and its result will
    /// be discarded.
    pub fn invalidate(&self, key: &QueryKey) {
        if let Some(entry) = self.inner.lock().get_mut(key) {
            entry.invalidate();
        }
        debug!(%key, "query invalidated");
        self.inner.emit(CacheEvent::Invalidated(key.clone()));
    }

    /// Replaces the value of `key` immediately, without a network call.
    ///
    /// The entry becomes `Ready` and fresh. Any in-flight fetch for the
    /// key is detached; its late result will not overwrite `value`.
    pub fn reset<T: Send + Sync + 'static>(&self, key: &QueryKey, value: T) {
        {
            let mut entries = self.inner.lock();
            let entry = entries.entry(key.clone()).or_default();
            let generation = entry.generation + 1;
            *entry = Entry {
                value: Some(Arc::new(value)),
                updated_at: Some(Instant::now()),
                invalidated: false,
                status: LoadState::Ready,
                error: None,
                in_flight: None,
                generation,
            };
        }
        debug!(%key, "query reset");
        self.inner.emit(CacheEvent::Reset(key.clone()));
    }

    /// Marks every key except `keep` stale. Returns the keys invalidated.
    pub fn invalidate_all_except(&self, keep: &QueryKey) -> Vec<QueryKey> {
        self.invalidate_matching(|key| key != keep)
    }

    /// Marks every key stale. Returns the keys invalidated.
    pub fn invalidate_all(&self) -> Vec<QueryKey> {
        self.invalidate_matching(|_| true)
    }

    fn invalidate_matching(&self, mut matches: impl FnMut(&QueryKey) -> bool) -> Vec<QueryKey> {
        let mut invalidated: Vec<QueryKey> = {
            let mut entries = self.inner.lock();
            entries
                .iter_mut()
                .filter(|(key, _)| matches(key))
                .map(|(key, entry)| {
                    entry.invalidate();
                    key.clone()
                })
                .collect()
        };
        invalidated.sort();

        debug!(count = invalidated.len(), "queries invalidated");
        for key in &invalidated {
            self.inner.emit(CacheEvent::Invalidated(key.clone()));
        }
        invalidated
    }

    /// The current state of `key`, or `None` if it was never touched.
    pub fn state(&self, key: &QueryKey) -> Option<QueryState> {
        self.inner.lock().get(key).map(Entry::snapshot)
    }

    /// The stored value of `key` without fetching.
    ///
    /// Returns `None` for invalidated entries, whose identity-scoped
    /// value must not be shown, and for a value of a different type.
    /// Values past their stale time are still returned.
    pub fn peek<T: Send + Sync + 'static>(&self, key: &QueryKey) -> Option<Arc<T>> {
        let value = {
            let entries = self.inner.lock();
            let entry = entries.get(key)?;
            if entry.invalidated {
                return None;
            }
            entry.value.clone()?
        };
        value.downcast::<T>().ok()
    }

    /// All keys the cache knows about, sorted.
    pub fn keys(&self) -> Vec<QueryKey> {
        let mut keys: Vec<QueryKey> = self.inner.lock().keys().cloned().collect();
        keys.sort();
        keys
    }

    /// Subscribes to cache events from this point on.
    pub fn subscribe(&self) -> broadcast::Receiver<CacheEvent> {
        self.inner.events.subscribe()
    }
}

impl Default for QueryCache {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}

/// Runs `fetch`, retrying transient failures per `retry`.
async fn fetch_with_retry<T, F, Fut>(key: QueryKey, fetch: F, retry: RetryPolicy) -> FetchResult
where
    T: Send + Sync + 'static,
    F: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<T, ApiError>> + Send + 'static,
{
    let mut attempt = 0;
    loop {
        match fetch().await {
            Ok(value) => return Ok(Arc::new(value) as AnyValue),
            Err(err) if retry.should_retry(attempt, &err) => {
                attempt += 1;
                let delay = retry.delay_for(attempt);
                warn!(%key, attempt, ?delay, error = %err, "fetch failed, retrying");
                tokio::time::sleep(delay).await;
            }
            Err(err) => return Err(err),
        }
    }
}
