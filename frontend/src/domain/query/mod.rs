//! Revalidating query cache.
//!
//! [`QueryCache`] maps normalized request paths to cache entries. Each entry
//! holds the last data, the last error and at most one in-flight request;
//! concurrent callers for the same key join that request instead of issuing
//! another. Results are published to [`QueryHandle`] subscribers through a
//! watch channel, so stale data stays visible while a revalidation runs.
//!
//! The cache is constructed once per application instance and torn down with
//! [`QueryCache::shutdown`]. Its mutation surface is
//! [`QueryCache::get_or_fetch`] and [`QueryCache::invalidate`]. Explicit
//! revalidation ([`QueryCache::mutate`]) always starts a new request; a
//! request it supersedes resolves to the newer result.

mod config;
mod entry;
mod handle;
mod retry;

pub use config::{QueryConfig, RevalidationEvent};
pub use handle::{QueryHandle, QuerySnapshot, ViewState};
pub use retry::{BackoffJitter, NoJitter, RandomJitter, RetryPolicy};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use futures_util::FutureExt;
use mockable::{Clock, DefaultClock};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

use self::entry::{CacheEntry, InFlight};
use crate::domain::{ApiPath, ClientError, FetchClient, FetchError, RequestOptions};

/// Time and jitter sources used by the cache.
pub struct QueryRuntime {
    /// Clock used for dedupe windows and backoff deadlines.
    pub clock: Arc<dyn Clock + Send + Sync>,
    /// Jitter applied to backoff delays.
    pub jitter: Arc<dyn BackoffJitter>,
}

impl Default for QueryRuntime {
    fn default() -> Self {
        Self {
            clock: Arc::new(DefaultClock),
            jitter: Arc::new(RandomJitter),
        }
    }
}

/// Process-wide query cache keyed by [`ApiPath`].
///
/// Cloning is cheap and shares the same entries.
///
/// # Examples
/// ```no_run
/// use std::sync::Arc;
/// use std::time::Duration;
/// use frontend::domain::{FetchClient, QueryCache, QueryConfig, RequestOptions, Stock};
/// use frontend::outbound::http::ReqwestTransport;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let origin = url::Url::parse("http://127.0.0.1:5000")?;
/// let transport = ReqwestTransport::new(origin, Duration::from_secs(10))?;
/// let cache = QueryCache::new(FetchClient::new(Arc::new(transport)));
/// let mut stocks = cache.query::<Vec<Stock>>("/stocks", RequestOptions::get(), QueryConfig::default());
/// if let Some(snapshot) = stocks.settled().await {
///     println!("{:?}", snapshot.data);
/// }
/// cache.shutdown();
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct QueryCache {
    inner: Arc<CacheInner>,
}

struct CacheInner {
    client: FetchClient,
    runtime: QueryRuntime,
    entries: Mutex<HashMap<ApiPath, CacheEntry>>,
    generation: AtomicU64,
    closed: AtomicBool,
}

impl QueryCache {
    /// Create a cache using the system clock and random jitter.
    pub fn new(client: FetchClient) -> Self {
        Self::with_runtime(client, QueryRuntime::default())
    }

    /// Create a cache with explicit time and jitter sources.
    pub fn with_runtime(client: FetchClient, runtime: QueryRuntime) -> Self {
        Self {
            inner: Arc::new(CacheInner {
                client,
                runtime,
                entries: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// The fetch client used for network calls.
    #[must_use]
    pub fn client(&self) -> &FetchClient {
        &self.inner.client
    }

    /// Subscribe to `path`, starting a fetch in the background when the entry
    /// is empty or due for mount revalidation.
    ///
    /// `options` only take effect if this call creates the entry. Background
    /// fetches need a Tokio runtime; without one they are deferred until the
    /// next [`QueryHandle::mutate`] or [`QueryCache::get_or_fetch`].
    pub fn query<D: DeserializeOwned>(
        &self,
        path: impl AsRef<str>,
        options: RequestOptions,
        config: QueryConfig,
    ) -> QueryHandle<D> {
        let key = ApiPath::normalize(path);
        let subscription = Arc::new(config);
        let now = self.now();
        let (receiver, started) = {
            let mut entries = self.lock_entries();
            if self.is_closed() {
                debug!(key = %key, "query after shutdown");
                let receiver = CacheEntry::closed_receiver();
                return QueryHandle::new(self.clone(), key, subscription, receiver);
            }
            let entry = entries
                .entry(key.clone())
                .or_insert_with(|| CacheEntry::new(options, subscription.retry));
            entry.subscribe(&subscription);
            let started = entry
                .mount_due(&subscription, now)
                .then(|| self.begin_fetch(&key, entry));
            (entry.receiver(), started)
        };
        if let Some(in_flight) = started {
            self.drive(&key, in_flight, "mount");
        }
        QueryHandle::new(self.clone(), key, subscription, receiver)
    }

    /// Return the cached result for `key`, fetching when the entry is empty
    /// or stale and joining any request already in flight.
    ///
    /// # Errors
    /// Returns the [`FetchError`] of the settled request, or a transport
    /// [`ClientError`] after [`QueryCache::shutdown`].
    pub async fn get_or_fetch(&self, key: &ApiPath) -> Result<Value, FetchError> {
        let in_flight = {
            let mut entries = self.lock_entries();
            if self.is_closed() {
                return Err(shut_down());
            }
            let entry = entries.entry(key.clone()).or_insert_with(|| {
                CacheEntry::new(RequestOptions::default(), RetryPolicy::default())
            });
            if let Some(cached) = entry.cached_result() {
                return cached;
            }
            self.begin_fetch(key, entry)
        };
        in_flight.await
    }

    /// Mark `key` stale so the next [`QueryCache::get_or_fetch`] refetches.
    /// Cached data stays visible to subscribers until the refetch settles.
    pub fn invalidate(&self, key: &ApiPath) {
        if let Some(entry) = self.lock_entries().get_mut(key) {
            entry.stale = true;
        }
    }

    /// Revalidate `key` now, ignoring dedupe and backoff.
    ///
    /// A request already in flight for `key` is superseded: its result is
    /// discarded and everyone awaiting it receives this request's result.
    ///
    /// # Errors
    /// See [`QueryCache::get_or_fetch`].
    pub async fn mutate(&self, key: &ApiPath) -> Result<Value, FetchError> {
        let in_flight = {
            let mut entries = self.lock_entries();
            if self.is_closed() {
                return Err(shut_down());
            }
            let entry = entries.entry(key.clone()).or_insert_with(|| {
                CacheEntry::new(RequestOptions::default(), RetryPolicy::default())
            });
            entry.stale = true;
            self.start_fetch(key, entry)
        };
        in_flight.await
    }

    /// Revalidate every entry whose subscribers asked for `event`, subject to
    /// dedupe and backoff.
    pub fn notify(&self, event: RevalidationEvent) {
        if self.is_closed() {
            return;
        }
        let now = self.now();
        let started: Vec<(ApiPath, InFlight)> = {
            let mut entries = self.lock_entries();
            entries
                .iter_mut()
                .filter_map(|(key, entry)| {
                    if !entry.event_due(event, now) {
                        return None;
                    }
                    entry.stale = true;
                    Some((key.clone(), self.begin_fetch(key, entry)))
                })
                .collect()
        };
        for (key, in_flight) in started {
            self.drive(&key, in_flight, event.as_str());
        }
    }

    /// Drop every entry and refuse further fetches. Subscribers observe the
    /// closed channel through [`QueryHandle::changed`] returning `None`.
    pub fn shutdown(&self) {
        self.inner.closed.store(true, Ordering::Release);
        let drained: Vec<CacheEntry> = self
            .lock_entries()
            .drain()
            .map(|(_, entry)| entry)
            .collect();
        debug!(entries = drained.len(), "query cache shut down");
    }

    fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    fn now(&self) -> DateTime<Utc> {
        self.inner.runtime.clock.utc()
    }

    fn lock_entries(&self) -> MutexGuard<'_, HashMap<ApiPath, CacheEntry>> {
        self.inner
            .entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Join the in-flight request for `entry` or register a new one. The
    /// returned future is not polled here; callers await it after releasing
    /// the entries lock.
    fn begin_fetch(&self, key: &ApiPath, entry: &mut CacheEntry) -> InFlight {
        if let Some((_, in_flight)) = &entry.in_flight {
            return in_flight.clone();
        }
        self.start_fetch(key, entry)
    }

    /// Register a new request for `entry`, superseding any in flight.
    fn start_fetch(&self, key: &ApiPath, entry: &mut CacheEntry) -> InFlight {
        if let Some((superseded, _)) = &entry.in_flight {
            debug!(key = %key, superseded, "superseding in-flight query fetch");
        }
        let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
        let client = self.inner.client.clone();
        let owner = Arc::downgrade(&self.inner);
        let target = key.clone();
        let options = entry.options.clone();
        let in_flight = async move {
            let result = client.fetch_value(target.as_str(), options).await;
            let settlement = match owner.upgrade() {
                Some(inner) => inner.settle(&target, generation, &result),
                None => Settlement::Kept,
            };
            match settlement {
                Settlement::Kept => result,
                Settlement::Follow(newer) => newer.await,
                Settlement::Latest(latest) => latest,
            }
        }
        .boxed()
        .shared();
        entry.in_flight = Some((generation, in_flight.clone()));
        entry.mark_validating();
        debug!(key = %key, generation, "query fetch started");
        in_flight
    }

    fn drive(&self, key: &ApiPath, in_flight: InFlight, trigger: &'static str) {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                let key = key.clone();
                drop(handle.spawn(async move {
                    if let Err(error) = in_flight.await {
                        debug!(key = %key, trigger, error = %error, "query revalidation failed");
                    }
                }));
            }
            Err(_) => {
                warn!(key = %key, trigger, "no async runtime; revalidation deferred");
            }
        }
    }
}

fn shut_down() -> FetchError {
    ClientError::transport("query cache has been shut down").into()
}

/// What a finished request hands to its awaiters.
enum Settlement {
    /// Its own result, recorded or with nowhere left to record it.
    Kept,
    /// A newer request for the key is still running.
    Follow(InFlight),
    /// A newer request already settled with this result.
    Latest(Result<Value, FetchError>),
}

impl CacheInner {
    fn settle(
        &self,
        key: &ApiPath,
        generation: u64,
        result: &Result<Value, FetchError>,
    ) -> Settlement {
        let now = self.runtime.clock.utc();
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let Some(entry) = entries.get_mut(key) else {
            return Settlement::Kept;
        };
        if !entry.owns_fetch(generation) {
            debug!(key = %key, generation, "discarding superseded query fetch");
            return match &entry.in_flight {
                Some((_, newer)) => Settlement::Follow(newer.clone()),
                None => entry.latest_result().map_or(Settlement::Kept, Settlement::Latest),
            };
        }
        match result {
            Ok(value) => {
                entry.record_success(value.clone(), now);
                debug!(key = %key, generation, "query fetch settled");
            }
            Err(error) => {
                let failures = entry.failures().saturating_add(1);
                let base = entry.retry().base_delay(failures);
                let delay = self.runtime.jitter.jittered_delay(base, failures);
                entry.record_failure(error.clone(), now, delay);
                debug!(
                    key = %key,
                    generation,
                    failures,
                    retry_after_ms = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                    error = %error,
                    "query fetch failed"
                );
            }
        }
        Settlement::Kept
    }
}
