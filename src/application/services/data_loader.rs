use crate::application::ports::cache::CacheInvalidator;
use crate::domain::value_objects::CacheKey;
use crate::shared::error::AppError;
use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use serde::Serialize;
use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

type SharedFetch<V> = Shared<BoxFuture<'static, Result<V, AppError>>>;

#[derive(Clone)]
struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
    expires_at: Instant,
}

struct InFlight<V> {
    id: u64,
    future: SharedFetch<V>,
}

struct LoaderState<V> {
    entries: HashMap<CacheKey, CacheEntry<V>>,
    in_flight: HashMap<CacheKey, InFlight<V>>,
    next_flight: u64,
}

struct Inner<V> {
    state: Mutex<LoaderState<V>>,
    hits: AtomicU64,
    misses: AtomicU64,
    coalesced: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub coalesced: u64,
}

/// Keyed TTL cache in front of async reads.
///
/// Concurrent misses for one key share a single fetch. Failures are never
/// cached. Invalidating a key while its fetch is in flight discards that
/// fetch's result instead of storing it.
pub struct DataLoader<V> {
    inner: Arc<Inner<V>>,
    default_ttl: Duration,
}

impl<V> Clone for DataLoader<V> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
            default_ttl: self.default_ttl,
        }
    }
}

impl<V> DataLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(LoaderState {
                    entries: HashMap::new(),
                    in_flight: HashMap::new(),
                    next_flight: 0,
                }),
                hits: AtomicU64::new(0),
                misses: AtomicU64::new(0),
                coalesced: AtomicU64::new(0),
            }),
            default_ttl,
        }
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub async fn load<F, Fut>(&self, key: CacheKey, fetcher: F, ttl: Duration) -> Result<V, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>> + Send + 'static,
    {
        let flight = {
            let mut state = self.inner.state.lock().await;

            if let Some(entry) = state.entries.get(&key) {
                if entry.expires_at > Instant::now() {
                    self.inner.hits.fetch_add(1, Ordering::Relaxed);
                    return Ok(entry.value.clone());
                }
            }

            if let Some(flight) = state.in_flight.get(&key) {
                self.inner.coalesced.fetch_add(1, Ordering::Relaxed);
                flight.future.clone()
            } else {
                self.inner.misses.fetch_add(1, Ordering::Relaxed);
                state.next_flight += 1;
                let id = state.next_flight;
                let future = Self::start_fetch(Arc::clone(&self.inner), key.clone(), id, fetcher(), ttl);
                state.in_flight.insert(
                    key.clone(),
                    InFlight {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };

        flight.await
    }

    pub async fn load_with_default_ttl<F, Fut>(&self, key: CacheKey, fetcher: F) -> Result<V, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, AppError>> + Send + 'static,
    {
        self.load(key, fetcher, self.default_ttl).await
    }

    fn start_fetch<Fut>(
        inner: Arc<Inner<V>>,
        key: CacheKey,
        id: u64,
        fetch: Fut,
        ttl: Duration,
    ) -> SharedFetch<V>
    where
        Fut: Future<Output = Result<V, AppError>> + Send + 'static,
    {
        async move {
            let result = fetch.await;

            let mut state = inner.state.lock().await;
            let current = state.in_flight.get(&key).map(|flight| flight.id) == Some(id);
            if current {
                state.in_flight.remove(&key);
                match &result {
                    Ok(value) => {
                        let fetched_at = Instant::now();
                        state.entries.insert(
                            key.clone(),
                            CacheEntry {
                                value: value.clone(),
                                fetched_at,
                                expires_at: fetched_at + ttl,
                            },
                        );
                    }
                    Err(err) => {
                        tracing::debug!(
                            target: "offline::cache",
                            key = %key,
                            error = %err,
                            "fetch failed; nothing cached"
                        );
                    }
                }
            } else {
                tracing::debug!(
                    target: "offline::cache",
                    key = %key,
                    "discarding result of invalidated fetch"
                );
            }

            result
        }
        .boxed()
        .shared()
    }

    /// Returns the cached value if it has not expired, without fetching.
    pub async fn peek(&self, key: &CacheKey) -> Option<V> {
        let state = self.inner.state.lock().await;
        state
            .entries
            .get(key)
            .filter(|entry| entry.expires_at > Instant::now())
            .map(|entry| entry.value.clone())
    }

    /// Age of the cached value, if any.
    pub async fn age(&self, key: &CacheKey) -> Option<Duration> {
        let state = self.inner.state.lock().await;
        state.entries.get(key).map(|entry| entry.fetched_at.elapsed())
    }

    pub async fn invalidate(&self, key: &CacheKey) -> bool {
        let mut state = self.inner.state.lock().await;
        state.in_flight.remove(key);
        state.entries.remove(key).is_some()
    }

    /// Drops every entry and in-flight fetch for `resource`, whatever the query.
    pub async fn invalidate_resource(&self, resource: &str) -> usize {
        let removed = {
            let mut state = self.inner.state.lock().await;
            state.in_flight.retain(|key, _| key.resource() != resource);
            let before = state.entries.len();
            state.entries.retain(|key, _| key.resource() != resource);
            before - state.entries.len()
        };
        if removed > 0 {
            tracing::debug!(
                target: "offline::cache",
                resource,
                removed,
                "invalidated cached reads"
            );
        }
        removed
    }

    pub async fn clear(&self) {
        let mut state = self.inner.state.lock().await;
        state.in_flight.clear();
        state.entries.clear();
    }

    pub async fn cleanup_expired(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        let now = Instant::now();
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.expires_at > now);
        before - state.entries.len()
    }

    pub async fn size(&self) -> usize {
        self.inner.state.lock().await.entries.len()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.inner.hits.load(Ordering::Relaxed),
            misses: self.inner.misses.load(Ordering::Relaxed),
            coalesced: self.inner.coalesced.load(Ordering::Relaxed),
        }
    }
}

#[async_trait]
impl<V> CacheInvalidator for DataLoader<V>
where
    V: Clone + Send + Sync + 'static,
{
    async fn invalidate_resource(&self, resource: &str) -> usize {
        DataLoader::invalidate_resource(self, resource).await
    }
}
