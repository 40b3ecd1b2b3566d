//! Read-through TTL cache with single-flight request de-duplication.
//!
//! Entries expire lazily: a stale entry is only evicted when its key is read.
//! Concurrent misses on the same key share one in-flight fetch through a
//! [`Shared`] future, so the underlying fetch runs once no matter how many
//! callers are waiting on it. Failed fetches are never cached.
//!
//! The cache is an explicit handle. Clones share the same storage, which is
//! how services see each other's writes and invalidations.

use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, trace};

/// Result handed to every caller of a fetch. The error is shared because
/// joined callers all observe the same failure.
pub type FetchResult<T, E> = Result<T, Arc<E>>;

type SharedFetch<T, E> = Shared<BoxFuture<'static, FetchResult<T, E>>>;

struct CacheEntry<T> {
    data: T,
    stored_at: Instant,
    ttl: Duration,
}

impl<T> CacheEntry<T> {
    fn new(data: T, ttl: Duration) -> Self {
        Self {
            data,
            stored_at: Instant::now(),
            ttl,
        }
    }

    fn is_fresh(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.stored_at) < self.ttl
    }
}

struct PendingRequest<T, E> {
    id: u64,
    future: SharedFetch<T, E>,
}

struct CacheState<T, E> {
    entries: HashMap<String, CacheEntry<T>>,
    pending: HashMap<String, PendingRequest<T, E>>,
    next_request_id: u64,
}

impl<T: Clone, E> CacheState<T, E> {
    fn fresh_entry(&mut self, key: &str, now: Instant) -> Option<T> {
        match self.entries.get(key) {
            Some(entry) if entry.is_fresh(now) => Some(entry.data.clone()),
            Some(_) => {
                self.entries.remove(key);
                trace!(key, "evicted stale cache entry");
                None
            }
            None => None,
        }
    }

    fn owns_pending(&self, key: &str, id: u64) -> bool {
        self.pending.get(key).is_some_and(|p| p.id == id)
    }
}

fn lock_state<T, E>(state: &Mutex<CacheState<T, E>>) -> MutexGuard<'_, CacheState<T, E>> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Clears the pending marker for one fetch once it settles.
///
/// Only the fetch that registered the marker may clear it or store its
/// result; an invalidation in the meantime hands the key to a newer fetch.
/// If the fetch is dropped mid-flight (for example by a panic) the marker
/// is cleared on drop so the key is not left pointing at a dead future.
struct PendingGuard<T, E> {
    state: Weak<Mutex<CacheState<T, E>>>,
    key: String,
    id: u64,
    ttl: Duration,
    settled: bool,
}

impl<T: Clone, E> PendingGuard<T, E> {
    fn settle(mut self, result: &FetchResult<T, E>) {
        if let Some(state) = self.state.upgrade() {
            let mut state = lock_state(&state);
            if state.owns_pending(&self.key, self.id) {
                state.pending.remove(&self.key);
                if let Ok(data) = result {
                    state
                        .entries
                        .insert(self.key.clone(), CacheEntry::new(data.clone(), self.ttl));
                }
            }
        }
        self.settled = true;
    }
}

impl<T, E> Drop for PendingGuard<T, E> {
    fn drop(&mut self) {
        if self.settled {
            return;
        }
        if let Some(state) = self.state.upgrade() {
            let mut state = lock_state(&state);
            if state.pending.get(&self.key).is_some_and(|p| p.id == self.id) {
                state.pending.remove(&self.key);
            }
        }
    }
}

/// In-memory TTL cache keyed by string, with single-flight fetches.
pub struct RequestCache<T, E> {
    state: Arc<Mutex<CacheState<T, E>>>,
}

impl<T, E> Clone for RequestCache<T, E> {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
        }
    }
}

impl<T, E> Default for RequestCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, E> RequestCache<T, E>
where
    T: Clone + Send + Sync + 'static,
    E: Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(CacheState {
                entries: HashMap::new(),
                pending: HashMap::new(),
                next_request_id: 0,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CacheState<T, E>> {
        lock_state(&self.state)
    }

    /// Cached data for `key` if present and unexpired.
    ///
    /// A stale entry is evicted as a side effect.
    pub fn get(&self, key: &str) -> Option<T> {
        self.lock().fresh_entry(key, Instant::now())
    }

    /// Store `data` under `key` with a fresh timestamp, replacing any entry.
    pub fn set(&self, key: impl Into<String>, data: T, ttl: Duration) {
        self.lock().entries.insert(key.into(), CacheEntry::new(data, ttl));
    }

    /// Return cached data, join an in-flight fetch for `key`, or start one.
    ///
    /// `fetch` runs at most once per miss, however many callers arrive while
    /// it is in flight. On success the result is cached for `ttl`; on failure
    /// nothing is cached and the error reaches every waiting caller. The
    /// pending marker is cleared either way. There is no cancellation: a
    /// caller that stops awaiting leaves the fetch to whoever polls it next.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, fetch: F, ttl: Duration) -> FetchResult<T, E>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        let in_flight = {
            let mut state = self.lock();

            if let Some(data) = state.fresh_entry(key, Instant::now()) {
                trace!(key, "cache hit");
                return Ok(data);
            }

            if let Some(pending) = state.pending.get(key) {
                debug!(key, "joining in-flight fetch");
                pending.future.clone()
            } else {
                let id = state.next_request_id;
                state.next_request_id = state.next_request_id.wrapping_add(1);

                let guard = PendingGuard {
                    state: Arc::downgrade(&self.state),
                    key: key.to_string(),
                    id,
                    ttl,
                    settled: false,
                };
                let owned_key = key.to_string();
                let future = async move {
                    debug!(key = %owned_key, "cache miss, fetching");
                    let result = fetch().await.map_err(Arc::new);
                    guard.settle(&result);
                    result
                }
                .boxed()
                .shared();

                state.pending.insert(
                    key.to_string(),
                    PendingRequest {
                        id,
                        future: future.clone(),
                    },
                );
                future
            }
        };

        in_flight.await
    }

    /// Drop the entry for `key` and forget any fetch in flight for it.
    ///
    /// A fetch that was already running still resolves for its callers but
    /// its result is not stored.
    pub fn invalidate(&self, key: &str) {
        let orphaned = {
            let mut state = self.lock();
            state.entries.remove(key);
            state.pending.remove(key)
        };
        // Released outside the lock: dropping the last handle on a fetch
        // runs its guard, which takes the lock itself.
        drop(orphaned);
    }

    /// Invalidate every key starting with `prefix`.
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let (dropped, orphaned) = {
            let mut state = self.lock();
            let before = state.entries.len();
            state.entries.retain(|key, _| !key.starts_with(prefix));

            let keys: Vec<String> = state
                .pending
                .keys()
                .filter(|key| key.starts_with(prefix))
                .cloned()
                .collect();
            let orphaned: Vec<_> = keys.iter().filter_map(|key| state.pending.remove(key)).collect();
            (before - state.entries.len(), orphaned)
        };
        drop(orphaned);
        dropped
    }

    pub fn clear(&self) {
        let orphaned = {
            let mut state = self.lock();
            state.entries.clear();
            std::mem::take(&mut state.pending)
        };
        drop(orphaned);
    }

    /// Number of stored entries, stale ones included until they are read.
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.lock().pending.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    const TTL: Duration = Duration::from_millis(1_000);

    fn counting_fetch(
        calls: &Arc<AtomicUsize>,
        value: u32,
    ) -> impl FnOnce() -> BoxFuture<'static, Result<u32, String>> + Send + 'static {
        let calls = Arc::clone(calls);
        move || {
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                tokio::time::sleep(Duration::from_millis(50)).await;
                Ok(value)
            }
            .boxed()
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_get_respects_ttl() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        cache.set("agents:dashboard:100:0", 7, TTL);

        tokio::time::advance(Duration::from_millis(999)).await;
        assert_eq!(cache.get("agents:dashboard:100:0"), Some(7));

        tokio::time::advance(Duration::from_millis(1)).await;
        assert_eq!(cache.get("agents:dashboard:100:0"), None);
        assert!(cache.is_empty(), "stale entry should be evicted on read");
    }

    #[tokio::test(start_paused = true)]
    async fn test_set_overwrites_and_refreshes() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        cache.set("k", 1, TTL);
        tokio::time::advance(Duration::from_millis(800)).await;
        cache.set("k", 2, TTL);
        tokio::time::advance(Duration::from_millis(800)).await;
        assert_eq!(cache.get("k"), Some(2));
    }

    #[tokio::test(start_paused = true)]
    async fn test_concurrent_misses_fetch_once() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k", counting_fetch(&calls, 42), TTL),
            cache.get_or_fetch("k", counting_fetch(&calls, 99), TTL),
        );

        assert_eq!(a.unwrap(), 42);
        assert_eq!(b.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(cache.pending_count(), 0);
        assert_eq!(cache.get("k"), Some(42));
    }

    #[tokio::test(start_paused = true)]
    async fn test_hit_skips_fetch() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));
        cache.set("k", 5, TTL);

        let value = cache.get_or_fetch("k", counting_fetch(&calls, 6), TTL).await.unwrap();
        assert_eq!(value, 5);
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_is_not_cached() {
        let cache: RequestCache<u32, String> = RequestCache::new();

        let err = cache
            .get_or_fetch("k", || async { Err::<u32, _>("backend down".to_string()) }, TTL)
            .await
            .unwrap_err();
        assert_eq!(err.as_str(), "backend down");
        assert_eq!(cache.pending_count(), 0);
        assert!(cache.get("k").is_none());

        let calls = Arc::new(AtomicUsize::new(0));
        let value = cache.get_or_fetch("k", counting_fetch(&calls, 3), TTL).await.unwrap();
        assert_eq!(value, 3);
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_joined_callers_share_the_error() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        let failing = || async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            Err::<u32, _>("timeout".to_string())
        };

        let (a, b) = tokio::join!(
            cache.get_or_fetch("k", failing, TTL),
            cache.get_or_fetch("k", || async { Ok::<u32, String>(1) }, TTL),
        );

        let (a, b) = (a.unwrap_err(), b.unwrap_err());
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[tokio::test(start_paused = true)]
    async fn test_invalidate_during_fetch_discards_result() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        let (value, ()) = tokio::join!(
            cache.get_or_fetch("k", counting_fetch(&calls, 10), TTL),
            async { cache.invalidate("k") },
        );

        assert_eq!(value.unwrap(), 10);
        assert_eq!(cache.get("k"), None);
        assert_eq!(cache.pending_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_refetches() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        let calls = Arc::new(AtomicUsize::new(0));

        cache.get_or_fetch("k", counting_fetch(&calls, 1), TTL).await.unwrap();
        tokio::time::advance(TTL).await;
        let value = cache.get_or_fetch("k", counting_fetch(&calls, 2), TTL).await.unwrap();

        assert_eq!(value, 2);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_invalidate_prefix_and_clear() {
        let cache: RequestCache<u32, String> = RequestCache::new();
        cache.set("agents:dashboard:10:0", 1, TTL);
        cache.set("agents:dashboard:10:10", 2, TTL);
        cache.set("agents:wallet:abc", 3, TTL);

        assert_eq!(cache.invalidate_prefix("agents:dashboard:"), 2);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("agents:wallet:abc"), Some(3));

        let other_handle = cache.clone();
        other_handle.clear();
        assert!(cache.is_empty());
    }
}
