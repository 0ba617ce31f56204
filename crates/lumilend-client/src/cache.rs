use std::collections::HashMap;
use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use tokio::time::Instant;
use tracing::trace;

struct CacheEntry<V> {
    value: V,
    fetched_at: Instant,
}

/// Read-through cache keyed by string, with a freshness window per lookup.
/// Stores whatever the fetcher returns, including "not found" results, so
/// a missing entry is not re-fetched until its window lapses.
///
/// Concurrent lookups of the same cold key each run the fetcher; the last
/// writer wins. That matches a refresh-on-read UI where the duplicate fetch
/// is rare and harmless.
pub struct TtlCache<V> {
    entries: Mutex<HashMap<String, CacheEntry<V>>>,
}

impl<V: Clone> TtlCache<V> {
    pub fn new() -> TtlCache<V> {
        TtlCache { entries: Mutex::new(HashMap::new()) }
    }

    /// Returns the cached value when it is younger than `ttl`, otherwise
    /// runs `fetch` and caches its result. The lock is never held across
    /// the fetch.
    pub async fn get_or_fetch<F, Fut>(&self, key: &str, ttl: Duration, fetch: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        {
            let entries = self.entries.lock().unwrap();
            if let Some(entry) = entries.get(key) {
                if entry.fetched_at.elapsed() < ttl {
                    trace!(key, "cache hit");
                    return entry.value.clone();
                }
            }
        }
        trace!(key, "cache miss");
        let value = fetch().await;
        self.entries.lock().unwrap().insert(
            key.to_string(),
            CacheEntry { value: value.clone(), fetched_at: Instant::now() },
        );
        value
    }

    pub fn invalidate(&self, key: &str) {
        self.entries.lock().unwrap().remove(key);
    }

    pub fn clear(&self) {
        self.entries.lock().unwrap().clear();
    }
}

impl<V: Clone> Default for TtlCache<V> {
    fn default() -> TtlCache<V> {
        TtlCache::new()
    }
}
