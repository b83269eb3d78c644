//! In-process cache backend.

use std::time::Duration;

use moka::future::Cache;

/// Upper bound on cached listings held in memory.
const MAX_ENTRIES: u64 = 10_000;

/// `moka` cache of serialized listings.
#[derive(Clone)]
pub struct MemoryCache {
    inner: Cache<String, String>,
}

impl MemoryCache {
    #[must_use]
    pub fn new(ttl: Option<Duration>) -> Self {
        let builder = Cache::builder().max_capacity(MAX_ENTRIES);
        let inner = match ttl {
            Some(ttl) => builder.time_to_live(ttl).build(),
            None => builder.build(),
        };
        Self { inner }
    }

    pub async fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key).await
    }

    pub async fn set(&self, key: String, payload: String) {
        self.inner.insert(key, payload).await;
    }

    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.inner.contains_key(key)
    }

    /// Invalidate everything. Only catalog listings live in this cache.
    pub fn purge(&self) {
        self.inner.invalidate_all();
    }
}
