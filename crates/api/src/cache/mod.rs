//! Catalog page cache.
//!
//! Listings are cached as the JSON array of [`Book`] they serialize to. Keys
//! live under the `books:` prefix in two disjoint namespaces:
//!
//! - `books:page:{n}` - one page of the catalog in insertion order
//! - `books:search:{keyword}` - exact title/author matches for a keyword
//!
//! A catalog import purges the whole prefix. Entries also expire after the
//! configured TTL, which bounds how long a page populated concurrently with
//! an import can stay stale.
//!
//! Two backends are available: Redis (shared between instances) and an
//! in-process `moka` cache used when no Redis URL is configured.

mod memory;
mod redis;

use std::fmt;
use std::time::Duration;

use secrecy::ExposeSecret;
use thiserror::Error;

use bookstore_core::PageNumber;

use crate::config::CatalogConfig;
use crate::models::Book;

pub use self::memory::MemoryCache;
pub use self::redis::RedisCache;

/// Prefix shared by every catalog key.
pub const CATALOG_PREFIX: &str = "books:";

/// Errors from the cache backends.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("redis error: {0}")]
    Redis(#[from] ::redis::RedisError),

    #[error("cache payload error: {0}")]
    Payload(#[from] serde_json::Error),
}

/// Key for one cached catalog listing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A page of the insertion-ordered catalog.
    Page(PageNumber),
    /// Exact-match search results.
    Search(String),
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Page(page) => write!(f, "{CATALOG_PREFIX}page:{page}"),
            Self::Search(keyword) => write!(f, "{CATALOG_PREFIX}search:{keyword}"),
        }
    }
}

/// Cache in front of the catalog read path.
#[derive(Clone)]
pub enum CatalogCache {
    Redis(RedisCache),
    Memory(MemoryCache),
}

impl CatalogCache {
    /// Build the cache described by the catalog config.
    ///
    /// Connects to Redis when a URL is configured, otherwise falls back to
    /// the in-process cache.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if the Redis connection cannot be made.
    pub async fn from_config(config: &CatalogConfig) -> Result<Self, CacheError> {
        match &config.redis_url {
            Some(url) => {
                let cache = RedisCache::connect(url.expose_secret(), config.cache_ttl).await?;
                Ok(Self::Redis(cache))
            }
            None => Ok(Self::in_memory(config.cache_ttl)),
        }
    }

    /// In-process cache with the given TTL (`None` = no expiry).
    #[must_use]
    pub fn in_memory(ttl: Option<Duration>) -> Self {
        Self::Memory(MemoryCache::new(ttl))
    }

    /// Backend name, for logs.
    #[must_use]
    pub const fn backend(&self) -> &'static str {
        match self {
            Self::Redis(_) => "redis",
            Self::Memory(_) => "memory",
        }
    }

    /// Look up a cached listing.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the payload is not a valid
    /// book list.
    pub async fn get(&self, key: &CacheKey) -> Result<Option<Vec<Book>>, CacheError> {
        let key = key.to_string();
        let payload = match self {
            Self::Redis(cache) => cache.get(&key).await?,
            Self::Memory(cache) => cache.get(&key).await,
        };
        payload
            .map(|json| serde_json::from_str(&json))
            .transpose()
            .map_err(CacheError::from)
    }

    /// Store a listing.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the backend write fails.
    pub async fn set(&self, key: &CacheKey, books: &[Book]) -> Result<(), CacheError> {
        let key = key.to_string();
        let payload = serde_json::to_string(books)?;
        match self {
            Self::Redis(cache) => cache.set(&key, payload).await,
            Self::Memory(cache) => {
                cache.set(key, payload).await;
                Ok(())
            }
        }
    }

    /// Whether a listing is cached under `key`.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if the backend fails.
    pub async fn contains(&self, key: &CacheKey) -> Result<bool, CacheError> {
        let key = key.to_string();
        match self {
            Self::Redis(cache) => cache.contains(&key).await,
            Self::Memory(cache) => Ok(cache.contains(&key)),
        }
    }

    /// Drop every catalog listing.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Redis` if the backend fails.
    pub async fn invalidate_catalog(&self) -> Result<(), CacheError> {
        match self {
            Self::Redis(cache) => {
                let purged = cache.purge().await?;
                tracing::debug!(purged, "Purged catalog keys from redis");
                Ok(())
            }
            Self::Memory(cache) => {
                cache.purge();
                Ok(())
            }
        }
    }
}
