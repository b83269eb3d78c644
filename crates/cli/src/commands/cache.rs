//! Catalog cache maintenance.

use bookstore_api::cache::{CacheError, CatalogCache};
use bookstore_api::config::{CatalogConfig, ConfigError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    #[error("BOOKSTORE_REDIS_URL is not set, there is no shared cache to flush")]
    NoSharedCache,
}

/// Drop every cached page and search listing from Redis.
///
/// # Errors
///
/// Returns an error if Redis is not configured or cannot be reached.
pub async fn flush() -> Result<(), CacheCommandError> {
    let config = CatalogConfig::from_env()?;
    if config.redis_url.is_none() {
        return Err(CacheCommandError::NoSharedCache);
    }

    let cache = CatalogCache::from_config(&config).await?;
    cache.invalidate_catalog().await?;

    tracing::info!("Catalog cache flushed");
    Ok(())
}
