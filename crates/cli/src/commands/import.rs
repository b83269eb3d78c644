//! Catalog import from a CSV file on disk.
//!
//! Same parser and transaction as `POST /addbooks`: the whole file is
//! validated first, then applied atomically, then the catalog cache is
//! purged.
//!
//! # Environment Variables
//!
//! - `BOOKSTORE_DATABASE_URL` - `PostgreSQL` connection string
//! - `BOOKSTORE_REDIS_URL` - Catalog cache to purge after the import

use std::fs::File;
use std::path::Path;

use bookstore_api::cache::{CacheError, CatalogCache};
use bookstore_api::config::{CatalogConfig, ConfigError, get_database_url};
use bookstore_api::db::{PgStore, create_pool};
use bookstore_api::services::catalog::{CatalogError, CatalogService};
use bookstore_api::services::import::{ImportError, parse_catalog};
use thiserror::Error;

/// Errors that can occur during an import.
#[derive(Debug, Error)]
pub enum ImportCommandError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Cannot open {path}: {source}")]
    Open {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid CSV: {0}")]
    Parse(#[from] ImportError),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Cache connection error: {0}")]
    Cache(#[from] CacheError),

    #[error("Import failed: {0}")]
    Catalog(#[from] CatalogError),
}

/// Import books from `path`.
///
/// # Errors
///
/// Returns an error if the file is unreadable or invalid, or if the import
/// transaction fails. Nothing is written in either case.
pub async fn run(path: &Path) -> Result<(), ImportCommandError> {
    let file = File::open(path).map_err(|source| ImportCommandError::Open {
        path: path.display().to_string(),
        source,
    })?;
    let rows = parse_catalog(file)?;
    tracing::info!(rows = rows.len(), path = %path.display(), "Parsed catalog file");

    let catalog_config = CatalogConfig::from_env()?;
    let database_url = get_database_url("BOOKSTORE_DATABASE_URL")?;
    let store = PgStore::new(create_pool(&database_url).await?);

    let cache = CatalogCache::from_config(&catalog_config).await?;
    if matches!(cache, CatalogCache::Memory(_)) {
        tracing::warn!(
            "BOOKSTORE_REDIS_URL not set, a running server keeps its cached pages until the TTL expires"
        );
    }

    let summary = CatalogService::new(&store, &cache, catalog_config.books_per_page)
        .import(&rows)
        .await?;

    tracing::info!(
        inserted = summary.inserted,
        restocked = summary.restocked,
        "Import complete"
    );
    Ok(())
}
