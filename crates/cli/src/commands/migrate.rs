//! Database migration command.
//!
//! # Usage
//!
//! ```bash
//! bookstore migrate
//! ```
//!
//! # Environment Variables
//!
//! - `BOOKSTORE_DATABASE_URL` - `PostgreSQL` connection string (falls back to `DATABASE_URL`)
//!
//! Migrations live in `crates/api/migrations/`.

use bookstore_api::config::{ConfigError, get_database_url};
use bookstore_api::db::create_pool;
use thiserror::Error;

/// Errors that can occur while migrating.
#[derive(Debug, Error)]
pub enum MigrationError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Run all pending migrations.
///
/// # Errors
///
/// Returns an error if the database is unreachable or a migration fails.
pub async fn run() -> Result<(), MigrationError> {
    let database_url = get_database_url("BOOKSTORE_DATABASE_URL")?;

    tracing::info!("Connecting to bookstore database...");
    let pool = create_pool(&database_url).await?;

    tracing::info!("Running bookstore migrations...");
    sqlx::migrate!("../api/migrations").run(&pool).await?;

    tracing::info!("Bookstore migrations complete!");
    Ok(())
}
