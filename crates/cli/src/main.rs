//! Bookstore CLI - migrations, catalog import and cache maintenance.
//!
//! # Usage
//!
//! ```bash
//! # Run database migrations
//! bookstore migrate
//!
//! # Import or restock books from a CSV file
//! bookstore import books.csv
//!
//! # Drop every cached catalog listing
//! bookstore cache flush
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

#[derive(Parser)]
#[command(name = "bookstore")]
#[command(author, version, about = "Bookstore CLI tools")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run database migrations
    Migrate,
    /// Import books from a CSV file (id, author, title, image, quantity, price, description)
    Import {
        /// Path to the CSV file
        path: PathBuf,
    },
    /// Manage the catalog cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,
    },
}

#[derive(Subcommand)]
enum CacheAction {
    /// Remove every cached page and search listing
    Flush,
}

#[tokio::main]
async fn main() {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let result: Result<(), Box<dyn std::error::Error>> = run(cli).await;

    if let Err(e) = result {
        tracing::error!("Command failed: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Migrate => commands::migrate::run().await?,
        Commands::Import { path } => commands::import::run(&path).await?,
        Commands::Cache { action } => match action {
            CacheAction::Flush => commands::cache::flush().await?,
        },
    }
    Ok(())
}
