//! Persistence for the bookstore.
//!
//! # Tables
//!
//! - `users` - Customers (unique username, mobile number, email)
//! - `books` - Catalog, one row per external `book_id`
//! - `cart` - Pending cart lines
//! - `customer_order` - Completed checkouts
//! - `orderbook` - Books belonging to each completed order
//! - `wishlist` - Books a user wants to buy later
//!
//! # Backends
//!
//! Handlers never talk to `PostgreSQL` directly. They go through the [`Store`]
//! trait, implemented by [`PgStore`] for production and [`MemoryStore`] for
//! tests and local development.
//!
//! # Migrations
//!
//! Migrations are stored in `crates/api/migrations/` and run via:
//! ```bash
//! cargo run -p bookstore-cli -- migrate
//! ```

pub mod books;
pub mod carts;
pub mod memory;
pub mod orders;
pub mod pg;
pub mod users;
pub mod wishlist;

use std::future::Future;
use std::time::Duration;

use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use bookstore_core::{BookId, OrderId, UserId};

use crate::models::{
    Book, BookImport, BookSort, CartItem, CartLine, ImportSummary, NewUser, Order, PlacedOrder,
    User, WishlistEntry,
};

pub use memory::MemoryStore;
pub use pg::PgStore;

/// Errors from the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., unique username).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// Restocking the book with this external id would exceed the largest
    /// storable stock count.
    #[error("stock for book {0} would overflow")]
    StockOverflow(i32),
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(database_url: &secrecy::SecretString) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

/// Operations the handlers need from persistence.
///
/// Every multi-row write runs as a single unit: either all of it is visible
/// afterwards or none of it is.
pub trait Store: Clone + Send + Sync + 'static {
    /// Check that the backend is reachable.
    fn ping(&self) -> impl Future<Output = Result<(), RepositoryError>> + Send;

    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a user. `Conflict` names the duplicated field.
    fn create_user(
        &self,
        user: &NewUser,
    ) -> impl Future<Output = Result<User, RepositoryError>> + Send;

    /// Look up a user by ID.
    fn find_user(
        &self,
        id: UserId,
    ) -> impl Future<Output = Result<Option<User>, RepositoryError>> + Send;

    /// Look up a user and their password hash by username.
    fn find_login(
        &self,
        username: &str,
    ) -> impl Future<Output = Result<Option<(User, String)>, RepositoryError>> + Send;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// One page of the catalog.
    fn list_books(
        &self,
        sort: BookSort,
        limit: u32,
        offset: u64,
    ) -> impl Future<Output = Result<Vec<Book>, RepositoryError>> + Send;

    /// Books whose title or author equals `keyword` exactly.
    fn search_books(
        &self,
        keyword: &str,
    ) -> impl Future<Output = Result<Vec<Book>, RepositoryError>> + Send;

    /// The whole catalog in insertion order.
    fn all_books(&self) -> impl Future<Output = Result<Vec<Book>, RepositoryError>> + Send;

    /// Look up a book by row ID.
    fn find_book(
        &self,
        id: BookId,
    ) -> impl Future<Output = Result<Option<Book>, RepositoryError>> + Send;

    /// Insert new books and restock known `book_id`s, all or nothing.
    fn import_books(
        &self,
        rows: &[BookImport],
    ) -> impl Future<Output = Result<ImportSummary, RepositoryError>> + Send;

    // =========================================================================
    // Cart
    // =========================================================================

    /// Take `quantity` units of a book out of stock and into the user's cart.
    ///
    /// Returns `None` without changing anything when fewer than `quantity`
    /// units are in stock at the time of the write.
    fn add_to_cart(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
    ) -> impl Future<Output = Result<Option<(CartLine, Book)>, RepositoryError>> + Send;

    /// The user's cart lines with book details.
    fn cart_items(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<CartItem>, RepositoryError>> + Send;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Convert the user's whole cart into an order.
    ///
    /// Returns `None` when the cart is empty.
    fn place_order(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<PlacedOrder>, RepositoryError>> + Send;

    /// The user's most recent order.
    fn latest_order(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Option<Order>, RepositoryError>> + Send;

    /// Mark an order delivered.
    ///
    /// `NotFound` for unknown orders, `Conflict` if it was already delivered.
    fn mark_delivered(
        &self,
        order_id: OrderId,
    ) -> impl Future<Output = Result<Order, RepositoryError>> + Send;

    // =========================================================================
    // Wishlist
    // =========================================================================

    /// Add a book to the user's wishlist, returning the existing entry if
    /// it is already there.
    fn add_to_wishlist(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> impl Future<Output = Result<WishlistEntry, RepositoryError>> + Send;

    /// Books on the user's wishlist, oldest entry first.
    fn wishlist_books(
        &self,
        user_id: UserId,
    ) -> impl Future<Output = Result<Vec<Book>, RepositoryError>> + Send;
}

/// Map a unique violation to `Conflict`, naming the field from the constraint.
pub(crate) fn map_unique_violation(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_unique_violation()
    {
        let field = match db_err.constraint() {
            Some("users_username_key") => "username",
            Some("users_mobilenum_key") => "mobile number",
            Some("users_email_key") => "email",
            Some("books_book_id_key") => "book id",
            _ => "value",
        };
        return RepositoryError::Conflict(format!("{field} already exists"));
    }
    RepositoryError::Database(e)
}
