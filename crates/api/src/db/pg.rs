//! `PostgreSQL` implementation of [`Store`].

use sqlx::PgPool;

use bookstore_core::{BookId, OrderId, UserId};

use super::books::BookRepository;
use super::carts::CartRepository;
use super::orders::OrderRepository;
use super::users::UserRepository;
use super::wishlist::WishlistRepository;
use super::{RepositoryError, Store};
use crate::models::{
    Book, BookImport, BookSort, CartItem, CartLine, ImportSummary, NewUser, Order, PlacedOrder,
    User, WishlistEntry,
};

/// Store backed by a `PostgreSQL` pool.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the underlying pool (used by migrations).
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

impl Store for PgStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        UserRepository::new(&self.pool).create(user).await
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        UserRepository::new(&self.pool).get_by_id(id).await
    }

    async fn find_login(&self, username: &str) -> Result<Option<(User, String)>, RepositoryError> {
        UserRepository::new(&self.pool).get_login(username).await
    }

    async fn list_books(
        &self,
        sort: BookSort,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Book>, RepositoryError> {
        BookRepository::new(&self.pool).list(sort, limit, offset).await
    }

    async fn search_books(&self, keyword: &str) -> Result<Vec<Book>, RepositoryError> {
        BookRepository::new(&self.pool).search(keyword).await
    }

    async fn all_books(&self) -> Result<Vec<Book>, RepositoryError> {
        BookRepository::new(&self.pool).all().await
    }

    async fn find_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        BookRepository::new(&self.pool).get_by_id(id).await
    }

    async fn import_books(&self, rows: &[BookImport]) -> Result<ImportSummary, RepositoryError> {
        BookRepository::new(&self.pool).import(rows).await
    }

    async fn add_to_cart(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<Option<(CartLine, Book)>, RepositoryError> {
        CartRepository::new(&self.pool)
            .add(user_id, book_id, quantity)
            .await
    }

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        CartRepository::new(&self.pool).items(user_id).await
    }

    async fn place_order(&self, user_id: UserId) -> Result<Option<PlacedOrder>, RepositoryError> {
        OrderRepository::new(&self.pool).place(user_id).await
    }

    async fn latest_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        OrderRepository::new(&self.pool)
            .latest_for_user(user_id)
            .await
    }

    async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        OrderRepository::new(&self.pool)
            .mark_delivered(order_id)
            .await
    }

    async fn add_to_wishlist(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<WishlistEntry, RepositoryError> {
        WishlistRepository::new(&self.pool)
            .add(user_id, book_id)
            .await
    }

    async fn wishlist_books(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError> {
        WishlistRepository::new(&self.pool).books(user_id).await
    }
}
