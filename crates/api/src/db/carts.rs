//! Cart repository for `PostgreSQL`.

use sqlx::PgPool;

use bookstore_core::{BookId, UserId};

use super::RepositoryError;
use crate::models::{Book, CartItem, CartLine};

/// Repository for cart database operations.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Reserve stock and insert a cart line in one transaction.
    ///
    /// The stock decrement is conditional, so two concurrent requests can
    /// never take the quantity below zero; the loser gets `None`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn add(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<Option<(CartLine, Book)>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let book = sqlx::query_as::<_, Book>(
            r"
            UPDATE books
            SET quantity = quantity - $2
            WHERE id = $1 AND quantity >= $2
            RETURNING id, book_id, author, title, image, quantity, price, description
            ",
        )
        .bind(book_id)
        .bind(quantity)
        .fetch_optional(&mut *tx)
        .await?;

        let Some(book) = book else {
            tx.rollback().await?;
            return Ok(None);
        };

        let line = sqlx::query_as::<_, CartLine>(
            r"
            INSERT INTO cart (user_id, book_id, quantity)
            VALUES ($1, $2, $3)
            RETURNING id, user_id, book_id, quantity
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .bind(quantity)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(Some((line, book)))
    }

    /// Get the user's cart lines joined with their books.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let items = sqlx::query_as::<_, CartItem>(
            r"
            SELECT c.id AS line_id, c.book_id, b.title, b.price AS unit_price, c.quantity
            FROM cart c
            JOIN books b ON b.id = c.book_id
            WHERE c.user_id = $1
            ORDER BY c.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(items)
    }
}
