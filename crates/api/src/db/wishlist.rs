//! Wishlist repository for `PostgreSQL`.

use sqlx::PgPool;

use bookstore_core::{BookId, UserId};

use super::RepositoryError;
use crate::models::{Book, WishlistEntry};

/// Repository for wishlist database operations.
pub struct WishlistRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> WishlistRepository<'a> {
    /// Create a new wishlist repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a book, or return the entry that already exists.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the book doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn add(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<WishlistEntry, RepositoryError> {
        let inserted = sqlx::query_as::<_, WishlistEntry>(
            r"
            INSERT INTO wishlist (user_id, book_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, book_id) DO NOTHING
            RETURNING id, user_id, book_id
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_optional(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        if let Some(entry) = inserted {
            return Ok(entry);
        }

        let existing = sqlx::query_as::<_, WishlistEntry>(
            r"
            SELECT id, user_id, book_id
            FROM wishlist
            WHERE user_id = $1 AND book_id = $2
            ",
        )
        .bind(user_id)
        .bind(book_id)
        .fetch_one(self.pool)
        .await?;

        Ok(existing)
    }

    /// Get the books on a user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn books(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(
            r"
            SELECT b.id, b.book_id, b.author, b.title, b.image, b.quantity, b.price, b.description
            FROM wishlist w
            JOIN books b ON b.id = w.book_id
            WHERE w.user_id = $1
            ORDER BY w.id
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(books)
    }
}
