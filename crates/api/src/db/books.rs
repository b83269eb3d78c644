//! Catalog repository for `PostgreSQL`.

use sqlx::PgPool;

use bookstore_core::BookId;

use super::{RepositoryError, map_unique_violation};
use crate::models::{Book, BookImport, BookSort, ImportSummary};

const BOOK_COLUMNS: &str = "id, book_id, author, title, image, quantity, price, description";

/// Repository for catalog database operations.
pub struct BookRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> BookRepository<'a> {
    /// Create a new book repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get one page of books.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(
        &self,
        sort: BookSort,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Book>, RepositoryError> {
        let order_by = match sort {
            BookSort::Insertion => "id",
            BookSort::PriceAscending => "price, id",
        };
        let offset = i64::try_from(offset)
            .map_err(|_| RepositoryError::DataCorruption("page offset out of range".into()))?;

        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY {order_by} LIMIT $1 OFFSET $2"
        ))
        .bind(i64::from(limit))
        .bind(offset)
        .fetch_all(self.pool)
        .await?;

        Ok(books)
    }

    /// Find books whose title or author equals `keyword`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn search(&self, keyword: &str) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE title = $1 OR author = $1 ORDER BY id"
        ))
        .bind(keyword)
        .fetch_all(self.pool)
        .await?;

        Ok(books)
    }

    /// Get the whole catalog.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn all(&self) -> Result<Vec<Book>, RepositoryError> {
        let books = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books ORDER BY id"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(books)
    }

    /// Get a book by row ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let book = sqlx::query_as::<_, Book>(&format!(
            "SELECT {BOOK_COLUMNS} FROM books WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        Ok(book)
    }

    /// Apply an import in one transaction.
    ///
    /// A known `book_id` gets the row's quantity added to its stock; the
    /// other columns of the existing book are left alone.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::StockOverflow` if a restock would push a
    /// quantity past `i32::MAX`, or `RepositoryError::Database` if any
    /// statement fails; nothing is written in either case.
    pub async fn import(&self, rows: &[BookImport]) -> Result<ImportSummary, RepositoryError> {
        let mut tx = self.pool.begin().await?;
        let mut summary = ImportSummary::default();

        for row in rows {
            let restocked = sqlx::query(
                r"
                UPDATE books
                SET quantity = quantity + $2
                WHERE book_id = $1 AND quantity <= $3
                ",
            )
            .bind(row.book_id)
            .bind(row.quantity)
            .bind(i32::MAX.saturating_sub(row.quantity))
            .execute(&mut *tx)
            .await?;

            if restocked.rows_affected() > 0 {
                summary.restocked += 1;
                continue;
            }

            let exists: bool =
                sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM books WHERE book_id = $1)")
                    .bind(row.book_id)
                    .fetch_one(&mut *tx)
                    .await?;
            if exists {
                return Err(RepositoryError::StockOverflow(row.book_id));
            }

            sqlx::query(
                r"
                INSERT INTO books (book_id, author, title, image, quantity, price, description)
                VALUES ($1, $2, $3, $4, $5, $6, $7)
                ",
            )
            .bind(row.book_id)
            .bind(&row.author)
            .bind(&row.title)
            .bind(row.image.as_deref())
            .bind(row.quantity)
            .bind(row.price)
            .bind(&row.description)
            .execute(&mut *tx)
            .await
            .map_err(map_unique_violation)?;

            summary.inserted += 1;
        }

        tx.commit().await?;

        Ok(summary)
    }
}
