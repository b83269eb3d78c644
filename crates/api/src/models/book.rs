//! Catalog types.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bookstore_core::BookId;

/// A book offered for sale.
///
/// This is also the cache payload format: listings are stored as a JSON
/// array of `Book`, so field names here are part of the cache contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Row ID, used by cart and wishlist requests.
    pub id: BookId,
    /// External catalog ID from the import file.
    pub book_id: i32,
    pub author: String,
    pub title: String,
    /// Cover image reference.
    pub image: Option<String>,
    /// Units in stock, never negative.
    pub quantity: i32,
    pub price: Decimal,
    pub description: String,
}

impl Book {
    /// Whether at least one unit is in stock.
    #[must_use]
    pub const fn in_stock(&self) -> bool {
        self.quantity > 0
    }
}

/// Ordering for catalog pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BookSort {
    /// Insertion order (row ID).
    #[default]
    Insertion,
    /// Price ascending, ties broken by row ID.
    PriceAscending,
}

/// One validated row of a catalog import.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookImport {
    pub book_id: i32,
    pub author: String,
    pub title: String,
    pub image: Option<String>,
    pub quantity: i32,
    pub price: Decimal,
    pub description: String,
}

impl BookImport {
    /// Build the catalog row created when `book_id` is new.
    #[must_use]
    pub fn into_book(self, id: BookId) -> Book {
        Book {
            id,
            book_id: self.book_id,
            author: self.author,
            title: self.title,
            image: self.image,
            quantity: self.quantity,
            price: self.price,
            description: self.description,
        }
    }
}

/// What an import did to the catalog.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ImportSummary {
    /// Rows that created a new book.
    pub inserted: usize,
    /// Rows that added stock to an existing book.
    pub restocked: usize,
}
