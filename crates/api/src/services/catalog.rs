//! Catalog read path.
//!
//! Paginated and keyword listings are served from [`CatalogCache`] when
//! possible and populated from the store on a miss. The cache is never the
//! source of truth: a failing cache degrades to a store read.

use thiserror::Error;

use bookstore_core::PageNumber;

use crate::cache::{CacheKey, CatalogCache};
use crate::db::{RepositoryError, Store};
use crate::models::{Book, BookImport, BookSort, ImportSummary};

/// Errors from catalog operations.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// Requested page is past the end of the catalog.
    #[error("page {0} does not exist")]
    PageNotFound(PageNumber),

    /// Search matched nothing.
    #[error("No such books available")]
    NoMatches,

    /// Search keyword was empty.
    #[error("keyword is required")]
    EmptyKeyword,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// A catalog listing and where it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub books: Vec<Book>,
    /// Served from the cache.
    pub cached: bool,
}

/// Catalog service.
pub struct CatalogService<'a, S> {
    store: &'a S,
    cache: &'a CatalogCache,
    per_page: u32,
}

impl<'a, S: Store> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S, cache: &'a CatalogCache, per_page: u32) -> Self {
        Self {
            store,
            cache,
            per_page,
        }
    }

    /// One page of the catalog in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::PageNotFound` for an empty page other than the
    /// first. Returns `CatalogError::Repository` if the store fails.
    pub async fn page(&self, page: PageNumber) -> Result<Listing, CatalogError> {
        let key = CacheKey::Page(page);
        if let Some(books) = self.cached(&key).await {
            return Ok(Listing {
                books,
                cached: true,
            });
        }

        let books = self
            .store
            .list_books(BookSort::Insertion, self.per_page, page.offset(self.per_page))
            .await?;
        if books.is_empty() && !page.is_first() {
            return Err(CatalogError::PageNotFound(page));
        }

        self.populate(&key, &books).await;
        Ok(Listing {
            books,
            cached: false,
        })
    }

    /// Books whose title or author equals `keyword`.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::EmptyKeyword` for a blank keyword and
    /// `CatalogError::NoMatches` when nothing matches. Neither is cached.
    pub async fn search(&self, keyword: &str) -> Result<Listing, CatalogError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Err(CatalogError::EmptyKeyword);
        }

        let key = CacheKey::Search(keyword.to_string());
        if let Some(books) = self.cached(&key).await {
            return Ok(Listing {
                books,
                cached: true,
            });
        }

        let books = self.store.search_books(keyword).await?;
        if books.is_empty() {
            return Err(CatalogError::NoMatches);
        }

        self.populate(&key, &books).await;
        Ok(Listing {
            books,
            cached: false,
        })
    }

    /// One page of the catalog ordered by ascending price. Never cached.
    ///
    /// # Errors
    ///
    /// Same as [`Self::page`].
    pub async fn sorted_by_price(&self, page: PageNumber) -> Result<Vec<Book>, CatalogError> {
        let books = self
            .store
            .list_books(
                BookSort::PriceAscending,
                self.per_page,
                page.offset(self.per_page),
            )
            .await?;
        if books.is_empty() && !page.is_first() {
            return Err(CatalogError::PageNotFound(page));
        }
        Ok(books)
    }

    /// Apply an import, then purge every cached listing.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::Repository` if the import fails; the catalog
    /// and the cache are untouched in that case.
    pub async fn import(&self, rows: &[BookImport]) -> Result<ImportSummary, CatalogError> {
        let summary = self.store.import_books(rows).await?;
        tracing::info!(
            inserted = summary.inserted,
            restocked = summary.restocked,
            "Catalog import committed"
        );

        self.invalidate().await;
        Ok(summary)
    }

    /// Purge cached listings, logging failures.
    pub async fn invalidate(&self) {
        if let Err(e) = self.cache.invalidate_catalog().await {
            tracing::error!(
                error = %e,
                backend = self.cache.backend(),
                "Failed to invalidate catalog cache, entries expire by TTL"
            );
        }
    }

    async fn cached(&self, key: &CacheKey) -> Option<Vec<Book>> {
        match self.cache.get(key).await {
            Ok(Some(books)) => {
                tracing::debug!(%key, "Catalog cache hit");
                Some(books)
            }
            Ok(None) => {
                tracing::debug!(%key, "Catalog cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "Catalog cache read failed, using store");
                None
            }
        }
    }

    async fn populate(&self, key: &CacheKey, books: &[Book]) {
        if let Err(e) = self.cache.set(key, books).await {
            tracing::warn!(%key, error = %e, "Catalog cache write failed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use rust_decimal::Decimal;

    use super::*;
    use crate::db::MemoryStore;

    fn row(book_id: i32, title: &str, author: &str, quantity: i32, cents: i64) -> BookImport {
        BookImport {
            book_id,
            author: author.to_string(),
            title: title.to_string(),
            image: None,
            quantity,
            price: Decimal::new(cents, 2),
            description: String::new(),
        }
    }

    async fn seeded() -> MemoryStore {
        let store = MemoryStore::new();
        store
            .import_books(&[
                row(1, "Emma", "Jane Austen", 3, 1500),
                row(2, "Dune", "Frank Herbert", 5, 999),
                row(3, "Persuasion", "Jane Austen", 1, 1200),
            ])
            .await
            .unwrap();
        store
    }

    fn page(n: u32) -> PageNumber {
        PageNumber::new(n).unwrap()
    }

    #[tokio::test]
    async fn test_page_miss_then_hit() {
        let store = seeded().await;
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        let first = catalog.page(page(1)).await.unwrap();
        assert!(!first.cached);
        assert_eq!(first.books.len(), 2);
        assert!(cache.contains(&CacheKey::Page(page(1))).await.unwrap());

        let second = catalog.page(page(1)).await.unwrap();
        assert!(second.cached);
        assert_eq!(second.books, first.books);
    }

    #[tokio::test]
    async fn test_page_past_end_not_cached() {
        let store = seeded().await;
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        assert_eq!(catalog.page(page(2)).await.unwrap().books.len(), 1);
        assert!(matches!(
            catalog.page(page(3)).await,
            Err(CatalogError::PageNotFound(_))
        ));
        assert!(!cache.contains(&CacheKey::Page(page(3))).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_catalog_first_page() {
        let store = MemoryStore::new();
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        assert!(catalog.page(page(1)).await.unwrap().books.is_empty());
    }

    #[tokio::test]
    async fn test_search_matches_title_or_author() {
        let store = seeded().await;
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        let austen = catalog.search("Jane Austen").await.unwrap();
        assert_eq!(austen.books.len(), 2);
        let dune = catalog.search("Dune").await.unwrap();
        assert_eq!(dune.books[0].author, "Frank Herbert");
        assert!(catalog.search("Dune").await.unwrap().cached);
    }

    #[tokio::test]
    async fn test_search_miss_not_cached() {
        let store = seeded().await;
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        assert!(matches!(
            catalog.search("Ulysses").await,
            Err(CatalogError::NoMatches)
        ));
        assert!(
            !cache
                .contains(&CacheKey::Search("Ulysses".to_string()))
                .await
                .unwrap()
        );
        assert!(matches!(
            catalog.search("   ").await,
            Err(CatalogError::EmptyKeyword)
        ));
    }

    #[tokio::test]
    async fn test_sorted_by_price() {
        let store = seeded().await;
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        let cheapest = catalog.sorted_by_price(page(1)).await.unwrap();
        let titles: Vec<_> = cheapest.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, ["Dune", "Persuasion"]);
        assert!(!cache.contains(&CacheKey::Page(page(1))).await.unwrap());
    }

    #[tokio::test]
    async fn test_import_invalidates_cached_pages() {
        let store = seeded().await;
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        let before = catalog.page(page(1)).await.unwrap();
        assert_eq!(before.books[0].quantity, 3);

        let summary = catalog
            .import(&[row(1, "Emma", "Jane Austen", 4, 1500)])
            .await
            .unwrap();
        assert_eq!(summary.restocked, 1);
        assert!(!cache.contains(&CacheKey::Page(page(1))).await.unwrap());

        let after = catalog.page(page(1)).await.unwrap();
        assert!(!after.cached);
        assert_eq!(after.books[0].quantity, 7);
    }

    #[tokio::test]
    async fn test_overflowing_restock_keeps_catalog() {
        let store = seeded().await;
        let cache = CatalogCache::in_memory(None);
        let catalog = CatalogService::new(&store, &cache, 2);

        catalog
            .import(&[row(2, "Dune", "Frank Herbert", i32::MAX - 5, 999)])
            .await
            .unwrap();
        let cached = catalog.page(page(1)).await.unwrap();
        assert_eq!(cached.books[1].quantity, i32::MAX);

        let err = catalog
            .import(&[
                row(4, "Sanditon", "Jane Austen", 2, 800),
                row(2, "Dune", "Frank Herbert", 1, 999),
            ])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CatalogError::Repository(RepositoryError::StockOverflow(2))
        ));
        assert!(cache.contains(&CacheKey::Page(page(1))).await.unwrap());
        assert_eq!(store.list_books(BookSort::Insertion, 10, 0).await.unwrap().len(), 3);
    }
}
