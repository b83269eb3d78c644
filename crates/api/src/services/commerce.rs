//! Cart, order, wishlist and delivery operations.

use rust_decimal::Decimal;
use thiserror::Error;

use bookstore_core::{BookId, OrderId, UserId};

use crate::db::{RepositoryError, Store};
use crate::models::{Book, CartItem, CartLine, Order, PlacedOrder, WishlistEntry, cart_total};

/// Errors from commerce operations.
#[derive(Debug, Error)]
pub enum CommerceError {
    #[error("quantity must be at least 1")]
    InvalidQuantity,

    #[error("book not found")]
    BookNotFound,

    #[error("Book not available")]
    BookUnavailable,

    #[error("only {available} copies in stock")]
    InsufficientStock { available: i32 },

    #[error("Cart is empty")]
    EmptyCart,

    #[error("order not found")]
    OrderNotFound,

    #[error("order already delivered")]
    AlreadyDelivered,

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// The caller's cart with its total.
#[derive(Debug, Clone)]
pub struct CartView {
    pub items: Vec<CartItem>,
    pub total: Decimal,
}

/// Commerce service.
pub struct CommerceService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CommerceService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Move `quantity` copies of a book from stock into the user's cart.
    ///
    /// Returns the new cart line and the book with its reduced stock.
    ///
    /// # Errors
    ///
    /// Returns `InvalidQuantity` for quantities below one, `BookNotFound`
    /// for unknown books, `BookUnavailable` when the book is out of stock
    /// and `InsufficientStock` when fewer copies remain than requested,
    /// including when a concurrent request took them first.
    pub async fn add_to_cart(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<(CartLine, Book), CommerceError> {
        if quantity < 1 {
            return Err(CommerceError::InvalidQuantity);
        }

        let book = self
            .store
            .find_book(book_id)
            .await?
            .ok_or(CommerceError::BookNotFound)?;
        if !book.in_stock() {
            return Err(CommerceError::BookUnavailable);
        }
        if quantity > book.quantity {
            return Err(CommerceError::InsufficientStock {
                available: book.quantity,
            });
        }

        match self.store.add_to_cart(user_id, book_id, quantity).await? {
            Some(added) => Ok(added),
            None => {
                let available = self
                    .store
                    .find_book(book_id)
                    .await?
                    .map_or(0, |b| b.quantity);
                tracing::info!(%book_id, quantity, available, "Lost stock race on add to cart");
                Err(CommerceError::InsufficientStock { available })
            }
        }
    }

    /// The user's cart lines and total.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the store fails.
    pub async fn cart(&self, user_id: UserId) -> Result<CartView, CommerceError> {
        let items = self.store.cart_items(user_id).await?;
        let total = cart_total(&items);
        Ok(CartView { items, total })
    }

    /// Check out the user's whole cart.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::EmptyCart` if there is nothing to order.
    pub async fn place_order(&self, user_id: UserId) -> Result<PlacedOrder, CommerceError> {
        let placed = self
            .store
            .place_order(user_id)
            .await?
            .ok_or(CommerceError::EmptyCart)?;

        tracing::info!(
            %user_id,
            order_id = %placed.order.id,
            total = %placed.order.total_amount,
            lines = placed.books.len(),
            "Order placed"
        );
        Ok(placed)
    }

    /// Add a book to the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::BookNotFound` for unknown books.
    pub async fn add_to_wishlist(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<WishlistEntry, CommerceError> {
        self.store
            .add_to_wishlist(user_id, book_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::BookNotFound,
                other => CommerceError::Repository(other),
            })
    }

    /// Books on the user's wishlist.
    ///
    /// # Errors
    ///
    /// Returns `CommerceError::Repository` if the store fails.
    pub async fn wishlist(&self, user_id: UserId) -> Result<Vec<Book>, CommerceError> {
        Ok(self.store.wishlist_books(user_id).await?)
    }

    /// Mark an order delivered.
    ///
    /// # Errors
    ///
    /// Returns `OrderNotFound` or `AlreadyDelivered`.
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, CommerceError> {
        self.store
            .mark_delivered(order_id)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => CommerceError::OrderNotFound,
                RepositoryError::Conflict(_) => CommerceError::AlreadyDelivered,
                other => CommerceError::Repository(other),
            })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;
    use crate::models::BookImport;

    const USER: UserId = UserId::new(1);

    async fn seeded(stock: &[(i32, i32, i64)]) -> (MemoryStore, Vec<Book>) {
        let store = MemoryStore::new();
        let rows: Vec<_> = stock
            .iter()
            .map(|&(book_id, quantity, cents)| BookImport {
                book_id,
                author: "Author".to_string(),
                title: format!("Book {book_id}"),
                image: None,
                quantity,
                price: Decimal::new(cents, 2),
                description: String::new(),
            })
            .collect();
        store.import_books(&rows).await.unwrap();
        let books = store.all_books().await.unwrap();
        (store, books)
    }

    #[tokio::test]
    async fn test_add_to_cart_decrements_stock() {
        let (store, books) = seeded(&[(1, 5, 1000)]).await;
        let commerce = CommerceService::new(&store);

        let (line, book) = commerce.add_to_cart(USER, books[0].id, 2).await.unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(book.quantity, 3);
        assert_eq!(store.stock(books[0].id).await, Some(3));
    }

    #[tokio::test]
    async fn test_add_to_cart_rejections() {
        let (store, books) = seeded(&[(1, 0, 1000), (2, 2, 500)]).await;
        let commerce = CommerceService::new(&store);

        assert!(matches!(
            commerce.add_to_cart(USER, books[0].id, 1).await,
            Err(CommerceError::BookUnavailable)
        ));
        assert!(matches!(
            commerce.add_to_cart(USER, books[1].id, 3).await,
            Err(CommerceError::InsufficientStock { available: 2 })
        ));
        assert!(matches!(
            commerce.add_to_cart(USER, books[1].id, 0).await,
            Err(CommerceError::InvalidQuantity)
        ));
        assert!(matches!(
            commerce.add_to_cart(USER, BookId::new(999), 1).await,
            Err(CommerceError::BookNotFound)
        ));
        assert!(commerce.cart(USER).await.unwrap().items.is_empty());
        assert_eq!(store.stock(books[1].id).await, Some(2));
    }

    #[tokio::test]
    async fn test_add_to_cart_after_stock_taken_between_check_and_write() {
        let (store, books) = seeded(&[(1, 3, 1000)]).await;
        let commerce = CommerceService::new(&store);
        store.sell_out_after_lookup(books[0].id).await;

        assert!(matches!(
            commerce.add_to_cart(USER, books[0].id, 2).await,
            Err(CommerceError::InsufficientStock { available: 0 })
        ));
        assert!(commerce.cart(USER).await.unwrap().items.is_empty());
        assert_eq!(store.stock(books[0].id).await, Some(0));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_add_to_cart_never_oversells() {
        let (store, books) = seeded(&[(1, 5, 1000)]).await;
        let book_id = books[0].id;

        let mut tasks = tokio::task::JoinSet::new();
        for user in 100..132 {
            let store = store.clone();
            tasks.spawn(async move {
                CommerceService::new(&store)
                    .add_to_cart(UserId::new(user), book_id, 1)
                    .await
            });
        }

        let mut sold = 0;
        while let Some(outcome) = tasks.join_next().await {
            match outcome.unwrap() {
                Ok((line, _)) => {
                    assert_eq!(line.quantity, 1);
                    sold += 1;
                }
                Err(CommerceError::BookUnavailable | CommerceError::InsufficientStock { .. }) => {}
                Err(other) => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(sold, 5);
        assert_eq!(store.stock(book_id).await, Some(0));
    }

    #[tokio::test]
    async fn test_place_order_totals_and_clears_cart() {
        let (store, books) = seeded(&[(1, 5, 1000), (2, 5, 250)]).await;
        let commerce = CommerceService::new(&store);
        commerce.add_to_cart(USER, books[0].id, 2).await.unwrap();
        commerce.add_to_cart(USER, books[1].id, 3).await.unwrap();

        let before = commerce.cart(USER).await.unwrap();
        assert_eq!(before.total, Decimal::new(2750, 2));

        let placed = commerce.place_order(USER).await.unwrap();
        assert_eq!(placed.order.total_amount, before.total);
        assert_eq!(store.order_book_count(placed.order.id).await, 2);
        assert!(commerce.cart(USER).await.unwrap().items.is_empty());
    }

    #[tokio::test]
    async fn test_place_order_empty_cart() {
        let (store, _) = seeded(&[]).await;
        let commerce = CommerceService::new(&store);

        assert!(matches!(
            commerce.place_order(USER).await,
            Err(CommerceError::EmptyCart)
        ));
    }

    #[tokio::test]
    async fn test_failed_order_keeps_cart() {
        let (store, books) = seeded(&[(1, 5, 1000)]).await;
        let commerce = CommerceService::new(&store);
        commerce.add_to_cart(USER, books[0].id, 1).await.unwrap();

        store.set_offline(true).await;
        assert!(matches!(
            commerce.place_order(USER).await,
            Err(CommerceError::Repository(_))
        ));
        store.set_offline(false).await;

        assert_eq!(commerce.cart(USER).await.unwrap().items.len(), 1);
    }

    #[tokio::test]
    async fn test_order_rolled_back_after_partial_write() {
        let (store, books) = seeded(&[(1, 5, 1000), (2, 5, 250)]).await;
        let commerce = CommerceService::new(&store);
        commerce.add_to_cart(USER, books[0].id, 2).await.unwrap();
        commerce.add_to_cart(USER, books[1].id, 1).await.unwrap();
        let before = commerce.cart(USER).await.unwrap();

        store.fail_order_at(books[1].id).await;
        assert!(matches!(
            commerce.place_order(USER).await,
            Err(CommerceError::Repository(RepositoryError::Database(_)))
        ));

        let after = commerce.cart(USER).await.unwrap();
        assert_eq!(after.items, before.items);
        assert_eq!(after.total, before.total);
        assert_eq!(store.order_count(USER).await, 0);
        assert!(store.latest_order(USER).await.unwrap().is_none());
        assert_eq!(store.stock(books[0].id).await, Some(3));
        assert_eq!(store.stock(books[1].id).await, Some(4));

        let placed = commerce.place_order(USER).await.unwrap();
        assert_eq!(store.order_book_count(placed.order.id).await, 2);
        assert_eq!(store.order_count(USER).await, 1);
    }

    #[tokio::test]
    async fn test_mark_delivered() {
        let (store, books) = seeded(&[(1, 5, 1000)]).await;
        let commerce = CommerceService::new(&store);
        commerce.add_to_cart(USER, books[0].id, 1).await.unwrap();
        let placed = commerce.place_order(USER).await.unwrap();

        assert!(
            commerce
                .mark_delivered(placed.order.id)
                .await
                .unwrap()
                .status
                .is_delivered()
        );
        assert!(matches!(
            commerce.mark_delivered(placed.order.id).await,
            Err(CommerceError::AlreadyDelivered)
        ));
        assert!(matches!(
            commerce.mark_delivered(OrderId::new(404)).await,
            Err(CommerceError::OrderNotFound)
        ));
    }

    #[tokio::test]
    async fn test_wishlist() {
        let (store, books) = seeded(&[(1, 5, 1000)]).await;
        let commerce = CommerceService::new(&store);

        commerce.add_to_wishlist(USER, books[0].id).await.unwrap();
        commerce.add_to_wishlist(USER, books[0].id).await.unwrap();
        assert_eq!(commerce.wishlist(USER).await.unwrap().len(), 1);
        assert!(matches!(
            commerce.add_to_wishlist(USER, BookId::new(999)).await,
            Err(CommerceError::BookNotFound)
        ));
    }
}
