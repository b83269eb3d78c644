//! In-process implementation of [`Store`].
//!
//! Used by the test suites and for running the API without `PostgreSQL`.
//! All tables sit behind one mutex, so every operation is atomic with
//! respect to every other one, matching the transactional behavior of
//! [`PgStore`](super::PgStore).

use std::sync::Arc;

use chrono::Utc;
use tokio::sync::Mutex;

use bookstore_core::{
    BookId, CartLineId, DeliveryStatus, OrderBookId, OrderId, UserId, WishlistEntryId,
};

use super::{RepositoryError, Store};
use crate::models::{
    Book, BookImport, BookSort, CartItem, CartLine, ImportSummary, NewUser, Order, OrderBook,
    PlacedOrder, User, WishlistEntry, cart_total,
};

#[derive(Debug, Default)]
struct Tables {
    users: Vec<(User, String)>,
    books: Vec<Book>,
    cart: Vec<CartLine>,
    orders: Vec<Order>,
    order_books: Vec<OrderBook>,
    wishlist: Vec<WishlistEntry>,
    next_id: i32,
    offline: bool,
    faults: Faults,
}

/// One-shot failures armed by tests.
#[derive(Debug, Default)]
struct Faults {
    /// Empty this book's stock right after the next lookup returns it.
    sell_out_after_lookup: Option<BookId>,
    /// Fail `place_order` when it reaches this book's line.
    fail_order_at: Option<BookId>,
}

impl Tables {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn check_online(&self) -> Result<(), RepositoryError> {
        if self.offline {
            return Err(RepositoryError::Database(sqlx::Error::PoolClosed));
        }
        Ok(())
    }

    fn book(&self, id: BookId) -> Option<&Book> {
        self.books.iter().find(|b| b.id == id)
    }
}

/// Store that keeps everything in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tables: Arc<Mutex<Tables>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent operation fail as if the database were down.
    pub async fn set_offline(&self, offline: bool) {
        self.tables.lock().await.offline = offline;
    }

    /// Let the next `find_book` of `id` see the current stock, then sell the
    /// book out before the caller can act on it.
    pub async fn sell_out_after_lookup(&self, id: BookId) {
        self.tables.lock().await.faults.sell_out_after_lookup = Some(id);
    }

    /// Make the next `place_order` fail once it has written the order and
    /// reaches the line for `id`. Everything it wrote is rolled back.
    pub async fn fail_order_at(&self, id: BookId) {
        self.tables.lock().await.faults.fail_order_at = Some(id);
    }

    /// Orders recorded for a user.
    pub async fn order_count(&self, user_id: UserId) -> usize {
        self.tables
            .lock()
            .await
            .orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .count()
    }

    /// Current stock of a book, if it exists.
    pub async fn stock(&self, id: BookId) -> Option<i32> {
        self.tables.lock().await.book(id).map(|b| b.quantity)
    }

    /// Number of order lines recorded for an order.
    pub async fn order_book_count(&self, order_id: OrderId) -> usize {
        self.tables
            .lock()
            .await
            .order_books
            .iter()
            .filter(|ob| ob.order_id == order_id)
            .count()
    }
}

impl Store for MemoryStore {
    async fn ping(&self) -> Result<(), RepositoryError> {
        self.tables.lock().await.check_online()
    }

    async fn create_user(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.check_online()?;

        let duplicate = t.users.iter().find_map(|(u, _)| {
            if u.username == user.username {
                Some("username")
            } else if u.mobile == user.mobile {
                Some("mobile number")
            } else if u.email == user.email {
                Some("email")
            } else {
                None
            }
        });
        if let Some(field) = duplicate {
            return Err(RepositoryError::Conflict(format!("{field} already exists")));
        }

        let created = User {
            id: UserId::new(t.next_id()),
            username: user.username.clone(),
            mobile: user.mobile.clone(),
            email: user.email.clone(),
            created_at: Utc::now(),
        };
        t.users.push((created.clone(), user.password_hash.clone()));
        Ok(created)
    }

    async fn find_user(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;
        Ok(t.users.iter().find(|(u, _)| u.id == id).map(|(u, _)| u.clone()))
    }

    async fn find_login(&self, username: &str) -> Result<Option<(User, String)>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;
        Ok(t.users.iter().find(|(u, _)| u.username == username).cloned())
    }

    async fn list_books(
        &self,
        sort: BookSort,
        limit: u32,
        offset: u64,
    ) -> Result<Vec<Book>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;

        let mut books = t.books.clone();
        if sort == BookSort::PriceAscending {
            books.sort_by(|a, b| a.price.cmp(&b.price).then(a.id.cmp(&b.id)));
        }
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(usize::MAX);
        Ok(books.into_iter().skip(skip).take(take).collect())
    }

    async fn search_books(&self, keyword: &str) -> Result<Vec<Book>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;
        Ok(t.books
            .iter()
            .filter(|b| b.title == keyword || b.author == keyword)
            .cloned()
            .collect())
    }

    async fn all_books(&self) -> Result<Vec<Book>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;
        Ok(t.books.clone())
    }

    async fn find_book(&self, id: BookId) -> Result<Option<Book>, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.check_online()?;

        let found = t.book(id).cloned();
        if t.faults.sell_out_after_lookup == Some(id) {
            t.faults.sell_out_after_lookup = None;
            if let Some(book) = t.books.iter_mut().find(|b| b.id == id) {
                book.quantity = 0;
            }
        }
        Ok(found)
    }

    async fn import_books(&self, rows: &[BookImport]) -> Result<ImportSummary, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.check_online()?;

        // Applied to a copy so a failing row leaves the catalog untouched
        let mut staged = t.books.clone();
        let mut summary = ImportSummary::default();
        for row in rows {
            if let Some(existing) = staged.iter_mut().find(|b| b.book_id == row.book_id) {
                existing.quantity = existing
                    .quantity
                    .checked_add(row.quantity)
                    .ok_or(RepositoryError::StockOverflow(row.book_id))?;
                summary.restocked += 1;
                continue;
            }
            let id = BookId::new(t.next_id());
            staged.push(row.clone().into_book(id));
            summary.inserted += 1;
        }

        t.books = staged;
        Ok(summary)
    }

    async fn add_to_cart(
        &self,
        user_id: UserId,
        book_id: BookId,
        quantity: i32,
    ) -> Result<Option<(CartLine, Book)>, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.check_online()?;

        let Some(book) = t
            .books
            .iter_mut()
            .find(|b| b.id == book_id && b.quantity >= quantity)
        else {
            return Ok(None);
        };
        book.quantity -= quantity;
        let book = book.clone();

        let line = CartLine {
            id: CartLineId::new(t.next_id()),
            user_id,
            book_id,
            quantity,
        };
        t.cart.push(line.clone());
        Ok(Some((line, book)))
    }

    async fn cart_items(&self, user_id: UserId) -> Result<Vec<CartItem>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;
        Ok(cart_items_for(&t, user_id))
    }

    async fn place_order(&self, user_id: UserId) -> Result<Option<PlacedOrder>, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.check_online()?;

        let items = cart_items_for(&t, user_id);
        if items.is_empty() {
            return Ok(None);
        }

        let order = Order {
            id: OrderId::new(t.next_id()),
            user_id,
            total_amount: cart_total(&items),
            status: DeliveryStatus::Pending,
            order_date: Utc::now(),
        };

        // Written row by row like the SQL transaction; undone on failure
        let cart = t.cart.clone();
        let orders = t.orders.clone();
        let order_books = t.order_books.clone();

        t.orders.push(order.clone());
        let mut books = Vec::with_capacity(items.len());
        for item in &items {
            if t.faults.fail_order_at == Some(item.book_id) {
                t.faults.fail_order_at = None;
                t.cart = cart;
                t.orders = orders;
                t.order_books = order_books;
                return Err(RepositoryError::Database(sqlx::Error::Protocol(
                    "order line insert failed".to_owned(),
                )));
            }

            let line = OrderBook {
                id: OrderBookId::new(t.next_id()),
                order_id: order.id,
                user_id,
                book_id: item.book_id,
                quantity: item.quantity,
            };
            t.cart.retain(|c| c.id != item.line_id);
            t.order_books.push(line.clone());
            books.push(line);
        }

        Ok(Some(PlacedOrder { order, books }))
    }

    async fn latest_order(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;
        Ok(t.orders
            .iter()
            .filter(|o| o.user_id == user_id)
            .max_by_key(|o| (o.order_date, o.id))
            .cloned())
    }

    async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.check_online()?;

        let order = t
            .orders
            .iter_mut()
            .find(|o| o.id == order_id)
            .ok_or(RepositoryError::NotFound)?;
        if order.status.is_delivered() {
            return Err(RepositoryError::Conflict("order already delivered".to_owned()));
        }
        order.status = DeliveryStatus::Delivered;
        Ok(order.clone())
    }

    async fn add_to_wishlist(
        &self,
        user_id: UserId,
        book_id: BookId,
    ) -> Result<WishlistEntry, RepositoryError> {
        let mut t = self.tables.lock().await;
        t.check_online()?;

        if t.book(book_id).is_none() {
            return Err(RepositoryError::NotFound);
        }
        if let Some(existing) = t
            .wishlist
            .iter()
            .find(|w| w.user_id == user_id && w.book_id == book_id)
        {
            return Ok(existing.clone());
        }

        let entry = WishlistEntry {
            id: WishlistEntryId::new(t.next_id()),
            user_id,
            book_id,
        };
        t.wishlist.push(entry.clone());
        Ok(entry)
    }

    async fn wishlist_books(&self, user_id: UserId) -> Result<Vec<Book>, RepositoryError> {
        let t = self.tables.lock().await;
        t.check_online()?;
        Ok(t.wishlist
            .iter()
            .filter(|w| w.user_id == user_id)
            .filter_map(|w| t.book(w.book_id).cloned())
            .collect())
    }
}

fn cart_items_for(t: &Tables, user_id: UserId) -> Vec<CartItem> {
    t.cart
        .iter()
        .filter(|line| line.user_id == user_id)
        .filter_map(|line| {
            let book = t.book(line.book_id)?;
            Some(CartItem {
                line_id: line.id,
                book_id: line.book_id,
                title: book.title.clone(),
                unit_price: book.price,
                quantity: line.quantity,
            })
        })
        .collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use bookstore_core::{Email, MobileNumber};

    use super::*;

    fn import(book_id: i32, title: &str, quantity: i32, cents: i64) -> BookImport {
        BookImport {
            book_id,
            author: "Frank Herbert".to_string(),
            title: title.to_string(),
            image: None,
            quantity,
            price: Decimal::new(cents, 2),
            description: String::new(),
        }
    }

    fn new_user(name: &str, mobile: &str, email: &str) -> NewUser {
        NewUser {
            username: name.to_string(),
            mobile: MobileNumber::parse(mobile).unwrap(),
            email: Email::parse(email).unwrap(),
            password_hash: "hash".to_string(),
        }
    }

    #[tokio::test]
    async fn test_duplicate_user_names_field() {
        let store = MemoryStore::new();
        store
            .create_user(&new_user("alice", "9876543210", "a@x.com"))
            .await
            .unwrap();

        let err = store
            .create_user(&new_user("bob", "9876543210", "b@x.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(ref m) if m.contains("mobile")));
    }

    #[tokio::test]
    async fn test_import_restocks_known_book_id() {
        let store = MemoryStore::new();
        let first = store
            .import_books(&[import(7, "Dune", 3, 999)])
            .await
            .unwrap();
        assert_eq!(first.inserted, 1);

        let second = store
            .import_books(&[import(7, "Dune", 2, 999), import(8, "Emma", 1, 500)])
            .await
            .unwrap();
        assert_eq!(second, ImportSummary { inserted: 1, restocked: 1 });

        let books = store.all_books().await.unwrap();
        assert_eq!(books.len(), 2);
        assert_eq!(books[0].quantity, 5);
    }

    #[tokio::test]
    async fn test_restock_overflow_rejects_whole_import() {
        let store = MemoryStore::new();
        store
            .import_books(&[import(7, "Dune", i32::MAX, 999)])
            .await
            .unwrap();

        let err = store
            .import_books(&[import(8, "Emma", 4, 500), import(7, "Dune", 1, 999)])
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::StockOverflow(7)));

        let books = store.all_books().await.unwrap();
        assert_eq!(books.len(), 1);
        assert_eq!(books[0].quantity, i32::MAX);
    }

    #[tokio::test]
    async fn test_add_to_cart_never_oversells() {
        let store = MemoryStore::new();
        store.import_books(&[import(1, "Dune", 2, 999)]).await.unwrap();
        let book = store.all_books().await.unwrap().remove(0);
        let user = UserId::new(100);

        assert!(store.add_to_cart(user, book.id, 3).await.unwrap().is_none());
        assert_eq!(store.stock(book.id).await, Some(2));

        let (_, after) = store.add_to_cart(user, book.id, 2).await.unwrap().unwrap();
        assert_eq!(after.quantity, 0);
        assert!(store.add_to_cart(user, book.id, 1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_place_order_consumes_cart() {
        let store = MemoryStore::new();
        store
            .import_books(&[import(1, "Dune", 5, 1000), import(2, "Emma", 5, 250)])
            .await
            .unwrap();
        let books = store.all_books().await.unwrap();
        let user = UserId::new(100);

        store.add_to_cart(user, books[0].id, 2).await.unwrap();
        store.add_to_cart(user, books[1].id, 1).await.unwrap();

        let placed = store.place_order(user).await.unwrap().unwrap();
        assert_eq!(placed.order.total_amount, Decimal::new(2250, 2));
        assert_eq!(placed.books.len(), 2);
        assert!(store.cart_items(user).await.unwrap().is_empty());
        assert!(store.place_order(user).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_mark_delivered_twice_conflicts() {
        let store = MemoryStore::new();
        store.import_books(&[import(1, "Dune", 5, 1000)]).await.unwrap();
        let book = store.all_books().await.unwrap().remove(0);
        let user = UserId::new(100);
        store.add_to_cart(user, book.id, 1).await.unwrap();
        let placed = store.place_order(user).await.unwrap().unwrap();

        let delivered = store.mark_delivered(placed.order.id).await.unwrap();
        assert!(delivered.status.is_delivered());
        assert!(matches!(
            store.mark_delivered(placed.order.id).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(
            store.mark_delivered(OrderId::new(9999)).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_wishlist_collapses_duplicates() {
        let store = MemoryStore::new();
        store.import_books(&[import(1, "Dune", 5, 1000)]).await.unwrap();
        let book = store.all_books().await.unwrap().remove(0);
        let user = UserId::new(100);

        let first = store.add_to_wishlist(user, book.id).await.unwrap();
        let second = store.add_to_wishlist(user, book.id).await.unwrap();
        assert_eq!(first.id, second.id);
        assert_eq!(store.wishlist_books(user).await.unwrap().len(), 1);

        assert!(matches!(
            store.add_to_wishlist(user, BookId::new(9999)).await,
            Err(RepositoryError::NotFound)
        ));
    }

    #[tokio::test]
    async fn test_offline_store_fails() {
        let store = MemoryStore::new();
        store.set_offline(true).await;
        assert!(store.ping().await.is_err());
        store.set_offline(false).await;
        assert!(store.ping().await.is_ok());
    }
}
