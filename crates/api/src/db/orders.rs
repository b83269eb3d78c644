//! Order repository for `PostgreSQL`.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;

use bookstore_core::{DeliveryStatus, OrderId, UserId};

use super::RepositoryError;
use crate::models::{CartItem, Order, OrderBook, PlacedOrder, cart_total};

/// Raw `customer_order` row.
#[derive(Debug, sqlx::FromRow)]
struct OrderRow {
    id: OrderId,
    user_id: UserId,
    total_amount: Decimal,
    is_delivered: bool,
    order_date: DateTime<Utc>,
}

impl From<OrderRow> for Order {
    fn from(row: OrderRow) -> Self {
        Self {
            id: row.id,
            user_id: row.user_id,
            total_amount: row.total_amount,
            status: DeliveryStatus::from_delivered(row.is_delivered),
            order_date: row.order_date,
        }
    }
}

/// Repository for order database operations.
pub struct OrderRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> OrderRepository<'a> {
    /// Create a new order repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Check out the user's cart.
    ///
    /// Locks the cart lines, inserts the order, moves every line into
    /// `orderbook` and deletes it from `cart`. Any failure rolls the whole
    /// checkout back, leaving the cart as it was.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a statement fails.
    pub async fn place(&self, user_id: UserId) -> Result<Option<PlacedOrder>, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let items = sqlx::query_as::<_, CartItem>(
            r"
            SELECT c.id AS line_id, c.book_id, b.title, b.price AS unit_price, c.quantity
            FROM cart c
            JOIN books b ON b.id = c.book_id
            WHERE c.user_id = $1
            ORDER BY c.id
            FOR UPDATE OF c
            ",
        )
        .bind(user_id)
        .fetch_all(&mut *tx)
        .await?;

        if items.is_empty() {
            tx.rollback().await?;
            return Ok(None);
        }

        let order: Order = sqlx::query_as::<_, OrderRow>(
            r"
            INSERT INTO customer_order (user_id, total_amount)
            VALUES ($1, $2)
            RETURNING id, user_id, total_amount, is_delivered, order_date
            ",
        )
        .bind(user_id)
        .bind(cart_total(&items))
        .fetch_one(&mut *tx)
        .await?
        .into();

        let mut books = Vec::with_capacity(items.len());
        for item in &items {
            sqlx::query("DELETE FROM cart WHERE id = $1")
                .bind(item.line_id)
                .execute(&mut *tx)
                .await?;

            let book = sqlx::query_as::<_, OrderBook>(
                r"
                INSERT INTO orderbook (order_id, user_id, book_id, quantity)
                VALUES ($1, $2, $3, $4)
                RETURNING id, order_id, user_id, book_id, quantity
                ",
            )
            .bind(order.id)
            .bind(user_id)
            .bind(item.book_id)
            .bind(item.quantity)
            .fetch_one(&mut *tx)
            .await?;

            books.push(book);
        }

        tx.commit().await?;

        Ok(Some(PlacedOrder { order, books }))
    }

    /// Get the user's most recent order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn latest_for_user(&self, user_id: UserId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, OrderRow>(
            r"
            SELECT id, user_id, total_amount, is_delivered, order_date
            FROM customer_order
            WHERE user_id = $1
            ORDER BY order_date DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Order::from))
    }

    /// Flip the delivery flag of an undelivered order.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the order doesn't exist.
    /// Returns `RepositoryError::Conflict` if it was already delivered.
    pub async fn mark_delivered(&self, order_id: OrderId) -> Result<Order, RepositoryError> {
        let updated = sqlx::query_as::<_, OrderRow>(
            r"
            UPDATE customer_order
            SET is_delivered = TRUE
            WHERE id = $1 AND is_delivered = FALSE
            RETURNING id, user_id, total_amount, is_delivered, order_date
            ",
        )
        .bind(order_id)
        .fetch_optional(self.pool)
        .await?;

        if let Some(row) = updated {
            return Ok(row.into());
        }

        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM customer_order WHERE id = $1)")
                .bind(order_id)
                .fetch_one(self.pool)
                .await?;

        if exists {
            Err(RepositoryError::Conflict("order already delivered".to_owned()))
        } else {
            Err(RepositoryError::NotFound)
        }
    }
}
