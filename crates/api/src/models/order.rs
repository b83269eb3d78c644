//! Order types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use bookstore_core::{BookId, DeliveryStatus, OrderBookId, OrderId, UserId};

/// A completed checkout.
///
/// Immutable except for `status`, which moves to `Delivered` once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub status: DeliveryStatus,
    pub order_date: DateTime<Utc>,
}

/// One book of a completed order, created from a consumed cart line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct OrderBook {
    pub id: OrderBookId,
    pub order_id: OrderId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub quantity: i32,
}

/// Result of placing an order.
#[derive(Debug, Clone, Serialize)]
pub struct PlacedOrder {
    pub order: Order,
    pub books: Vec<OrderBook>,
}
