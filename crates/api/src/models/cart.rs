//! Cart types.

use rust_decimal::Decimal;
use serde::Serialize;

use bookstore_core::{BookId, CartLineId, UserId};

/// A pending, not-yet-ordered book selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartLine {
    pub id: CartLineId,
    pub user_id: UserId,
    pub book_id: BookId,
    pub quantity: i32,
}

/// A cart line joined with the book it refers to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct CartItem {
    pub line_id: CartLineId,
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
}

impl CartItem {
    /// Price of this line (unit price times quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price * Decimal::from(self.quantity)
    }
}

/// Sum of all line totals.
#[must_use]
pub fn cart_total(items: &[CartItem]) -> Decimal {
    items.iter().map(CartItem::line_total).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(price: Decimal, quantity: i32) -> CartItem {
        CartItem {
            line_id: CartLineId::new(1),
            book_id: BookId::new(1),
            title: "Dune".to_string(),
            unit_price: price,
            quantity,
        }
    }

    #[test]
    fn test_line_total() {
        assert_eq!(item(Decimal::new(1250, 2), 3).line_total(), Decimal::new(3750, 2));
    }

    #[test]
    fn test_cart_total() {
        let items = [item(Decimal::new(999, 2), 2), item(Decimal::new(500, 2), 1)];
        assert_eq!(cart_total(&items), Decimal::new(2498, 2));
        assert_eq!(cart_total(&[]), Decimal::ZERO);
    }
}
