//! Wishlist types.

use serde::Serialize;

use bookstore_core::{BookId, UserId, WishlistEntryId};

/// A book a user wants to buy later.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, sqlx::FromRow)]
pub struct WishlistEntry {
    pub id: WishlistEntryId,
    pub user_id: UserId,
    pub book_id: BookId,
}
