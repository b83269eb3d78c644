//! Domain models for the bookstore.
//!
//! These are validated domain objects. Types that are read straight out of
//! `PostgreSQL` derive `sqlx::FromRow`; the rest are assembled by the store.

pub mod book;
pub mod cart;
pub mod order;
pub mod user;
pub mod wishlist;

pub use book::{Book, BookImport, BookSort, ImportSummary};
pub use cart::{CartItem, CartLine, cart_total};
pub use order::{Order, OrderBook, PlacedOrder};
pub use user::{NewUser, User};
pub use wishlist::WishlistEntry;
