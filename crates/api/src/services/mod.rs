//! Business logic services.
//!
//! # Services
//!
//! - `auth` - Registration, login and login tokens
//! - `catalog` - Cached catalog listings and imports
//! - `commerce` - Cart, orders, wishlist and delivery
//! - `email` - Order confirmation email
//! - `import` - Catalog CSV parsing
//!
//! Services borrow the store and cache from [`AppState`](crate::state::AppState)
//! for the duration of one request.

pub mod auth;
pub mod catalog;
pub mod commerce;
pub mod email;
pub mod import;
