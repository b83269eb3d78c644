//! Bookstore Core - Shared types library.
//!
//! This crate provides common types used across all bookstore components:
//! - `api` - The HTTP backend (catalog, cart, orders, wishlist)
//! - `cli` - Command-line tools for migrations, catalog import and cache maintenance
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no database access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, emails, mobile numbers,
//!   page numbers and delivery status

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
