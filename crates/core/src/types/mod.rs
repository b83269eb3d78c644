//! Core types for the bookstore.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod mobile;
pub mod page;
pub mod status;

pub use email::{Email, EmailError};
pub use id::*;
pub use mobile::{MobileNumber, MobileNumberError};
pub use page::{PageNumber, PageNumberError};
pub use status::DeliveryStatus;
