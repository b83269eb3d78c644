//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use bookstore_core::{Email, MobileNumber, UserId};

/// A registered customer.
///
/// The password hash is deliberately not part of this type; it is only read
/// by the login path.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: UserId,
    pub username: String,
    pub mobile: MobileNumber,
    pub email: Email,
    pub created_at: DateTime<Utc>,
}

/// A validated registration, ready to insert.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub mobile: MobileNumber,
    pub email: Email,
    /// Argon2 PHC string.
    pub password_hash: String,
}
