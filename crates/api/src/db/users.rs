//! User repository for `PostgreSQL`.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use bookstore_core::{Email, MobileNumber, UserId};

use super::{RepositoryError, map_unique_violation};
use crate::models::{NewUser, User};

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: UserId,
    username: String,
    mobilenum: String,
    email: String,
    created_at: DateTime<Utc>,
}

/// `users` row plus the password column, used only for login.
#[derive(Debug, sqlx::FromRow)]
struct LoginRow {
    #[sqlx(flatten)]
    user: UserRow,
    password: String,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(row: UserRow) -> Result<Self, Self::Error> {
        let email = Email::parse(&row.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;
        let mobile = MobileNumber::parse(&row.mobilenum).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid mobile number in database: {e}"))
        })?;

        Ok(Self {
            id: row.id,
            username: row.username,
            mobile,
            email,
            created_at: row.created_at,
        })
    }
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username, mobile number or
    /// email is already registered.
    pub async fn create(&self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            INSERT INTO users (username, mobilenum, password, email)
            VALUES ($1, $2, $3, $4)
            RETURNING id, username, mobilenum, email, created_at
            ",
        )
        .bind(&user.username)
        .bind(user.mobile.as_str())
        .bind(&user.password_hash)
        .bind(user.email.as_str())
        .fetch_one(self.pool)
        .await
        .map_err(map_unique_violation)?;

        row.try_into()
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query_as::<_, UserRow>(
            r"
            SELECT id, username, mobilenum, email, created_at
            FROM users
            WHERE id = $1
            ",
        )
        .bind(id)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_login(
        &self,
        username: &str,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row = sqlx::query_as::<_, LoginRow>(
            r"
            SELECT id, username, mobilenum, email, created_at, password
            FROM users
            WHERE username = $1
            ",
        )
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = User::try_from(row.user)?;
        Ok(Some((user, row.password)))
    }
}
