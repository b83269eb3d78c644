//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers return `Result<T, AppError>`.
//! Errors render as the standard envelope with `success: false`.

use axum::{
    extract::{FromRequest, FromRequestParts, rejection::JsonRejection, rejection::PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::cache::CacheError;
use crate::db::RepositoryError;
use crate::response::failure;
use crate::services::auth::AuthError;
use crate::services::catalog::CatalogError;
use crate::services::commerce::CommerceError;
use crate::services::email::EmailError;
use crate::services::import::ImportError;

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Request body, path or field failed validation.
    #[error("{0}")]
    Validation(String),

    /// No `token` header on a protected route.
    #[error("Requires Login")]
    MissingToken,

    /// Token could not be verified.
    #[error("Invalid or expired token")]
    InvalidToken,

    /// Credentials were rejected.
    #[error("{0}")]
    Unauthorized(String),

    /// Authenticated but not allowed.
    #[error("{0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("{0}")]
    NotFound(String),

    /// Request conflicts with current state.
    #[error("{0}")]
    Conflict(String),

    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(RepositoryError),

    /// Cache operation failed.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::MissingToken => StatusCode::BAD_REQUEST,
            Self::InvalidToken | Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Database(_) | Self::Cache(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    const fn is_server_error(&self) -> bool {
        matches!(self, Self::Database(_) | Self::Cache(_) | Self::Internal(_))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Capture server errors to Sentry
        if self.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if self.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        failure(self.status(), message)
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound => Self::NotFound("Not found".to_string()),
            RepositoryError::Conflict(msg) => Self::Conflict(msg),
            RepositoryError::StockOverflow(_) => Self::Validation(err.to_string()),
            other => Self::Database(other),
        }
    }
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidEmail(_)
            | AuthError::InvalidMobile(_)
            | AuthError::InvalidUsername(_)
            | AuthError::WeakPassword(_) => Self::Validation(err.to_string()),
            AuthError::InvalidCredentials => {
                Self::Unauthorized("Bad username or password".to_string())
            }
            AuthError::UserAlreadyExists(msg) => Self::Conflict(msg),
            AuthError::InvalidToken(_) => Self::InvalidToken,
            AuthError::Repository(e) => e.into(),
            AuthError::TokenSigning | AuthError::PasswordHash => Self::Internal(err.to_string()),
        }
    }
}

impl From<CatalogError> for AppError {
    fn from(err: CatalogError) -> Self {
        match err {
            CatalogError::PageNotFound(_) | CatalogError::NoMatches => {
                Self::NotFound(err.to_string())
            }
            CatalogError::EmptyKeyword => Self::Validation(err.to_string()),
            CatalogError::Repository(e) => e.into(),
        }
    }
}

impl From<CommerceError> for AppError {
    fn from(err: CommerceError) -> Self {
        match err {
            CommerceError::InvalidQuantity => Self::Validation(err.to_string()),
            CommerceError::BookNotFound | CommerceError::OrderNotFound => {
                Self::NotFound(err.to_string())
            }
            CommerceError::BookUnavailable
            | CommerceError::InsufficientStock { .. }
            | CommerceError::EmptyCart
            | CommerceError::AlreadyDelivered => Self::Conflict(err.to_string()),
            CommerceError::Repository(e) => e.into(),
        }
    }
}

impl From<ImportError> for AppError {
    fn from(err: ImportError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<EmailError> for AppError {
    fn from(err: EmailError) -> Self {
        Self::Internal(err.to_string())
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

/// `Json` extractor whose rejection renders as the error envelope.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `Path` extractor whose rejection renders as the error envelope.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
