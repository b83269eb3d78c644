//! Token authentication extractors.
//!
//! Protected handlers take [`RequireUser`] or [`RequireAdmin`] as an
//! argument. The token travels in the `token` header; a missing header and
//! a bad token are rejected with distinct errors before the handler runs.

use axum::{extract::FromRequestParts, http::request::Parts};

use bookstore_core::UserId;

use crate::db::Store;
use crate::error::{AppError, set_sentry_user};
use crate::models::User;
use crate::state::AppState;

/// Header carrying the login token.
pub const TOKEN_HEADER: &str = "token";

/// Extractor that requires a valid login token.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler<S: Store>(
///     RequireUser(user_id): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, user {user_id}!")
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RequireUser(pub UserId);

impl<S: Store> FromRequestParts<AppState<S>> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(TOKEN_HEADER)
            .ok_or(AppError::MissingToken)?
            .to_str()
            .map_err(|_| AppError::InvalidToken)?;

        let claims = state.tokens().verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected token");
            AppError::InvalidToken
        })?;

        set_sentry_user(&claims.user_id);
        Ok(Self(claims.user_id))
    }
}

/// Extractor that requires the token of the configured admin user.
#[derive(Debug, Clone)]
pub struct RequireAdmin(pub User);

impl<S: Store> FromRequestParts<AppState<S>> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState<S>,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user_id) = RequireUser::from_request_parts(parts, state).await?;

        let user = state
            .store()
            .find_user(user_id)
            .await?
            .ok_or(AppError::InvalidToken)?;

        if user.username != state.admin_username() {
            tracing::warn!(%user_id, "Non-admin attempted an admin operation");
            return Err(AppError::Forbidden("Access Denied".to_string()));
        }

        Ok(Self(user))
    }
}
