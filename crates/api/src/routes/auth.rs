//! Registration, login and token verification handlers.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::UserId;

use crate::db::Store;
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::response::ApiResponse;
use crate::services::auth::Registration;
use crate::state::AppState;

// =============================================================================
// Request Types
// =============================================================================

/// Registration request body.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    #[serde(alias = "mobile")]
    pub mobilenum: String,
    pub email: String,
    pub password: String,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
pub struct RegisterData {
    pub user_id: UserId,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct LoginData {
    pub user_id: UserId,
    pub username: String,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyData {
    pub user_id: UserId,
    pub valid: bool,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and return a login token.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn register<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<RegisterRequest>,
) -> Result<ApiResponse<RegisterData>> {
    let user = state
        .auth()
        .register(Registration {
            username: &body.username,
            mobile: &body.mobilenum,
            email: &body.email,
            password: &body.password,
        })
        .await?;

    let token = state.tokens().issue(user.id)?;
    tracing::info!(user_id = %user.id, "User registered");

    Ok(ApiResponse::created(
        "Registration successful",
        RegisterData {
            user_id: user.id,
            username: user.username,
            token,
        },
    ))
}

/// Check credentials and return a login token.
#[instrument(skip(state, body), fields(username = %body.username))]
pub async fn login<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<LoginRequest>,
) -> Result<ApiResponse<LoginData>> {
    let user = state.auth().login(&body.username, &body.password).await?;
    let token = state.tokens().issue(user.id)?;

    Ok(ApiResponse::ok(
        "Login Successful",
        LoginData {
            user_id: user.id,
            username: user.username,
            token,
        },
    ))
}

/// Report whether `token` was issued to `user_id`.
#[instrument(skip(state, token))]
pub async fn verify<S: Store>(
    State(state): State<AppState<S>>,
    ApiPath((token, user_id)): ApiPath<(String, UserId)>,
) -> Result<ApiResponse<VerifyData>> {
    let claims = state
        .tokens()
        .verify(&token)
        .map_err(|_| AppError::InvalidToken)?;

    let valid = claims.user_id == user_id;
    let message = if valid {
        "Token belongs to user"
    } else {
        "Token does not belong to user"
    };

    Ok(ApiResponse::ok(message, VerifyData { user_id, valid }))
}
