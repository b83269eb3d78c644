//! Order placement, confirmation email and delivery handlers.

use axum::extract::State;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{OrderId, UserId};

use crate::db::Store;
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::middleware::RequireUser;
use crate::models::OrderBook;
use crate::response::ApiResponse;
use crate::services::email::spawn_order_confirmation;
use crate::state::AppState;

/// Delivery update request body.
#[derive(Debug, Deserialize)]
pub struct DeliveryRequest {
    pub order_id: OrderId,
}

#[derive(Debug, Serialize)]
pub struct OrderData {
    pub order_id: OrderId,
    pub user_id: UserId,
    pub total_amount: Decimal,
    pub order_date: DateTime<Utc>,
    pub books: Vec<OrderBook>,
}

#[derive(Debug, Serialize)]
pub struct DeliveryData {
    pub order_id: OrderId,
    pub status: &'static str,
}

/// Check out the caller's cart, then email a confirmation in the background.
#[instrument(skip(state))]
pub async fn place<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user_id): RequireUser,
) -> Result<ApiResponse<OrderData>> {
    let placed = state.commerce().place_order(user_id).await?;

    match state.store().find_user(user_id).await {
        Ok(Some(user)) => spawn_order_confirmation(state.mailer(), user, placed.order.clone()),
        Ok(None) => tracing::warn!(%user_id, "Order placed for unknown user, no email sent"),
        Err(e) => tracing::error!(error = %e, %user_id, "Failed to load user for order email"),
    }

    Ok(ApiResponse::created(
        "Order Placed",
        OrderData {
            order_id: placed.order.id,
            user_id,
            total_amount: placed.order.total_amount,
            order_date: placed.order.order_date,
            books: placed.books,
        },
    ))
}

/// Send the confirmation for the user's latest order and wait for delivery.
#[instrument(skip(state))]
pub async fn send_mail<S: Store>(
    State(state): State<AppState<S>>,
    ApiPath(user_id): ApiPath<UserId>,
) -> Result<ApiResponse<()>> {
    let user = state
        .store()
        .find_user(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;
    let order = state
        .store()
        .latest_order(user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("No orders for this user".to_string()))?;
    let mailer = state
        .mailer()
        .ok_or_else(|| AppError::Internal("email is not configured".to_string()))?;

    mailer.send_order_confirmation(&user, &order).await?;

    Ok(ApiResponse::message(format!("Mail sent to {}", user.username)))
}

/// Mark an order delivered.
#[instrument(skip(state))]
pub async fn deliver<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<DeliveryRequest>,
) -> Result<ApiResponse<DeliveryData>> {
    let order = state.commerce().mark_delivered(body.order_id).await?;
    tracing::info!(order_id = %order.id, "Order delivered");

    Ok(ApiResponse::ok(
        "Order Delivered",
        DeliveryData {
            order_id: order.id,
            status: order.status.label(),
        },
    ))
}
