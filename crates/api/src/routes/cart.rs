//! Cart handlers.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{BookId, CartLineId};

use crate::db::Store;
use crate::error::{ApiJson, Result};
use crate::middleware::RequireUser;
use crate::response::ApiResponse;
use crate::state::AppState;

const fn default_quantity() -> i32 {
    1
}

/// Add-to-cart request body.
#[derive(Debug, Deserialize)]
pub struct AddToCartRequest {
    pub book_id: BookId,
    #[serde(default = "default_quantity")]
    pub quantity: i32,
}

#[derive(Debug, Serialize)]
pub struct AddedData {
    pub line_id: CartLineId,
    pub book_id: BookId,
    pub title: String,
    pub quantity: i32,
    pub price_per_book: Decimal,
    pub remaining_stock: i32,
}

#[derive(Debug, Serialize)]
pub struct CartLineData {
    pub line_id: CartLineId,
    pub book_id: BookId,
    pub title: String,
    pub unit_price: Decimal,
    pub quantity: i32,
    pub line_total: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CartData {
    pub items: Vec<CartLineData>,
    pub total: Decimal,
}

/// Put copies of a book in the caller's cart.
#[instrument(skip(state))]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<AddToCartRequest>,
) -> Result<ApiResponse<AddedData>> {
    let (line, book) = state
        .commerce()
        .add_to_cart(user_id, body.book_id, body.quantity)
        .await?;

    Ok(ApiResponse::created(
        "Books added to the cart",
        AddedData {
            line_id: line.id,
            book_id: book.id,
            title: book.title,
            quantity: line.quantity,
            price_per_book: book.price,
            remaining_stock: book.quantity,
        },
    ))
}

/// The caller's cart.
#[instrument(skip(state))]
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user_id): RequireUser,
) -> Result<ApiResponse<CartData>> {
    let cart = state.commerce().cart(user_id).await?;
    let items = cart
        .items
        .into_iter()
        .map(|item| CartLineData {
            line_total: item.line_total(),
            line_id: item.line_id,
            book_id: item.book_id,
            title: item.title,
            unit_price: item.unit_price,
            quantity: item.quantity,
        })
        .collect();

    Ok(ApiResponse::ok(
        "Cart",
        CartData {
            items,
            total: cart.total,
        },
    ))
}
