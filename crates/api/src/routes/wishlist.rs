//! Wishlist handlers.

use axum::extract::State;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::{BookId, WishlistEntryId};

use crate::db::Store;
use crate::error::{ApiJson, Result};
use crate::middleware::RequireUser;
use crate::models::Book;
use crate::response::ApiResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct WishlistRequest {
    pub book_id: BookId,
}

#[derive(Debug, Serialize)]
pub struct WishlistEntryData {
    pub entry_id: WishlistEntryId,
    pub book_id: BookId,
}

#[derive(Debug, Serialize)]
pub struct WishlistData {
    pub books: Vec<Book>,
}

#[instrument(skip(state))]
pub async fn add<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user_id): RequireUser,
    ApiJson(body): ApiJson<WishlistRequest>,
) -> Result<ApiResponse<WishlistEntryData>> {
    let entry = state
        .commerce()
        .add_to_wishlist(user_id, body.book_id)
        .await?;

    Ok(ApiResponse::created(
        "Books added to wishlist",
        WishlistEntryData {
            entry_id: entry.id,
            book_id: entry.book_id,
        },
    ))
}

#[instrument(skip(state))]
pub async fn list<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user_id): RequireUser,
) -> Result<ApiResponse<WishlistData>> {
    let books = state.commerce().wishlist(user_id).await?;
    Ok(ApiResponse::ok("Wishlist", WishlistData { books }))
}
