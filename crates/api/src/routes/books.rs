//! Catalog handlers: listing, search, price sort and admin import.

use axum::extract::{Multipart, State, multipart::MultipartRejection};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use bookstore_core::PageNumber;

use crate::db::Store;
use crate::error::{ApiJson, ApiPath, AppError, Result};
use crate::middleware::RequireAdmin;
use crate::models::Book;
use crate::response::ApiResponse;
use crate::services::import::parse_catalog;
use crate::state::AppState;

/// Multipart field holding the CSV upload.
pub const UPLOAD_FIELD: &str = "upfile";

/// Search request body.
#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub keyword: String,
}

/// A page of the catalog.
#[derive(Debug, Serialize)]
pub struct PageData {
    pub page: PageNumber,
    pub books: Vec<Book>,
    pub cached: bool,
}

/// Search results.
#[derive(Debug, Serialize)]
pub struct SearchData {
    pub keyword: String,
    pub books: Vec<Book>,
    pub cached: bool,
}

/// Import outcome plus the catalog as it now stands.
#[derive(Debug, Serialize)]
pub struct ImportData {
    pub inserted: usize,
    pub restocked: usize,
    pub books: Vec<Book>,
}

/// First page of the catalog.
pub async fn first_page<S: Store>(state: State<AppState<S>>) -> Result<ApiResponse<PageData>> {
    list(state, PageNumber::FIRST).await
}

/// A numbered page of the catalog.
pub async fn page<S: Store>(
    state: State<AppState<S>>,
    ApiPath(page): ApiPath<PageNumber>,
) -> Result<ApiResponse<PageData>> {
    list(state, page).await
}

#[instrument(skip(state))]
async fn list<S: Store>(
    State(state): State<AppState<S>>,
    page: PageNumber,
) -> Result<ApiResponse<PageData>> {
    let listing = state.catalog().page(page).await?;
    Ok(ApiResponse::ok(
        "Books",
        PageData {
            page,
            books: listing.books,
            cached: listing.cached,
        },
    ))
}

/// Exact title or author search.
#[instrument(skip(state, body), fields(keyword = %body.keyword))]
pub async fn search<S: Store>(
    State(state): State<AppState<S>>,
    ApiJson(body): ApiJson<SearchRequest>,
) -> Result<ApiResponse<SearchData>> {
    let listing = state.catalog().search(&body.keyword).await?;
    Ok(ApiResponse::ok(
        "Books found",
        SearchData {
            keyword: body.keyword.trim().to_string(),
            books: listing.books,
            cached: listing.cached,
        },
    ))
}

/// First page sorted by price.
pub async fn first_page_by_price<S: Store>(
    state: State<AppState<S>>,
) -> Result<ApiResponse<PageData>> {
    sorted(state, PageNumber::FIRST).await
}

/// A numbered page sorted by price.
pub async fn page_by_price<S: Store>(
    state: State<AppState<S>>,
    ApiPath(page): ApiPath<PageNumber>,
) -> Result<ApiResponse<PageData>> {
    sorted(state, page).await
}

#[instrument(skip(state))]
async fn sorted<S: Store>(
    State(state): State<AppState<S>>,
    page: PageNumber,
) -> Result<ApiResponse<PageData>> {
    let books = state.catalog().sorted_by_price(page).await?;
    Ok(ApiResponse::ok(
        "Books sorted",
        PageData {
            page,
            books,
            cached: false,
        },
    ))
}

/// Bulk load or restock books from an uploaded CSV. Admin only.
#[instrument(skip(state, admin, multipart), fields(admin = %admin.0.username))]
pub async fn import<S: Store>(
    State(state): State<AppState<S>>,
    admin: RequireAdmin,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<ApiResponse<ImportData>> {
    let mut multipart = multipart.map_err(|e| AppError::Validation(e.body_text()))?;

    let mut upload = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() == Some(UPLOAD_FIELD) {
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::Validation(e.body_text()))?;
            upload = Some(bytes);
            break;
        }
    }

    let bytes = upload.ok_or_else(|| AppError::Validation("Upload a CSV file".to_string()))?;
    let rows = parse_catalog(bytes.as_ref())?;

    let catalog = state.catalog();
    let summary = catalog.import(&rows).await?;
    let books = state.store().all_books().await?;

    Ok(ApiResponse::ok(
        "Books added",
        ImportData {
            inserted: summary.inserted,
            restocked: summary.restocked,
            books,
        },
    ))
}
