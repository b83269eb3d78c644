//! HTTP route handlers for the bookstore API.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                      - Liveness
//! GET  /health/ready                - Store readiness
//!
//! # Accounts
//! POST /register                    - Create user, returns token
//! POST /login                       - Check credentials, returns token
//! GET  /verify/{token}/{user_id}    - Does the token belong to the user
//!
//! # Catalog
//! GET  /get_books[/{page}]          - Paginated catalog (cached)
//! POST /search                      - Exact title or author match (cached)
//! GET  /sort_by_price[/{page}]      - Paginated catalog by ascending price
//! POST /addbooks                    - CSV import, admin only (multipart `upfile`)
//!
//! # Shopping (token header required)
//! POST /cart                        - Add a book to the cart
//! GET  /cart                        - View cart and total
//! POST /order                       - Check out the cart
//! POST /wishlist                    - Wishlist a book
//! GET  /wishlist                    - List wishlisted books
//!
//! # Fulfilment
//! GET|POST /send_mail/{user_id}     - Email the latest order confirmation
//! PUT  /delivery                    - Mark an order delivered
//! ```

pub mod auth;
pub mod books;
pub mod cart;
pub mod health;
pub mod orders;
pub mod wishlist;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post, put},
};

use crate::db::Store;
use crate::state::AppState;

/// Largest accepted CSV upload.
const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

/// Create the full API router.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness::<S>))
        .route("/register", post(auth::register::<S>))
        .route("/login", post(auth::login::<S>))
        .route("/verify/{token}/{user_id}", get(auth::verify::<S>))
        .merge(catalog_routes())
        .route("/cart", post(cart::add::<S>).get(cart::show::<S>))
        .route("/order", post(orders::place::<S>))
        .route(
            "/wishlist",
            post(wishlist::add::<S>).get(wishlist::list::<S>),
        )
        .route(
            "/send_mail/{user_id}",
            get(orders::send_mail::<S>).post(orders::send_mail::<S>),
        )
        .route("/delivery", put(orders::deliver::<S>))
}

fn catalog_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/get_books", get(books::first_page::<S>))
        .route("/get_books/{page}", get(books::page::<S>))
        .route("/search", post(books::search::<S>))
        .route("/sort_by_price", get(books::first_page_by_price::<S>))
        .route("/sort_by_price/{page}", get(books::page_by_price::<S>))
        .route(
            "/addbooks",
            post(books::import::<S>).layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES)),
        )
}
