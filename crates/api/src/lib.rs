//! Bookstore API library.
//!
//! The server binary and the integration tests build the same router from
//! [`app`], differing only in the [`db::Store`] and cache they hand it.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, extract::Request};
use tower_http::trace::TraceLayer;

use crate::db::Store;
use crate::state::AppState;

/// Build the application router with request tracing and request IDs.
///
/// Sentry layers are added by the binary so tests run without a client.
pub fn app<S: Store>(state: AppState<S>) -> Router {
    Router::new()
        .merge(routes::routes::<S>())
        .layer(axum::middleware::from_fn(
            middleware::request_id_middleware,
        ))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request| {
                tracing::info_span!(
                    "request",
                    method = %request.method(),
                    uri = %request.uri(),
                    request_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}
