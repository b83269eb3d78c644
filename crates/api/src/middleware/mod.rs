//! HTTP middleware and extractors.
//!
//! # Middleware Order (bottom to top in Router)
//!
//! 1. Sentry layer (capture errors)
//! 2. `TraceLayer` (request tracing)
//! 3. Request ID (add unique ID to each request)
//!
//! Authentication is not a layer: handlers opt in with the
//! [`RequireUser`] and [`RequireAdmin`] extractors.

pub mod auth;
pub mod request_id;

pub use auth::{RequireAdmin, RequireUser, TOKEN_HEADER};
pub use request_id::{REQUEST_ID_HEADER, RequestId, request_id_middleware};
