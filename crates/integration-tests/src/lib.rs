//! Integration tests for the bookstore API.
//!
//! # Running Tests
//!
//! ```bash
//! # In-process tests (no database, no Redis)
//! cargo test -p bookstore-integration-tests
//!
//! # Live tests against a running server
//! BOOKSTORE_TEST_URL=http://127.0.0.1:3000 cargo test -p bookstore-integration-tests -- --ignored
//! ```
//!
//! [`TestApp`] drives the real router with `tower::ServiceExt::oneshot`
//! over the in-memory store and cache, so every test starts from an empty
//! bookstore.

#![allow(clippy::missing_panics_doc, clippy::unwrap_used)]

use std::time::Duration;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use bookstore_api::cache::CatalogCache;
use bookstore_api::config::{AuthConfig, CatalogConfig};
use bookstore_api::db::MemoryStore;
use bookstore_api::middleware::TOKEN_HEADER;
use bookstore_api::state::AppState;
use secrecy::SecretString;
use serde_json::{Value, json};
use tower::ServiceExt;

/// Username the test app treats as the catalog administrator.
pub const ADMIN: &str = "admin";

/// Password used for every registered test user.
pub const PASSWORD: &str = "correct-horse-battery";

const JWT_SECRET: &str = "kV9#mQ2$wL7!pX4@nR8^tY3&bZ6*cF1%";
const MULTIPART_BOUNDARY: &str = "bookstore-test-boundary";
const MAX_BODY_BYTES: usize = 1024 * 1024;

/// A decoded response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// The envelope's `success` flag.
    #[must_use]
    pub fn success(&self) -> bool {
        self.body["success"].as_bool().unwrap()
    }

    /// The envelope's `message`.
    #[must_use]
    pub fn message(&self) -> &str {
        self.body["message"].as_str().unwrap()
    }

    /// The envelope's `data`.
    #[must_use]
    pub fn data(&self) -> &Value {
        &self.body["data"]
    }
}

/// The router wired to an in-memory store and cache.
pub struct TestApp {
    pub router: Router,
    pub store: MemoryStore,
    pub cache: CatalogCache,
}

impl TestApp {
    /// App with two books per page.
    #[must_use]
    pub fn new() -> Self {
        Self::with_page_size(2)
    }

    #[must_use]
    pub fn with_page_size(books_per_page: u32) -> Self {
        let store = MemoryStore::new();
        let cache = CatalogCache::in_memory(None);
        let auth = AuthConfig {
            jwt_secret: SecretString::from(JWT_SECRET),
            token_ttl: Duration::from_secs(3600),
            admin_username: ADMIN.to_string(),
        };
        let catalog = CatalogConfig {
            books_per_page,
            ..CatalogConfig::default()
        };

        let state = AppState::new(store.clone(), cache.clone(), &auth, &catalog, None);
        Self {
            router: bookstore_api::app(state),
            store,
            cache,
        }
    }

    /// Send a request, with an optional JSON body and token.
    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> TestResponse {
        self.request(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> TestResponse {
        self.request(Method::POST, uri, token, Some(body)).await
    }

    /// Register `username` and return `(user_id, token)`.
    pub async fn register(&self, username: &str) -> (i64, String) {
        let suffix: u64 = username.bytes().map(u64::from).sum();
        let response = self
            .post(
                "/register",
                None,
                json!({
                    "username": username,
                    "mobilenum": format!("98765{suffix:05}"),
                    "email": format!("{username}@example.com"),
                    "password": PASSWORD,
                }),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);

        let data = response.data();
        (
            data["user_id"].as_i64().unwrap(),
            data["token"].as_str().unwrap().to_string(),
        )
    }

    /// Upload `csv` to `/addbooks` as the multipart `upfile` field.
    pub async fn upload_csv(&self, token: Option<&str>, csv: &str) -> TestResponse {
        let body = format!(
            "--{MULTIPART_BOUNDARY}\r\n\
             Content-Disposition: form-data; name=\"upfile\"; filename=\"books.csv\"\r\n\
             Content-Type: text/csv\r\n\r\n\
             {csv}\r\n\
             --{MULTIPART_BOUNDARY}--\r\n"
        );
        let mut builder = Request::builder()
            .method(Method::POST)
            .uri("/addbooks")
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={MULTIPART_BOUNDARY}"),
            );
        if let Some(token) = token {
            builder = builder.header(TOKEN_HEADER, token);
        }
        self.send(builder.body(Body::from(body)).unwrap()).await
    }

    /// Register the admin and import `csv`.
    pub async fn seed_catalog(&self, csv: &str) -> String {
        let (_, token) = self.register(ADMIN).await;
        let response = self.upload_csv(Some(&token), csv).await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        token
    }

    async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), MAX_BODY_BYTES).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

/// A small catalog: three books, one of them out of stock.
pub const CATALOG_CSV: &str = "\
id,author,title,image,quantity,price,description
101,Jane Austen,Emma,emma.jpg,3,15.00,A comedy of manners
102,Frank Herbert,Dune,dune.jpg,5,9.99,Desert planet
103,Jane Austen,Persuasion,,0,12.00,Second chances";
