//! Registration, login, token verification and auth rejections.

#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use bookstore_api::middleware::REQUEST_ID_HEADER;
use bookstore_integration_tests::{PASSWORD, TestApp};
use serde_json::json;

#[tokio::test]
async fn test_register_then_login() {
    let app = TestApp::new();
    let (user_id, _) = app.register("alice").await;

    let response = app
        .post(
            "/login",
            None,
            json!({ "username": "alice", "password": PASSWORD }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.success());
    assert_eq!(response.message(), "Login Successful");
    assert_eq!(response.data()["user_id"].as_i64().unwrap(), user_id);
    assert!(response.data()["token"].as_str().is_some());
}

#[tokio::test]
async fn test_login_wrong_password() {
    let app = TestApp::new();
    app.register("alice").await;

    let response = app
        .post(
            "/login",
            None,
            json!({ "username": "alice", "password": "not-the-password" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    assert!(!response.success());
    assert_eq!(response.message(), "Bad username or password");
}

#[tokio::test]
async fn test_duplicate_username_conflicts() {
    let app = TestApp::new();
    app.register("alice").await;

    let response = app
        .post(
            "/register",
            None,
            json!({
                "username": "alice",
                "mobilenum": "9123456780",
                "email": "other@example.com",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert!(!response.success());
}

#[tokio::test]
async fn test_register_rejects_bad_mobile() {
    let app = TestApp::new();

    let response = app
        .post(
            "/register",
            None,
            json!({
                "username": "carol",
                "mobilenum": "12ab",
                "email": "carol@example.com",
                "password": PASSWORD,
            }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_verify_token_ownership() {
    let app = TestApp::new();
    let (alice_id, alice_token) = app.register("alice").await;
    let (bob_id, _) = app.register("bob").await;

    let own = app
        .get(&format!("/verify/{alice_token}/{alice_id}"), None)
        .await;
    assert_eq!(own.status, StatusCode::OK);
    assert_eq!(own.data()["valid"], json!(true));

    let other = app.get(&format!("/verify/{alice_token}/{bob_id}"), None).await;
    assert_eq!(other.status, StatusCode::OK);
    assert_eq!(other.data()["valid"], json!(false));

    let garbage = app.get(&format!("/verify/not.a.token/{alice_id}"), None).await;
    assert_eq!(garbage.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_missing_and_invalid_token() {
    let app = TestApp::new();

    let missing = app.get("/cart", None).await;
    assert_eq!(missing.status, StatusCode::BAD_REQUEST);
    assert_eq!(missing.message(), "Requires Login");

    let invalid = app.get("/cart", Some("nonsense")).await;
    assert_eq!(invalid.status, StatusCode::UNAUTHORIZED);
    assert!(!invalid.success());
}

#[tokio::test]
async fn test_every_response_has_request_id() {
    let app = TestApp::new();

    let ok = app.request(Method::GET, "/health", None, None).await;
    assert_eq!(ok.status, StatusCode::OK);
    assert!(ok.headers.contains_key(REQUEST_ID_HEADER));

    let failed = app.get("/cart", None).await;
    assert!(failed.headers.contains_key(REQUEST_ID_HEADER));
}

#[tokio::test]
async fn test_readiness_follows_store() {
    let app = TestApp::new();
    assert_eq!(app.get("/health/ready", None).await.status, StatusCode::OK);

    app.store.set_offline(true).await;
    assert_eq!(
        app.get("/health/ready", None).await.status,
        StatusCode::SERVICE_UNAVAILABLE
    );
}
