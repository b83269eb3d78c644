//! Cart, order, wishlist, email and delivery flows.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use axum::http::{Method, StatusCode};
use bookstore_core::{BookId, UserId};
use bookstore_integration_tests::{CATALOG_CSV, TestApp};
use serde_json::{Value, json};

/// Seed the catalog and look up the internal ids of Emma, Dune and Persuasion.
async fn seeded() -> (TestApp, Vec<i64>) {
    let app = TestApp::with_page_size(10);
    app.seed_catalog(CATALOG_CSV).await;
    let listing = app.get("/get_books", None).await;
    let ids = listing.data()["books"]
        .as_array()
        .unwrap()
        .iter()
        .map(|b| b["id"].as_i64().unwrap())
        .collect();
    (app, ids)
}

async fn stock_of(app: &TestApp, book_id: i64) -> i64 {
    app.cache.invalidate_catalog().await.unwrap();
    let listing = app.get("/get_books", None).await;
    listing.data()["books"]
        .as_array()
        .unwrap()
        .iter()
        .find(|b| b["id"].as_i64() == Some(book_id))
        .map(|b| b["quantity"].as_i64().unwrap())
        .unwrap()
}

fn money(value: &Value) -> &str {
    value.as_str().unwrap()
}

#[tokio::test]
async fn test_add_to_cart_reserves_stock() {
    let (app, ids) = seeded().await;
    let (_, token) = app.register("alice").await;

    let response = app
        .post(
            "/cart",
            Some(&token),
            json!({ "book_id": ids[1], "quantity": 2 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CREATED);
    assert_eq!(response.message(), "Books added to the cart");
    assert_eq!(response.data()["remaining_stock"], json!(3));
    assert_eq!(stock_of(&app, ids[1]).await, 3);
}

#[tokio::test]
async fn test_out_of_stock_creates_no_line() {
    let (app, ids) = seeded().await;
    let (_, token) = app.register("alice").await;

    let response = app
        .post("/cart", Some(&token), json!({ "book_id": ids[2] }))
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.message(), "Book not available");
    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(cart.data()["items"], json!([]));
}

#[tokio::test]
async fn test_cannot_take_more_than_stock() {
    let (app, ids) = seeded().await;
    let (_, token) = app.register("alice").await;

    let response = app
        .post(
            "/cart",
            Some(&token),
            json!({ "book_id": ids[0], "quantity": 4 }),
        )
        .await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(stock_of(&app, ids[0]).await, 3);
}

#[tokio::test]
async fn test_unknown_book() {
    let (app, _) = seeded().await;
    let (_, token) = app.register("alice").await;

    let response = app
        .post("/cart", Some(&token), json!({ "book_id": 9999 }))
        .await;
    assert_eq!(response.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_place_order_totals_cart_and_empties_it() {
    let (app, ids) = seeded().await;
    let (user_id, token) = app.register("alice").await;
    app.post(
        "/cart",
        Some(&token),
        json!({ "book_id": ids[0], "quantity": 2 }),
    )
    .await;
    app.post("/cart", Some(&token), json!({ "book_id": ids[1] }))
        .await;

    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(money(&cart.data()["total"]), "39.99");

    let order = app.request(Method::POST, "/order", Some(&token), None).await;

    assert_eq!(order.status, StatusCode::CREATED);
    assert_eq!(order.message(), "Order Placed");
    assert_eq!(order.data()["user_id"].as_i64().unwrap(), user_id);
    assert_eq!(money(&order.data()["total_amount"]), "39.99");
    assert_eq!(order.data()["books"].as_array().unwrap().len(), 2);

    let after = app.get("/cart", Some(&token)).await;
    assert_eq!(after.data()["items"], json!([]));
    assert_eq!(money(&after.data()["total"]), "0");
}

#[tokio::test]
async fn test_empty_cart_order_conflicts() {
    let (app, _) = seeded().await;
    let (_, token) = app.register("alice").await;

    let response = app.request(Method::POST, "/order", Some(&token), None).await;

    assert_eq!(response.status, StatusCode::CONFLICT);
    assert_eq!(response.message(), "Cart is empty");
}

#[tokio::test]
async fn test_failed_order_keeps_cart() {
    let (app, ids) = seeded().await;
    let (_, token) = app.register("alice").await;
    app.post("/cart", Some(&token), json!({ "book_id": ids[1] }))
        .await;

    app.store.set_offline(true).await;
    let failed = app.request(Method::POST, "/order", Some(&token), None).await;
    app.store.set_offline(false).await;

    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(failed.message(), "Internal server error");
    let cart = app.get("/cart", Some(&token)).await;
    assert_eq!(cart.data()["items"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_order_failing_midway_leaves_no_trace() {
    let (app, ids) = seeded().await;
    let (user_id, token) = app.register("alice").await;
    app.post("/cart", Some(&token), json!({ "book_id": ids[0] }))
        .await;
    app.post("/cart", Some(&token), json!({ "book_id": ids[1], "quantity": 2 }))
        .await;
    let before = app.get("/cart", Some(&token)).await;

    app.store
        .fail_order_at(BookId::new(i32::try_from(ids[1]).unwrap()))
        .await;
    let failed = app.request(Method::POST, "/order", Some(&token), None).await;

    assert_eq!(failed.status, StatusCode::INTERNAL_SERVER_ERROR);
    let after = app.get("/cart", Some(&token)).await;
    assert_eq!(after.data(), before.data());
    let user_id = UserId::new(i32::try_from(user_id).unwrap());
    assert_eq!(app.store.order_count(user_id).await, 0);
    assert_eq!(stock_of(&app, ids[1]).await, 3);

    let placed = app.request(Method::POST, "/order", Some(&token), None).await;
    assert_eq!(placed.status, StatusCode::CREATED, "{:?}", placed.body);
    assert_eq!(app.store.order_count(user_id).await, 1);
}

#[tokio::test]
async fn test_carts_are_per_user() {
    let (app, ids) = seeded().await;
    let (_, alice) = app.register("alice").await;
    let (_, bob) = app.register("bob").await;
    app.post("/cart", Some(&alice), json!({ "book_id": ids[1] }))
        .await;

    let bobs = app.get("/cart", Some(&bob)).await;
    assert_eq!(bobs.data()["items"], json!([]));
}

#[tokio::test]
async fn test_wishlist_add_and_list() {
    let (app, ids) = seeded().await;
    let (_, token) = app.register("alice").await;

    let added = app
        .post("/wishlist", Some(&token), json!({ "book_id": ids[2] }))
        .await;
    assert_eq!(added.status, StatusCode::CREATED);
    let again = app
        .post("/wishlist", Some(&token), json!({ "book_id": ids[2] }))
        .await;
    assert_eq!(again.data()["entry_id"], added.data()["entry_id"]);

    let listed = app.get("/wishlist", Some(&token)).await;
    let books = listed.data()["books"].as_array().unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0]["title"], json!("Persuasion"));

    let missing = app
        .post("/wishlist", Some(&token), json!({ "book_id": 9999 }))
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_delivery() {
    let (app, ids) = seeded().await;
    let (_, token) = app.register("alice").await;
    app.post("/cart", Some(&token), json!({ "book_id": ids[0] }))
        .await;
    let order = app.request(Method::POST, "/order", Some(&token), None).await;
    let order_id = order.data()["order_id"].clone();

    let delivered = app
        .request(
            Method::PUT,
            "/delivery",
            None,
            Some(json!({ "order_id": order_id })),
        )
        .await;
    assert_eq!(delivered.status, StatusCode::OK);
    assert_eq!(delivered.data()["status"], json!("Delivered"));

    let twice = app
        .request(
            Method::PUT,
            "/delivery",
            None,
            Some(json!({ "order_id": order_id })),
        )
        .await;
    assert_eq!(twice.status, StatusCode::CONFLICT);

    let unknown = app
        .request(
            Method::PUT,
            "/delivery",
            None,
            Some(json!({ "order_id": 424_242 })),
        )
        .await;
    assert_eq!(unknown.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_send_mail_errors() {
    let (app, ids) = seeded().await;
    let (user_id, token) = app.register("alice").await;

    let no_user = app.get("/send_mail/424242", None).await;
    assert_eq!(no_user.status, StatusCode::NOT_FOUND);

    let no_order = app.get(&format!("/send_mail/{user_id}"), None).await;
    assert_eq!(no_order.status, StatusCode::NOT_FOUND);

    app.post("/cart", Some(&token), json!({ "book_id": ids[0] }))
        .await;
    app.request(Method::POST, "/order", Some(&token), None).await;

    // The test app has no SMTP relay
    let disabled = app
        .request(Method::POST, &format!("/send_mail/{user_id}"), None, None)
        .await;
    assert_eq!(disabled.status, StatusCode::INTERNAL_SERVER_ERROR);
}
