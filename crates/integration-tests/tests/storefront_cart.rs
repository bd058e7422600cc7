//! Integration tests for the cart routes.

use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::json;

use kiosk_integration_tests::{TestContext, decimal};
use kiosk_storefront::storage::keys;

// =============================================================================
// Adding
// =============================================================================

#[tokio::test]
async fn test_same_product_twice_merges_into_one_line() {
    let ctx = TestContext::new();

    ctx.add_to_cart(1, 1).await;
    let cart = ctx.add_to_cart(1, 2).await;

    let items = cart["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(cart["items"][0]["quantity"], 3);
    assert_eq!(cart["totalItems"], 3);
    assert_eq!(decimal(&cart["totalPrice"]), Decimal::new(32_985, 2));
}

#[tokio::test]
async fn test_add_defaults_to_one() {
    let ctx = TestContext::new();

    let (status, cart) = ctx.post("/api/cart/items", json!({ "productId": 2 })).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totalItems"], 1);
}

#[tokio::test]
async fn test_add_unknown_product_is_not_found() {
    let ctx = TestContext::new();

    let (status, body) = ctx.post("/api/cart/items", json!({ "productId": 999 })).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Product 999 not found");
    assert_eq!(ctx.get("/api/cart").await.1["totalItems"], 0);
}

// =============================================================================
// Quantities and totals
// =============================================================================

#[tokio::test]
async fn test_totals_are_sums_over_lines() {
    let ctx = TestContext::new();

    ctx.add_to_cart(1, 2).await;
    ctx.add_to_cart(2, 1).await;
    let cart = ctx.add_to_cart(4, 3).await;

    let items = cart["items"].as_array().expect("items array");
    let quantity_sum: u64 = items.iter().map(|i| i["quantity"].as_u64().expect("quantity")).sum();
    let price_sum: Decimal = items
        .iter()
        .map(|i| decimal(&i["price"]) * Decimal::from(i["quantity"].as_u64().expect("quantity")))
        .sum();

    assert_eq!(cart["totalItems"], quantity_sum);
    assert_eq!(decimal(&cart["totalPrice"]), price_sum);

    let (_, count) = ctx.get("/api/cart/count").await;
    assert_eq!(count["totalItems"], 6);
}

#[tokio::test]
async fn test_set_quantity_overwrites() {
    let ctx = TestContext::new();
    ctx.add_to_cart(2, 1).await;

    let (status, cart) = ctx
        .request(Method::PATCH, "/api/cart/items/2", Some(json!({ "quantity": 5 })))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"][0]["quantity"], 5);
    assert_eq!(decimal(&cart["totalPrice"]), Decimal::new(11_150, 2));
}

#[tokio::test]
async fn test_quantity_zero_or_below_removes_line() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 2).await;
    ctx.add_to_cart(2, 1).await;

    let (_, cart) = ctx
        .request(Method::PATCH, "/api/cart/items/1", Some(json!({ "quantity": 0 })))
        .await;
    assert_eq!(cart["items"].as_array().expect("items array").len(), 1);
    assert_eq!(cart["totalItems"], 1);

    let (_, cart) = ctx
        .request(Method::PATCH, "/api/cart/items/2", Some(json!({ "quantity": -3 })))
        .await;
    assert!(cart["items"].as_array().expect("items array").is_empty());
    assert_eq!(cart["totalItems"], 0);
    assert_eq!(decimal(&cart["totalPrice"]), Decimal::ZERO);
}

#[tokio::test]
async fn test_remove_line() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 1).await;
    ctx.add_to_cart(3, 1).await;

    let (status, cart) = ctx.delete("/api/cart/items/1").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["items"].as_array().expect("items array").len(), 1);
    assert_eq!(cart["items"][0]["id"], 3);
}

// =============================================================================
// Persistence
// =============================================================================

#[tokio::test]
async fn test_clear_empties_totals_and_persisted_record() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 2).await;
    assert_eq!(
        ctx.stored(keys::CART).expect("cart persisted").as_array().map(Vec::len),
        Some(1)
    );

    let (status, cart) = ctx.delete("/api/cart").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(cart["totalItems"], 0);
    assert_eq!(decimal(&cart["totalPrice"]), Decimal::ZERO);
    assert_eq!(ctx.stored(keys::CART), Some(json!([])));
}

#[tokio::test]
async fn test_cart_survives_restart() {
    let ctx = TestContext::new();
    ctx.add_to_cart(4, 2).await;

    let restarted = TestContext::with_store(ctx.store.clone());
    let (_, cart) = restarted.get("/api/cart").await;

    assert_eq!(cart["totalItems"], 2);
    assert_eq!(cart["items"][0]["title"], "WD 2TB Elements Portable Hard Drive");
}
