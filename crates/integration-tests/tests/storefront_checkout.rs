//! Integration tests for the checkout flow.

use axum::http::StatusCode;
use rust_decimal::Decimal;
use serde_json::{Value, json};

use kiosk_core::CurrencyCode;
use kiosk_integration_tests::{TestContext, decimal, shipping_address};
use kiosk_storefront::storage::keys;

fn with_field(field: &str, value: &str) -> Value {
    let mut address = shipping_address();
    address[field] = json!(value);
    address
}

// =============================================================================
// Shipping
// =============================================================================

#[tokio::test]
async fn test_shipping_requires_items_in_cart() {
    let ctx = TestContext::new();

    let (status, body) = ctx.post("/api/checkout/shipping", shipping_address()).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "cart is empty");
}

#[tokio::test]
async fn test_shipping_rejects_missing_fields() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 1).await;

    let (status, body) = ctx.post("/api/checkout/shipping", json!({ "firstName": "Ayşe" })).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    let fields = body["fields"].as_object().expect("field errors");
    for field in ["lastName", "email", "phone", "address", "city", "district", "postalCode"] {
        assert!(fields.contains_key(field), "{field} should be reported");
    }
    assert!(!fields.contains_key("firstName"));
    assert_eq!(ctx.get("/api/checkout").await.1["step"], "shipping");
}

#[tokio::test]
async fn test_shipping_rejects_bad_email_and_phone() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 1).await;

    let (status, body) = ctx
        .post("/api/checkout/shipping", with_field("email", "ayse@example"))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["email"].is_string());

    for phone in ["053212345", "053212345678", "0532-123-4567"] {
        let (status, body) = ctx
            .post("/api/checkout/shipping", with_field("phone", phone))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{phone} should be rejected");
        assert!(body["fields"]["phone"].is_string());
    }

    assert_eq!(ctx.get("/api/checkout").await.1["step"], "shipping");
}

#[tokio::test]
async fn test_valid_shipping_moves_to_payment_selection() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 1).await;

    let (status, view) = ctx
        .post("/api/checkout/shipping", with_field("phone", "05321234567"))
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "payment-selection");
    assert_eq!(view["shippingAddress"]["city"], "İstanbul");
}

#[tokio::test]
async fn test_signed_in_email_fills_blank_email() {
    let ctx = TestContext::new();
    ctx.post(
        "/api/auth/login",
        json!({ "email": "mehmet@example.com", "password": "secret1" }),
    )
    .await;
    ctx.add_to_cart(2, 1).await;

    let (status, view) = ctx.post("/api/checkout/shipping", with_field("email", "")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["shippingAddress"]["email"], "mehmet@example.com");
}

// =============================================================================
// Payment selection and totals
// =============================================================================

#[tokio::test]
async fn test_terms_must_be_accepted() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 1).await;
    ctx.post("/api/checkout/shipping", shipping_address()).await;

    let (status, body) = ctx
        .post("/api/checkout/payment", json!({ "method": "credit-card", "acceptTerms": false }))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["fields"]["terms"].is_string());
    assert_eq!(ctx.get("/api/checkout").await.1["step"], "payment-selection");
}

#[tokio::test]
async fn test_payment_selection_needs_shipping_first() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 1).await;

    let (status, _) = ctx
        .post("/api/checkout/payment", json!({ "method": "credit-card", "acceptTerms": true }))
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_shipping_fee_and_free_shipping() {
    let ctx = TestContext::new();
    ctx.add_to_cart(1, 1).await;

    let (_, view) = ctx.get("/api/checkout").await;
    assert_eq!(decimal(&view["totals"]["shippingCost"]), Decimal::new(2999, 2));
    assert_eq!(decimal(&view["totals"]["total"]), Decimal::new(13_994, 2));

    ctx.add_to_cart(3, 3).await;
    let (_, view) = ctx.get("/api/checkout").await;
    assert_eq!(decimal(&view["totals"]["shippingCost"]), Decimal::ZERO);
    assert_eq!(
        decimal(&view["totals"]["total"]),
        decimal(&view["totals"]["subtotal"])
    );
}

#[tokio::test]
async fn test_back_and_reset() {
    let ctx = TestContext::new();
    ctx.checkout_to("credit-card").await;

    let (_, view) = ctx.post("/api/checkout/back", json!({})).await;
    assert_eq!(view["step"], "payment-selection");
    let (_, view) = ctx.post("/api/checkout/back", json!({})).await;
    assert_eq!(view["step"], "shipping");
    assert_eq!(view["shippingAddress"]["firstName"], "Ayşe");

    let (_, view) = ctx.post("/api/checkout/reset", json!({})).await;
    assert_eq!(view["step"], "shipping");
    assert_eq!(view["shippingAddress"]["firstName"], "");
}

// =============================================================================
// Card payment
// =============================================================================

#[tokio::test]
async fn test_card_checkout_places_confirmed_order() {
    let ctx = TestContext::new();
    ctx.checkout_to("credit-card").await;

    let (status, intent) = ctx.post("/api/checkout/card/intent", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(intent["paymentIntentId"], "pi_test_1");
    assert_eq!(intent["clientSecret"], "pi_test_1_secret_test");

    let created = ctx.payments.created();
    assert_eq!(created.len(), 1);
    let intent_request = created.first().expect("one intent");
    assert_eq!(intent_request.amount, 13_994);
    assert_eq!(intent_request.currency, CurrencyCode::TRY);
    assert_eq!(intent_request.metadata["itemCount"], "1");
    assert!(intent_request.metadata.contains_key("timestamp"));

    let (status, placed) = ctx
        .post("/api/checkout/card/confirm", json!({ "paymentIntentId": "pi_test_1" }))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(placed["step"], "confirmed");
    assert_eq!(placed["order"]["id"], "pi_test_1");
    assert_eq!(placed["order"]["status"], "confirmed");
    assert_eq!(placed["order"]["paymentMethod"], "credit-card");
    assert_eq!(decimal(&placed["order"]["total"]), Decimal::new(13_994, 2));

    assert_eq!(ctx.get("/api/cart").await.1["totalItems"], 0);
    assert_eq!(ctx.stored(keys::CART), Some(json!([])));
    assert_eq!(ctx.stored(keys::LAST_ORDER).expect("order saved")["id"], "pi_test_1");

    let (status, last) = ctx.get("/api/orders/last").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(last["id"], "pi_test_1");
}

#[tokio::test]
async fn test_card_order_matches_cart_at_intent_time() {
    let ctx = TestContext::new();
    ctx.checkout_to("credit-card").await;

    let (status, _) = ctx.post("/api/checkout/card/intent", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    let charged = ctx.payments.created().first().expect("one intent").amount;
    assert_eq!(charged, 13_994);

    // Items added after the intent are not part of the charge
    ctx.add_to_cart(2, 5).await;
    let (_, view) = ctx.get("/api/checkout").await;
    assert_eq!(decimal(&view["totals"]["total"]), Decimal::new(charged, 2));

    let (status, placed) = ctx
        .post("/api/checkout/card/confirm", json!({ "paymentIntentId": "pi_test_1" }))
        .await;
    assert_eq!(status, StatusCode::OK, "{placed}");
    assert_eq!(decimal(&placed["order"]["total"]), Decimal::new(charged, 2));
    let items = placed["order"]["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items.first().expect("one line")["id"], 1);

    let (_, last) = ctx.get("/api/orders/last").await;
    assert_eq!(decimal(&last["total"]), Decimal::new(charged, 2));
    assert_eq!(ctx.get("/api/cart").await.1["totalItems"], 0);
}

#[tokio::test]
async fn test_charged_amount_mismatch_does_not_place_order() {
    let ctx = TestContext::new();
    ctx.checkout_to("credit-card").await;
    ctx.post("/api/checkout/card/intent", json!({})).await;
    ctx.payments.set_amount(50);

    let (status, body) = ctx
        .post("/api/checkout/card/confirm", json!({ "paymentIntentId": "pi_test_1" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(
        body["error"].as_str().expect("error message").contains("13994"),
        "{body}"
    );
    assert!(ctx.stored(keys::LAST_ORDER).is_none());
    assert_eq!(ctx.get("/api/cart").await.1["totalItems"], 1);
    assert_eq!(ctx.get("/api/checkout").await.1["step"], "card-payment");
}

#[tokio::test]
async fn test_unpaid_intent_does_not_place_order() {
    let ctx = TestContext::new();
    ctx.checkout_to("credit-card").await;
    ctx.payments.set_status("requires_payment_method");
    ctx.post("/api/checkout/card/intent", json!({})).await;

    let (status, body) = ctx
        .post("/api/checkout/card/confirm", json!({ "paymentIntentId": "pi_test_1" }))
        .await;

    assert_eq!(status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(body["error"], "payment not completed (status: requires_payment_method)");
    assert_eq!(ctx.get("/api/cart").await.1["totalItems"], 1);
    assert_eq!(ctx.get("/api/checkout").await.1["step"], "card-payment");
    assert!(ctx.stored(keys::LAST_ORDER).is_none());
}

#[tokio::test]
async fn test_confirm_checks_the_pending_intent() {
    let ctx = TestContext::new();
    ctx.checkout_to("credit-card").await;

    let (status, _) = ctx
        .post("/api/checkout/card/confirm", json!({ "paymentIntentId": "pi_test_1" }))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    ctx.post("/api/checkout/card/intent", json!({})).await;
    let (status, _) = ctx
        .post("/api/checkout/card/confirm", json!({ "paymentIntentId": "pi_other" }))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_card_intent_outside_card_step_is_conflict() {
    let ctx = TestContext::new();
    ctx.checkout_to("cash-on-delivery").await;

    let (status, _) = ctx.post("/api/checkout/card/intent", json!({})).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(ctx.payments.create_calls(), 0);
}

#[tokio::test]
async fn test_declined_intent_passes_processor_message() {
    let ctx = TestContext::new();
    ctx.checkout_to("credit-card").await;
    ctx.payments.decline_with("Your card was declined.");

    let (status, body) = ctx.post("/api/checkout/card/intent", json!({})).await;

    assert_eq!(status, StatusCode::BAD_GATEWAY);
    assert_eq!(body["error"], "Your card was declined.");
    assert_eq!(ctx.get("/api/checkout").await.1["paymentIntentId"], Value::Null);
}

// =============================================================================
// Cash on delivery
// =============================================================================

#[tokio::test]
async fn test_cash_checkout_places_pending_order() {
    let ctx = TestContext::new();
    ctx.checkout_to("cash-on-delivery").await;
    assert_eq!(ctx.get("/api/checkout").await.1["step"], "cash-on-delivery");

    let (status, placed) = ctx.post("/api/checkout/cash", json!({})).await;

    assert_eq!(status, StatusCode::OK);
    let id = placed["order"]["id"].as_str().expect("order id");
    assert!(id.starts_with("COD_"), "unexpected id {id}");
    assert_eq!(placed["order"]["status"], "pending");
    assert_eq!(placed["order"]["paymentMethod"], "cash-on-delivery");
    assert_eq!(ctx.get("/api/cart").await.1["totalItems"], 0);
    assert_eq!(ctx.payments.create_calls(), 0);
}

#[tokio::test]
async fn test_new_shipping_after_confirmation_starts_over() {
    let ctx = TestContext::new();
    ctx.checkout_to("cash-on-delivery").await;
    ctx.post("/api/checkout/cash", json!({})).await;
    ctx.add_to_cart(4, 1).await;

    let (status, view) = ctx.post("/api/checkout/shipping", shipping_address()).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["step"], "payment-selection");
}

#[tokio::test]
async fn test_no_last_order_is_not_found() {
    let ctx = TestContext::new();

    let (status, body) = ctx.get("/api/orders/last").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert!(body["error"].is_string());
}
