//! HTTP route handlers for storefront.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness
//! GET    /health/ready                  - Store readable
//!
//! # Catalog
//! GET    /api/products?category=&sort=  - Product listing
//! GET    /api/products/{id}             - Product detail
//! GET    /api/categories                - Categories with product counts
//!
//! # Cart
//! GET    /api/cart                      - Lines and totals
//! GET    /api/cart/count                - Total item count
//! POST   /api/cart/items                - Add a product
//! PATCH  /api/cart/items/{id}           - Set quantity (<= 0 removes)
//! DELETE /api/cart/items/{id}           - Remove a line
//! DELETE /api/cart                      - Clear
//!
//! # Favorites
//! GET    /api/favorites                 - Saved products
//! POST   /api/favorites                 - Save a product
//! GET    /api/favorites/{id}            - Is the product saved
//! DELETE /api/favorites/{id}            - Forget a product
//! DELETE /api/favorites                 - Clear
//!
//! # Search
//! GET    /api/search                    - Current query and results
//! POST   /api/search                    - Run a query
//! DELETE /api/search                    - Reset
//!
//! # Auth (simulated)
//! GET    /api/auth/me                   - Current state
//! POST   /api/auth/login                - Sign in
//! POST   /api/auth/register             - Register
//! POST   /api/auth/logout               - Sign out
//!
//! # Checkout
//! GET    /api/checkout                  - Step, details, totals
//! POST   /api/checkout/shipping         - Submit shipping address
//! POST   /api/checkout/payment          - Choose payment method
//! POST   /api/checkout/back             - Previous step
//! POST   /api/checkout/reset            - Start over
//! POST   /api/checkout/card/intent      - Create payment intent for the total
//! POST   /api/checkout/card/confirm     - Record the order once paid
//! POST   /api/checkout/cash             - Place a cash-on-delivery order
//! GET    /api/orders/last               - Most recent order
//!
//! # Payments
//! POST   /api/payments/create-intent    - Create a payment intent
//! GET    /api/payments/config           - Publishable key and currency
//! POST   /api/payments/validate-card    - Card shape checks
//! ```

pub mod auth;
pub mod cart;
pub mod checkout;
pub mod favorites;
pub mod health;
pub mod payments;
pub mod products;
pub mod search;

use axum::{
    Router,
    middleware::from_fn,
    routing::{get, patch, post},
};
use tower::ServiceBuilder;
use tower_http::trace::{DefaultOnResponse, OnResponse, TraceLayer};
use tracing::Span;

use crate::middleware::request_id_middleware;
use crate::state::AppState;

/// Create the catalog routes router.
pub fn product_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(products::index))
        .route("/{id}", get(products::show))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show).delete(cart::clear))
        .route("/count", get(cart::count))
        .route("/items", post(cart::add))
        .route("/items/{id}", patch(cart::update).delete(cart::remove))
}

/// Create the favorites routes router.
pub fn favorite_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(favorites::index).post(favorites::add).delete(favorites::clear))
        .route("/{id}", get(favorites::show).delete(favorites::remove))
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/me", get(auth::me))
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/logout", post(auth::logout))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/shipping", post(checkout::shipping))
        .route("/payment", post(checkout::payment))
        .route("/back", post(checkout::back))
        .route("/reset", post(checkout::reset))
        .route("/card/intent", post(checkout::card_intent))
        .route("/card/confirm", post(checkout::card_confirm))
        .route("/cash", post(checkout::cash))
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/create-intent", post(payments::create_intent))
        .route("/config", get(payments::config))
        .route("/validate-card", post(payments::validate_card))
}

/// Create all API routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/products", product_routes())
        .route("/categories", get(products::categories))
        .nest("/cart", cart_routes())
        .nest("/favorites", favorite_routes())
        .route(
            "/search",
            get(search::show).post(search::run).delete(search::clear),
        )
        .nest("/auth", auth_routes())
        .nest("/checkout", checkout_routes())
        .route("/orders/last", get(checkout::last_order))
        .nest("/payments", payment_routes())
}

/// Build the full application: health checks, API, and middleware.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness))
        .nest("/api", routes())
        .layer(
            ServiceBuilder::new()
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(|request: &axum::http::Request<_>| {
                            tracing::info_span!(
                                "http_request",
                                method = %request.method(),
                                uri = %request.uri(),
                                request_id = tracing::field::Empty,
                                status = tracing::field::Empty,
                                latency_ms = tracing::field::Empty,
                            )
                        })
                        .on_response(
                            |response: &axum::http::Response<_>,
                             latency: std::time::Duration,
                             span: &Span| {
                                span.record("status", response.status().as_u16());
                                span.record(
                                    "latency_ms",
                                    u64::try_from(latency.as_millis()).unwrap_or(u64::MAX),
                                );
                                DefaultOnResponse::default().on_response(response, latency, span);
                            },
                        ),
                )
                // Inside the trace span so the id lands on it
                .layer(from_fn(request_id_middleware)),
        )
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction())
}
