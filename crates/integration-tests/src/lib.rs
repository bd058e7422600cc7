//! Integration tests for the Kiosk storefront.
//!
//! Tests drive the real router with `tower::ServiceExt::oneshot`. The
//! collaborators behind it are swapped for in-process doubles:
//!
//! - [`MemoryStore`] instead of the data directory
//! - [`FixtureCatalog`] instead of the catalog API
//! - [`FakeProcessor`] instead of Stripe, recording every intent it creates
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p kiosk-integration-tests
//! ```

use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use url::Url;

use kiosk_core::{CurrencyCode, Product, ProductId, Rating};
use kiosk_storefront::catalog::{CatalogError, ProductCatalog};
use kiosk_storefront::config::{CatalogConfig, PaymentConfig, SimulationConfig, StorefrontConfig};
use kiosk_storefront::payments::{CreateIntent, PaymentError, PaymentIntent, PaymentProcessor};
use kiosk_storefront::routes;
use kiosk_storefront::state::AppState;
use kiosk_storefront::storage::{KeyValueStore, MemoryStore};

const MAX_BODY_BYTES: usize = 1024 * 1024;

// =============================================================================
// Catalog
// =============================================================================

fn product(id: i32, title: &str, cents: i64, category: &str, description: &str, rate: f64) -> Product {
    Product {
        id: ProductId::new(id),
        title: title.to_string(),
        price: Decimal::new(cents, 2),
        description: description.to_string(),
        category: category.to_string(),
        image: format!("https://catalog.test/img/{id}.jpg"),
        rating: Rating { rate, count: 100 },
    }
}

/// Six products across four categories.
///
/// "cotton" appears in one title (rated lowest) and two descriptions.
#[must_use]
pub fn fixture_products() -> Vec<Product> {
    vec![
        product(
            1,
            "Fjallraven Foldsack Backpack",
            10_995,
            "men's clothing",
            "Your perfect pack for everyday use and walks in the forest",
            3.9,
        ),
        product(
            2,
            "Mens Casual Slim Fit T-Shirt",
            2_230,
            "men's clothing",
            "Slim-fitting style in lightweight cotton",
            4.1,
        ),
        product(
            3,
            "Solid Gold Petite Micropave",
            16_800,
            "jewelery",
            "Satisfaction guaranteed. Return or exchange within 30 days",
            3.9,
        ),
        product(
            4,
            "WD 2TB Elements Portable Hard Drive",
            6_400,
            "electronics",
            "USB 3.0 and USB 2.0 compatibility with fast data transfers",
            3.3,
        ),
        product(
            5,
            "Rain Jacket Women Windbreaker",
            3_999,
            "women's clothing",
            "Lightweight shell with a cotton lining",
            3.8,
        ),
        product(
            6,
            "Cotton Field Jacket",
            5_599,
            "men's clothing",
            "Great outerwear for spring and autumn",
            2.5,
        ),
    ]
}

/// A catalog serving a fixed product list.
pub struct FixtureCatalog {
    products: Vec<Product>,
}

impl FixtureCatalog {
    #[must_use]
    pub const fn new(products: Vec<Product>) -> Self {
        Self { products }
    }
}

#[async_trait]
impl ProductCatalog for FixtureCatalog {
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        Ok(self.products.clone())
    }

    async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        self.products
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or(CatalogError::NotFound(id))
    }
}

// =============================================================================
// Payment processor
// =============================================================================

/// A payment processor that records intents instead of charging anything.
pub struct FakeProcessor {
    created: Mutex<Vec<CreateIntent>>,
    status: Mutex<String>,
    amount: Mutex<Option<i64>>,
    decline: Mutex<Option<String>>,
}

impl Default for FakeProcessor {
    fn default() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            status: Mutex::new("succeeded".to_string()),
            amount: Mutex::new(None),
            decline: Mutex::new(None),
        }
    }
}

impl FakeProcessor {
    /// Every intent request received so far.
    pub fn created(&self) -> Vec<CreateIntent> {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of intents created.
    pub fn create_calls(&self) -> usize {
        self.created
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Status reported when an intent is retrieved.
    pub fn set_status(&self, status: &str) {
        *self.status.lock().unwrap_or_else(PoisonError::into_inner) = status.to_string();
    }

    /// Amount reported when an intent is retrieved, instead of the
    /// requested one.
    pub fn set_amount(&self, amount: i64) {
        *self.amount.lock().unwrap_or_else(PoisonError::into_inner) = Some(amount);
    }

    /// Reject every following create request with `message`.
    pub fn decline_with(&self, message: &str) {
        *self.decline.lock().unwrap_or_else(PoisonError::into_inner) = Some(message.to_string());
    }

    fn intent_id(index: usize) -> String {
        format!("pi_test_{index}")
    }
}

#[async_trait]
impl PaymentProcessor for FakeProcessor {
    async fn create_intent(&self, request: &CreateIntent) -> Result<PaymentIntent, PaymentError> {
        if let Some(message) = self
            .decline
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
        {
            return Err(PaymentError::Processor {
                message,
                code: Some("card_declined".to_string()),
            });
        }

        let mut created = self.created.lock().unwrap_or_else(PoisonError::into_inner);
        created.push(request.clone());
        let id = Self::intent_id(created.len());

        Ok(PaymentIntent {
            client_secret: Some(format!("{id}_secret_test")),
            id,
            status: "requires_payment_method".to_string(),
            amount: request.amount,
            currency: request.currency.code().to_string(),
        })
    }

    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let created = self.created.lock().unwrap_or_else(PoisonError::into_inner);
        let (index, request) = created
            .iter()
            .enumerate()
            .find(|(i, _)| Self::intent_id(i + 1) == id)
            .ok_or_else(|| PaymentError::Processor {
                message: format!("No such payment_intent: '{id}'"),
                code: Some("resource_missing".to_string()),
            })?;

        Ok(PaymentIntent {
            id: Self::intent_id(index + 1),
            client_secret: None,
            status: self
                .status
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .clone(),
            amount: self
                .amount
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .unwrap_or(request.amount),
            currency: request.currency.code().to_string(),
        })
    }
}

// =============================================================================
// Test context
// =============================================================================

/// Configuration with no simulated delays and unreachable external URLs.
#[must_use]
pub fn test_config() -> StorefrontConfig {
    StorefrontConfig {
        host: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        data_dir: PathBuf::from("unused"),
        catalog: CatalogConfig {
            base_url: Url::parse("http://catalog.test").expect("valid URL"),
            cache_ttl: Duration::from_secs(60),
        },
        payments: PaymentConfig {
            secret_key: SecretString::from("sk_test_integration_Zq81mXv0".to_string()),
            publishable_key: Some("pk_test_integration".to_string()),
            api_base: Url::parse("http://processor.test").expect("valid URL"),
            default_currency: CurrencyCode::TRY,
        },
        simulation: SimulationConfig {
            auth_delay: Duration::ZERO,
            cash_order_delay: Duration::ZERO,
        },
        sentry_dsn: None,
        sentry_environment: None,
    }
}

/// The router plus handles on its collaborators.
pub struct TestContext {
    pub app: Router,
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub payments: Arc<FakeProcessor>,
}

impl Default for TestContext {
    fn default() -> Self {
        Self::new()
    }
}

impl TestContext {
    /// Fresh context with an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_store(Arc::new(MemoryStore::new()))
    }

    /// Context over an existing store, as after a restart.
    #[must_use]
    pub fn with_store(store: Arc<MemoryStore>) -> Self {
        let payments = Arc::new(FakeProcessor::default());
        let state = AppState::new(
            test_config(),
            store.clone(),
            Arc::new(FixtureCatalog::new(fixture_products())),
            payments.clone(),
        );

        Self {
            app: routes::app(state.clone()),
            state,
            store,
            payments,
        }
    }

    /// Send a request and return the status and the body as JSON.
    ///
    /// A body that is not JSON is returned as a JSON string.
    pub async fn request(&self, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let builder = Request::builder().method(method).uri(uri);
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .app
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");

        let status = response.status();
        let bytes = to_bytes(response.into_body(), MAX_BODY_BYTES)
            .await
            .expect("readable body");
        let json = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        (status, json)
    }

    pub async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::GET, uri, None).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.request(Method::POST, uri, Some(body)).await
    }

    pub async fn delete(&self, uri: &str) -> (StatusCode, Value) {
        self.request(Method::DELETE, uri, None).await
    }

    /// Raw persisted value under `key`.
    pub fn stored(&self, key: &str) -> Option<Value> {
        self.store
            .get(key)
            .expect("memory store is infallible")
            .map(|raw| serde_json::from_str(&raw).expect("stored values are JSON"))
    }

    /// Add `quantity` of a fixture product to the cart.
    pub async fn add_to_cart(&self, id: i32, quantity: u32) -> Value {
        let (status, body) = self
            .post(
                "/api/cart/items",
                serde_json::json!({ "productId": id, "quantity": quantity }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "add to cart failed: {body}");
        body
    }

    /// Fill the cart and walk checkout to the payment step for `method`.
    pub async fn checkout_to(&self, method: &str) {
        self.add_to_cart(1, 1).await;
        let (status, body) = self.post("/api/checkout/shipping", shipping_address()).await;
        assert_eq!(status, StatusCode::OK, "shipping rejected: {body}");
        let (status, body) = self
            .post(
                "/api/checkout/payment",
                serde_json::json!({ "method": method, "acceptTerms": true }),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "payment selection rejected: {body}");
    }
}

/// A complete, valid shipping address.
#[must_use]
pub fn shipping_address() -> Value {
    serde_json::json!({
        "firstName": "Ayşe",
        "lastName": "Yılmaz",
        "email": "ayse@example.com",
        "phone": "0532 123 45 67",
        "address": "Bağdat Caddesi 12",
        "city": "İstanbul",
        "district": "Kadıköy",
        "postalCode": "34710"
    })
}

/// Read a decimal that may be serialized as a string or a number.
#[must_use]
pub fn decimal(value: &Value) -> Decimal {
    match value {
        Value::String(s) => s.parse().expect("decimal string"),
        Value::Number(n) => n.to_string().parse().expect("decimal number"),
        other => panic!("not a decimal: {other}"),
    }
}
