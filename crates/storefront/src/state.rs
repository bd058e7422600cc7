//! Application state shared across handlers.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use crate::catalog::{CatalogClient, ProductCatalog};
use crate::config::StorefrontConfig;
use crate::payments::{PaymentProcessor, StripeClient};
use crate::services::{
    AuthService, CartService, CheckoutService, FavoritesService, SearchService,
};
use crate::storage::{FileStore, KeyValueStore, StorageError};

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It owns the shopper's state
/// containers and the clients for the catalog and the payment processor.
///
/// Lock order when more than one container is needed: checkout, then auth,
/// then cart. Never hold a guard across an `.await`.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: StorefrontConfig,
    store: Arc<dyn KeyValueStore>,
    catalog: Arc<dyn ProductCatalog>,
    payments: Arc<dyn PaymentProcessor>,
    cart: Mutex<CartService>,
    favorites: Mutex<FavoritesService>,
    search: Mutex<SearchService>,
    auth: Mutex<AuthService>,
    checkout: Mutex<CheckoutService>,
}

impl AppState {
    /// Create a new application state from its collaborators.
    ///
    /// Persisted containers are loaded from `store` here.
    #[must_use]
    pub fn new(
        config: StorefrontConfig,
        store: Arc<dyn KeyValueStore>,
        catalog: Arc<dyn ProductCatalog>,
        payments: Arc<dyn PaymentProcessor>,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                cart: Mutex::new(CartService::load(store.clone())),
                favorites: Mutex::new(FavoritesService::load(store.clone())),
                search: Mutex::new(SearchService::new()),
                auth: Mutex::new(AuthService::load(store.clone())),
                checkout: Mutex::new(CheckoutService::new(store.clone())),
                config,
                store,
                catalog,
                payments,
            }),
        }
    }

    /// Create the production state: file store, catalog client, Stripe.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the data directory cannot be created.
    pub fn from_config(config: StorefrontConfig) -> Result<Self, StorageError> {
        let store = Arc::new(FileStore::open(&config.data_dir)?);
        let catalog = Arc::new(CatalogClient::new(&config.catalog));
        let payments = Arc::new(StripeClient::new(&config.payments));

        Ok(Self::new(config, store, catalog, payments))
    }

    /// Get a reference to the storefront configuration.
    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    /// Get the key-value store.
    #[must_use]
    pub fn store(&self) -> &dyn KeyValueStore {
        self.inner.store.as_ref()
    }

    /// Get the product catalog.
    #[must_use]
    pub fn catalog(&self) -> &dyn ProductCatalog {
        self.inner.catalog.as_ref()
    }

    /// Get the payment processor.
    #[must_use]
    pub fn payments(&self) -> &dyn PaymentProcessor {
        self.inner.payments.as_ref()
    }

    pub fn cart(&self) -> MutexGuard<'_, CartService> {
        lock(&self.inner.cart)
    }

    pub fn favorites(&self) -> MutexGuard<'_, FavoritesService> {
        lock(&self.inner.favorites)
    }

    pub fn search(&self) -> MutexGuard<'_, SearchService> {
        lock(&self.inner.search)
    }

    pub fn auth(&self) -> MutexGuard<'_, AuthService> {
        lock(&self.inner.auth)
    }

    pub fn checkout(&self) -> MutexGuard<'_, CheckoutService> {
        lock(&self.inner.checkout)
    }
}

/// Lock a container. A panic in another handler leaves the data usable, so
/// poisoning is ignored.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
