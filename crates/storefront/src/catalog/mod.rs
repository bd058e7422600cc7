//! Product catalog access.
//!
//! # Architecture
//!
//! - The catalog is an external REST API (the public demo store by default)
//! - No local copy: every listing goes to the API, behind a `moka` cache
//! - Handlers depend on the [`ProductCatalog`] trait so tests can swap in a
//!   fixture catalog
//!
//! # Example
//!
//! ```rust,ignore
//! use kiosk_storefront::catalog::{CatalogClient, ProductCatalog};
//!
//! let catalog = CatalogClient::new(&config.catalog);
//! let products = catalog.list_products().await?;
//! let backpack = catalog.get_product(ProductId::new(1)).await?;
//! ```

mod cache;
mod client;
pub mod listing;

pub use client::CatalogClient;
pub use listing::{CategorySummary, ProductSort};

use async_trait::async_trait;
use thiserror::Error;

use kiosk_core::{Product, ProductId};

/// Errors that can occur when reading the catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("catalog returned HTTP {status}")]
    Status { status: u16 },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// Product not found.
    #[error("product not found: {0}")]
    NotFound(ProductId),
}

/// Read access to the product catalog.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Every product, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError` if the catalog cannot be reached or parsed.
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError>;

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogError::NotFound` for an unknown id.
    async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError>;
}
