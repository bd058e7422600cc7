//! REST client for the product catalog API.
//!
//! Caches products and listings using `moka` (TTL from config).

use std::sync::Arc;

use async_trait::async_trait;
use moka::future::Cache;
use tracing::{debug, instrument};

use kiosk_core::{Product, ProductId};

use super::cache::{CacheKey, CacheValue};
use super::{CatalogError, ProductCatalog};
use crate::config::CatalogConfig;

/// Longest body excerpt written to logs.
const LOG_BODY_LIMIT: usize = 500;

/// Client for the catalog REST API.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a new catalog client.
    #[must_use]
    pub fn new(config: &CatalogConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(config.cache_ttl)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.as_str().trim_end_matches('/').to_string(),
                cache,
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{path}", self.inner.base_url)
    }

    /// GET `path` and return the body text.
    async fn fetch(&self, path: &str) -> Result<String, CatalogError> {
        let response = self
            .inner
            .client
            .get(self.url(path))
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Catalog API returned non-success status"
            );
            return Err(CatalogError::Status {
                status: status.as_u16(),
            });
        }

        Ok(body)
    }
}

#[async_trait]
impl ProductCatalog for CatalogClient {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, CatalogError> {
        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let body = self.fetch("products").await?;
        let products = parse_products(&body)?;

        // Warm the per-product entries too; the detail page usually follows
        for product in &products {
            self.inner
                .cache
                .insert(
                    CacheKey::Product(product.id),
                    CacheValue::Product(Box::new(product.clone())),
                )
                .await;
        }
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;

        debug!(count = products.len(), "Fetched product list");
        Ok(products)
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: ProductId) -> Result<Product, CatalogError> {
        let key = CacheKey::Product(id);
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let body = self.fetch(&format!("products/{id}")).await?;
        let product = parse_product(&body)?.ok_or(CatalogError::NotFound(id))?;

        self.inner
            .cache
            .insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }
}

fn parse_products(body: &str) -> Result<Vec<Product>, CatalogError> {
    serde_json::from_str(body).map_err(|e| {
        tracing::error!(
            error = %e,
            body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
            "Failed to parse catalog response"
        );
        CatalogError::Parse(e)
    })
}

/// Parse a single-product body. The API answers an unknown id with an empty
/// body (or `null`), which maps to `None`.
fn parse_product(body: &str) -> Result<Option<Product>, CatalogError> {
    let body = body.trim();
    if body.is_empty() {
        return Ok(None);
    }
    Ok(serde_json::from_str::<Option<Product>>(body)?)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use url::Url;

    use super::*;

    fn client(base: &str) -> CatalogClient {
        CatalogClient::new(&CatalogConfig {
            base_url: Url::parse(base).unwrap(),
            cache_ttl: Duration::from_secs(300),
        })
    }

    #[test]
    fn test_url_building() {
        assert_eq!(
            client("https://fakestoreapi.com").url("products/3"),
            "https://fakestoreapi.com/products/3"
        );
        assert_eq!(
            client("http://localhost:9000/api/").url("products"),
            "http://localhost:9000/api/products"
        );
    }

    #[test]
    fn test_empty_body_is_not_found() {
        assert!(parse_product("").unwrap().is_none());
        assert!(parse_product("  null ").unwrap().is_none());
    }

    #[test]
    fn test_parse_product_body() {
        let body = r#"{"id":5,"title":"Bracelet","price":695,"description":"",
            "category":"jewelery","image":"","rating":{"rate":4.6,"count":400}}"#;
        let product = parse_product(body).unwrap().unwrap();
        assert_eq!(product.id, ProductId::new(5));
    }

    #[test]
    fn test_garbage_body_is_parse_error() {
        assert!(matches!(
            parse_products("<html>"),
            Err(CatalogError::Parse(_))
        ));
    }
}
