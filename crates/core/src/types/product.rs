//! Catalog product records.
//!
//! The shape mirrors the public demo catalog's JSON, so these types
//! deserialize straight from its responses.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ProductId;

/// Customer rating summary for a product.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct Rating {
    /// Average rating, 0.0 to 5.0.
    pub rate: f64,
    /// Number of ratings.
    pub count: u32,
}

/// A product as published by the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    /// Unit price in the store currency's standard unit.
    pub price: Decimal,
    pub description: String,
    pub category: String,
    /// Image URL.
    pub image: String,
    #[serde(default)]
    pub rating: Rating,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_catalog_record() {
        let json = r#"{
            "id": 1,
            "title": "Fjallraven - Foldsack No. 1 Backpack",
            "price": 109.95,
            "description": "Your perfect pack for everyday use",
            "category": "men's clothing",
            "image": "https://example.com/1.jpg",
            "rating": { "rate": 3.9, "count": 120 }
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.id, ProductId::new(1));
        assert_eq!(product.price, Decimal::new(10_995, 2));
        assert!((product.rating.rate - 3.9).abs() < f64::EPSILON);
        assert_eq!(product.rating.count, 120);
    }

    #[test]
    fn test_missing_rating_defaults() {
        let json = r#"{
            "id": 2, "title": "Mug", "price": 5, "description": "",
            "category": "kitchen", "image": ""
        }"#;

        let product: Product = serde_json::from_str(json).unwrap();
        assert_eq!(product.rating, Rating::default());
    }
}
