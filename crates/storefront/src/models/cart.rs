//! Cart and favorites line types.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kiosk_core::{Product, ProductId, Rating};

/// One product in the cart with its quantity.
///
/// Display fields are a snapshot taken when the product was added.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: ProductId,
    pub title: String,
    /// Unit price.
    pub price: Decimal,
    pub image: String,
    pub category: String,
    /// Always at least 1 while the item is in the cart.
    pub quantity: u32,
}

impl CartItem {
    /// Price of the whole line (unit price × quantity).
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

/// Product snapshot used when adding to the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartProduct {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
}

impl CartProduct {
    /// Attach a quantity, producing a cart line.
    #[must_use]
    pub fn with_quantity(self, quantity: u32) -> CartItem {
        CartItem {
            id: self.id,
            title: self.title,
            price: self.price,
            image: self.image,
            category: self.category,
            quantity,
        }
    }
}

impl From<&Product> for CartProduct {
    fn from(product: &Product) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            category: product.category.clone(),
        }
    }
}

/// A saved product with no purchase intent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FavoriteItem {
    pub id: ProductId,
    pub title: String,
    pub price: Decimal,
    pub image: String,
    pub category: String,
    /// Rating at the time the product was saved.
    pub rating: Rating,
    pub added_at: DateTime<Utc>,
}

impl FavoriteItem {
    /// Snapshot a catalog product as a favorite added at `added_at`.
    #[must_use]
    pub fn from_product(product: &Product, added_at: DateTime<Utc>) -> Self {
        Self {
            id: product.id,
            title: product.title.clone(),
            price: product.price,
            image: product.image.clone(),
            category: product.category.clone(),
            rating: product.rating,
            added_at,
        }
    }
}
