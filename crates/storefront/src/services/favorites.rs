//! Favorites container with set semantics keyed by product id.

use std::sync::Arc;

use chrono::Utc;

use kiosk_core::{Product, ProductId};

use crate::models::FavoriteItem;
use crate::storage::{self, KeyValueStore, keys};

/// The shopper's saved products.
pub struct FavoritesService {
    items: Vec<FavoriteItem>,
    store: Arc<dyn KeyValueStore>,
}

impl FavoritesService {
    /// Load persisted favorites, or start empty.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let stored: Vec<FavoriteItem> =
            storage::load_json(store.as_ref(), keys::FAVORITES).unwrap_or_default();

        let mut items: Vec<FavoriteItem> = Vec::with_capacity(stored.len());
        for item in stored {
            if !items.iter().any(|existing| existing.id == item.id) {
                items.push(item);
            }
        }

        Self { items, store }
    }

    /// Save a product. Returns `false` if it was already a favorite.
    pub fn add(&mut self, product: &Product) -> bool {
        if self.is_favorite(product.id) {
            return false;
        }
        self.items.push(FavoriteItem::from_product(product, Utc::now()));
        self.persist();
        true
    }

    /// Forget a product. Returns `false` if it was not a favorite.
    pub fn remove(&mut self, id: ProductId) -> bool {
        let before = self.items.len();
        self.items.retain(|item| item.id != id);
        let removed = self.items.len() != before;
        self.persist();
        removed
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    #[must_use]
    pub fn is_favorite(&self, id: ProductId) -> bool {
        self.items.iter().any(|item| item.id == id)
    }

    /// Favorites in the order they were added.
    #[must_use]
    pub fn items(&self) -> &[FavoriteItem] {
        &self.items
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    fn persist(&self) {
        storage::mirror_json(self.store.as_ref(), keys::FAVORITES, &self.items);
    }
}
