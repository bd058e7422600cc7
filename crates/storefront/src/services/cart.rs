//! Cart container.
//!
//! Aggregates cart lines by product identity and keeps the totals in step
//! with the lines. Every mutation is mirrored to the key-value store.

use std::sync::Arc;

use rust_decimal::Decimal;
use serde::Serialize;

use kiosk_core::ProductId;

use crate::models::{CartItem, CartProduct};
use crate::storage::{self, KeyValueStore, keys};

/// Snapshot of the cart for responses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartState {
    pub items: Vec<CartItem>,
    pub total_items: u32,
    pub total_price: Decimal,
}

/// The shopper's cart.
pub struct CartService {
    items: Vec<CartItem>,
    store: Arc<dyn KeyValueStore>,
}

impl CartService {
    /// Load the cart persisted in `store`, or start empty.
    ///
    /// Stored lines with a zero quantity are dropped and duplicate ids are
    /// merged, so the invariants hold even for hand-edited data.
    pub fn load(store: Arc<dyn KeyValueStore>) -> Self {
        let stored: Vec<CartItem> =
            storage::load_json(store.as_ref(), keys::CART).unwrap_or_default();

        let mut cart = Self {
            items: Vec::with_capacity(stored.len()),
            store,
        };
        for item in stored {
            let quantity = item.quantity;
            cart.merge(item, quantity);
        }

        tracing::debug!(lines = cart.items.len(), "Cart loaded");
        cart
    }

    /// Add `quantity` of a product, merging with an existing line.
    ///
    /// Adding zero is a no-op.
    pub fn add(&mut self, product: CartProduct, quantity: u32) {
        if quantity == 0 {
            return;
        }
        self.merge(product.with_quantity(quantity), quantity);
        self.persist();
    }

    /// Remove the line for `id`, if any.
    pub fn remove(&mut self, id: ProductId) {
        self.items.retain(|item| item.id != id);
        self.persist();
    }

    /// Overwrite the quantity for `id`. Zero or below removes the line.
    ///
    /// Unknown ids are ignored.
    pub fn set_quantity(&mut self, id: ProductId, quantity: i64) {
        if quantity <= 0 {
            self.items.retain(|item| item.id != id);
        } else if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        }
        self.persist();
    }

    /// Empty the cart and the persisted record.
    pub fn clear(&mut self) {
        self.items.clear();
        self.persist();
    }

    /// Quantity of `id` in the cart, or 0.
    #[must_use]
    pub fn item_quantity(&self, id: ProductId) -> u32 {
        self.items
            .iter()
            .find(|item| item.id == id)
            .map_or(0, |item| item.quantity)
    }

    /// Cart lines in insertion order.
    #[must_use]
    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of quantities over all lines.
    #[must_use]
    pub fn total_items(&self) -> u32 {
        self.items
            .iter()
            .fold(0_u32, |sum, item| sum.saturating_add(item.quantity))
    }

    /// Sum of line totals.
    #[must_use]
    pub fn total_price(&self) -> Decimal {
        self.items.iter().map(CartItem::line_total).sum()
    }

    /// Snapshot of lines and totals.
    #[must_use]
    pub fn state(&self) -> CartState {
        CartState {
            items: self.items.clone(),
            total_items: self.total_items(),
            total_price: self.total_price(),
        }
    }

    fn merge(&mut self, line: CartItem, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.items.iter_mut().find(|item| item.id == line.id) {
            Some(existing) => existing.quantity = existing.quantity.saturating_add(quantity),
            None => self.items.push(line),
        }
    }

    fn persist(&self) {
        storage::mirror_json(self.store.as_ref(), keys::CART, &self.items);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;

    fn product(id: i32, price_cents: i64) -> CartProduct {
        CartProduct {
            id: ProductId::new(id),
            title: format!("Product {id}"),
            price: Decimal::new(price_cents, 2),
            image: format!("https://img.test/{id}.jpg"),
            category: "electronics".to_string(),
        }
    }

    fn empty_cart() -> (CartService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        (CartService::load(store.clone()), store)
    }

    fn persisted(store: &MemoryStore) -> Vec<CartItem> {
        storage::load_json(store, keys::CART).unwrap()
    }

    #[test]
    fn test_adding_same_product_twice_sums_quantity() {
        let (mut cart, _) = empty_cart();
        cart.add(product(1, 1000), 2);
        cart.add(product(1, 1000), 3);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_quantity(ProductId::new(1)), 5);
        assert_eq!(cart.total_items(), 5);
        assert_eq!(cart.total_price(), Decimal::new(5000, 2));
    }

    #[test]
    fn test_add_zero_is_noop() {
        let (mut cart, _) = empty_cart();
        cart.add(product(1, 1000), 0);
        assert!(cart.is_empty());
    }

    #[test]
    fn test_totals_are_sums_over_lines() {
        let (mut cart, _) = empty_cart();
        cart.add(product(1, 1050), 2);
        cart.add(product(2, 399), 1);
        cart.add(product(3, 1), 10);

        assert_eq!(cart.total_items(), 13);
        // 2 × 10.50 + 3.99 + 10 × 0.01
        assert_eq!(cart.total_price(), Decimal::new(2509, 2));
    }

    #[test]
    fn test_set_quantity_overwrites() {
        let (mut cart, _) = empty_cart();
        cart.add(product(1, 1000), 2);
        cart.set_quantity(ProductId::new(1), 7);

        assert_eq!(cart.item_quantity(ProductId::new(1)), 7);
        assert_eq!(cart.total_price(), Decimal::new(7000, 2));
    }

    #[test]
    fn test_set_quantity_zero_or_below_removes() {
        let (mut cart, _) = empty_cart();
        cart.add(product(1, 1000), 2);
        cart.add(product(2, 500), 1);

        cart.set_quantity(ProductId::new(1), 0);
        assert_eq!(cart.item_quantity(ProductId::new(1)), 0);
        assert_eq!(cart.items().len(), 1);

        cart.set_quantity(ProductId::new(2), -4);
        assert!(cart.is_empty());
        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
    }

    #[test]
    fn test_set_quantity_unknown_id_is_ignored() {
        let (mut cart, _) = empty_cart();
        cart.add(product(1, 1000), 1);
        cart.set_quantity(ProductId::new(99), 3);

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_quantity(ProductId::new(99)), 0);
    }

    #[test]
    fn test_remove() {
        let (mut cart, _) = empty_cart();
        cart.add(product(1, 1000), 1);
        cart.add(product(2, 1000), 1);
        cart.remove(ProductId::new(1));

        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.items()[0].id, ProductId::new(2));
    }

    #[test]
    fn test_every_mutation_is_persisted() {
        let (mut cart, store) = empty_cart();

        cart.add(product(1, 1000), 2);
        assert_eq!(persisted(&store), cart.items());

        cart.set_quantity(ProductId::new(1), 4);
        assert_eq!(persisted(&store)[0].quantity, 4);

        cart.remove(ProductId::new(1));
        assert!(persisted(&store).is_empty());
    }

    #[test]
    fn test_clear_empties_memory_and_store() {
        let (mut cart, store) = empty_cart();
        cart.add(product(1, 1000), 2);
        cart.add(product(2, 250), 1);

        cart.clear();

        assert_eq!(cart.total_items(), 0);
        assert_eq!(cart.total_price(), Decimal::ZERO);
        assert!(persisted(&store).is_empty());
    }

    #[test]
    fn test_reload_restores_cart() {
        let (mut cart, store) = empty_cart();
        cart.add(product(1, 1000), 2);
        cart.add(product(2, 250), 1);

        let reloaded = CartService::load(store);
        assert_eq!(reloaded.state(), cart.state());
    }

    #[test]
    fn test_load_normalizes_stored_lines() {
        let store = Arc::new(MemoryStore::new());
        let stored = vec![
            product(1, 1000).with_quantity(1),
            product(1, 1000).with_quantity(2),
            product(2, 500).with_quantity(0),
        ];
        storage::save_json(store.as_ref(), keys::CART, &stored).unwrap();

        let cart = CartService::load(store);
        assert_eq!(cart.items().len(), 1);
        assert_eq!(cart.item_quantity(ProductId::new(1)), 3);
    }

    #[test]
    fn test_malformed_store_starts_empty() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::CART, "not json").unwrap();

        let cart = CartService::load(store);
        assert!(cart.is_empty());
    }
}
