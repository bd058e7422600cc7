//! Checkout records: shipping address, totals, and the placed order.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use kiosk_core::{OrderStatus, PaymentMethod};

use super::CartItem;

/// Orders above this subtotal ship for free.
pub const FREE_SHIPPING_THRESHOLD: Decimal = Decimal::from_parts(500, 0, 0, false, 0);

/// Flat shipping fee below the free-shipping threshold (29.99).
pub const SHIPPING_FEE: Decimal = Decimal::from_parts(2999, 0, 0, false, 2);

/// Where and to whom the order ships.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase", default)]
pub struct ShippingAddress {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub city: String,
    pub district: String,
    pub postal_code: String,
}

/// Money owed for a cart at checkout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderTotals {
    pub subtotal: Decimal,
    pub shipping_cost: Decimal,
    pub total: Decimal,
}

impl OrderTotals {
    /// Totals for a cart subtotal: free shipping strictly above the threshold.
    #[must_use]
    pub fn for_subtotal(subtotal: Decimal) -> Self {
        let shipping_cost = if subtotal > FREE_SHIPPING_THRESHOLD {
            Decimal::ZERO
        } else {
            SHIPPING_FEE
        };

        Self {
            subtotal,
            shipping_cost,
            total: subtotal + shipping_cost,
        }
    }
}

/// A placed order. Only the most recent one is kept.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    /// Payment intent id for card orders, `COD_<millis>` for cash orders.
    pub id: String,
    pub items: Vec<CartItem>,
    pub shipping_address: ShippingAddress,
    #[serde(flatten)]
    pub totals: OrderTotals,
    pub payment_method: PaymentMethod,
    pub status: OrderStatus,
    pub created_at: DateTime<Utc>,
}
