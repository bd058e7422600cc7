//! Status enums for checkout and orders.

use serde::{Deserialize, Serialize};

/// How the shopper pays for an order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum PaymentMethod {
    /// Card payment confirmed through the payment processor.
    #[default]
    CreditCard,
    /// Paid in cash when the parcel is delivered.
    CashOnDelivery,
}

impl std::fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::CreditCard => write!(f, "credit-card"),
            Self::CashOnDelivery => write!(f, "cash-on-delivery"),
        }
    }
}

impl std::str::FromStr for PaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "credit-card" => Ok(Self::CreditCard),
            "cash-on-delivery" => Ok(Self::CashOnDelivery),
            _ => Err(format!("invalid payment method: {s}")),
        }
    }
}

/// Order status recorded with the last order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Payment has been captured.
    Confirmed,
    /// Awaiting cash payment at delivery.
    Pending,
}

impl OrderStatus {
    /// Initial status of an order placed with the given payment method.
    #[must_use]
    pub const fn for_method(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::CreditCard => Self::Confirmed,
            PaymentMethod::CashOnDelivery => Self::Pending,
        }
    }
}
