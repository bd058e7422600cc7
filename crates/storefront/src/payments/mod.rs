//! Card payment processing.
//!
//! The storefront never sees card details: it creates a payment intent for
//! an amount, hands the client secret to the shopper's device, and later
//! reads the intent back to learn whether the processor captured the money.
//!
//! [`StripeClient`] talks to the Stripe REST API. Handlers depend on the
//! [`PaymentProcessor`] trait so tests can record calls instead.

mod stripe;

pub use stripe::StripeClient;

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use kiosk_core::{CurrencyCode, Price};

/// Smallest chargeable amount, in standard units (0.50).
pub const MINIMUM_AMOUNT: Decimal = Decimal::from_parts(50, 0, 0, false, 2);

/// Intent status meaning the payment was captured.
pub const STATUS_SUCCEEDED: &str = "succeeded";

/// Errors that can occur when creating or reading payment intents.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// Amount below [`MINIMUM_AMOUNT`].
    #[error("minimum payment amount is {minimum}")]
    AmountTooSmall { minimum: String },

    /// Amount missing, not a number, or too large.
    #[error("amount must be a number")]
    InvalidAmount,

    /// Currency the storefront does not support.
    #[error("{0}")]
    UnsupportedCurrency(String),

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The processor rejected the request. `message` is the processor's own.
    #[error("{message}")]
    Processor {
        message: String,
        code: Option<String>,
    },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl PaymentError {
    /// Whether the error comes from the request rather than the processor.
    #[must_use]
    pub const fn is_invalid_request(&self) -> bool {
        matches!(
            self,
            Self::AmountTooSmall { .. } | Self::InvalidAmount | Self::UnsupportedCurrency(_)
        )
    }
}

/// A validated request to create a payment intent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateIntent {
    /// Amount in minor units.
    pub amount: i64,
    pub currency: CurrencyCode,
    /// Caller metadata plus a `timestamp` entry.
    pub metadata: BTreeMap<String, String>,
}

impl CreateIntent {
    /// Validate `amount` and convert it to minor units.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::AmountTooSmall` below 0.50 and
    /// `PaymentError::InvalidAmount` if the amount overflows.
    pub fn new(
        amount: Decimal,
        currency: CurrencyCode,
        mut metadata: BTreeMap<String, String>,
    ) -> Result<Self, PaymentError> {
        if amount < MINIMUM_AMOUNT {
            return Err(PaymentError::AmountTooSmall {
                minimum: Price::new(MINIMUM_AMOUNT, currency).display(),
            });
        }
        let amount = Price::new(amount, currency)
            .to_minor_units()
            .ok_or(PaymentError::InvalidAmount)?;

        metadata.insert(
            "timestamp".to_string(),
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        );

        Ok(Self {
            amount,
            currency,
            metadata,
        })
    }
}

/// A payment intent as reported by the processor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentIntent {
    pub id: String,
    /// Secret the shopper's device uses to confirm the payment.
    #[serde(default)]
    pub client_secret: Option<String>,
    /// Processor status, e.g. `requires_payment_method` or `succeeded`.
    pub status: String,
    /// Amount in minor units.
    pub amount: i64,
    pub currency: String,
}

impl PaymentIntent {
    #[must_use]
    pub fn is_succeeded(&self) -> bool {
        self.status == STATUS_SUCCEEDED
    }
}

/// Creates and reads payment intents.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    /// Create an intent with automatic payment methods enabled.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Processor` with the processor's message if it
    /// rejects the request.
    async fn create_intent(&self, request: &CreateIntent) -> Result<PaymentIntent, PaymentError>;

    /// Read an intent back by id.
    ///
    /// # Errors
    ///
    /// Returns `PaymentError::Processor` if the processor does not know it.
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError>;
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_amount_below_minimum_rejected() {
        let err = CreateIntent::new(Decimal::new(40, 2), CurrencyCode::TRY, BTreeMap::new())
            .unwrap_err();
        assert!(matches!(err, PaymentError::AmountTooSmall { .. }));
        assert_eq!(err.to_string(), "minimum payment amount is ₺0.50");
        assert!(err.is_invalid_request());
    }

    #[test]
    fn test_minimum_amount_accepted() {
        let intent =
            CreateIntent::new(Decimal::new(50, 2), CurrencyCode::TRY, BTreeMap::new()).unwrap();
        assert_eq!(intent.amount, 50);
    }

    #[test]
    fn test_amount_rounded_to_minor_units() {
        let intent =
            CreateIntent::new(Decimal::new(12_345, 3), CurrencyCode::USD, BTreeMap::new())
                .unwrap();
        assert_eq!(intent.amount, 1235);
    }

    #[test]
    fn test_timestamp_added_to_metadata() {
        let mut metadata = BTreeMap::new();
        metadata.insert("orderRef".to_string(), "abc".to_string());

        let intent = CreateIntent::new(Decimal::from(10), CurrencyCode::TRY, metadata).unwrap();
        assert_eq!(intent.metadata["orderRef"], "abc");
        assert!(intent.metadata.contains_key("timestamp"));
    }
}
