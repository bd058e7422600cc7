//! Payment route handlers.

use std::collections::BTreeMap;

use axum::{Json, extract::State};
use chrono::Utc;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::instrument;

use kiosk_core::{CardCheck, CurrencyCode};

use crate::error::Result;
use crate::payments::{CreateIntent, PaymentError};
use crate::state::AppState;

/// Intent creation request. Fields are loosely typed so that a missing or
/// non-numeric amount is reported as a payment error rather than a
/// deserialization failure.
#[derive(Debug, Default, Deserialize)]
pub struct CreateIntentRequest {
    #[serde(default)]
    pub amount: Option<Value>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, Value>>,
}

/// Intent created response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentCreated {
    pub client_secret: Option<String>,
    pub payment_intent_id: String,
}

/// Client-side payment configuration.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentsConfig {
    pub publishable_key: Option<String>,
    pub currency: CurrencyCode,
}

/// Card validation request.
#[derive(Debug, Deserialize)]
pub struct ValidateCardRequest {
    pub number: String,
    pub expiry: String,
    pub cvv: String,
}

fn parse_amount(value: Option<&Value>) -> std::result::Result<Decimal, PaymentError> {
    let Some(Value::Number(number)) = value else {
        return Err(PaymentError::InvalidAmount);
    };
    let text = number.to_string();
    text.parse::<Decimal>()
        .or_else(|_| Decimal::from_scientific(&text))
        .map_err(|_| PaymentError::InvalidAmount)
}

fn metadata_strings(metadata: Option<BTreeMap<String, Value>>) -> BTreeMap<String, String> {
    metadata
        .unwrap_or_default()
        .into_iter()
        .map(|(key, value)| match value {
            Value::String(s) => (key, s),
            other => (key, other.to_string()),
        })
        .collect()
}

/// Create a payment intent for an arbitrary amount.
///
/// Amounts below 0.50 are rejected before the processor is contacted.
/// Only the currencies the storefront prices in ([`CurrencyCode`]) are
/// accepted; any other code is refused here even if the processor would
/// take it.
#[instrument(skip_all)]
pub async fn create_intent(
    State(state): State<AppState>,
    Json(request): Json<CreateIntentRequest>,
) -> Result<Json<IntentCreated>> {
    let amount = parse_amount(request.amount.as_ref())?;
    let currency = match request.currency.as_deref() {
        Some(code) => code
            .parse::<CurrencyCode>()
            .map_err(PaymentError::UnsupportedCurrency)?,
        None => state.config().payments.default_currency,
    };

    let intent_request = CreateIntent::new(amount, currency, metadata_strings(request.metadata))?;
    let intent = state.payments().create_intent(&intent_request).await?;

    tracing::info!(intent_id = %intent.id, amount = intent.amount, "Payment intent created");
    Ok(Json(IntentCreated {
        client_secret: intent.client_secret,
        payment_intent_id: intent.id,
    }))
}

/// Publishable key and default currency for the shopper's device.
pub async fn config(State(state): State<AppState>) -> Json<PaymentsConfig> {
    let payments = &state.config().payments;
    Json(PaymentsConfig {
        publishable_key: payments.publishable_key.clone(),
        currency: payments.default_currency,
    })
}

/// Run the card checks against today's date.
pub async fn validate_card(Json(request): Json<ValidateCardRequest>) -> Json<CardCheck> {
    Json(CardCheck::run(
        &request.number,
        &request.expiry,
        &request.cvv,
        Utc::now().date_naive(),
    ))
}
