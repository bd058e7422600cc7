//! Stripe REST client for payment intents.

use std::sync::Arc;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use super::{CreateIntent, PaymentError, PaymentIntent, PaymentProcessor};
use crate::config::PaymentConfig;

/// Client for the Stripe payment intents API.
#[derive(Clone)]
pub struct StripeClient {
    inner: Arc<StripeClientInner>,
}

struct StripeClientInner {
    client: reqwest::Client,
    api_base: String,
    secret_key: SecretString,
}

/// Error envelope returned by the API.
#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ApiError,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    code: Option<String>,
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(config: &PaymentConfig) -> Self {
        Self {
            inner: Arc::new(StripeClientInner {
                client: reqwest::Client::new(),
                api_base: config.api_base.as_str().trim_end_matches('/').to_string(),
                secret_key: config.secret_key.clone(),
            }),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/v1/{path}", self.inner.api_base)
    }

    /// Turn a response into an intent or the processor's error.
    async fn read_intent(response: reqwest::Response) -> Result<PaymentIntent, PaymentError> {
        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let error = processor_error(status, &body);
            tracing::warn!(status = %status, error = %error, "Stripe rejected request");
            return Err(error);
        }

        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl PaymentProcessor for StripeClient {
    #[instrument(skip(self, request), fields(amount = request.amount, currency = %request.currency))]
    async fn create_intent(&self, request: &CreateIntent) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .inner
            .client
            .post(self.url("payment_intents"))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .form(&form_fields(request))
            .send()
            .await?;

        let intent = Self::read_intent(response).await?;
        tracing::info!(payment_intent_id = %intent.id, "Payment intent created");
        Ok(intent)
    }

    #[instrument(skip(self))]
    async fn retrieve_intent(&self, id: &str) -> Result<PaymentIntent, PaymentError> {
        let response = self
            .inner
            .client
            .get(self.url(&format!("payment_intents/{id}")))
            .bearer_auth(self.inner.secret_key.expose_secret())
            .send()
            .await?;

        Self::read_intent(response).await
    }
}

/// Form-encoded body for intent creation.
fn form_fields(request: &CreateIntent) -> Vec<(String, String)> {
    let mut fields = vec![
        ("amount".to_string(), request.amount.to_string()),
        ("currency".to_string(), request.currency.code().to_string()),
        (
            "automatic_payment_methods[enabled]".to_string(),
            "true".to_string(),
        ),
    ];
    fields.extend(
        request
            .metadata
            .iter()
            .map(|(key, value)| (format!("metadata[{key}]"), value.clone())),
    );
    fields
}

/// Extract the processor's message from an error body, untouched.
fn processor_error(status: reqwest::StatusCode, body: &str) -> PaymentError {
    match serde_json::from_str::<ErrorEnvelope>(body) {
        Ok(ErrorEnvelope {
            error:
                ApiError {
                    message: Some(message),
                    code,
                },
        }) => PaymentError::Processor { message, code },
        _ => PaymentError::Processor {
            message: format!("payment processor returned HTTP {}", status.as_u16()),
            code: None,
        },
    }
}
