//! Stripe Checkout client.
//!
//! Creates hosted checkout sessions through the form-encoded Stripe REST API.
//! Payment completion is not tracked here; Stripe redirects the user back to
//! the success URL, which carries the credit count.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::StripeConfig;

/// Errors that can occur when interacting with the payment provider.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The session was created without a redirect URL.
    #[error("Checkout session {0} has no URL")]
    MissingUrl(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// What the customer pays for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineItem {
    /// A price object configured in the Stripe dashboard.
    Price { price_id: String },
    /// Ad-hoc price data.
    Inline {
        name: String,
        unit_amount: i64,
        currency: String,
    },
}

/// Parameters of a one-off payment checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSessionParams {
    /// The single line item, quantity 1.
    pub line_item: LineItem,
    /// Redirect after a successful payment.
    pub success_url: String,
    /// Redirect after a cancelled payment.
    pub cancel_url: String,
    /// Key/value pairs attached to the session.
    pub metadata: Vec<(String, String)>,
}

impl CheckoutSessionParams {
    /// Encode as Stripe form fields (`line_items[0][price]=...`).
    #[must_use]
    pub fn form_fields(&self) -> Vec<(String, String)> {
        let mut fields = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        match &self.line_item {
            LineItem::Price { price_id } => {
                fields.push(("line_items[0][price]".to_string(), price_id.clone()));
            }
            LineItem::Inline {
                name,
                unit_amount,
                currency,
            } => {
                fields.push((
                    "line_items[0][price_data][currency]".to_string(),
                    currency.clone(),
                ));
                fields.push((
                    "line_items[0][price_data][unit_amount]".to_string(),
                    unit_amount.to_string(),
                ));
                fields.push((
                    "line_items[0][price_data][product_data][name]".to_string(),
                    name.clone(),
                ));
            }
        }

        for (key, value) in &self.metadata {
            fields.push((format!("metadata[{key}]"), value.clone()));
        }

        fields
    }
}

/// A created checkout session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CheckoutSession {
    /// Session identifier (`cs_...`).
    pub id: String,
    /// Hosted payment page.
    pub url: String,
}

/// Creates hosted checkout sessions.
#[async_trait]
pub trait PaymentProvider: Send + Sync {
    /// Create a checkout session and return its redirect URL.
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentError>;
}

/// Stripe API client.
#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    secret_key: SecretString,
    api_base: String,
}

impl std::fmt::Debug for StripeClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeClient")
            .field("secret_key", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

impl StripeClient {
    /// Create a new Stripe client.
    #[must_use]
    pub fn new(client: Client, config: &StripeConfig) -> Self {
        Self {
            client,
            secret_key: config.secret_key.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: Option<String>,
}

#[async_trait]
impl PaymentProvider for StripeClient {
    #[instrument(skip(self, params), fields(success_url = %params.success_url))]
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(self.secret_key.expose_secret())
            .form(&params.form_fields())
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = super::error_body(response).await;
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .ok()
                .and_then(|e| e.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), %message, "Stripe API error creating checkout session");
            return Err(PaymentError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentError::Parse(e.to_string()))?;

        let url = session
            .url
            .ok_or_else(|| PaymentError::MissingUrl(session.id.clone()))?;

        debug!(session_id = %session.id, "Checkout session created");

        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }
}
