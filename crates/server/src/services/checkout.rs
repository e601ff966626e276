//! Credit pack checkout.
//!
//! Resolves a pack identifier against the fixed pack table and asks the
//! payment provider for a hosted checkout page. The success redirect carries
//! `success=true&add_credits=N` so the frontend can credit the purchase.

use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};
use tryon_core::{CreditPack, CurrencyCode, PackError, PackId};
use url::Url;

use super::payment::{CheckoutSessionParams, LineItem, PaymentError, PaymentProvider};

/// Errors from the checkout service.
#[derive(Debug, Error)]
pub enum CheckoutError {
    /// The pack identifier is not in the table.
    #[error(transparent)]
    InvalidPack(#[from] PackError),

    /// A redirect URL could not be parsed.
    #[error("Invalid redirect URL: {0}")]
    InvalidUrl(String),

    /// The payment provider failed.
    #[error(transparent)]
    Payment(#[from] PaymentError),
}

/// Creates checkout sessions for credit packs.
#[derive(Clone)]
pub struct CheckoutService {
    provider: Arc<dyn PaymentProvider>,
    price_ids: HashMap<PackId, String>,
    currency: CurrencyCode,
    public_base_url: Url,
}

impl std::fmt::Debug for CheckoutService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CheckoutService")
            .field("price_ids", &self.price_ids)
            .field("currency", &self.currency)
            .field("public_base_url", &self.public_base_url.as_str())
            .finish_non_exhaustive()
    }
}

impl CheckoutService {
    #[must_use]
    pub fn new(
        provider: Arc<dyn PaymentProvider>,
        price_ids: HashMap<PackId, String>,
        currency: CurrencyCode,
        public_base_url: Url,
    ) -> Self {
        Self {
            provider,
            price_ids,
            currency,
            public_base_url,
        }
    }

    /// Currency used for packs without a configured price id.
    #[must_use]
    pub const fn currency(&self) -> CurrencyCode {
        self.currency
    }

    /// Create a checkout session for `pack_id` and return the payment page URL.
    ///
    /// Missing redirect URLs default to the public base URL.
    ///
    /// # Errors
    ///
    /// Returns `InvalidPack` for unknown packs (the provider is not called),
    /// `InvalidUrl` for unparseable redirects and `Payment` for provider
    /// failures.
    #[instrument(skip(self, success_url, cancel_url))]
    pub async fn create_session(
        &self,
        pack_id: &str,
        success_url: Option<&str>,
        cancel_url: Option<&str>,
    ) -> Result<String, CheckoutError> {
        let pack = pack_id.parse::<PackId>()?.pack();

        let success_url = self.success_url(success_url, &pack)?;
        let cancel_url = match cancel_url {
            Some(raw) => parse_redirect(raw)?,
            None => self.public_base_url.clone(),
        };

        let params = CheckoutSessionParams {
            line_item: self.line_item(&pack),
            success_url: success_url.into(),
            cancel_url: cancel_url.into(),
            metadata: vec![
                ("pack_id".to_string(), pack.id.to_string()),
                ("credits".to_string(), pack.credits.to_string()),
            ],
        };

        let session = self.provider.create_checkout_session(&params).await?;
        info!(session_id = %session.id, pack = %pack.id, "Checkout session created");

        Ok(session.url)
    }

    /// Success redirect with the credit count appended to its query.
    fn success_url(&self, raw: Option<&str>, pack: &CreditPack) -> Result<Url, CheckoutError> {
        let mut url = match raw {
            Some(raw) => parse_redirect(raw)?,
            None => self.public_base_url.clone(),
        };
        url.query_pairs_mut()
            .append_pair("success", "true")
            .append_pair("add_credits", &pack.credits.to_string());
        Ok(url)
    }

    fn line_item(&self, pack: &CreditPack) -> LineItem {
        self.price_ids.get(&pack.id).map_or_else(
            || LineItem::Inline {
                name: pack.name.to_string(),
                unit_amount: pack.unit_amount_cents,
                currency: self.currency.stripe_code().to_string(),
            },
            |price_id| LineItem::Price {
                price_id: price_id.clone(),
            },
        )
    }
}

fn parse_redirect(raw: &str) -> Result<Url, CheckoutError> {
    Url::parse(raw).map_err(|e| CheckoutError::InvalidUrl(format!("{raw}: {e}")))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::services::payment::CheckoutSession;

    /// Records every session request.
    #[derive(Default)]
    struct RecordingProvider {
        calls: Mutex<Vec<CheckoutSessionParams>>,
        fail: bool,
    }

    #[async_trait]
    impl PaymentProvider for RecordingProvider {
        async fn create_checkout_session(
            &self,
            params: &CheckoutSessionParams,
        ) -> Result<CheckoutSession, PaymentError> {
            self.calls.lock().unwrap().push(params.clone());
            if self.fail {
                return Err(PaymentError::Api {
                    status: 401,
                    message: "Invalid API Key provided".to_string(),
                });
            }
            Ok(CheckoutSession {
                id: "cs_test_1".to_string(),
                url: "https://checkout.stripe.com/c/pay/cs_test_1".to_string(),
            })
        }
    }

    fn service(provider: Arc<RecordingProvider>) -> CheckoutService {
        let price_ids = HashMap::from([(PackId::Pack30, "price_30".to_string())]);
        CheckoutService::new(
            provider,
            price_ids,
            CurrencyCode::EUR,
            Url::parse("https://tryon.test/").unwrap(),
        )
    }

    #[tokio::test]
    async fn test_unknown_pack_never_reaches_provider() {
        let provider = Arc::new(RecordingProvider::default());
        let err = service(Arc::clone(&provider))
            .create_session("pack_999", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidPack(_)));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_success_url_carries_credit_count() {
        let provider = Arc::new(RecordingProvider::default());
        let url = service(Arc::clone(&provider))
            .create_session(
                "pack_30",
                Some("https://app.test/done"),
                Some("https://app.test/cancel"),
            )
            .await
            .unwrap();

        assert_eq!(url, "https://checkout.stripe.com/c/pay/cs_test_1");

        let calls = provider.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(
            calls[0].success_url,
            "https://app.test/done?success=true&add_credits=30"
        );
        assert_eq!(calls[0].cancel_url, "https://app.test/cancel");
        assert_eq!(
            calls[0].line_item,
            LineItem::Price {
                price_id: "price_30".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_existing_query_is_preserved() {
        let provider = Arc::new(RecordingProvider::default());
        service(Arc::clone(&provider))
            .create_session("pack_10", Some("https://app.test/?lang=fr"), None)
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(
            calls[0].success_url,
            "https://app.test/?lang=fr&success=true&add_credits=10"
        );
        assert_eq!(calls[0].cancel_url, "https://tryon.test/");
    }

    #[tokio::test]
    async fn test_inline_price_without_price_id() {
        let provider = Arc::new(RecordingProvider::default());
        service(Arc::clone(&provider))
            .create_session("pack_100", None, None)
            .await
            .unwrap();

        let calls = provider.calls.lock().unwrap();
        assert_eq!(
            calls[0].success_url,
            "https://tryon.test/?success=true&add_credits=100"
        );
        assert_eq!(
            calls[0].line_item,
            LineItem::Inline {
                name: "100 Try-On Credits".to_string(),
                unit_amount: 2499,
                currency: "eur".to_string(),
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_redirect_url() {
        let provider = Arc::new(RecordingProvider::default());
        let err = service(Arc::clone(&provider))
            .create_session("pack_10", Some("not a url"), None)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::InvalidUrl(_)));
        assert!(provider.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_provider_failure() {
        let provider = Arc::new(RecordingProvider {
            fail: true,
            ..RecordingProvider::default()
        });
        let err = service(provider)
            .create_session("pack_10", None, None)
            .await
            .unwrap_err();

        assert!(matches!(err, CheckoutError::Payment(PaymentError::Api { status: 401, .. })));
    }
}
