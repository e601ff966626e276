//! Shared fixtures for router tests: in-process vendor fakes and an app
//! builder using them.

#![allow(dead_code, clippy::unwrap_used)]

use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::Router;
use secrecy::SecretString;
use tryon_core::{CategoryPolicy, CurrencyCode, PackId, SynthesisOutput};
use tryon_server::services::payment::{CheckoutSession, CheckoutSessionParams};
use tryon_server::services::{
    CheckoutService, MediaError, MediaHost, PaymentError, PaymentProvider, SynthesisBackend,
    SynthesisError, SynthesisJob, TryOnService,
};
use tryon_server::state::AppState;

pub const SECURITY_KEY: &str = "Zq8vN2kR5mT9xW4pL7hJ3cF6";

/// Payment provider recording every request.
#[derive(Default)]
pub struct FakePayments {
    pub sessions: Mutex<Vec<CheckoutSessionParams>>,
}

#[async_trait]
impl PaymentProvider for FakePayments {
    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams,
    ) -> Result<CheckoutSession, PaymentError> {
        self.sessions.lock().unwrap().push(params.clone());
        Ok(CheckoutSession {
            id: "cs_test_fake".to_string(),
            url: "https://checkout.stripe.com/c/pay/cs_test_fake".to_string(),
        })
    }
}

/// Synthesis backend returning a fixed output.
pub struct FakeSynthesis {
    pub output: Option<SynthesisOutput>,
    pub calls: Mutex<usize>,
}

impl FakeSynthesis {
    pub fn returning(output: Option<SynthesisOutput>) -> Self {
        Self {
            output,
            calls: Mutex::new(0),
        }
    }
}

#[async_trait]
impl SynthesisBackend for FakeSynthesis {
    fn name(&self) -> &str {
        "fake"
    }

    async fn generate(
        &self,
        _job: &SynthesisJob<'_>,
    ) -> Result<Option<SynthesisOutput>, SynthesisError> {
        *self.calls.lock().unwrap() += 1;
        Ok(self.output.clone())
    }
}

/// Media host echoing a fixed hosted URL, or rejecting every upload.
#[derive(Default)]
pub struct FakeMedia {
    pub uploads: Mutex<Vec<String>>,
    pub rejection: Option<String>,
}

impl FakeMedia {
    pub fn rejecting(message: &str) -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            rejection: Some(message.to_string()),
        }
    }
}

#[async_trait]
impl MediaHost for FakeMedia {
    async fn upload_from_url(&self, source_url: &str) -> Result<String, MediaError> {
        self.uploads.lock().unwrap().push(source_url.to_string());
        match &self.rejection {
            Some(message) => Err(MediaError::Api {
                status: 401,
                message: message.clone(),
            }),
            None => Ok("https://res.cloudinary.test/tryon_hd/result.png".to_string()),
        }
    }
}

/// Fakes wired into one app.
pub struct TestApp {
    pub router: Router,
    pub payments: Arc<FakePayments>,
    pub synthesis: Arc<FakeSynthesis>,
    pub media: Arc<FakeMedia>,
}

/// Build the full router over fakes, serving files from `static_dir`.
pub fn build_test_app(static_dir: &Path, output: Option<SynthesisOutput>) -> TestApp {
    build_test_app_with_media(static_dir, output, FakeMedia::default())
}

/// Like [`build_test_app`], with a caller-provided media host.
pub fn build_test_app_with_media(
    static_dir: &Path,
    output: Option<SynthesisOutput>,
    media: FakeMedia,
) -> TestApp {
    let payments = Arc::new(FakePayments::default());
    let synthesis = Arc::new(FakeSynthesis::returning(output));
    let media = Arc::new(media);

    let checkout = CheckoutService::new(
        Arc::clone(&payments) as Arc<dyn PaymentProvider>,
        HashMap::from([(PackId::Pack30, "price_30".to_string())]),
        CurrencyCode::EUR,
        url::Url::parse("https://tryon.test/").unwrap(),
    );
    let tryon = TryOnService::new(
        Arc::clone(&synthesis) as Arc<dyn SynthesisBackend>,
        None,
        Arc::clone(&media) as Arc<dyn MediaHost>,
        SecretString::from(SECURITY_KEY),
        CategoryPolicy::Fallback,
    );

    let state = AppState::with_services(static_dir.to_path_buf(), checkout, tryon);

    TestApp {
        router: tryon_server::app(state, &[]),
        payments,
        synthesis,
        media,
    }
}
