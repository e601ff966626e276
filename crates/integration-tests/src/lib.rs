//! End-to-end tests for the try-on server.
//!
//! Each test boots the full router (real Stripe, Replicate and Cloudinary
//! clients, full middleware stack) on an ephemeral port. All three vendors are
//! pointed at one `wiremock` server; their API paths do not overlap.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p tryon-integration-tests
//! ```

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;

use secrecy::SecretString;
use tempfile::TempDir;
use tokio::task::JoinHandle;
use tryon_core::{CategoryPolicy, CurrencyCode, PackId};
use tryon_server::config::{CloudinaryConfig, ReplicateConfig, ServerConfig, StripeConfig};
use tryon_server::services::SynthesisBackendKind;
use tryon_server::state::AppState;
use wiremock::MockServer;

/// Shared secret configured in every test server.
pub const SECURITY_KEY: &str = "Zq8vN2kR5mT9xW4pL7hJ3cF6";

/// Public base URL of the test frontend.
pub const PUBLIC_BASE_URL: &str = "https://tryon.test/";

/// A running server plus its fake vendor API.
pub struct TestContext {
    pub client: reqwest::Client,
    pub base_url: String,
    pub vendor: MockServer,
    pub static_dir: TempDir,
    server: JoinHandle<()>,
}

impl TestContext {
    /// Start a server with the default test configuration.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start a server after adjusting the test configuration.
    ///
    /// # Panics
    ///
    /// Panics if the server cannot be started.
    pub async fn start_with(customize: impl FnOnce(&mut ServerConfig)) -> Self {
        let vendor = MockServer::start().await;
        let static_dir = tempfile::tempdir().expect("Failed to create static dir");
        write_frontend(static_dir.path());

        let mut config = test_config(&vendor.uri(), static_dir.path());
        customize(&mut config);

        let state = AppState::new(&config).expect("Failed to build application state");
        let app = tryon_server::app(state, &config.cors_allowed_origins);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test listener");
        let addr = listener.local_addr().expect("Listener has no address");

        let server = tokio::spawn(async move {
            axum::serve(
                listener,
                app.into_make_service_with_connect_info::<SocketAddr>(),
            )
            .await
            .expect("Test server failed");
        });

        Self {
            client: reqwest::Client::new(),
            base_url: format!("http://{addr}"),
            vendor,
            static_dir,
            server,
        }
    }

    /// Absolute URL of a server path.
    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Requests the vendor server received on `path`.
    pub async fn vendor_requests(&self, path: &str) -> Vec<wiremock::Request> {
        self.vendor
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|request| request.url.path() == path)
            .collect()
    }
}

impl Drop for TestContext {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Configuration pointing every vendor at `vendor_base`.
///
/// # Panics
///
/// Panics if the public base URL constant is invalid.
#[must_use]
pub fn test_config(vendor_base: &str, static_dir: &Path) -> ServerConfig {
    ServerConfig {
        host: [127, 0, 0, 1].into(),
        port: 0,
        public_base_url: url::Url::parse(PUBLIC_BASE_URL).expect("valid test URL"),
        static_dir: static_dir.to_path_buf(),
        cors_allowed_origins: Vec::new(),
        security_key: SecretString::from(SECURITY_KEY),
        category_policy: CategoryPolicy::Fallback,
        stripe: StripeConfig {
            secret_key: SecretString::from("sk_test_integration"),
            price_ids: HashMap::from([
                (PackId::Pack10, "price_10".to_string()),
                (PackId::Pack30, "price_30".to_string()),
            ]),
            currency: CurrencyCode::EUR,
            api_base: vendor_base.to_string(),
        },
        replicate: ReplicateConfig {
            api_token: SecretString::from("r8_integration"),
            backend: SynthesisBackendKind::IdmVton,
            model: None,
            upscale_model: None,
            max_wait: Duration::from_secs(10),
            api_base: vendor_base.to_string(),
        },
        cloudinary: CloudinaryConfig {
            cloud_name: "demo".to_string(),
            api_key: "123456789012345".to_string(),
            api_secret: SecretString::from("cloudinary-secret"),
            folder: "tryon_hd".to_string(),
            api_base: vendor_base.to_string(),
        },
        sentry_dsn: None,
        sentry_environment: None,
        sentry_sample_rate: 1.0,
        sentry_traces_sample_rate: 0.0,
    }
}

/// Write a minimal frontend bundle, plus a backend file that must stay hidden.
///
/// # Panics
///
/// Panics if the files cannot be written.
pub fn write_frontend(dir: &Path) {
    let files = [
        ("index.html", "<!doctype html><title>Try-On</title>"),
        ("app.js", "console.log('tryon');"),
        ("styles.css", "body { margin: 0; }"),
        ("main.py", "print('backend')"),
    ];
    for (name, contents) in files {
        std::fs::write(dir.join(name), contents).expect("Failed to write static file");
    }
}
