//! Application state shared across handlers.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::services::{
    CheckoutService, CloudinaryClient, ModelRef, ReplicateClient, ReplicateTryOn,
    ReplicateUpscaler, StripeClient, SynthesisError, TryOnService, Upscaler,
};

/// Error building the application state.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error("invalid model reference: {0}")]
    Model(#[from] SynthesisError),
    #[error("no model configured for the {0} backend")]
    MissingModel(String),
}

/// Application state shared across all handlers.
///
/// This struct is cheaply cloneable via `Arc`. It holds the services and the
/// static root; configuration is consumed when the services are built.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    static_dir: PathBuf,
    checkout: CheckoutService,
    tryon: TryOnService,
}

impl AppState {
    /// Build the state with the real vendor clients.
    ///
    /// One `reqwest::Client` (and its connection pool) is shared by all
    /// vendors.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built or a model
    /// reference is malformed.
    pub fn new(config: &ServerConfig) -> Result<Self, StateError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("tryon-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        let checkout = CheckoutService::new(
            Arc::new(StripeClient::new(http.clone(), &config.stripe)),
            config.stripe.price_ids.clone(),
            config.stripe.currency,
            config.public_base_url.clone(),
        );

        let replicate = ReplicateClient::new(http.clone(), &config.replicate);
        let backend_kind = config.replicate.backend;
        let model: ModelRef = config
            .replicate
            .model
            .as_deref()
            .or_else(|| backend_kind.default_model())
            .ok_or_else(|| StateError::MissingModel(backend_kind.to_string()))?
            .parse()?;

        let upscaler = config
            .replicate
            .upscale_model
            .as_deref()
            .map(str::parse::<ModelRef>)
            .transpose()?
            .map(|model| {
                Arc::new(ReplicateUpscaler::new(replicate.clone(), model)) as Arc<dyn Upscaler>
            });

        let tryon = TryOnService::new(
            Arc::new(ReplicateTryOn::new(replicate, backend_kind, model)),
            upscaler,
            Arc::new(CloudinaryClient::new(http, &config.cloudinary)),
            config.security_key.clone(),
            config.category_policy,
        );

        tracing::info!(
            backend = %backend_kind,
            upscale = config.replicate.upscale_model.is_some(),
            "Vendor clients initialized"
        );

        Ok(Self::with_services(
            config.static_dir.clone(),
            checkout,
            tryon,
        ))
    }

    /// Build the state from prepared services.
    #[must_use]
    pub fn with_services(
        static_dir: PathBuf,
        checkout: CheckoutService,
        tryon: TryOnService,
    ) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                static_dir,
                checkout,
                tryon,
            }),
        }
    }

    /// Directory holding the frontend bundle.
    #[must_use]
    pub fn static_dir(&self) -> &Path {
        &self.inner.static_dir
    }

    /// Get a reference to the checkout service.
    #[must_use]
    pub fn checkout(&self) -> &CheckoutService {
        &self.inner.checkout
    }

    /// Get a reference to the try-on service.
    #[must_use]
    pub fn tryon(&self) -> &TryOnService {
        &self.inner.tryon
    }
}
