//! Try-on pipeline.
//!
//! secret gate → category → synthesis → first URL → optional upscale → upload.
//! Vendor calls run strictly one after another. Nothing is retried.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tracing::{debug, info, instrument, warn};
use tryon_core::{CategoryError, CategoryPolicy, GarmentCategory, TryOnRequest};

use super::media::{MediaError, MediaHost};
use super::synthesis::{SynthesisBackend, SynthesisError, SynthesisJob, Upscaler};

/// Errors from the try-on pipeline.
#[derive(Debug, Error)]
pub enum TryOnError {
    /// The shared secret did not match.
    #[error("invalid security key")]
    Unauthorized,

    /// Unknown category under the reject policy.
    #[error(transparent)]
    InvalidCategory(#[from] CategoryError),

    /// The synthesis backend failed.
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// The backend finished without a usable image.
    #[error("synthesis returned no image")]
    GenerationFailed,

    /// The media host rejected the upload.
    #[error("upload failed: {0}")]
    Upload(#[from] MediaError),
}

/// Runs try-on generations.
#[derive(Clone)]
pub struct TryOnService {
    backend: Arc<dyn SynthesisBackend>,
    upscaler: Option<Arc<dyn Upscaler>>,
    media: Arc<dyn MediaHost>,
    security_key: SecretString,
    category_policy: CategoryPolicy,
}

impl std::fmt::Debug for TryOnService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryOnService")
            .field("backend", &self.backend.name())
            .field("upscale", &self.upscaler.is_some())
            .field("security_key", &"[REDACTED]")
            .field("category_policy", &self.category_policy)
            .finish_non_exhaustive()
    }
}

impl TryOnService {
    #[must_use]
    pub fn new(
        backend: Arc<dyn SynthesisBackend>,
        upscaler: Option<Arc<dyn Upscaler>>,
        media: Arc<dyn MediaHost>,
        security_key: SecretString,
        category_policy: CategoryPolicy,
    ) -> Self {
        Self {
            backend,
            upscaler,
            media,
            security_key,
            category_policy,
        }
    }

    /// Generate a try-on image and return its hosted URL.
    ///
    /// # Errors
    ///
    /// - `Unauthorized` if the security key does not match; no vendor is called
    /// - `InvalidCategory` for an unknown category under the reject policy
    /// - `Synthesis` / `GenerationFailed` if no image was produced
    /// - `Upload` if the media host fails
    #[instrument(
        skip(self, request),
        fields(user_id = %request.user_id, backend = %self.backend.name())
    )]
    pub async fn generate(&self, request: &TryOnRequest) -> Result<String, TryOnError> {
        if !constant_time_compare(&request.security_key, self.security_key.expose_secret()) {
            warn!("Rejected try-on request with invalid security key");
            return Err(TryOnError::Unauthorized);
        }

        let category = GarmentCategory::resolve(&request.category, self.category_policy)?;
        if GarmentCategory::parse(&request.category).is_none() {
            warn!(category = %request.category, fallback = %category, "Unknown category, using fallback");
        }

        let job = SynthesisJob {
            person_image_url: &request.person_image_url,
            garment_image_url: &request.clothing_image_url,
            category,
        };

        let output = self.backend.generate(&job).await?;
        let candidate = output
            .as_ref()
            .and_then(|o| o.first_url())
            .ok_or(TryOnError::GenerationFailed)?
            .to_string();
        debug!(%candidate, "Synthesis produced an image");

        let final_url = self.refine(candidate).await;
        let hosted = self.media.upload_from_url(&final_url).await?;

        info!(%hosted, "Try-on image generated");
        Ok(hosted)
    }

    /// Run the upscaler if configured; any failure keeps the unrefined URL.
    async fn refine(&self, candidate: String) -> String {
        let Some(upscaler) = &self.upscaler else {
            return candidate;
        };

        match upscaler.upscale(&candidate).await {
            Ok(Some(output)) => match output.first_url() {
                Some(url) => url.to_string(),
                None => {
                    warn!("Upscaler returned an empty output, keeping unrefined image");
                    candidate
                }
            },
            Ok(None) => {
                warn!("Upscaler returned no output, keeping unrefined image");
                candidate
            }
            Err(e) => {
                warn!(error = %e, "Upscale failed, keeping unrefined image");
                candidate
            }
        }
    }
}

/// Constant-time string comparison.
fn constant_time_compare(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result: u8 = 0;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }

    result == 0
}
