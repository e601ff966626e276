//! Virtual try-on synthesis backends.
//!
//! The try-on model is a strategy selected at startup (`SYNTHESIS_BACKEND`).
//! Each model family speaks its own category vocabulary and takes a fixed
//! parameter set; both live on [`SynthesisBackendKind`]. Models are hosted on
//! Replicate and invoked through [`ReplicateClient`].

pub mod replicate;

use std::str::FromStr;

use async_trait::async_trait;
use serde_json::json;
use thiserror::Error;
use tracing::instrument;
use tryon_core::{GarmentCategory, SynthesisOutput};

pub use replicate::{ModelRef, ReplicateClient};

/// Garment description passed to IDM-VTON.
const REALISTIC_PROMPT: &str = "photorealistic, perfectly fitted, highly detailed, sharp focus, \
     professional studio lighting, high quality, 8k";

/// Fixed seed so identical inputs give identical images.
const SEED: u32 = 42;

/// Errors that can occur when running a synthesis model.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The prediction ended in `failed` or `canceled`.
    #[error("Prediction {id} {status}: {message}")]
    PredictionFailed {
        id: String,
        status: String,
        message: String,
    },

    /// The prediction was still running when the wait limit ran out.
    #[error("Prediction {id} did not finish within {waited_secs}s")]
    TimedOut { id: String, waited_secs: u64 },

    /// Malformed model reference.
    #[error("Invalid model reference: {0}")]
    InvalidModel(String),

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Inputs of one try-on generation.
#[derive(Debug, Clone, Copy)]
pub struct SynthesisJob<'a> {
    pub person_image_url: &'a str,
    pub garment_image_url: &'a str,
    pub category: GarmentCategory,
}

/// Composes a garment image onto a person image.
#[async_trait]
pub trait SynthesisBackend: Send + Sync {
    /// Short identifier used in logs.
    fn name(&self) -> &str;

    /// Run the model. `Ok(None)` means it finished without an image.
    async fn generate(
        &self,
        job: &SynthesisJob<'_>,
    ) -> Result<Option<SynthesisOutput>, SynthesisError>;
}

/// Optional refinement pass over a generated image.
#[async_trait]
pub trait Upscaler: Send + Sync {
    async fn upscale(&self, image_url: &str) -> Result<Option<SynthesisOutput>, SynthesisError>;
}

/// Supported try-on model families.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SynthesisBackendKind {
    /// IDM-VTON
    #[default]
    IdmVton,
    /// CatVTON
    CatVton,
}

impl SynthesisBackendKind {
    /// Model reference used when `SYNTHESIS_MODEL` is unset.
    #[must_use]
    pub const fn default_model(self) -> Option<&'static str> {
        match self {
            Self::IdmVton => Some(
                "cuuupid/idm-vton:0513734a452173b8173e907e3a59d19a36266e55b48528559432bd21c7d7e985",
            ),
            Self::CatVton => None,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::IdmVton => "idm-vton",
            Self::CatVton => "cat-vton",
        }
    }

    /// The model's own name for a garment category.
    #[must_use]
    pub const fn category_value(self, category: GarmentCategory) -> &'static str {
        match (self, category) {
            (Self::IdmVton, GarmentCategory::UpperBody) => "upper_body",
            (Self::IdmVton, GarmentCategory::LowerBody) => "lower_body",
            (Self::IdmVton, GarmentCategory::Dresses) => "dresses",
            (Self::CatVton, GarmentCategory::UpperBody) => "upper",
            (Self::CatVton, GarmentCategory::LowerBody) => "lower",
            (Self::CatVton, GarmentCategory::Dresses) => "overall",
        }
    }

    /// Model input for a job, including the fixed quality parameters.
    #[must_use]
    pub fn input(self, job: &SynthesisJob<'_>) -> serde_json::Value {
        let category = self.category_value(job.category);
        match self {
            Self::IdmVton => json!({
                "human_img": job.person_image_url,
                "garm_img": job.garment_image_url,
                "garment_des": REALISTIC_PROMPT,
                "category": category,
                "steps": 40,
                "crop": false,
                "seed": SEED,
            }),
            Self::CatVton => json!({
                "person_image": job.person_image_url,
                "cloth_image": job.garment_image_url,
                "cloth_type": category,
                "num_inference_steps": 50,
                "guidance_scale": 2.5,
                "seed": SEED,
                "width": 768,
                "height": 1024,
            }),
        }
    }
}

impl std::fmt::Display for SynthesisBackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SynthesisBackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "idm-vton" | "idmvton" => Ok(Self::IdmVton),
            "cat-vton" | "catvton" => Ok(Self::CatVton),
            other => Err(format!(
                "unknown synthesis backend '{other}' (expected idm-vton or cat-vton)"
            )),
        }
    }
}

/// Try-on model hosted on Replicate.
#[derive(Debug, Clone)]
pub struct ReplicateTryOn {
    client: ReplicateClient,
    kind: SynthesisBackendKind,
    model: ModelRef,
}

impl ReplicateTryOn {
    #[must_use]
    pub const fn new(client: ReplicateClient, kind: SynthesisBackendKind, model: ModelRef) -> Self {
        Self {
            client,
            kind,
            model,
        }
    }
}

#[async_trait]
impl SynthesisBackend for ReplicateTryOn {
    fn name(&self) -> &str {
        self.kind.as_str()
    }

    #[instrument(skip(self, job), fields(backend = %self.kind, category = %job.category))]
    async fn generate(
        &self,
        job: &SynthesisJob<'_>,
    ) -> Result<Option<SynthesisOutput>, SynthesisError> {
        self.client.run(&self.model, self.kind.input(job)).await
    }
}

/// Super-resolution model hosted on Replicate.
#[derive(Debug, Clone)]
pub struct ReplicateUpscaler {
    client: ReplicateClient,
    model: ModelRef,
}

impl ReplicateUpscaler {
    #[must_use]
    pub const fn new(client: ReplicateClient, model: ModelRef) -> Self {
        Self { client, model }
    }
}

#[async_trait]
impl Upscaler for ReplicateUpscaler {
    #[instrument(skip(self), fields(model = %self.model))]
    async fn upscale(&self, image_url: &str) -> Result<Option<SynthesisOutput>, SynthesisError> {
        let input = json!({
            "image": image_url,
            "scale": 2,
            "face_enhance": false,
        });
        self.client.run(&self.model, input).await
    }
}
