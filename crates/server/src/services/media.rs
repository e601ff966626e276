//! Cloudinary media hosting client.
//!
//! Generated images are re-uploaded from their (possibly expiring) vendor URL
//! to Cloudinary, which fetches the remote file itself. Uploads are signed with
//! the API secret; the secret never leaves the server.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use sha1::{Digest, Sha1};
use thiserror::Error;
use tracing::{debug, error, instrument};

use crate::config::CloudinaryConfig;

/// Errors that can occur when uploading to the media host.
#[derive(Debug, Error)]
pub enum MediaError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),
}

/// Durable storage for generated images.
#[async_trait]
pub trait MediaHost: Send + Sync {
    /// Upload the image at `source_url` and return its canonical hosted URL.
    async fn upload_from_url(&self, source_url: &str) -> Result<String, MediaError>;
}

/// Cloudinary upload API client.
#[derive(Clone)]
pub struct CloudinaryClient {
    client: Client,
    cloud_name: String,
    api_key: String,
    api_secret: SecretString,
    folder: String,
    api_base: String,
}

impl std::fmt::Debug for CloudinaryClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryClient")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

impl CloudinaryClient {
    /// Create a new Cloudinary client.
    #[must_use]
    pub fn new(client: Client, config: &CloudinaryConfig) -> Self {
        Self {
            client,
            cloud_name: config.cloud_name.clone(),
            api_key: config.api_key.clone(),
            api_secret: config.api_secret.clone(),
            folder: config.folder.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
        }
    }

    /// Sign upload parameters.
    ///
    /// Parameters are sorted by name, joined as `k=v&k=v`, suffixed with the
    /// API secret and hashed with SHA-1. `file`, `api_key` and the signature
    /// itself are never part of the signed string.
    fn sign(&self, params: &[(&str, &str)]) -> String {
        let mut sorted: Vec<_> = params.to_vec();
        sorted.sort_by(|a, b| a.0.cmp(b.0));

        let to_sign = sorted
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&");

        let mut hasher = Sha1::new();
        hasher.update(to_sign.as_bytes());
        hasher.update(self.api_secret.expose_secret().as_bytes());
        hex::encode(hasher.finalize())
    }
}

#[async_trait]
impl MediaHost for CloudinaryClient {
    #[instrument(skip(self), fields(folder = %self.folder))]
    async fn upload_from_url(&self, source_url: &str) -> Result<String, MediaError> {
        let timestamp = chrono::Utc::now().timestamp().to_string();
        let signature = self.sign(&[
            ("folder", self.folder.as_str()),
            ("timestamp", timestamp.as_str()),
        ]);

        let form = [
            ("file", source_url),
            ("folder", self.folder.as_str()),
            ("timestamp", timestamp.as_str()),
            ("api_key", self.api_key.as_str()),
            ("signature", signature.as_str()),
        ];

        let response = self
            .client
            .post(format!(
                "{}/v1_1/{}/image/upload",
                self.api_base, self.cloud_name
            ))
            .form(&form)
            .send()
            .await?;
        let status = response.status();

        if !status.is_success() {
            let body = super::error_body(response).await;
            let message = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!(status = status.as_u16(), %message, "Cloudinary upload failed");
            return Err(MediaError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let upload: UploadResponse = response
            .json()
            .await
            .map_err(|e| MediaError::Parse(e.to_string()))?;

        debug!(secure_url = %upload.secure_url, "Image uploaded to Cloudinary");

        Ok(upload.secure_url)
    }
}
