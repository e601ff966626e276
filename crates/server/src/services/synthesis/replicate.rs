//! Replicate predictions API client.
//!
//! Wraps prediction creation and polling using [`reqwest`]. A prediction is
//! created with `Prefer: wait`, so short jobs complete in the first response;
//! longer jobs are polled until they reach a terminal status or the wait
//! limit runs out.

use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tokio::time::Instant;
use tracing::{debug, instrument, warn};
use tryon_core::SynthesisOutput;

use super::SynthesisError;
use crate::config::ReplicateConfig;

/// Delay between two status polls of a running prediction.
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Reference to a Replicate model, optionally pinned to a version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelRef {
    owner: String,
    name: String,
    version: Option<String>,
}

impl ModelRef {
    /// Pinned version identifier, if any.
    #[must_use]
    pub fn version(&self) -> Option<&str> {
        self.version.as_deref()
    }
}

impl std::fmt::Display for ModelRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for ModelRef {
    type Err = SynthesisError;

    /// Parse `owner/name` or `owner/name:version`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || SynthesisError::InvalidModel(s.to_string());

        let (path, version) = match s.trim().split_once(':') {
            Some((path, version)) if !version.is_empty() => (path, Some(version.to_string())),
            Some(_) => return Err(invalid()),
            None => (s.trim(), None),
        };
        let (owner, name) = path.split_once('/').ok_or_else(invalid)?;
        if owner.is_empty() || name.is_empty() || name.contains('/') {
            return Err(invalid());
        }

        Ok(Self {
            owner: owner.to_string(),
            name: name.to_string(),
            version,
        })
    }
}

/// Lifecycle status of a prediction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
enum PredictionStatus {
    Starting,
    Processing,
    Succeeded,
    Failed,
    Canceled,
    #[serde(other)]
    Unknown,
}

impl PredictionStatus {
    const fn is_terminal(self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed | Self::Canceled)
    }
}

/// Prediction resource as returned by the API.
#[derive(Debug, Deserialize)]
struct Prediction {
    id: String,
    status: PredictionStatus,
    #[serde(default)]
    output: Option<serde_json::Value>,
    #[serde(default)]
    error: Option<serde_json::Value>,
}

impl Prediction {
    /// Convert a terminal prediction into its output.
    fn into_output(self) -> Result<Option<SynthesisOutput>, SynthesisError> {
        match self.status {
            PredictionStatus::Succeeded => match self.output {
                None | Some(serde_json::Value::Null) => Ok(None),
                Some(value) => serde_json::from_value::<SynthesisOutput>(value)
                    .map(Some)
                    .map_err(|e| SynthesisError::Parse(format!("unexpected output shape: {e}"))),
            },
            status => Err(SynthesisError::PredictionFailed {
                id: self.id,
                status: format!("{status:?}").to_lowercase(),
                message: self
                    .error
                    .map(|e| match e {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    })
                    .unwrap_or_default(),
            }),
        }
    }
}

/// HTTP client for the Replicate predictions API.
#[derive(Clone)]
pub struct ReplicateClient {
    client: Client,
    api_token: SecretString,
    api_base: String,
    poll_interval: Duration,
    max_wait: Duration,
}

impl std::fmt::Debug for ReplicateClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateClient")
            .field("api_token", &"[REDACTED]")
            .field("api_base", &self.api_base)
            .field("poll_interval", &self.poll_interval)
            .field("max_wait", &self.max_wait)
            .finish_non_exhaustive()
    }
}

impl ReplicateClient {
    /// Create a new Replicate client.
    #[must_use]
    pub fn new(client: Client, config: &ReplicateConfig) -> Self {
        Self {
            client,
            api_token: config.api_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            max_wait: config.max_wait,
        }
    }

    /// Override the delay between status polls.
    #[must_use]
    pub const fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// Run a model to completion and return its output.
    ///
    /// A `succeeded` prediction with a `null` output yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// Returns error if the API rejects the request, the prediction fails or
    /// is cancelled, the output has an unexpected shape, or the wait limit
    /// is exhausted.
    #[instrument(skip(self, model, input), fields(model = %model))]
    pub async fn run(
        &self,
        model: &ModelRef,
        input: serde_json::Value,
    ) -> Result<Option<SynthesisOutput>, SynthesisError> {
        let prediction = self.create_prediction(model, input).await?;
        debug!(prediction_id = %prediction.id, status = ?prediction.status, "Prediction created");

        let prediction = self.wait_for_completion(prediction).await?;
        prediction.into_output()
    }

    /// Create a prediction, waiting synchronously for a short while.
    async fn create_prediction(
        &self,
        model: &ModelRef,
        input: serde_json::Value,
    ) -> Result<Prediction, SynthesisError> {
        let (url, body) = match model.version() {
            Some(version) => (
                format!("{}/v1/predictions", self.api_base),
                serde_json::json!({ "version": version, "input": input }),
            ),
            None => (
                format!(
                    "{}/v1/models/{}/{}/predictions",
                    self.api_base, model.owner, model.name
                ),
                serde_json::json!({ "input": input }),
            ),
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(self.api_token.expose_secret())
            .header("Prefer", "wait")
            .json(&body)
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Fetch the current state of a prediction.
    async fn get_prediction(&self, id: &str) -> Result<Prediction, SynthesisError> {
        let response = self
            .client
            .get(format!("{}/v1/predictions/{id}", self.api_base))
            .bearer_auth(self.api_token.expose_secret())
            .send()
            .await?;

        Self::parse_response(response).await
    }

    /// Poll until the prediction reaches a terminal status.
    async fn wait_for_completion(
        &self,
        mut prediction: Prediction,
    ) -> Result<Prediction, SynthesisError> {
        let deadline = Instant::now() + self.max_wait;

        while !prediction.status.is_terminal() {
            if Instant::now() >= deadline {
                warn!(prediction_id = %prediction.id, "Prediction did not finish within the wait limit");
                return Err(SynthesisError::TimedOut {
                    id: prediction.id,
                    waited_secs: self.max_wait.as_secs(),
                });
            }

            tokio::time::sleep(self.poll_interval).await;
            prediction = self.get_prediction(&prediction.id).await?;
            debug!(prediction_id = %prediction.id, status = ?prediction.status, "Prediction polled");
        }

        Ok(prediction)
    }

    // ---- private helpers ----

    /// Parse a successful JSON response, or turn a non-2xx response into
    /// [`SynthesisError::Api`].
    async fn parse_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, SynthesisError> {
        let status = response.status();
        if !status.is_success() {
            let message = crate::services::error_body(response).await;
            return Err(SynthesisError::Api {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<T>()
            .await
            .map_err(|e| SynthesisError::Parse(e.to_string()))
    }
}
