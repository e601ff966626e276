//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures errors to Sentry before
//! responding to the client. All route handlers should return `Result<T, AppError>`.
//!
//! Responses are JSON `{"detail": "..."}`. Vendor error payloads are logged
//! and captured, never returned.

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use tryon_core::ErrorBody;

use crate::services::{CheckoutError, MediaError, PaymentError, SynthesisError, TryOnError};

/// Application-level error type for the try-on server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Unknown credit pack.
    #[error("Invalid pack: {0}")]
    InvalidPack(String),

    /// Unknown garment category under the reject policy.
    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Request body is not valid JSON for the endpoint.
    #[error("Invalid request body: {message}")]
    InvalidBody { status: StatusCode, message: String },

    /// Per-client request budget exhausted.
    #[error("Rate limited")]
    RateLimited,

    /// Shared secret mismatch.
    #[error("Unauthorized")]
    Unauthorized,

    /// Access to a protected file.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The synthesis backend produced no image.
    #[error("Generation returned no image")]
    GenerationFailed,

    /// Payment provider call failed.
    #[error("Payment provider error: {0}")]
    PaymentProvider(#[from] PaymentError),

    /// Synthesis provider call failed.
    #[error("Synthesis provider error: {0}")]
    SynthesisProvider(#[from] SynthesisError),

    /// Media upload failed.
    #[error("Media upload error: {0}")]
    MediaUpload(#[from] MediaError),
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::InvalidPack(_) | Self::InvalidCategory(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::InvalidBody { status, .. } => *status,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::Unauthorized | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::GenerationFailed
            | Self::PaymentProvider(_)
            | Self::SynthesisProvider(_)
            | Self::MediaUpload(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the client.
    fn detail(&self) -> String {
        match self {
            Self::InvalidPack(_) => "Invalid pack ID.".to_string(),
            Self::InvalidCategory(category) => format!("Unknown garment category: {category}"),
            Self::BadRequest(msg) | Self::InvalidBody { message: msg, .. } => msg.clone(),
            Self::RateLimited => "Too many requests, please slow down.".to_string(),
            Self::Unauthorized => "Invalid security key.".to_string(),
            Self::Forbidden(_) => "Access forbidden".to_string(),
            Self::NotFound(_) => "File not found".to_string(),
            Self::GenerationFailed => "Image generation returned no result".to_string(),
            Self::PaymentProvider(_) => "Payment service error".to_string(),
            Self::SynthesisProvider(_) => "Image generation service error".to_string(),
            Self::MediaUpload(_) => "Image storage service error".to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let body = ErrorBody {
            detail: self.detail(),
        };

        (status, Json(body)).into_response()
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        match err {
            CheckoutError::InvalidPack(e) => Self::InvalidPack(e.to_string()),
            CheckoutError::InvalidUrl(msg) => Self::BadRequest(msg),
            CheckoutError::Payment(e) => Self::PaymentProvider(e),
        }
    }
}

impl From<TryOnError> for AppError {
    fn from(err: TryOnError) -> Self {
        match err {
            TryOnError::Unauthorized => Self::Unauthorized,
            TryOnError::InvalidCategory(tryon_core::CategoryError::Unknown(category)) => {
                Self::InvalidCategory(category)
            }
            TryOnError::Synthesis(e) => Self::SynthesisProvider(e),
            TryOnError::GenerationFailed => Self::GenerationFailed,
            TryOnError::Upload(e) => Self::MediaUpload(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::InvalidBody {
            status: rejection.status(),
            message: rejection.body_text(),
        }
    }
}

/// Set the Sentry user context from the caller's opaque user ID.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("checkout", "Checkout requested", Some(&[("pack_id", "pack_30")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
