//! Request and response bodies of the JSON API.

use serde::{Deserialize, Serialize};

/// Body of `POST /api/v1/generate-tryon`.
///
/// Implements `Debug` manually to redact the security key.
#[derive(Clone, Serialize, Deserialize)]
pub struct TryOnRequest {
    /// Publicly reachable URL of the person photo.
    pub person_image_url: String,
    /// Publicly reachable URL of the garment photo.
    pub clothing_image_url: String,
    /// Garment category in the caller's vocabulary.
    pub category: String,
    /// Opaque client-side user identifier, used for logging only.
    pub user_id: String,
    /// Shared secret authorizing the request.
    pub security_key: String,
}

impl std::fmt::Debug for TryOnRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TryOnRequest")
            .field("person_image_url", &self.person_image_url)
            .field("clothing_image_url", &self.clothing_image_url)
            .field("category", &self.category)
            .field("user_id", &self.user_id)
            .field("security_key", &"[REDACTED]")
            .finish()
    }
}

/// Response of `POST /api/v1/generate-tryon`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnResponse {
    /// Durable, hosted URL of the generated image.
    pub result_image_url: String,
}

/// Body of `POST /api/v1/create-checkout-session`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutRequest {
    /// Credit pack identifier (`pack_10`, `pack_30`, `pack_100`).
    pub pack_id: String,
    /// Where the payment page sends the user after paying.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_url: Option<String>,
    /// Where the payment page sends the user after cancelling.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancel_url: Option<String>,
}

/// Response of `POST /api/v1/create-checkout-session`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutResponse {
    /// Hosted checkout page to redirect the user to.
    pub url: String,
}

/// Error body returned by every failing API call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human-readable, vendor-agnostic message.
    pub detail: String,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_try_on_request_debug_redacts_key() {
        let request = TryOnRequest {
            person_image_url: "https://x.test/p.png".to_string(),
            clothing_image_url: "https://x.test/c.png".to_string(),
            category: "upper_body".to_string(),
            user_id: "user_1".to_string(),
            security_key: "super_secret_key_value".to_string(),
        };

        let debug_output = format!("{request:?}");
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_secret_key_value"));
    }

    #[test]
    fn test_checkout_request_urls_are_optional() {
        let request: CheckoutRequest = serde_json::from_str(r#"{"pack_id":"pack_10"}"#).unwrap();
        assert_eq!(request.pack_id, "pack_10");
        assert!(request.success_url.is_none());
        assert!(request.cancel_url.is_none());
    }
}
