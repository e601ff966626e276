//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `PUBLIC_BASE_URL` - Public URL of the frontend (default checkout redirects)
//! - `TRYON_SECURITY_KEY` - Shared secret expected in try-on requests
//! - `REPLICATE_API_TOKEN` - Replicate API token
//! - `STRIPE_SECRET_KEY` - Stripe secret API key
//! - `CLOUDINARY_CLOUD_NAME` - Cloudinary cloud name
//! - `CLOUDINARY_API_KEY` - Cloudinary API key
//! - `CLOUDINARY_API_SECRET` - Cloudinary API secret
//!
//! ## Optional
//! - `TRYON_HOST` - Bind address (default: 127.0.0.1)
//! - `TRYON_PORT` - Listen port (default: 8000)
//! - `STATIC_DIR` - Directory holding the frontend bundle (default: static)
//! - `CORS_ALLOWED_ORIGINS` - Comma-separated origins (default: any)
//! - `CATEGORY_POLICY` - `fallback` or `reject` (default: fallback)
//! - `STRIPE_PRICE_ID_10`, `STRIPE_PRICE_ID_30`, `STRIPE_PRICE_ID_100` - Stripe
//!   price references; packs without one are sold with inline price data
//! - `CURRENCY` - Currency of inline prices (default: eur)
//! - `SYNTHESIS_BACKEND` - `idm-vton` or `cat-vton` (default: idm-vton)
//! - `SYNTHESIS_MODEL` - Replicate model reference (required for cat-vton)
//! - `SYNTHESIS_MAX_WAIT_SECS` - Poll limit for one prediction (default: 300)
//! - `UPSCALE_MODEL` - Replicate model reference; enables the upscale step
//! - `CLOUDINARY_FOLDER` - Upload folder (default: tryon_hd)
//! - `STRIPE_API_BASE`, `REPLICATE_API_BASE`, `CLOUDINARY_API_BASE` - Vendor
//!   API base URLs
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name
//! - `SENTRY_SAMPLE_RATE` - Fraction of errors sent to Sentry (default: 1.0)
//! - `SENTRY_TRACES_SAMPLE_RATE` - Fraction of transactions traced (default: 0.0)

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use tryon_core::{CategoryPolicy, CurrencyCode, PackId};

use crate::services::synthesis::SynthesisBackendKind;

const MIN_SECURITY_KEY_LENGTH: usize = 24;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "mot_de_passe",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

const DEFAULT_STRIPE_API_BASE: &str = "https://api.stripe.com";
const DEFAULT_REPLICATE_API_BASE: &str = "https://api.replicate.com";
const DEFAULT_CLOUDINARY_API_BASE: &str = "https://api.cloudinary.com";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Server configuration.
///
/// Built once at startup and shared read-only with every handler.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Public URL of the frontend
    pub public_base_url: url::Url,
    /// Directory holding the static frontend bundle
    pub static_dir: PathBuf,
    /// Allowed CORS origins (empty means any origin)
    pub cors_allowed_origins: Vec<String>,
    /// Shared secret expected in try-on requests
    pub security_key: SecretString,
    /// Handling of unrecognized garment categories
    pub category_policy: CategoryPolicy,
    /// Stripe configuration
    pub stripe: StripeConfig,
    /// Replicate configuration
    pub replicate: ReplicateConfig,
    /// Cloudinary configuration
    pub cloudinary: CloudinaryConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
    /// Sentry error sample rate
    pub sentry_sample_rate: f32,
    /// Sentry performance sample rate
    pub sentry_traces_sample_rate: f32,
}

/// Stripe Checkout configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct StripeConfig {
    /// Secret API key
    pub secret_key: SecretString,
    /// Stripe price reference per pack, when configured
    pub price_ids: HashMap<PackId, String>,
    /// Currency of inline prices
    pub currency: CurrencyCode,
    /// API base URL
    pub api_base: String,
}

impl std::fmt::Debug for StripeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeConfig")
            .field("secret_key", &"[REDACTED]")
            .field("price_ids", &self.price_ids)
            .field("currency", &self.currency)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Replicate synthesis configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ReplicateConfig {
    /// API token
    pub api_token: SecretString,
    /// Active try-on model family
    pub backend: SynthesisBackendKind,
    /// Model reference override (`owner/name` or `owner/name:version`)
    pub model: Option<String>,
    /// Upscale model reference; `None` disables the upscale step
    pub upscale_model: Option<String>,
    /// Maximum time to wait for one prediction
    pub max_wait: Duration,
    /// API base URL
    pub api_base: String,
}

impl std::fmt::Debug for ReplicateConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReplicateConfig")
            .field("api_token", &"[REDACTED]")
            .field("backend", &self.backend)
            .field("model", &self.model)
            .field("upscale_model", &self.upscale_model)
            .field("max_wait", &self.max_wait)
            .field("api_base", &self.api_base)
            .finish()
    }
}

/// Cloudinary media hosting configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Cloud name
    pub cloud_name: String,
    /// API key
    pub api_key: String,
    /// API secret used to sign uploads
    pub api_secret: SecretString,
    /// Upload folder
    pub folder: String,
    /// API base URL
    pub api_base: String,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if the shared secret fails validation (placeholder detection, entropy
    /// check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("TRYON_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRYON_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("TRYON_PORT", "8000")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("TRYON_PORT".to_string(), e.to_string()))?;
        let public_base_url = url::Url::parse(&get_required_env("PUBLIC_BASE_URL")?)
            .map_err(|e| ConfigError::InvalidEnvVar("PUBLIC_BASE_URL".to_string(), e.to_string()))?;
        let static_dir = PathBuf::from(get_env_or_default("STATIC_DIR", "static"));
        let cors_allowed_origins = get_optional_env("CORS_ALLOWED_ORIGINS")
            .map(|value| parse_list(&value))
            .unwrap_or_default();

        let security_key = get_validated_secret("TRYON_SECURITY_KEY")?;
        validate_min_length(&security_key, "TRYON_SECURITY_KEY")?;

        let category_policy = get_env_or_default("CATEGORY_POLICY", "fallback")
            .parse::<CategoryPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("CATEGORY_POLICY".to_string(), e))?;

        let stripe = StripeConfig::from_env()?;
        let replicate = ReplicateConfig::from_env()?;
        let cloudinary = CloudinaryConfig::from_env()?;

        let sentry_dsn = get_optional_env("SENTRY_DSN");
        let sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");
        let sentry_sample_rate = get_parsed_or_default("SENTRY_SAMPLE_RATE", 1.0)?;
        let sentry_traces_sample_rate = get_parsed_or_default("SENTRY_TRACES_SAMPLE_RATE", 0.0)?;

        Ok(Self {
            host,
            port,
            public_base_url,
            static_dir,
            cors_allowed_origins,
            security_key,
            category_policy,
            stripe,
            replicate,
            cloudinary,
            sentry_dsn,
            sentry_environment,
            sentry_sample_rate,
            sentry_traces_sample_rate,
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl StripeConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let mut price_ids = HashMap::new();
        for (pack, key) in [
            (PackId::Pack10, "STRIPE_PRICE_ID_10"),
            (PackId::Pack30, "STRIPE_PRICE_ID_30"),
            (PackId::Pack100, "STRIPE_PRICE_ID_100"),
        ] {
            if let Some(price_id) = get_optional_env(key).filter(|v| !v.trim().is_empty()) {
                price_ids.insert(pack, price_id);
            }
        }

        let currency = get_env_or_default("CURRENCY", "eur")
            .parse::<CurrencyCode>()
            .map_err(|e| ConfigError::InvalidEnvVar("CURRENCY".to_string(), e))?;

        Ok(Self {
            secret_key: get_required_secret("STRIPE_SECRET_KEY")?,
            price_ids,
            currency,
            api_base: get_env_or_default("STRIPE_API_BASE", DEFAULT_STRIPE_API_BASE),
        })
    }
}

impl ReplicateConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend = get_env_or_default("SYNTHESIS_BACKEND", "idm-vton")
            .parse::<SynthesisBackendKind>()
            .map_err(|e| ConfigError::InvalidEnvVar("SYNTHESIS_BACKEND".to_string(), e))?;
        let model = get_optional_env("SYNTHESIS_MODEL").filter(|v| !v.trim().is_empty());

        if model.is_none() && backend.default_model().is_none() {
            return Err(ConfigError::MissingEnvVar("SYNTHESIS_MODEL".to_string()));
        }

        let max_wait_secs: u64 = get_parsed_or_default("SYNTHESIS_MAX_WAIT_SECS", 300)?;

        Ok(Self {
            api_token: get_required_secret("REPLICATE_API_TOKEN")?,
            backend,
            model,
            upscale_model: get_optional_env("UPSCALE_MODEL").filter(|v| !v.trim().is_empty()),
            max_wait: Duration::from_secs(max_wait_secs),
            api_base: get_env_or_default("REPLICATE_API_BASE", DEFAULT_REPLICATE_API_BASE),
        })
    }
}

impl CloudinaryConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            cloud_name: get_required_env("CLOUDINARY_CLOUD_NAME")?,
            api_key: get_required_env("CLOUDINARY_API_KEY")?,
            api_secret: get_required_secret("CLOUDINARY_API_SECRET")?,
            folder: get_env_or_default("CLOUDINARY_FOLDER", "tryon_hd"),
            api_base: get_env_or_default("CLOUDINARY_API_BASE", DEFAULT_CLOUDINARY_API_BASE),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get a required environment variable as a secret.
fn get_required_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    Ok(SecretString::from(value))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an optional environment variable, falling back to a default.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Split a comma-separated list, dropping empty entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

/// Validate that the shared secret meets minimum length requirements.
fn validate_min_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    use secrecy::ExposeSecret;

    let value = secret.expose_secret();
    if value.len() < MIN_SECURITY_KEY_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "must be at least {} characters (got {})",
                MIN_SECURITY_KEY_LENGTH,
                value.len()
            ),
        ));
    }
    Ok(())
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_rejects_french_placeholder() {
        let result = validate_secret_strength(
            "MOT_DE_PASSE_TRES_SECRET_A_METTRE_AUSSI_DANS_BUBBLE",
            "TRYON_SECURITY_KEY",
        );
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_validate_secret_strength_valid() {
        let result = validate_secret_strength("aB3$xY9!mK2@nL5#pQ7&rT0*uW4^zC6", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_validate_min_length() {
        assert!(validate_min_length(&SecretString::from("short"), "TEST").is_err());
        assert!(validate_min_length(&SecretString::from("k".repeat(24)), "TEST").is_ok());
    }

    #[test]
    fn test_parse_list() {
        assert_eq!(
            parse_list(" https://a.test, ,https://b.test "),
            vec!["https://a.test".to_string(), "https://b.test".to_string()]
        );
        assert!(parse_list("").is_empty());
    }

    #[test]
    fn test_stripe_config_debug_redacts_secrets() {
        let config = StripeConfig {
            secret_key: SecretString::from("sk_live_super_secret_value"),
            price_ids: HashMap::from([(PackId::Pack10, "price_123".to_string())]),
            currency: CurrencyCode::EUR,
            api_base: DEFAULT_STRIPE_API_BASE.to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("price_123"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("sk_live_super_secret_value"));
    }

    #[test]
    fn test_cloudinary_config_debug_redacts_secrets() {
        let config = CloudinaryConfig {
            cloud_name: "demo-cloud".to_string(),
            api_key: "1234567890".to_string(),
            api_secret: SecretString::from("cloudinary_secret_value"),
            folder: "tryon_hd".to_string(),
            api_base: DEFAULT_CLOUDINARY_API_BASE.to_string(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("demo-cloud"));
        assert!(!debug_output.contains("cloudinary_secret_value"));
    }
}
