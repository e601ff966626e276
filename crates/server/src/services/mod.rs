//! Business logic services and vendor API clients.
//!
//! # Services
//!
//! - `checkout` - Credit pack checkout (pack table + payment provider)
//! - `tryon` - Try-on pipeline (secret gate, synthesis, upscale, upload)
//!
//! # Vendor clients
//!
//! - `payment` - Stripe Checkout sessions
//! - `synthesis` - Replicate-hosted try-on and upscale models
//! - `media` - Cloudinary uploads
//!
//! Each vendor sits behind a trait (`PaymentProvider`, `SynthesisBackend`,
//! `Upscaler`, `MediaHost`) so the services can be driven with in-process
//! fakes in tests.

pub mod checkout;
pub mod media;
pub mod payment;
pub mod synthesis;
pub mod tryon;

pub use checkout::{CheckoutError, CheckoutService};
pub use media::{CloudinaryClient, MediaError, MediaHost};
pub use payment::{PaymentError, PaymentProvider, StripeClient};
pub use synthesis::{
    ModelRef, ReplicateClient, ReplicateTryOn, ReplicateUpscaler, SynthesisBackend,
    SynthesisBackendKind, SynthesisError, SynthesisJob, Upscaler,
};
pub use tryon::{TryOnError, TryOnService};

/// Read an error body for logging, without failing on unreadable bodies.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    response
        .text()
        .await
        .unwrap_or_else(|_| "<unreadable body>".to_string())
}
