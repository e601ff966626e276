//! Core types for the try-on backend.
//!
//! This module provides type-safe wrappers for the domain concepts shared
//! between the server and its tests.

pub mod api;
pub mod category;
pub mod output;
pub mod pack;
pub mod price;

pub use api::{CheckoutRequest, CheckoutResponse, ErrorBody, TryOnRequest, TryOnResponse};
pub use category::{CategoryError, CategoryPolicy, GarmentCategory};
pub use output::SynthesisOutput;
pub use pack::{CreditPack, PackError, PackId};
pub use price::{CurrencyCode, Price};
