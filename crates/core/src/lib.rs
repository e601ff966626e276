//! Try-On Core - Shared types library.
//!
//! This crate provides the types shared by the HTTP server and its tests:
//! - `server` - The JSON API and static frontend responder
//! - `integration-tests` - End-to-end tests over real HTTP
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients. Vendor calls live in the server crate.
//!
//! # Modules
//!
//! - [`types`] - Credit packs, prices, garment categories, synthesis output
//!   and the request/response bodies of the JSON API

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
