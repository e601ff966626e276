//! Try-on server library.
//!
//! This crate provides the HTTP backend as a library, allowing it to be
//! tested end-to-end and reused by the binary.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod routes;
pub mod services;
pub mod state;

pub use routes::app;
