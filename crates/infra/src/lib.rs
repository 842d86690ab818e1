//! # Rednit Infrastructure
//!
//! Infrastructure implementations of core ports and the public client.
//!
//! This crate contains:
//! - The reqwest-backed HTTP transport
//! - Configuration loading (environment, `.env`, JSON/TOML files)
//! - Tracing subscriber setup
//! - [`RednitClient`], the entry point tying everything together
//!
//! ## Architecture
//! - Implements traits defined in `rednit-core`
//! - Contains all "impure" code (network, filesystem, environment)

pub mod client;
pub mod config;
pub mod errors;
pub mod http;
pub mod logging;

// Re-export commonly used items
pub use client::{RednitClient, RednitClientBuilder};
pub use errors::InfraError;
pub use http::{ReqwestTransport, ReqwestTransportBuilder};
