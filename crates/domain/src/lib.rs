//! # Rednit Domain
//!
//! Domain types shared by the request engine and its adapters.
//!
//! This crate contains:
//! - The domain error type and `Result` alias
//! - Client configuration structures
//! - Route templates and the route compiler
//! - Raw response, page envelope and cached entity types
//!
//! ## Architecture
//! - No dependencies on other Rednit crates
//! - No I/O: everything here is plain data and pure functions

pub mod config;
pub mod constants;
pub mod errors;
pub mod routes;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use routes::{CompiledRoute, HttpMethod, Route};
pub use types::*;
