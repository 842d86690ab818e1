//! Domain types and models
//!
//! Raw transport data, page envelopes and the entities kept in cache views.
//! Everything else the provider returns is decoded into
//! `serde_json::Value` by the caller.

pub mod entities;
pub mod page;
pub mod response;

pub use entities::{Cacheable, Match, MatchedPerson, Message};
pub use page::{decode_data, Page};
pub use response::{RawResponse, TransportRequest};
