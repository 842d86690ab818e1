//! Cursor-paginated cache views
//!
//! A [`CacheView`] walks a provider listing page by page into a
//! [`PaginatedCache`], then answers lookups from memory.

mod cache;
mod endpoints;
mod view;

pub use cache::{LoadGuard, PageOrder, PaginatedCache};
pub use endpoints::{MatchCacheView, MatchPages, MessageCacheView, MessagePages};
pub use view::{CacheView, PagedEndpoint};
