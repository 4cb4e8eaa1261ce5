//! SQLite-backed cache of book catalog metadata.
//!
//! Catalog lookups are slow and rate limited, so every entry the catalog
//! hands out is kept here for a bounded time (30 days by default). The cache
//! is never the source of truth: it can be deleted at any time and every
//! failure inside it degrades to a cache miss.
//!
//! The same database remembers the last few search queries.

mod cache;
mod db;
pub mod error;
mod merge;
mod recent;
mod record;

pub use crate::cache::{DEFAULT_TTL, MetadataCache};
pub use crate::db::Database;
pub use crate::merge::{Merged, merge};
pub use crate::recent::{MAX_RECENT_SEARCHES, RecentSearches};
pub use crate::record::CacheRecord;
