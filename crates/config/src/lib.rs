//! Configuration for tome.
//!
//! See [`Config::load`] for where values come from, and [`Config`] for what
//! can be set.

mod config;
pub mod error;
mod load;

pub use crate::config::{CacheConfig, CatalogConfig, Config, DEFAULT_DEBOUNCE_MS, DEFAULT_TTL_DAYS, SearchConfig};
pub use crate::load::{ENV_PREFIX, default_files};
