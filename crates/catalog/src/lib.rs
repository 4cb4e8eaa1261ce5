//! Book catalog access.
//!
//! Everything that talks to, or reasons about, the public book catalog:
//!
//! - [`CatalogEntry`](models::CatalogEntry), the one normalized shape of book
//!   metadata used throughout the workspace.
//! - The [`Catalog`] trait and its [`OpenLibrary`] implementation.
//! - [`classify`], separating original works from summaries, study guides and
//!   other derivative products.
//! - [`url`] helpers for human-readable book page URLs.

mod catalog;
mod classify;
mod consts;
pub mod error;
pub mod models;
mod openlibrary;
pub mod url;

pub use crate::catalog::{Catalog, CatalogHandle, SearchField};
pub use crate::classify::{Partition, classify, is_derivative};
pub use crate::openlibrary::{
    DEFAULT_BASE_URL, DEFAULT_COVERS_URL, DEFAULT_LIMIT, DEFAULT_USER_AGENT, OpenLibrary, OpenLibraryBuilder,
};
