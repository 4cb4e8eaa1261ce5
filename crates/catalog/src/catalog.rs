//! Catalog trait.

use crate::error::Result;
use crate::models::CatalogEntry;
use async_trait::async_trait;
use std::sync::Arc;

/// Which field a catalog search matches against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SearchField {
    /// Free-text search over titles, authors, subjects, etc.
    #[default]
    Any,
    Title,
    Author,
}
impl SearchField {
    /// Name of the query-string parameter for this field.
    pub fn param(&self) -> &'static str {
        match self {
            Self::Any => "q",
            Self::Title => "title",
            Self::Author => "author",
        }
    }
}

/// A public, read-only source of book metadata.
///
/// Implementations translate their wire format into [`CatalogEntry`] at the
/// boundary; nothing past this trait ever sees a catalog-specific shape.
#[async_trait]
pub trait Catalog: Send + Sync {
    /// Name of the catalog, for logging only.
    fn name(&self) -> &str;

    /// Search the catalog.
    ///
    /// A blank query returns an empty list without contacting the catalog.
    /// Returns [`RateLimited`](crate::error::ErrorKind::RateLimited) when the
    /// catalog is throttling requests, and
    /// [`SearchFailed`](crate::error::ErrorKind::SearchFailed) for anything
    /// else that went wrong.
    async fn search(&self, field: SearchField, query: &str) -> Result<Vec<CatalogEntry>>;

    /// Fetch enriched metadata (cover, ISBNs, publish year, resolved author
    /// names) for a single work.
    ///
    /// Returns `Ok(None)` if the catalog doesn't know the identifier.
    async fn details(&self, id: &str) -> Result<Option<CatalogEntry>>;
}

pub type CatalogHandle = Arc<dyn Catalog + Send + Sync>;
