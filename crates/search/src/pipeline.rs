use crate::error::{ErrorKind, Result};
use exn::ResultExt;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::task::JoinHandle;
use tome_cache::{Merged, MetadataCache, merge};
use tome_catalog::models::CatalogEntry;
use tome_catalog::url::id_to_key;
use tome_catalog::{CatalogHandle, Partition, SearchField, classify};
use tracing::instrument;

/// Keeps the catalog's failure category visible in the search error.
fn from_catalog<T>(result: tome_catalog::error::Result<T>) -> Result<T> {
    match result {
        Ok(value) => Ok(value),
        Err(e) => {
            let kind = ErrorKind::Catalog((*e).clone());
            Err(e).or_raise(|| kind)
        },
    }
}

/// Catalog search, overlaid with the metadata cache and split into original
/// and derivative works.
#[derive(Clone)]
pub struct SearchPipeline {
    catalog: CatalogHandle,
    cache: MetadataCache,
    backfills: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl SearchPipeline {
    pub fn new(catalog: CatalogHandle, cache: MetadataCache) -> Self {
        Self { catalog, cache, backfills: Arc::default() }
    }

    pub fn cache(&self) -> &MetadataCache {
        &self.cache
    }

    /// Searches the catalog, prefers cached copies of the results, and
    /// classifies them.
    ///
    /// Results that weren't cached are written to the cache in the
    /// background; the search doesn't wait for (or care about) that write.
    #[instrument(skip(self), fields(catalog = self.catalog.name()))]
    pub async fn search(&self, field: SearchField, query: &str) -> Result<Partition> {
        let fresh = from_catalog(self.catalog.search(field, query).await)?;
        if fresh.is_empty() {
            return Ok(Partition::default());
        }
        let ids: Vec<&str> = fresh.iter().map(|entry| entry.id.as_str()).collect();
        let cached = self.cache.get_many(&ids).await;
        let Merged { entries, misses } = merge(fresh, &cached);
        tracing::debug!(hits = cached.len(), misses = misses.len(), "Merged search results with cache");
        self.backfill(misses);
        Ok(classify(entries))
    }

    /// Full metadata for one book, written through to the cache.
    ///
    /// Falls back to a cached copy when the catalog can't be reached. A book
    /// the catalog doesn't know is `None`.
    #[instrument(skip(self), fields(catalog = self.catalog.name()))]
    pub async fn details(&self, id: &str) -> Result<Option<CatalogEntry>> {
        let key = id_to_key(id.trim());
        match self.catalog.details(&key).await {
            Ok(Some(entry)) => {
                self.cache.put_many(std::slice::from_ref(&entry)).await;
                Ok(Some(entry))
            },
            Ok(None) => Ok(None),
            Err(e) => match self.cache.get_many(&[key.as_str()]).await.remove(&key) {
                Some(cached) => {
                    tracing::warn!(error = ?e, "Catalog unavailable; serving cached details");
                    Ok(Some(cached))
                },
                None => from_catalog(Err(e)),
            },
        }
    }

    fn backfill(&self, misses: Vec<CatalogEntry>) {
        if misses.is_empty() {
            return;
        }
        let cache = self.cache.clone();
        let handle = tokio::spawn(async move { cache.put_many(&misses).await });
        let mut backfills = self.backfills.lock().unwrap_or_else(PoisonError::into_inner);
        backfills.retain(|handle| !handle.is_finished());
        backfills.push(handle);
    }

    /// Waits for background cache writes started so far. Only needed by
    /// callers about to shut the runtime down, which would cancel them.
    pub async fn settle(&self) {
        let pending = std::mem::take(&mut *self.backfills.lock().unwrap_or_else(PoisonError::into_inner));
        for handle in pending {
            if let Err(e) = handle.await {
                tracing::warn!(error = %e, "Cache backfill task failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCatalog;
    use tome_cache::Database;
    use tome_catalog::error::ErrorKind as CatalogErrorKind;

    fn entry(id: &str, title: &str, author: &str) -> CatalogEntry {
        CatalogEntry::new(id, title).with_authors([author])
    }

    async fn pipeline(catalog: FakeCatalog) -> (Arc<FakeCatalog>, SearchPipeline) {
        let db = Database::connect_in_memory().await.unwrap();
        let catalog = Arc::new(catalog);
        (catalog.clone(), SearchPipeline::new(catalog, MetadataCache::from(&db)))
    }

    #[tokio::test]
    async fn test_search_classifies_and_prefers_cache() {
        let results = vec![
            entry("/works/OL1W", "Atomic Habits", "James Clear"),
            entry("/works/OL2W", "Summary of Atomic Habits", "Quick Reads"),
            entry("/works/OL3W", "Atomic Habits Workbook", "Someone"),
        ];
        let (_, pipeline) = pipeline(FakeCatalog::default().with_results("habits", results)).await;
        let enriched = entry("/works/OL1W", "Atomic Habits", "James Clear").with_isbn(["9780735211292"]);
        pipeline.cache().put_many(&[enriched.clone()]).await;

        let partition = pipeline.search(SearchField::Any, "habits").await.unwrap();
        assert_eq!(partition.original, [enriched]);
        let derivative: Vec<_> = partition.derivative.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(derivative, ["/works/OL2W", "/works/OL3W"]);
    }

    #[tokio::test]
    async fn test_search_backfills_misses() {
        let results = vec![entry("/works/OL1W", "Dune", "Frank Herbert"), entry("/works/OL2W", "Emma", "Jane Austen")];
        let (_, pipeline) = pipeline(FakeCatalog::default().with_results("classics", results)).await;
        pipeline.search(SearchField::Any, "classics").await.unwrap();

        pipeline.settle().await;
        let cached = pipeline.cache().get_many(&["/works/OL1W", "/works/OL2W"]).await;
        assert_eq!(cached.len(), 2);
        assert_eq!(cached["/works/OL2W"].title, "Emma");
    }

    #[tokio::test]
    async fn test_rate_limit_is_surfaced() {
        let (_, pipeline) = pipeline(FakeCatalog::default().failing(CatalogErrorKind::RateLimited)).await;
        let err = pipeline.search(SearchField::Title, "anything").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Catalog(CatalogErrorKind::RateLimited));
        assert!((*err).to_string().starts_with("Too many requests"));
    }

    #[tokio::test]
    async fn test_details_write_through_and_fallback() {
        let dune = entry("/works/OL1W", "Dune", "Frank Herbert").with_isbn(["9780441013593"]);
        let (catalog, pipeline) = pipeline(FakeCatalog::default().with_details(dune.clone())).await;

        assert_eq!(pipeline.details("OL1W").await.unwrap(), Some(dune.clone()));
        assert_eq!(pipeline.cache().get_many(&["/works/OL1W"]).await["/works/OL1W"], dune);
        assert_eq!(pipeline.details("OL404W").await.unwrap(), None);

        catalog.fail_with(CatalogErrorKind::DetailsFailed);
        assert_eq!(pipeline.details("/works/OL1W").await.unwrap(), Some(dune));
        let err = pipeline.details("OL2W").await.unwrap_err();
        assert_eq!(*err, ErrorKind::Catalog(CatalogErrorKind::DetailsFailed));
    }

    #[tokio::test]
    async fn test_empty_results() {
        let (catalog, pipeline) = pipeline(FakeCatalog::default()).await;
        assert!(pipeline.search(SearchField::Author, "nobody").await.unwrap().is_empty());
        assert_eq!(catalog.searches(), 1);
    }
}
