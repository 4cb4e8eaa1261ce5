use crate::error::Result;
use crate::pipeline::SearchPipeline;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tome_catalog::{Partition, SearchField};

pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(500);

/// Search-as-you-type on top of a [`SearchPipeline`].
///
/// Each call waits out the debounce interval first and is only answered if
/// no newer call was made in the meantime, neither during the debounce nor
/// while its request was in flight. Superseded calls resolve to `None`.
pub struct SearchSession {
    pipeline: SearchPipeline,
    debounce: Duration,
    latest: AtomicU64,
}

impl SearchSession {
    pub fn new(pipeline: SearchPipeline) -> Self {
        Self { pipeline, debounce: DEFAULT_DEBOUNCE, latest: AtomicU64::new(0) }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn pipeline(&self) -> &SearchPipeline {
        &self.pipeline
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    pub async fn search(&self, field: SearchField, query: &str) -> Result<Option<Partition>> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        tokio::time::sleep(self.debounce).await;
        if !self.is_current(ticket) {
            tracing::trace!(ticket, "Search superseded while debouncing");
            return Ok(None);
        }
        let result = self.pipeline.search(field, query).await;
        if !self.is_current(ticket) {
            tracing::debug!(ticket, "Discarding stale search response");
            return Ok(None);
        }
        result.map(Some)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeCatalog;
    use std::sync::Arc;
    use tome_cache::{Database, MetadataCache};
    use tome_catalog::models::CatalogEntry;

    /// Builds a session over a closed cache, then freezes the clock. A
    /// closed cache misses without touching SQLite, so no real time passes
    /// behind the paused clock's back.
    async fn session(catalog: FakeCatalog) -> (Arc<FakeCatalog>, SearchSession) {
        let db = Database::connect_in_memory().await.unwrap();
        db.close().await;
        tokio::time::pause();
        let catalog = Arc::new(catalog);
        let pipeline = SearchPipeline::new(catalog.clone(), MetadataCache::from(&db));
        (catalog, SearchSession::new(pipeline))
    }

    fn results(title: &str) -> Vec<CatalogEntry> {
        vec![CatalogEntry::new(format!("/works/{title}"), title).with_authors(["Author"])]
    }

    #[tokio::test]
    async fn test_typing_only_searches_once() {
        let catalog = FakeCatalog::default().with_results("dun", results("Dun")).with_results("dune", results("Dune"));
        let (catalog, session) = session(catalog).await;

        let (first, second) = tokio::join!(session.search(SearchField::Any, "dun"), async {
            tokio::time::sleep(Duration::from_millis(200)).await;
            session.search(SearchField::Any, "dune").await
        });
        assert_eq!(first.unwrap(), None);
        assert_eq!(second.unwrap().unwrap().original[0].title, "Dune");
        assert_eq!(catalog.searches(), 1);
    }

    #[tokio::test]
    async fn test_stale_response_is_discarded() {
        let catalog = FakeCatalog::default()
            .with_results("slow", results("Slow"))
            .with_results("fast", results("Fast"))
            .with_latency("slow", Duration::from_secs(2));
        let (catalog, session) = session(catalog).await;

        let (slow, fast) = tokio::join!(session.search(SearchField::Any, "slow"), async {
            // After the slow request went out, before it came back.
            tokio::time::sleep(Duration::from_millis(600)).await;
            session.search(SearchField::Any, "fast").await
        });
        assert_eq!(slow.unwrap(), None);
        assert_eq!(fast.unwrap().unwrap().original[0].title, "Fast");
        assert_eq!(catalog.searches(), 2);
    }

    #[tokio::test]
    async fn test_custom_debounce() {
        let catalog = FakeCatalog::default().with_results("emma", results("Emma"));
        let (_, session) = session(catalog).await;
        let session = session.with_debounce(Duration::ZERO);
        let partition = session.search(SearchField::Title, "emma").await.unwrap().unwrap();
        assert_eq!(partition.len(), 1);
    }
}
