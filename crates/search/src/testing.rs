//! Scriptable catalog for tests.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tome_catalog::error::{ErrorKind, Result};
use tome_catalog::models::CatalogEntry;
use tome_catalog::{Catalog, SearchField};

#[derive(Default)]
pub(crate) struct FakeCatalog {
    results: HashMap<String, Vec<CatalogEntry>>,
    details: HashMap<String, CatalogEntry>,
    latency: HashMap<String, Duration>,
    failure: Mutex<Option<ErrorKind>>,
    searches: AtomicUsize,
}

impl FakeCatalog {
    pub(crate) fn with_results(mut self, query: &str, results: Vec<CatalogEntry>) -> Self {
        self.results.insert(query.to_string(), results);
        self
    }

    pub(crate) fn with_details(mut self, entry: CatalogEntry) -> Self {
        self.details.insert(entry.id.clone(), entry);
        self
    }

    /// Delays the response to one query by `latency`.
    pub(crate) fn with_latency(mut self, query: &str, latency: Duration) -> Self {
        self.latency.insert(query.to_string(), latency);
        self
    }

    pub(crate) fn failing(self, kind: ErrorKind) -> Self {
        self.fail_with(kind);
        self
    }

    pub(crate) fn fail_with(&self, kind: ErrorKind) {
        *self.failure.lock().unwrap() = Some(kind);
    }

    pub(crate) fn searches(&self) -> usize {
        self.searches.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        match self.failure.lock().unwrap().clone() {
            Some(kind) => exn::bail!(kind),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl Catalog for FakeCatalog {
    fn name(&self) -> &str {
        "fake"
    }

    async fn search(&self, _field: SearchField, query: &str) -> Result<Vec<CatalogEntry>> {
        self.searches.fetch_add(1, Ordering::SeqCst);
        if let Some(latency) = self.latency.get(query) {
            tokio::time::sleep(*latency).await;
        }
        self.check()?;
        Ok(self.results.get(query).cloned().unwrap_or_default())
    }

    async fn details(&self, id: &str) -> Result<Option<CatalogEntry>> {
        self.check()?;
        Ok(self.details.get(id).cloned())
    }
}
