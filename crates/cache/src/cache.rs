use crate::db::Database;
use crate::error::{ErrorKind, Result};
use crate::record::{CacheRecord, CacheRow, timestamp_nanos};
use exn::ResultExt;
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::{BTreeSet, HashMap};
use time::{Duration, UtcDateTime};
use tome_catalog::models::CatalogEntry;
use tracing::instrument;

/// Entries older than this are never served.
pub const DEFAULT_TTL: Duration = Duration::days(30);
// Well below SQLite's bound-parameter limit.
const LOOKUP_CHUNK: usize = 500;

/// Time-bounded store of catalog metadata keyed by catalog identifier.
///
/// Freshness is decided when reading, so expired rows are invisible even
/// before [`sweep_expired`](Self::sweep_expired) physically removes them.
/// Every operation fails open: storage errors are logged and turned into
/// misses (reads) or silently dropped (writes), never returned.
#[derive(Debug, Clone)]
pub struct MetadataCache {
    pool: SqlitePool,
    ttl: Duration,
}

impl From<&Database> for MetadataCache {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone(), ttl: DEFAULT_TTL }
    }
}

impl MetadataCache {
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Fresh entries for the requested identifiers; unknown, expired and
    /// unreadable identifiers are simply absent from the map.
    pub async fn get_many<S: AsRef<str>>(&self, ids: &[S]) -> HashMap<String, CatalogEntry> {
        self.get_many_at(ids, UtcDateTime::now()).await
    }

    #[instrument(skip_all, fields(requested = ids.len()))]
    pub async fn get_many_at<S: AsRef<str>>(&self, ids: &[S], now: UtcDateTime) -> HashMap<String, CatalogEntry> {
        let records = match self.fetch(ids).await {
            Ok(records) => records,
            Err(e) => {
                tracing::warn!(error = ?e, "Cache lookup failed; treating every identifier as a miss");
                return HashMap::new();
            },
        };
        let hits: HashMap<_, _> = records
            .into_iter()
            .filter(|record| record.is_valid_at(now, self.ttl))
            .map(|record| (record.entry.id.clone(), record.entry))
            .collect();
        tracing::debug!(hits = hits.len(), "Cache lookup complete");
        hits
    }

    /// Fresh entries in the order of `ids`, skipping misses. Used to rebuild
    /// ordered lists (such as favorites) from identifiers alone.
    pub async fn get_ordered<S: AsRef<str>>(&self, ids: &[S]) -> Vec<CatalogEntry> {
        let mut hits = self.get_many(ids).await;
        ids.iter().filter_map(|id| hits.remove(id.as_ref())).collect()
    }

    /// Upserts entries, stamping each with the current time.
    pub async fn put_many(&self, entries: &[CatalogEntry]) {
        self.put_many_at(entries, UtcDateTime::now()).await;
    }

    #[instrument(skip_all, fields(entries = entries.len()))]
    pub async fn put_many_at(&self, entries: &[CatalogEntry], now: UtcDateTime) {
        if entries.is_empty() {
            return;
        }
        if let Err(e) = self.upsert(entries, now).await {
            tracing::warn!(error = ?e, "Failed to write entries to the cache");
        }
    }

    /// Physically deletes entries older than the TTL and returns how many
    /// were removed (`0` when the sweep itself fails).
    pub async fn sweep_expired(&self) -> u64 {
        self.sweep_expired_at(UtcDateTime::now()).await
    }

    #[instrument(skip(self))]
    pub async fn sweep_expired_at(&self, now: UtcDateTime) -> u64 {
        let cutoff = match timestamp_nanos(now - self.ttl) {
            Ok(cutoff) => cutoff,
            Err(e) => {
                tracing::warn!(error = ?e, "Cache sweep cutoff out of range");
                return 0;
            },
        };
        match sqlx::query(include_str!("../queries/delete_expired.sql")).bind(cutoff).execute(&self.pool).await {
            Ok(result) => {
                tracing::info!(removed = result.rows_affected(), "Swept expired cache entries");
                result.rows_affected()
            },
            Err(e) => {
                tracing::warn!(error = %e, "Cache sweep failed");
                0
            },
        }
    }

    async fn fetch<S: AsRef<str>>(&self, ids: &[S]) -> Result<Vec<CacheRecord>> {
        let ids: Vec<&str> = ids.iter().map(AsRef::as_ref).collect::<BTreeSet<_>>().into_iter().collect();
        let mut records = Vec::with_capacity(ids.len());
        for chunk in ids.chunks(LOOKUP_CHUNK) {
            let mut query = QueryBuilder::<Sqlite>::new(include_str!("../queries/select_entries_in.sql"));
            query.push("(");
            let mut separated = query.separated(", ");
            for id in chunk {
                separated.push_bind(id.to_string());
            }
            separated.push_unseparated(")");
            let rows: Vec<CacheRow> =
                query.build_query_as().fetch_all(&self.pool).await.or_raise(|| ErrorKind::Database)?;
            for row in rows {
                let id = row.id.clone();
                match CacheRecord::try_from(row) {
                    Ok(record) => records.push(record),
                    // One corrupt row shouldn't cost the whole batch.
                    Err(e) => tracing::warn!(id = %id, error = ?e, "Ignoring unreadable cache row"),
                }
            }
        }
        Ok(records)
    }

    async fn upsert(&self, entries: &[CatalogEntry], now: UtcDateTime) -> Result<()> {
        let rows = entries.iter().map(|entry| CacheRow::new(entry, now)).collect::<Result<Vec<_>>>()?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        for row in rows {
            sqlx::query(include_str!("../queries/upsert_entry.sql"))
                .bind(row.id)
                .bind(row.title)
                .bind(row.authors)
                .bind(row.publish_year)
                .bind(row.cover_url)
                .bind(row.isbn)
                .bind(row.cached_at)
                .execute(&mut *tx)
                .await
                .or_raise(|| ErrorKind::Database)?;
        }
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}
