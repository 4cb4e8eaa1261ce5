use crate::db::Database;
use crate::error::{ErrorKind, Result};
use crate::record::timestamp_nanos;
use exn::ResultExt;
use sqlx::SqlitePool;
use time::UtcDateTime;
use tracing::instrument;

/// How many search queries are remembered.
pub const MAX_RECENT_SEARCHES: u32 = 5;

/// Most recently submitted search queries, newest first.
///
/// Queries differing only in case are the same query: searching again moves
/// it to the front under its latest spelling. Failures are logged and
/// otherwise ignored, as with [`MetadataCache`](crate::MetadataCache).
#[derive(Debug, Clone)]
pub struct RecentSearches {
    pool: SqlitePool,
}

impl From<&Database> for RecentSearches {
    fn from(db: &Database) -> Self {
        Self { pool: db.pool().clone() }
    }
}

impl RecentSearches {
    pub async fn add(&self, query: &str) {
        self.add_at(query, UtcDateTime::now()).await;
    }

    /// Remembers a trimmed query; blank queries are ignored.
    #[instrument(skip(self))]
    pub async fn add_at(&self, query: &str, now: UtcDateTime) {
        let query = query.trim();
        if query.is_empty() {
            return;
        }
        if let Err(e) = self.record(query, now).await {
            tracing::warn!(error = ?e, "Failed to remember search");
        }
    }

    pub async fn list(&self) -> Vec<String> {
        let result = sqlx::query_scalar::<_, String>(include_str!("../queries/select_recent_searches.sql"))
            .bind(MAX_RECENT_SEARCHES)
            .fetch_all(&self.pool)
            .await;
        result.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to read recent searches");
            Vec::new()
        })
    }

    pub async fn clear(&self) {
        let result = sqlx::query(include_str!("../queries/clear_recent_searches.sql")).execute(&self.pool).await;
        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to clear recent searches");
        }
    }

    async fn record(&self, query: &str, now: UtcDateTime) -> Result<()> {
        let searched_at = timestamp_nanos(now)?;
        let mut tx = self.pool.begin().await.or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/upsert_recent_search.sql"))
            .bind(query.to_lowercase())
            .bind(query)
            .bind(searched_at)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        sqlx::query(include_str!("../queries/prune_recent_searches.sql"))
            .bind(MAX_RECENT_SEARCHES)
            .execute(&mut *tx)
            .await
            .or_raise(|| ErrorKind::Database)?;
        tx.commit().await.or_raise(|| ErrorKind::Database)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn at(seconds: i64) -> UtcDateTime {
        UtcDateTime::UNIX_EPOCH + Duration::seconds(seconds)
    }

    async fn recent() -> (Database, RecentSearches) {
        let db = Database::connect_in_memory().await.unwrap();
        let recent = RecentSearches::from(&db);
        (db, recent)
    }

    #[tokio::test]
    async fn test_newest_first_without_case_duplicates() {
        let (_db, recent) = recent().await;
        recent.add_at("Dune", at(1)).await;
        recent.add_at("emma", at(2)).await;
        recent.add_at("  DUNE ", at(3)).await;
        assert_eq!(recent.list().await, ["DUNE", "emma"]);
    }

    #[tokio::test]
    async fn test_keeps_only_the_latest_five() {
        let (_db, recent) = recent().await;
        for (i, query) in ["a", "b", "c", "d", "e", "f", "g"].into_iter().enumerate() {
            recent.add_at(query, at(i as i64)).await;
        }
        assert_eq!(recent.list().await, ["g", "f", "e", "d", "c"]);
    }

    #[tokio::test]
    async fn test_blank_queries_and_clear() {
        let (_db, recent) = recent().await;
        recent.add_at("   ", at(1)).await;
        assert!(recent.list().await.is_empty());

        recent.add_at("dune", at(2)).await;
        recent.clear().await;
        assert!(recent.list().await.is_empty());
    }

    #[tokio::test]
    async fn test_fails_open_when_storage_is_gone() {
        let (db, recent) = recent().await;
        recent.add("dune").await;
        db.close().await;
        recent.add("emma").await;
        assert!(recent.list().await.is_empty());
        recent.clear().await;
    }
}
