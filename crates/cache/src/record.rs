use crate::error::{Error, ErrorKind, Result};
use exn::ResultExt;
use time::{Duration, UtcDateTime};
use tome_catalog::models::CatalogEntry;

/// A cached entry and the moment it was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheRecord {
    pub entry: CatalogEntry,
    pub cached_at: UtcDateTime,
}
impl CacheRecord {
    /// A record is served while its age is at most `ttl` (inclusive).
    pub fn is_valid_at(&self, now: UtcDateTime, ttl: Duration) -> bool {
        now - self.cached_at <= ttl
    }
}

/// `cached_at` column value: nanoseconds since the Unix epoch. Nothing is
/// lost on the way through the table, so TTL checks against a stored
/// timestamp are exact.
pub(crate) fn timestamp_nanos(at: UtcDateTime) -> Result<i64> {
    i64::try_from(at.unix_timestamp_nanos()).or_raise(|| ErrorKind::InvalidData("cached_at"))
}

/// Raw `book_cache` row; list columns are JSON encoded.
#[derive(Debug, sqlx::FromRow)]
pub(crate) struct CacheRow {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) authors: String,
    pub(crate) publish_year: Option<i64>,
    pub(crate) cover_url: Option<String>,
    pub(crate) isbn: Option<String>,
    pub(crate) cached_at: i64,
}
impl CacheRow {
    pub(crate) fn new(entry: &CatalogEntry, cached_at: UtcDateTime) -> Result<Self> {
        let authors = serde_json::to_string(&entry.authors).or_raise(|| ErrorKind::InvalidData("authors"))?;
        let isbn = entry
            .isbn
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .or_raise(|| ErrorKind::InvalidData("isbn"))?;
        Ok(Self {
            id: entry.id.clone(),
            title: entry.title.clone(),
            authors,
            publish_year: entry.publish_year.map(i64::from),
            cover_url: entry.cover_url.clone(),
            isbn,
            cached_at: timestamp_nanos(cached_at)?,
        })
    }
}
impl TryFrom<CacheRow> for CacheRecord {
    type Error = Error;

    fn try_from(row: CacheRow) -> Result<Self> {
        let authors: Vec<String> = serde_json::from_str(&row.authors).or_raise(|| ErrorKind::InvalidData("authors"))?;
        let isbn: Option<Vec<String>> = row
            .isbn
            .as_deref()
            .map(serde_json::from_str)
            .transpose()
            .or_raise(|| ErrorKind::InvalidData("isbn"))?;
        let publish_year = row
            .publish_year
            .map(i32::try_from)
            .transpose()
            .or_raise(|| ErrorKind::InvalidData("publish_year"))?;
        let cached_at = UtcDateTime::from_unix_timestamp_nanos(i128::from(row.cached_at))
            .or_raise(|| ErrorKind::InvalidData("cached_at"))?;
        Ok(Self {
            entry: CatalogEntry {
                id: row.id,
                title: row.title,
                authors,
                publish_year,
                cover_url: row.cover_url,
                isbn: isbn.filter(|isbn| !isbn.is_empty()),
            },
            cached_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn at(timestamp: i64) -> UtcDateTime {
        UtcDateTime::from_unix_timestamp(timestamp).unwrap()
    }

    #[test]
    fn test_row_conversion_preserves_entry() {
        let entry = CatalogEntry::new("/works/OL1W", "Dune")
            .with_authors(["Frank Herbert"])
            .with_publish_year(1965)
            .with_isbn(["9780441013593"]);
        let row = CacheRow::new(&entry, at(1_700_000_000)).unwrap();
        assert_eq!(row.authors, r#"["Frank Herbert"]"#);
        let record = CacheRecord::try_from(row).unwrap();
        assert_eq!(record.entry, entry);
        assert_eq!(record.cached_at, at(1_700_000_000));
    }

    #[test]
    fn test_row_keeps_sub_second_timestamps() {
        let cached_at = UtcDateTime::from_unix_timestamp_nanos(1_700_000_000_150_359_945).unwrap();
        let row = CacheRow::new(&CatalogEntry::new("/works/OL1W", "Dune"), cached_at).unwrap();
        assert_eq!(row.cached_at, 1_700_000_000_150_359_945);
        assert_eq!(CacheRecord::try_from(row).unwrap().cached_at, cached_at);
    }

    #[test]
    fn test_corrupt_row_is_rejected() {
        let row = CacheRow {
            id: "/works/OL1W".to_string(),
            title: "Dune".to_string(),
            authors: "not json".to_string(),
            publish_year: None,
            cover_url: None,
            isbn: None,
            cached_at: 0,
        };
        let err = CacheRecord::try_from(row).unwrap_err();
        assert!(matches!(*err, ErrorKind::InvalidData("authors")));
    }

    #[rstest]
    #[case(Duration::days(29), true)]
    #[case(Duration::days(30), true)]
    #[case(Duration::days(30) + Duration::seconds(1), false)]
    #[case(Duration::days(365), false)]
    fn test_validity_window(#[case] age: Duration, #[case] valid: bool) {
        let now = at(1_800_000_000);
        let record = CacheRecord { entry: CatalogEntry::new("x", "y"), cached_at: now - age };
        assert_eq!(record.is_valid_at(now, Duration::days(30)), valid);
    }
}
