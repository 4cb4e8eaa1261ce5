use super::{Rating, Status};
use derive_more::Display;
use serde::{Deserialize, Serialize};
use time::{Date, UtcDateTime};
use tome_catalog::models::CatalogEntry;

/// Identity supplied by the authentication provider.
#[derive(Debug, Display, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);
impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// A locally generated placeholder until the store assigns the real
/// identifier.
#[derive(Debug, Display, Clone, PartialEq, Eq, Hash)]
pub enum EntryId {
    #[display("temp-{_0}")]
    Pending(u64),
    #[display("{_0}")]
    Persisted(String),
}
impl EntryId {
    pub fn persisted(&self) -> Option<&str> {
        match self {
            Self::Persisted(id) => Some(id),
            Self::Pending(_) => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending(_))
    }
}

/// Clamps a reading progress percentage to `0..=100`.
pub fn clamp_progress(progress: i32) -> u8 {
    // Lossless: the value is in range after clamping.
    progress.clamp(0, 100) as u8
}

/// One user's record of one book in one list.
///
/// A book may be in several lists at once, each with its own entry. Catalog
/// metadata is copied in when the book is added and not refreshed after.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryEntry {
    pub id: EntryId,
    pub user_id: UserId,
    pub status: Status,
    pub book: CatalogEntry,
    pub rating: Option<Rating>,
    pub notes: Option<String>,
    /// Percentage, always within `0..=100`.
    pub progress: Option<u8>,
    pub date_finished: Option<Date>,
    pub is_review_public: bool,
    /// Starts at 1 and only ever grows.
    pub read_count: u32,
    pub date_added: UtcDateTime,
    pub updated_at: UtcDateTime,
}
impl LibraryEntry {
    /// A fresh entry as it looks right after being added to a list.
    pub fn new(id: EntryId, user_id: UserId, book: CatalogEntry, status: Status, now: UtcDateTime) -> Self {
        Self {
            id,
            user_id,
            status,
            book,
            rating: None,
            notes: None,
            progress: None,
            date_finished: None,
            is_review_public: false,
            read_count: 1,
            date_added: now,
            updated_at: now,
        }
    }

    pub fn book_id(&self) -> &str {
        &self.book.id
    }
}

/// Request to add a book to one of a user's lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEntry {
    pub user_id: UserId,
    pub book: CatalogEntry,
    pub status: Status,
}

/// Partial update of a [`LibraryEntry`]; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryUpdate {
    pub status: Option<Status>,
    pub rating: Option<Rating>,
    pub notes: Option<String>,
    pub progress: Option<u8>,
    pub date_finished: Option<Date>,
    pub is_review_public: Option<bool>,
    pub read_count: Option<u32>,
}
impl EntryUpdate {
    pub fn status(mut self, status: Status) -> Self {
        self.status = Some(status);
        self
    }

    pub fn rating(mut self, rating: Rating) -> Self {
        self.rating = Some(rating);
        self
    }

    /// Trimmed; blank notes leave the existing notes alone.
    pub fn notes(mut self, notes: impl AsRef<str>) -> Self {
        let notes = notes.as_ref().trim();
        self.notes = (!notes.is_empty()).then(|| notes.to_string());
        self
    }

    pub fn progress(mut self, progress: i32) -> Self {
        self.progress = Some(clamp_progress(progress));
        self
    }

    pub fn date_finished(mut self, date: Date) -> Self {
        self.date_finished = Some(date);
        self
    }

    pub fn review_public(mut self, public: bool) -> Self {
        self.is_review_public = Some(public);
        self
    }

    pub fn read_count(mut self, count: u32) -> Self {
        self.read_count = Some(count);
        self
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Applies the update in place. A lower read count than the current one
    /// is ignored.
    pub fn apply_to(&self, entry: &mut LibraryEntry, now: UtcDateTime) {
        if let Some(status) = self.status {
            entry.status = status;
        }
        if let Some(rating) = self.rating {
            entry.rating = Some(rating);
        }
        if let Some(notes) = &self.notes {
            entry.notes = Some(notes.clone());
        }
        if let Some(progress) = self.progress {
            entry.progress = Some(progress.min(100));
        }
        if let Some(date) = self.date_finished {
            entry.date_finished = Some(date);
        }
        if let Some(public) = self.is_review_public {
            entry.is_review_public = public;
        }
        if let Some(count) = self.read_count {
            entry.read_count = entry.read_count.max(count);
        }
        entry.updated_at = now;
    }
}
