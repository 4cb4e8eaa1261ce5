//! Persistence seam for library entries and profiles.
//!
//! The real store is a hosted backend with per-row ownership; it is only
//! ever reached through these traits. Every call is scoped to a user, and a
//! row owned by someone else behaves exactly like a missing row.

#[cfg(any(test, feature = "memory"))]
mod memory;

#[cfg(any(test, feature = "memory"))]
pub use self::memory::{MemoryStore, Operation};
use crate::error::Result;
use crate::models::{EntryUpdate, LibraryEntry, NewEntry, Profile, Status, UserId};
use async_trait::async_trait;
use std::sync::Arc;

/// Record-level access to users' library entries.
#[async_trait]
pub trait LibraryStore: Send + Sync {
    /// Short identifier for log output.
    fn name(&self) -> &str;

    /// Persists a new entry and returns it with its server-assigned id.
    ///
    /// Fails with [`AlreadyInList`](crate::error::ErrorKind::AlreadyInList)
    /// if the user already has the book under that status.
    async fn insert(&self, entry: NewEntry) -> Result<LibraryEntry>;

    async fn update(&self, user: &UserId, id: &str, update: &EntryUpdate) -> Result<LibraryEntry>;

    async fn delete(&self, user: &UserId, id: &str) -> Result<()>;

    /// Every entry the user has for one book, across all statuses.
    async fn entries_for_book(&self, user: &UserId, book_id: &str) -> Result<Vec<LibraryEntry>>;

    /// The user's entries, newest first, optionally limited to one status.
    async fn list(&self, user: &UserId, status: Option<Status>) -> Result<Vec<LibraryEntry>>;
}

/// Access to user profiles.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// `None` when the user has no profile yet.
    async fn profile(&self, user: &UserId) -> Result<Option<Profile>>;

    async fn create_profile(&self, user: &UserId) -> Result<Profile>;

    async fn set_favorites(&self, user: &UserId, favorites: &[String]) -> Result<Profile>;
}

pub type StoreHandle = Arc<dyn LibraryStore + Send + Sync>;
pub type ProfileHandle = Arc<dyn ProfileStore + Send + Sync>;
