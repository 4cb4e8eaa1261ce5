//! In-memory store for tests and offline use.

use super::{LibraryStore, ProfileStore};
use crate::error::{ErrorKind, Result};
use crate::models::{EntryId, EntryUpdate, LibraryEntry, NewEntry, Profile, Status, UserId};
use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use time::UtcDateTime;
use tokio::sync::RwLock;

/// Store calls that can be counted and made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Insert,
    Update,
    Delete,
    Query,
    Profile,
}

#[derive(Default)]
struct Inner {
    entries: Vec<LibraryEntry>,
    profiles: HashMap<UserId, Profile>,
    next_id: u64,
    failures: HashSet<Operation>,
    calls: HashMap<Operation, usize>,
}
impl Inner {
    /// Counts the call and consumes an injected failure, if any.
    fn begin(&mut self, op: Operation) -> Result<()> {
        *self.calls.entry(op).or_default() += 1;
        if self.failures.remove(&op) {
            exn::bail!(ErrorKind::Store);
        }
        Ok(())
    }

    fn owned_mut(&mut self, user: &UserId, id: &str) -> Result<&mut LibraryEntry> {
        let Some(entry) = self
            .entries
            .iter_mut()
            .find(|entry| &entry.user_id == user && entry.id.persisted() == Some(id))
        else {
            exn::bail!(ErrorKind::NotFound);
        };
        Ok(entry)
    }
}

/// Library and profile store held in memory.
///
/// Enforces the same rules as the hosted backend: one entry per user, book
/// and status, and rows only visible to their owner. Failures can be
/// injected per [`Operation`] with [`fail_next`](Self::fail_next).
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Seeds the store with existing entries, assigning ids to pending ones.
    pub fn with_entries(entries: impl IntoIterator<Item = LibraryEntry>) -> Self {
        let mut inner = Inner::default();
        for mut entry in entries {
            if entry.id.is_pending() {
                inner.next_id += 1;
                entry.id = EntryId::Persisted(format!("entry-{}", inner.next_id));
            }
            inner.entries.push(entry);
        }
        Self { inner: RwLock::new(inner) }
    }

    /// Makes the next call of the given kind fail with a store error.
    pub async fn fail_next(&self, op: Operation) {
        self.inner.write().await.failures.insert(op);
    }

    /// Number of calls of the given kind received so far.
    pub async fn calls(&self, op: Operation) -> usize {
        self.inner.read().await.calls.get(&op).copied().unwrap_or_default()
    }

    /// Every stored entry, in insertion order.
    pub async fn snapshot(&self) -> Vec<LibraryEntry> {
        self.inner.read().await.entries.clone()
    }
}

#[async_trait]
impl LibraryStore for MemoryStore {
    fn name(&self) -> &str {
        "memory"
    }

    async fn insert(&self, new: NewEntry) -> Result<LibraryEntry> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Insert)?;
        let exists = inner.entries.iter().any(|entry| {
            entry.user_id == new.user_id && entry.book.id == new.book.id && entry.status == new.status
        });
        if exists {
            exn::bail!(ErrorKind::AlreadyInList);
        }
        inner.next_id += 1;
        let id = EntryId::Persisted(format!("entry-{}", inner.next_id));
        let entry = LibraryEntry::new(id, new.user_id, new.book, new.status, UtcDateTime::now());
        inner.entries.push(entry.clone());
        Ok(entry)
    }

    async fn update(&self, user: &UserId, id: &str, update: &EntryUpdate) -> Result<LibraryEntry> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Update)?;
        let current = inner.owned_mut(user, id)?.clone();
        if let Some(status) = update.status.filter(|status| *status != current.status) {
            let taken = inner.entries.iter().any(|entry| {
                &entry.user_id == user && entry.book.id == current.book.id && entry.status == status
            });
            if taken {
                exn::bail!(ErrorKind::AlreadyInList);
            }
        }
        let entry = inner.owned_mut(user, id)?;
        update.apply_to(entry, UtcDateTime::now());
        Ok(entry.clone())
    }

    async fn delete(&self, user: &UserId, id: &str) -> Result<()> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Delete)?;
        inner.owned_mut(user, id)?;
        inner.entries.retain(|entry| !(&entry.user_id == user && entry.id.persisted() == Some(id)));
        Ok(())
    }

    async fn entries_for_book(&self, user: &UserId, book_id: &str) -> Result<Vec<LibraryEntry>> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Query)?;
        Ok(inner.entries.iter().filter(|e| &e.user_id == user && e.book.id == book_id).cloned().collect())
    }

    async fn list(&self, user: &UserId, status: Option<Status>) -> Result<Vec<LibraryEntry>> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Query)?;
        let mut entries: Vec<_> = inner
            .entries
            .iter()
            .filter(|e| &e.user_id == user && status.is_none_or(|status| e.status == status))
            .cloned()
            .collect();
        // Ties on the timestamp keep the latest insert first.
        entries.reverse();
        entries.sort_by(|a, b| b.date_added.cmp(&a.date_added));
        Ok(entries)
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn profile(&self, user: &UserId) -> Result<Option<Profile>> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Profile)?;
        Ok(inner.profiles.get(user).cloned())
    }

    async fn create_profile(&self, user: &UserId) -> Result<Profile> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Profile)?;
        let profile = inner.profiles.entry(user.clone()).or_insert_with(|| Profile::new(user.clone()));
        Ok(profile.clone())
    }

    async fn set_favorites(&self, user: &UserId, favorites: &[String]) -> Result<Profile> {
        let mut inner = self.inner.write().await;
        inner.begin(Operation::Profile)?;
        let Some(profile) = inner.profiles.get_mut(user) else {
            exn::bail!(ErrorKind::NotFound);
        };
        profile.favorite_books = favorites.to_vec();
        Ok(profile.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tome_catalog::models::CatalogEntry;

    fn new_entry(user: &str, book: &str, status: Status) -> NewEntry {
        NewEntry { user_id: UserId::new(user), book: CatalogEntry::new(book, "Title"), status }
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_rejects_duplicates() {
        let store = MemoryStore::default();
        let first = store.insert(new_entry("u1", "/works/OL1W", Status::Read)).await.unwrap();
        assert_eq!(first.id, EntryId::Persisted("entry-1".into()));
        assert_eq!(first.read_count, 1);

        let err = store.insert(new_entry("u1", "/works/OL1W", Status::Read)).await.unwrap_err();
        assert_eq!(*err, ErrorKind::AlreadyInList);
        // Same book, different status or different user, is fine.
        store.insert(new_entry("u1", "/works/OL1W", Status::Reading)).await.unwrap();
        store.insert(new_entry("u2", "/works/OL1W", Status::Read)).await.unwrap();
    }

    #[tokio::test]
    async fn test_rows_are_only_visible_to_their_owner() {
        let store = MemoryStore::default();
        let entry = store.insert(new_entry("u1", "/works/OL1W", Status::Read)).await.unwrap();
        let id = entry.id.persisted().unwrap();
        let stranger = UserId::new("u2");
        let err = store.delete(&stranger, id).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound);
        assert!(store.entries_for_book(&stranger, "/works/OL1W").await.unwrap().is_empty());
        assert_eq!(store.list(&UserId::new("u1"), None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_injected_failure_applies_once() {
        let store = MemoryStore::default();
        store.fail_next(Operation::Insert).await;
        let err = store.insert(new_entry("u1", "/works/OL1W", Status::Read)).await.unwrap_err();
        assert_eq!(*err, ErrorKind::Store);
        store.insert(new_entry("u1", "/works/OL1W", Status::Read)).await.unwrap();
        assert_eq!(store.calls(Operation::Insert).await, 2);
    }

    #[tokio::test]
    async fn test_list_is_newest_first() {
        let store = MemoryStore::default();
        for book in ["/works/OL1W", "/works/OL2W", "/works/OL3W"] {
            store.insert(new_entry("u1", book, Status::WantToRead)).await.unwrap();
        }
        store.insert(new_entry("u1", "/works/OL4W", Status::Read)).await.unwrap();
        let user = UserId::new("u1");
        let books: Vec<_> = store
            .list(&user, Some(Status::WantToRead))
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.book.id)
            .collect();
        assert_eq!(books, ["/works/OL3W", "/works/OL2W", "/works/OL1W"]);
    }

    #[tokio::test]
    async fn test_status_change_cannot_collide() {
        let store = MemoryStore::default();
        let reading = store.insert(new_entry("u1", "/works/OL1W", Status::Reading)).await.unwrap();
        store.insert(new_entry("u1", "/works/OL1W", Status::Read)).await.unwrap();
        let user = UserId::new("u1");
        let update = EntryUpdate::default().status(Status::Read);
        let err = store.update(&user, reading.id.persisted().unwrap(), &update).await.unwrap_err();
        assert_eq!(*err, ErrorKind::AlreadyInList);
    }

    #[tokio::test]
    async fn test_profiles() {
        let store = MemoryStore::default();
        let user = UserId::new("u1");
        assert_eq!(store.profile(&user).await.unwrap(), None);
        let err = store.set_favorites(&user, &["/works/OL1W".to_string()]).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound);
        store.create_profile(&user).await.unwrap();
        let profile = store.set_favorites(&user, &["/works/OL1W".to_string()]).await.unwrap();
        assert_eq!(profile.favorite_books, ["/works/OL1W"]);
    }
}
