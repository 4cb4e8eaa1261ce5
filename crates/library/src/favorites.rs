use crate::error::{ErrorKind, Result};
use crate::models::{MAX_FAVORITES, Profile, UserId};
use crate::notify::Notifier;
use crate::session::Session;
use crate::store::ProfileHandle;
use tracing::instrument;

/// The ordered handful of books a user features on their profile.
pub struct Favorites {
    store: ProfileHandle,
    session: Session,
    notifier: Notifier,
}

impl Favorites {
    pub fn new(store: ProfileHandle, session: Session, notifier: Notifier) -> Self {
        Self { store, session, notifier }
    }

    /// The signed-in user's profile, created on first access.
    pub async fn profile(&self) -> Result<Profile> {
        let user = self.session.require_user()?;
        self.profile_of(user).await
    }

    /// Favorite catalog identifiers, in display order.
    pub async fn list(&self) -> Result<Vec<String>> {
        Ok(self.profile().await?.favorite_books)
    }

    /// Appends a book. Adding a book twice is a no-op.
    #[instrument(skip(self))]
    pub async fn add(&self, book_id: &str) -> Result<Vec<String>> {
        let user = self.session.require_user()?;
        let result = self.try_add(user, book_id).await;
        self.report(&result, "Added to favorites");
        result
    }

    #[instrument(skip(self))]
    pub async fn remove(&self, book_id: &str) -> Result<Vec<String>> {
        let user = self.session.require_user()?;
        let result = self.try_remove(user, book_id).await;
        self.report(&result, "Removed from favorites");
        result
    }

    /// Replaces the whole list, e.g. after the user dragged books around.
    pub async fn reorder(&self, book_ids: Vec<String>) -> Result<Vec<String>> {
        let user = self.session.require_user()?;
        if book_ids.len() > MAX_FAVORITES {
            exn::bail!(ErrorKind::FavoritesFull(MAX_FAVORITES));
        }
        // Make sure the profile exists before writing to it.
        self.profile_of(user).await?;
        Ok(self.store.set_favorites(user, &book_ids).await?.favorite_books)
    }

    async fn profile_of(&self, user: &UserId) -> Result<Profile> {
        match self.store.profile(user).await? {
            Some(profile) => Ok(profile),
            None => {
                tracing::debug!(%user, "Creating profile on first access");
                self.store.create_profile(user).await
            },
        }
    }

    async fn try_add(&self, user: &UserId, book_id: &str) -> Result<Vec<String>> {
        let mut favorites = self.profile_of(user).await?.favorite_books;
        if favorites.iter().any(|id| id == book_id) {
            return Ok(favorites);
        }
        if favorites.len() >= MAX_FAVORITES {
            exn::bail!(ErrorKind::FavoritesFull(MAX_FAVORITES));
        }
        favorites.push(book_id.to_string());
        Ok(self.store.set_favorites(user, &favorites).await?.favorite_books)
    }

    async fn try_remove(&self, user: &UserId, book_id: &str) -> Result<Vec<String>> {
        let mut favorites = self.profile_of(user).await?.favorite_books;
        favorites.retain(|id| id != book_id);
        Ok(self.store.set_favorites(user, &favorites).await?.favorite_books)
    }

    fn report<T>(&self, result: &Result<T>, success: &str) {
        match result {
            Ok(_) => self.notifier.success(success),
            Err(e) => {
                let kind: &ErrorKind = e;
                self.notifier.error(kind.to_string());
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Level;
    use crate::store::{MemoryStore, Operation};
    use std::sync::Arc;

    fn favorites(store: Arc<MemoryStore>) -> (Favorites, tokio::sync::mpsc::UnboundedReceiver<crate::Notification>) {
        let (notifier, rx) = Notifier::channel();
        (Favorites::new(store, Session::signed_in(UserId::new("u1")), notifier), rx)
    }

    #[tokio::test]
    async fn test_profile_is_created_on_first_access() {
        let store = Arc::new(MemoryStore::default());
        let (favorites, _rx) = favorites(store);
        assert!(favorites.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_add_is_idempotent_and_bounded() {
        let store = Arc::new(MemoryStore::default());
        let (favorites, mut rx) = favorites(store);
        for id in ["a", "b", "c", "d"] {
            favorites.add(id).await.unwrap();
        }
        assert_eq!(favorites.add("b").await.unwrap(), ["a", "b", "c", "d"]);

        let err = favorites.add("e").await.unwrap_err();
        assert_eq!(*err, ErrorKind::FavoritesFull(4));
        let mut last = None;
        while let Ok(notification) = rx.try_recv() {
            last = Some(notification);
        }
        let last = last.unwrap();
        assert_eq!(last.level, Level::Error);
        assert_eq!(last.message, "You can only have 4 favorite books");
    }

    #[tokio::test]
    async fn test_remove_and_reorder() {
        let store = Arc::new(MemoryStore::default());
        let (favorites, _rx) = favorites(store);
        for id in ["a", "b", "c"] {
            favorites.add(id).await.unwrap();
        }
        assert_eq!(favorites.remove("b").await.unwrap(), ["a", "c"]);
        assert_eq!(favorites.reorder(vec!["c".into(), "a".into()]).await.unwrap(), ["c", "a"]);
        let five = ["1", "2", "3", "4", "5"].map(String::from).to_vec();
        assert_eq!(*favorites.reorder(five).await.unwrap_err(), ErrorKind::FavoritesFull(4));
        assert_eq!(favorites.list().await.unwrap(), ["c", "a"]);
    }

    #[tokio::test]
    async fn test_requires_sign_in() {
        let store = Arc::new(MemoryStore::default());
        let (notifier, _rx) = Notifier::channel();
        let favorites = Favorites::new(store.clone(), Session::anonymous(), notifier);
        assert_eq!(*favorites.add("a").await.unwrap_err(), ErrorKind::Unauthenticated);
        assert_eq!(store.calls(Operation::Profile).await, 0);
    }

    #[tokio::test]
    async fn test_store_failure_notifies_once() {
        let store = Arc::new(MemoryStore::default());
        let (favorites, mut rx) = favorites(store.clone());
        store.fail_next(Operation::Profile).await;
        assert_eq!(*favorites.add("a").await.unwrap_err(), ErrorKind::Store);
        let notifications: Vec<_> = std::iter::from_fn(|| rx.try_recv().ok()).collect();
        assert_eq!(notifications.len(), 1);
        assert_eq!(notifications[0].level, Level::Error);
        assert!(favorites.list().await.unwrap().is_empty());
    }
}
