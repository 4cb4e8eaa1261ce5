//! A user's book lists and profile favorites.
//!
//! Entries live in an external store reached through [`LibraryStore`]. The
//! [`Reconciler`] keeps a local view of one user's lists that changes
//! immediately on user action and converges on the store's answer, rolling
//! back and publishing a [`Notification`] when the store says no.

pub mod error;
mod favorites;
pub mod models;
mod mutation;
mod notify;
mod reconciler;
mod session;
pub mod store;

pub use crate::favorites::Favorites;
pub use crate::mutation::Membership;
pub use crate::notify::{Level, Notification, Notifier};
pub use crate::reconciler::Reconciler;
pub use crate::session::Session;
pub use crate::store::{LibraryStore, ProfileHandle, ProfileStore, StoreHandle};
