//! Library error types.
//!
//! The `Display` text of each kind is what a user gets to read in an error
//! notification, so keep it short and free of internals.

use crate::models::Status;
use derive_more::{Display, Error};

/// A library error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// No signed-in user; the caller should send the user to sign in.
    #[display("Please sign in to manage your library")]
    Unauthenticated,
    /// Another change to the same book and list hasn't resolved yet.
    #[display("This book is still being updated")]
    MutationInFlight,
    #[display("Book is not in your {} list", _0.label())]
    NotInList(#[error(not(source))] Status),
    #[display("Book already in your library")]
    AlreadyInList,
    #[display("Library entry not found")]
    NotFound,
    #[display("Rating must be between 1 and 5, got {_0}")]
    InvalidRating(#[error(not(source))] u8),
    #[display("You can only have {_0} favorite books")]
    FavoritesFull(#[error(not(source))] usize),
    /// The backing store rejected or failed the request.
    #[display("Failed to update list")]
    Store,
    #[display("invalid library data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::MutationInFlight | Self::Store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages() {
        assert_eq!(ErrorKind::NotInList(Status::Reading).to_string(), "Book is not in your Reading Now list");
        assert_eq!(ErrorKind::FavoritesFull(4).to_string(), "You can only have 4 favorite books");
        assert!(ErrorKind::Store.is_retryable());
        assert!(!ErrorKind::Unauthenticated.is_retryable());
    }
}
