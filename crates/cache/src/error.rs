//! Cache error types.
//!
//! Most cache operations swallow their own failures (a broken cache only
//! ever means a slower lookup), so these mostly surface from [`Database`]
//! setup and the fallible internals that the public API logs and discards.
//!
//! [`Database`]: crate::Database

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error)]
pub enum ErrorKind {
    #[display("database error")]
    Database,
    #[display("database migration error")]
    Migration,
    #[display("cannot create cache directory: {}", _0.display())]
    Directory(#[error(not(source))] PathBuf),
    /// A stored row could not be turned back into an entry (or vice versa).
    #[display("invalid cache data: {_0}")]
    InvalidData(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Database)
    }
}
