//! Catalog Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A catalog error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for catalog operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The HTTP client could not be constructed (TLS backend, invalid user agent).
    #[display("failed to initialize catalog client")]
    Client,
    /// The catalog answered `429 Too Many Requests`. Back off before searching again.
    #[display("Too many requests. Please wait a moment.")]
    RateLimited,
    /// Any other search failure (transport error or non-2xx status).
    #[display("Unable to search. Please try again.")]
    SearchFailed,
    /// Fetching the details of a single work failed for a reason other than
    /// the work not existing.
    #[display("Failed to fetch book details")]
    DetailsFailed,
    /// The catalog responded, but the body could not be understood.
    #[display("invalid catalog response: {_0}")]
    InvalidResponse(#[error(not(source))] &'static str),
    /// The identifier cannot be turned into a catalog key.
    #[display("invalid catalog identifier: {_0}")]
    InvalidId(#[error(not(source))] String),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::RateLimited | Self::SearchFailed | Self::DetailsFailed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_message_differs_from_generic_failure() {
        assert_ne!(ErrorKind::RateLimited.to_string(), ErrorKind::SearchFailed.to_string());
        assert_eq!(ErrorKind::RateLimited.to_string(), "Too many requests. Please wait a moment.");
    }

    #[test]
    fn test_error_kind_retryable() {
        assert!(ErrorKind::RateLimited.is_retryable());
        assert!(!ErrorKind::InvalidResponse("docs").is_retryable());
        assert!(!ErrorKind::InvalidId("".to_string()).is_retryable());
    }
}
