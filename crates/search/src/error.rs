use derive_more::{Display, Error};

/// A search error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for search operations.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The catalog request failed; carries the catalog's own category so the
    /// user sees e.g. the rate-limit message rather than a generic one.
    #[display("{_0}")]
    Catalog(#[error(not(source))] tome_catalog::error::ErrorKind),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Catalog(kind) => kind.is_retryable(),
        }
    }
}
