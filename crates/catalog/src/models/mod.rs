mod cover;
mod entry;

pub use self::cover::CoverSize;
pub use self::entry::CatalogEntry;

/// Sentinel author name used when a work has no resolvable authors.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
