//! Derivative-work classification.
//!
//! Catalog searches for popular books are flooded with summaries, study guides,
//! box sets and companion books. These are partitioned away from the original
//! works so that results can hide them by default, using two heuristics:
//!
//! 1. Entries without real author attribution (no authors, or only
//!    "unknown"/"anonymous"/blank names) are derivative.
//! 2. Entries whose lowercased title matches any pattern of
//!    [`DERIVATIVE_TITLES`](crate::consts::DERIVATIVE_TITLES) are derivative.
//!
//! Titles that coincidentally contain a pattern ("The Art Book Thief") are
//! misclassified. That's the price of a heuristic.

use crate::consts::{AUTHOR_SENTINELS, DERIVATIVE_TITLES};
use crate::models::CatalogEntry;

/// Search results split into original works and derivative works, each half
/// keeping the relative order of the input.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Partition {
    pub original: Vec<CatalogEntry>,
    pub derivative: Vec<CatalogEntry>,
}
impl Partition {
    pub fn len(&self) -> usize {
        self.original.len() + self.derivative.len()
    }

    pub fn is_empty(&self) -> bool {
        self.original.is_empty() && self.derivative.is_empty()
    }
}

fn is_unattributed(authors: &[String]) -> bool {
    authors.iter().all(|author| {
        let author = author.trim().to_lowercase();
        author.is_empty() || AUTHOR_SENTINELS.contains(&author.as_str())
    })
}

/// Returns `true` if the entry looks like a summary, guide or companion
/// product rather than an original work.
pub fn is_derivative(entry: &CatalogEntry) -> bool {
    // `all()` on an empty author list is vacuously true.
    is_unattributed(&entry.authors) || DERIVATIVE_TITLES.is_match(&entry.title.to_lowercase())
}

/// Stable partition of `entries` into original and derivative works.
pub fn classify(entries: impl IntoIterator<Item = CatalogEntry>) -> Partition {
    let (derivative, original): (Vec<_>, Vec<_>) = entries.into_iter().partition(is_derivative);
    Partition { original, derivative }
}
