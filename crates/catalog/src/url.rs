//! Human-readable book URLs.
//!
//! Book pages live at `/book/{author-slug}/{title-slug}-{OLID}`. Only the
//! trailing identifier matters when resolving a URL, the slugs are decoration.

use crate::consts::{OLID_REGEX, SLUG_STRIPPED};
use crate::models::CatalogEntry;

/// Lowercase, dash-separated slug.
pub fn slugify(text: impl AsRef<str>) -> String {
    let stripped: String = text.as_ref().chars().filter(|c| !SLUG_STRIPPED.contains(c)).collect();
    rslug::slugify!(&stripped)
}

/// Builds the canonical page URL of a book from its first author and title.
pub fn book_url(entry: &CatalogEntry) -> String {
    let author = entry.authors.first().map(String::as_str).filter(|a| !a.is_empty()).unwrap_or("unknown");
    format!("/book/{}/{}-{}", slugify(author), slugify(&entry.title), entry.olid())
}

/// Recovers the catalog identifier from the last path segment of a book URL.
///
/// Prefers the right-most dash-separated part that looks like a work or
/// edition identifier, falling back to the last part.
pub fn id_from_slug(slug: &str) -> &str {
    let mut parts = slug.rsplit('-');
    let last = parts.next().unwrap_or(slug);
    if OLID_REGEX.is_match(last) {
        return last;
    }
    parts.find(|part| OLID_REGEX.is_match(part)).unwrap_or(last)
}

/// Expands a bare identifier into a catalog key: works end in `W`, editions in
/// `M`. Keys that are already expanded are returned unchanged.
pub fn id_to_key(id: &str) -> String {
    if id.starts_with("/works/") || id.starts_with("/books/") {
        return id.to_string();
    }
    if id.ends_with('M') {
        format!("/books/{id}")
    } else {
        format!("/works/{id}")
    }
}
