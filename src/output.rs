//! Plain-text rendering of catalog entries for the terminal.

use std::fmt::Write;
use tome_catalog::models::CatalogEntry;
use tome_catalog::url::{book_url, id_from_slug, id_to_key};

/// One-line summary: `Title (Year) by Authors  /book/...`.
pub(crate) fn summary(entry: &CatalogEntry) -> String {
    let mut line = entry.title.clone();
    if let Some(year) = entry.publish_year {
        let _ = write!(line, " ({year})");
    }
    let _ = write!(line, " by {}  {}", entry.display_authors(), book_url(entry));
    line
}

pub(crate) fn details(entry: &CatalogEntry) -> String {
    let mut out = format!("{}\n", entry.title);
    let _ = writeln!(out, "  Authors:   {}", entry.display_authors());
    if let Some(year) = entry.publish_year {
        let _ = writeln!(out, "  Published: {year}");
    }
    if let Some(isbn) = entry.isbn.as_deref().filter(|isbn| !isbn.is_empty()) {
        let _ = writeln!(out, "  ISBN:      {}", isbn.join(", "));
    }
    if let Some(cover) = &entry.cover_url {
        let _ = writeln!(out, "  Cover:     {cover}");
    }
    let _ = writeln!(out, "  Key:       {}", entry.id);
    let _ = write!(out, "  Page:      {}", book_url(entry));
    out
}

/// Accepts a bare identifier, a catalog key or a book page URL, and returns
/// the catalog key it refers to.
pub(crate) fn resolve_key(input: &str) -> String {
    let input = input.trim().trim_end_matches('/');
    if input.starts_with("/works/") || input.starts_with("/books/") {
        return input.to_string();
    }
    let slug = input.rsplit('/').next().unwrap_or(input);
    id_to_key(id_from_slug(slug))
}
