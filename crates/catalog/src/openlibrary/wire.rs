//! Open Library response bodies and their translation into [`CatalogEntry`].

use crate::consts::YEAR_REGEX;
use crate::models::{CatalogEntry, CoverSize, UNKNOWN_AUTHOR};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub(crate) struct SearchResponse {
    #[serde(default)]
    pub(crate) docs: Vec<SearchDoc>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct SearchDoc {
    key: String,
    title: String,
    #[serde(default)]
    author_name: Option<Vec<String>>,
    #[serde(default)]
    first_publish_year: Option<i32>,
    #[serde(default)]
    cover_i: Option<i64>,
    #[serde(default)]
    isbn: Option<Vec<String>>,
}
impl SearchDoc {
    pub(crate) fn into_entry(self, covers_url: &str) -> CatalogEntry {
        CatalogEntry {
            id: self.key,
            title: self.title,
            authors: self.author_name.unwrap_or_default(),
            publish_year: self.first_publish_year,
            cover_url: self.cover_i.filter(|id| *id > 0).map(|id| CoverSize::M.url(covers_url, id)),
            isbn: self.isbn.filter(|isbn| !isbn.is_empty()),
        }
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct KeyRef {
    pub(crate) key: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct WorkAuthor {
    pub(crate) author: KeyRef,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Work {
    key: String,
    title: String,
    #[serde(default)]
    pub(crate) authors: Vec<WorkAuthor>,
    #[serde(default)]
    first_publish_date: Option<String>,
    #[serde(default)]
    covers: Vec<i64>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct EditionsResponse {
    #[serde(default)]
    pub(crate) entries: Vec<Edition>,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct Edition {
    #[serde(default)]
    covers: Vec<i64>,
    #[serde(default)]
    isbn: Option<Vec<String>>,
    #[serde(default)]
    publish_date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Author {
    pub(crate) name: String,
}

/// Open Library pads missing covers with `-1`.
fn first_cover(covers: &[i64]) -> Option<i64> {
    covers.iter().copied().find(|id| *id > 0)
}

/// Finds a four-digit year in a free-form date ("November 11, 2024", "2024-11-11", "Nov 2024").
pub(crate) fn extract_year(date: &str) -> Option<i32> {
    YEAR_REGEX.find(date).and_then(|m| m.as_str().parse().ok())
}

impl Work {
    /// Merges the work with its first edition and resolved author names.
    ///
    /// The work's own cover wins over the edition's; ISBNs only exist on
    /// editions; the edition's publish date wins over the work's.
    pub(crate) fn into_entry(self, edition: Option<Edition>, authors: Vec<String>, covers_url: &str) -> CatalogEntry {
        let edition = edition.unwrap_or_default();
        let cover = first_cover(&self.covers).or_else(|| first_cover(&edition.covers));
        let publish_year = edition
            .publish_date
            .as_deref()
            .and_then(extract_year)
            .or_else(|| self.first_publish_date.as_deref().and_then(extract_year));
        CatalogEntry {
            id: self.key,
            title: self.title,
            authors: if authors.is_empty() { vec![UNKNOWN_AUTHOR.to_string()] } else { authors },
            publish_year,
            cover_url: cover.map(|id| CoverSize::L.url(covers_url, id)),
            isbn: edition.isbn.filter(|isbn| !isbn.is_empty()),
        }
    }
}
