use serde::{Deserialize, Serialize};

/// Normalized book metadata, as returned by the catalog and held in caches.
///
/// The `id` is the opaque catalog key (for Open Library, a work key such as
/// `/works/OL45804W`). Everything else is best-effort: the catalog is
/// inconsistent about publish years, covers and ISBNs.
///
/// Two historical shapes are accepted on ingress (`coverUrl`/`cover_url`,
/// `publishYear`/`publish_year`, and `authors`/a single `author`), but only
/// the canonical snake_case shape is ever produced.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "LooseEntry")]
pub struct CatalogEntry {
    pub id: String,
    pub title: String,
    /// Ordered author names; may be empty.
    pub authors: Vec<String>,
    pub publish_year: Option<i32>,
    pub cover_url: Option<String>,
    pub isbn: Option<Vec<String>>,
}
impl CatalogEntry {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            authors: Vec::new(),
            publish_year: None,
            cover_url: None,
            isbn: None,
        }
    }

    pub fn with_authors<S: Into<String>>(mut self, authors: impl IntoIterator<Item = S>) -> Self {
        self.authors = authors.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_publish_year(mut self, year: impl Into<Option<i32>>) -> Self {
        self.publish_year = year.into();
        self
    }

    pub fn with_cover_url(mut self, url: impl Into<String>) -> Self {
        self.cover_url = Some(url.into());
        self
    }

    pub fn with_isbn<S: Into<String>>(mut self, isbn: impl IntoIterator<Item = S>) -> Self {
        self.isbn = Some(isbn.into_iter().map(Into::into).collect());
        self
    }

    /// The bare catalog identifier, without the key prefix (`/works/OL45804W` → `OL45804W`).
    pub fn olid(&self) -> &str {
        self.id.rsplit('/').find(|segment| !segment.is_empty()).unwrap_or(&self.id)
    }

    /// Author names joined for display, or the unknown-author sentinel.
    pub fn display_authors(&self) -> String {
        if self.authors.is_empty() {
            super::UNKNOWN_AUTHOR.to_string()
        } else {
            self.authors.join(", ")
        }
    }
}
impl AsRef<CatalogEntry> for CatalogEntry {
    fn as_ref(&self) -> &CatalogEntry {
        self
    }
}

/// Every shape a book record has been persisted or passed around in.
#[derive(Deserialize)]
struct LooseEntry {
    id: String,
    title: String,
    #[serde(default)]
    authors: Option<Vec<String>>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default, rename = "publishYear", alias = "publish_year")]
    publish_year: Option<i32>,
    #[serde(default, rename = "coverUrl")]
    cover_url_camel: Option<String>,
    #[serde(default)]
    cover_url: Option<String>,
    #[serde(default)]
    isbn: Option<Vec<String>>,
}
impl From<LooseEntry> for CatalogEntry {
    fn from(loose: LooseEntry) -> Self {
        let authors = match (loose.authors, loose.author) {
            (Some(authors), _) if !authors.is_empty() => authors,
            (_, Some(author)) if !author.trim().is_empty() => vec![author],
            _ => Vec::new(),
        };
        let cover_url = loose.cover_url_camel.or(loose.cover_url).filter(|url| !url.trim().is_empty());
        Self {
            id: loose.id,
            title: loose.title,
            authors,
            publish_year: loose.publish_year,
            cover_url,
            isbn: loose.isbn.filter(|isbn| !isbn.is_empty()),
        }
    }
}
