//! [Open Library](https://openlibrary.org) catalog client.

mod wire;

use self::wire::{Author, Edition, EditionsResponse, SearchResponse, Work};
use crate::catalog::{Catalog, SearchField};
use crate::error::{ErrorKind, Result};
use crate::models::CatalogEntry;
use crate::url::id_to_key;
use async_trait::async_trait;
use exn::ResultExt;
use reqwest::{Client, StatusCode};
use tracing::instrument;

pub const DEFAULT_BASE_URL: &str = "https://openlibrary.org";
pub const DEFAULT_COVERS_URL: &str = "https://covers.openlibrary.org";
pub const DEFAULT_USER_AGENT: &str = concat!("tome/", env!("CARGO_PKG_VERSION"));
pub const DEFAULT_LIMIT: u32 = 20;

/// Translates a search response status into the user-facing failure category.
fn check_search_status(status: StatusCode) -> Result<()> {
    match status {
        status if status.is_success() => Ok(()),
        StatusCode::TOO_MANY_REQUESTS => exn::bail!(ErrorKind::RateLimited),
        _ => exn::bail!(ErrorKind::SearchFailed),
    }
}

/// Builder for [`OpenLibrary`]; every setting has a sensible default.
#[derive(Debug, Clone)]
pub struct OpenLibraryBuilder {
    base_url: String,
    covers_url: String,
    user_agent: String,
    limit: u32,
}
impl Default for OpenLibraryBuilder {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            covers_url: DEFAULT_COVERS_URL.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            limit: DEFAULT_LIMIT,
        }
    }
}
impl OpenLibraryBuilder {
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn covers_url(mut self, url: impl Into<String>) -> Self {
        self.covers_url = url.into();
        self
    }

    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Maximum number of search results per query.
    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn build(self) -> Result<OpenLibrary> {
        let client = Client::builder().user_agent(self.user_agent).build().or_raise(|| ErrorKind::Client)?;
        Ok(OpenLibrary {
            client,
            base_url: self.base_url.trim_end_matches('/').to_string(),
            covers_url: self.covers_url.trim_end_matches('/').to_string(),
            limit: self.limit,
        })
    }
}

/// Open Library search and works API client.
#[derive(Debug, Clone)]
pub struct OpenLibrary {
    client: Client,
    base_url: String,
    covers_url: String,
    limit: u32,
}
impl OpenLibrary {
    pub fn builder() -> OpenLibraryBuilder {
        OpenLibraryBuilder::default()
    }

    /// First edition of a work, for the ISBNs and publish date that works
    /// don't carry. Failure is not an error; the work is still usable.
    async fn first_edition(&self, key: &str) -> Option<Edition> {
        let url = format!("{}{}/editions.json", self.base_url, key);
        let result = async {
            let response = self.client.get(url).query(&[("limit", "1")]).send().await?.error_for_status()?;
            response.json::<EditionsResponse>().await
        }
        .await;
        match result {
            Ok(editions) => editions.entries.into_iter().next(),
            Err(e) => {
                tracing::debug!(key, error = %e, "Continuing without edition data");
                None
            },
        }
    }

    async fn author_name(&self, key: &str) -> Option<String> {
        let url = format!("{}{}.json", self.base_url, key);
        let result = async {
            let response = self.client.get(url).send().await?.error_for_status()?;
            response.json::<Author>().await
        }
        .await;
        match result {
            Ok(author) => Some(author.name).filter(|name| !name.trim().is_empty()),
            Err(e) => {
                tracing::debug!(key, error = %e, "Skipping unresolvable author");
                None
            },
        }
    }

    /// Resolves all author keys of a work concurrently, keeping their order.
    async fn author_names(&self, work: &Work) -> Vec<String> {
        let lookups = work.authors.iter().map(|author| self.author_name(&author.author.key));
        futures::future::join_all(lookups).await.into_iter().flatten().collect()
    }
}

#[async_trait]
impl Catalog for OpenLibrary {
    fn name(&self) -> &str {
        "openlibrary"
    }

    #[instrument(skip(self), fields(limit = self.limit))]
    async fn search(&self, field: SearchField, query: &str) -> Result<Vec<CatalogEntry>> {
        let query = query.trim();
        if query.is_empty() {
            return Ok(Vec::new());
        }
        let limit = self.limit.to_string();
        let response = self
            .client
            .get(format!("{}/search.json", self.base_url))
            .query(&[(field.param(), query), ("limit", limit.as_str())])
            .send()
            .await
            .or_raise(|| ErrorKind::SearchFailed)?;
        check_search_status(response.status())?;
        let body: SearchResponse = response.json().await.or_raise(|| ErrorKind::InvalidResponse("search"))?;
        tracing::debug!(results = body.docs.len(), "Catalog search complete");
        Ok(body.docs.into_iter().map(|doc| doc.into_entry(&self.covers_url)).collect())
    }

    #[instrument(skip(self))]
    async fn details(&self, id: &str) -> Result<Option<CatalogEntry>> {
        let id = id.trim();
        if id.is_empty() {
            exn::bail!(ErrorKind::InvalidId(id.to_string()));
        }
        let key = id_to_key(id);
        let response = self
            .client
            .get(format!("{}{}.json", self.base_url, key))
            .send()
            .await
            .or_raise(|| ErrorKind::DetailsFailed)?;
        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            status if !status.is_success() => exn::bail!(ErrorKind::DetailsFailed),
            _ => {},
        }
        let work: Work = response.json().await.or_raise(|| ErrorKind::InvalidResponse("work"))?;
        let (edition, authors) = futures::join!(self.first_edition(&key), self.author_names(&work));
        Ok(Some(work.into_entry(edition, authors, &self.covers_url)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    type Route = (&'static str, u16, &'static str);

    /// Answers each request path with a canned status and JSON body; any
    /// other path gets a 404. Returns the base URL.
    async fn serve(routes: Vec<Route>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                let routes = routes.clone();
                tokio::spawn(async move {
                    let mut buf = vec![0u8; 8192];
                    let mut read = 0;
                    while read < buf.len() {
                        let n = socket.read(&mut buf[read..]).await.unwrap_or(0);
                        read += n;
                        if n == 0 || buf[..read].windows(4).any(|window| window == b"\r\n\r\n") {
                            break;
                        }
                    }
                    let request = String::from_utf8_lossy(&buf[..read]);
                    let target = request.split_whitespace().nth(1).unwrap_or("/");
                    let path = target.split('?').next().unwrap_or(target);
                    let (status, body) = routes
                        .iter()
                        .find(|(route, ..)| *route == path)
                        .map(|(_, status, body)| (*status, *body))
                        .unwrap_or((404, "{}"));
                    let response = format!(
                        "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
                         Connection: close\r\n\r\n{body}",
                        body.len()
                    );
                    _ = socket.write_all(response.as_bytes()).await;
                    _ = socket.shutdown().await;
                });
            }
        });
        format!("http://{addr}")
    }

    async fn catalog(routes: Vec<Route>) -> OpenLibrary {
        OpenLibrary::builder().base_url(serve(routes).await).build().unwrap()
    }

    #[rstest]
    #[case(StatusCode::OK, None)]
    #[case(StatusCode::TOO_MANY_REQUESTS, Some(ErrorKind::RateLimited))]
    #[case(StatusCode::INTERNAL_SERVER_ERROR, Some(ErrorKind::SearchFailed))]
    #[case(StatusCode::NOT_FOUND, Some(ErrorKind::SearchFailed))]
    fn test_search_status(#[case] status: StatusCode, #[case] expected: Option<ErrorKind>) {
        let result = check_search_status(status);
        assert_eq!(result.err().map(|e| (*e).clone()), expected);
    }

    #[tokio::test]
    async fn test_blank_query_skips_request() {
        // Unroutable base URL: any request would fail.
        let catalog = OpenLibrary::builder().base_url("http://127.0.0.1:9").build().unwrap();
        let results = catalog.search(SearchField::Any, "   ").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_search_over_http() {
        let body =
            r#"{"docs": [{"key": "/works/OL45804W", "title": "Fantastic Mr Fox", "author_name": ["Roald Dahl"]}]}"#;
        let catalog = catalog(vec![("/search.json", 200, body)]).await;
        let results = catalog.search(SearchField::Title, "fox").await.unwrap();
        assert_eq!(results, [CatalogEntry::new("/works/OL45804W", "Fantastic Mr Fox").with_authors(["Roald Dahl"])]);
    }

    #[rstest]
    #[case(429, ErrorKind::RateLimited)]
    #[case(503, ErrorKind::SearchFailed)]
    #[tokio::test]
    async fn test_search_failure_over_http(#[case] status: u16, #[case] expected: ErrorKind) {
        let catalog = catalog(vec![("/search.json", status, "{}")]).await;
        let err = catalog.search(SearchField::Any, "fox").await.unwrap_err();
        assert_eq!(*err, expected);
    }

    #[tokio::test]
    async fn test_details_not_found_is_absent() {
        let catalog = catalog(Vec::new()).await;
        assert_eq!(catalog.details("OL404W").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_details_server_error() {
        let catalog = catalog(vec![("/works/OL1W.json", 500, "{}")]).await;
        let err = catalog.details("OL1W").await.unwrap_err();
        assert_eq!(*err, ErrorKind::DetailsFailed);
    }

    #[tokio::test]
    async fn test_details_survive_failed_sub_fetches() {
        let work = r#"{
            "key": "/works/OL1W", "title": "Dune", "covers": [5], "first_publish_date": "1965",
            "authors": [{"author": {"key": "/authors/OL1A"}}, {"author": {"key": "/authors/OL2A"}}]
        }"#;
        // No edition data, and the second author can't be resolved.
        let catalog = catalog(vec![
            ("/works/OL1W.json", 200, work),
            ("/works/OL1W/editions.json", 500, "{}"),
            ("/authors/OL1A.json", 200, r#"{"name": "Frank Herbert"}"#),
        ])
        .await;
        let entry = catalog.details("/works/OL1W").await.unwrap().unwrap();
        let expected = CatalogEntry::new("/works/OL1W", "Dune")
            .with_authors(["Frank Herbert"])
            .with_publish_year(1965)
            .with_cover_url("https://covers.openlibrary.org/b/id/5-L.jpg");
        assert_eq!(entry, expected);
    }

    #[test]
    fn test_builder_normalizes_urls() {
        let catalog = OpenLibrary::builder().base_url("https://example.test/").limit(0).build().unwrap();
        assert_eq!(catalog.base_url, "https://example.test");
        assert_eq!(catalog.limit, 1);
    }

    #[rstest]
    #[case(SearchField::Any, "q")]
    #[case(SearchField::Title, "title")]
    #[case(SearchField::Author, "author")]
    fn test_search_field_param(#[case] field: SearchField, #[case] param: &str) {
        assert_eq!(field.param(), param);
    }
}
