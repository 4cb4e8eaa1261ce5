use derive_more::Display;

/// Cover image sizes offered by the covers service.
#[derive(Debug, Display, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CoverSize {
    /// Small (thumbnail)
    #[display("S")]
    S,
    /// Medium, used for search results
    #[default]
    #[display("M")]
    M,
    /// Large, used for detail pages
    #[display("L")]
    L,
}
impl CoverSize {
    /// Builds the URL of a cover image from its numeric cover ID.
    pub fn url(&self, covers_base: &str, cover_id: i64) -> String {
        format!("{}/b/id/{cover_id}-{self}.jpg", covers_base.trim_end_matches('/'))
    }
}
