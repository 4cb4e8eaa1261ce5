use super::UserId;
use serde::{Deserialize, Serialize};

/// Maximum number of books a profile can feature.
pub const MAX_FAVORITES: usize = 4;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    /// Catalog identifiers in display order.
    #[serde(default)]
    pub favorite_books: Vec<String>,
}
impl Profile {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id, favorite_books: Vec::new() }
    }
}
