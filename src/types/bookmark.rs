use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A saved bookmark as stored by the remote data service.
///
/// `id`, `user_id` and `created_at` are assigned remotely and never change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    pub id: String,
    pub user_id: String,
    pub url: String,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl Bookmark {
    /// Ordering used for every full listing: newest first.
    pub fn newest_first(a: &Bookmark, b: &Bookmark) -> std::cmp::Ordering {
        b.created_at.cmp(&a.created_at)
    }
}

/// Fields of a bookmark about to be created, after normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBookmark {
    pub user_id: String,
    pub url: String,
    pub title: String,
}
