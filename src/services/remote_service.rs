//! Contract of the remote data service the sync engine talks to.
//!
//! The service is the single source of truth for bookmarks. Every call is
//! scoped to a user; the subscription is a best-effort push channel that may
//! drop, duplicate or reorder events, and may deliver rows of other users.

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::types::bookmark::Bookmark;
use crate::types::errors::{DeleteError, InsertError, LoadError};
use crate::types::event::SubscriptionMessage;

/// Receiving end of a change subscription. Dropping it unsubscribes.
pub type Subscription = mpsc::Receiver<SubscriptionMessage>;

#[async_trait]
pub trait RemoteDataService: Send + Sync {
    /// All bookmarks of `user_id`, newest first.
    async fn list(&self, user_id: &str) -> Result<Vec<Bookmark>, LoadError>;

    /// Persists a bookmark and returns it with its assigned `id` and `created_at`.
    async fn insert(&self, user_id: &str, title: &str, url: &str) -> Result<Bookmark, InsertError>;

    /// Deletes the row matching both `id` and `user_id`.
    async fn delete(&self, id: &str, user_id: &str) -> Result<(), DeleteError>;

    /// Opens a change subscription. Status messages report the connection
    /// state; the channel closes when the service gives up.
    async fn subscribe(&self, user_id: &str) -> Subscription;
}
