//! Mutation Submitter for bookmark-sync.
//!
//! Sends create and delete requests to the remote data service. It never
//! touches the bookmark list; callers feed its results to the
//! reconciliation engine.

use std::sync::Arc;

use tracing::{info, warn};

use crate::services::remote_service::RemoteDataService;
use crate::types::bookmark::{Bookmark, NewBookmark};
use crate::types::errors::{DeleteError, InsertError};

/// Adds `https://` when the input has neither an `http://` nor an `https://` scheme.
pub fn normalize_url(raw: &str) -> String {
    let trimmed = raw.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    }
}

/// Validates and normalizes form input into the fields that get persisted.
pub fn prepare_insert(user_id: &str, title: &str, url: &str) -> Result<NewBookmark, InsertError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(InsertError::InvalidInput("title is required".to_string()));
    }
    if url.trim().is_empty() {
        return Err(InsertError::InvalidInput("url is required".to_string()));
    }

    Ok(NewBookmark {
        user_id: user_id.to_string(),
        url: normalize_url(url),
        title: title.to_string(),
    })
}

/// Performs bookmark mutations against a remote data service.
#[derive(Clone)]
pub struct MutationSubmitter {
    service: Arc<dyn RemoteDataService>,
}

impl MutationSubmitter {
    pub fn new(service: Arc<dyn RemoteDataService>) -> Self {
        Self { service }
    }

    /// Inserts a bookmark for `user_id` and returns the persisted record.
    ///
    /// The title is trimmed and the url normalized first. On failure nothing
    /// was written and the caller should keep the form input for a retry.
    pub async fn submit_insert(
        &self,
        user_id: &str,
        title: &str,
        url: &str,
    ) -> Result<Bookmark, InsertError> {
        let new = prepare_insert(user_id, title, url)?;

        match self.service.insert(&new.user_id, &new.title, &new.url).await {
            Ok(record) => {
                info!(id = %record.id, user_id = %record.user_id, "bookmark added");
                Ok(record)
            }
            Err(e) => {
                warn!(user_id = %user_id, error = %e, "failed to add bookmark");
                Err(e)
            }
        }
    }

    /// Deletes the row matching both `id` and `user_id`.
    ///
    /// The caller applies the optimistic removal before calling this and
    /// rolls it back on `Err`.
    pub async fn submit_delete(&self, id: &str, user_id: &str) -> Result<(), DeleteError> {
        self.service.delete(id, user_id).await.map_err(|e| {
            warn!(id = %id, user_id = %user_id, error = %e, "failed to delete bookmark");
            e
        })
    }
}
