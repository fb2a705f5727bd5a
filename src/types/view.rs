//! UI-facing state models.
//!
//! The presentation layer renders these; it never mutates the bookmark list
//! itself.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use super::bookmark::Bookmark;

/// Outcome of the listing that seeds a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "lowercase")]
pub enum LoadState {
    /// The initial listing has not resolved yet.
    Loading,
    /// At least one listing succeeded.
    Ready,
    /// The initial listing failed and nothing usable is loaded.
    Failed(String),
}

/// What the bookmark list area shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "view", rename_all = "lowercase")]
pub enum ListView {
    Loading,
    Error { message: String },
    Empty,
    Ready { count: usize, items: Vec<Bookmark> },
}

impl ListView {
    /// Picks the view for a load state and the current list. A failed load
    /// hides the list entirely; an empty list is distinct from a failure.
    pub fn new(load_state: &LoadState, bookmarks: &[Bookmark]) -> Self {
        match load_state {
            LoadState::Loading => ListView::Loading,
            LoadState::Failed(message) => ListView::Error {
                message: message.clone(),
            },
            LoadState::Ready if bookmarks.is_empty() => ListView::Empty,
            LoadState::Ready => ListView::Ready {
                count: bookmarks.len(),
                items: bookmarks.to_vec(),
            },
        }
    }

    /// Heading shown above a ready list.
    pub fn headline(&self) -> Option<String> {
        match self {
            ListView::Ready { count, .. } => Some(format!("Your Bookmarks ({})", count)),
            _ => None,
        }
    }
}

/// How long the confirmation stays up after a successful add.
pub const SUCCESS_DISPLAY: Duration = Duration::from_secs(3);

/// State of the add-bookmark form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddFormState {
    pub title: String,
    pub url: String,
    pub submitting: bool,
    pub error: Option<String>,
    pub success: bool,
    #[serde(skip)]
    success_since: Option<Instant>,
}

impl AddFormState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Called when the form is submitted.
    pub fn begin_submit(&mut self) {
        self.error = None;
        self.success = false;
        self.success_since = None;
        self.submitting = true;
    }

    /// The insert succeeded: clear the inputs and show the confirmation.
    pub fn finish_success(&mut self) {
        self.title.clear();
        self.url.clear();
        self.submitting = false;
        self.success = true;
        self.success_since = Some(Instant::now());
    }

    /// The insert failed: keep the inputs so the user can retry.
    pub fn finish_failure(&mut self, message: impl Into<String>) {
        self.submitting = false;
        self.error = Some(message.into());
    }

    /// Hides the confirmation early.
    pub fn dismiss_success(&mut self) {
        self.success = false;
        self.success_since = None;
    }

    /// Hides the confirmation once [`SUCCESS_DISPLAY`] has passed.
    pub fn expire_success(&mut self) {
        if self
            .success_since
            .is_some_and(|since| since.elapsed() >= SUCCESS_DISPLAY)
        {
            self.dismiss_success();
        }
    }
}

/// Renders a creation date as `Oct 19, 2026` (UTC).
pub fn format_date(created_at: &DateTime<Utc>) -> String {
    created_at.format("%b %-d, %Y").to_string()
}
