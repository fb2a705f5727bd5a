use serde::{Deserialize, Serialize};

use super::bookmark::Bookmark;

/// One change notification from the remote data service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ChangeEvent {
    Insert { record: Bookmark },
    Update { record: Bookmark },
    Delete { id: String, user_id: String },
}

impl ChangeEvent {
    /// Owner of the affected row.
    pub fn user_id(&self) -> &str {
        match self {
            ChangeEvent::Insert { record } | ChangeEvent::Update { record } => &record.user_id,
            ChangeEvent::Delete { user_id, .. } => user_id,
        }
    }

    /// Id of the affected row.
    pub fn id(&self) -> &str {
        match self {
            ChangeEvent::Insert { record } | ChangeEvent::Update { record } => &record.id,
            ChangeEvent::Delete { id, .. } => id,
        }
    }
}

/// Connection state of a change subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Connecting,
    Connected,
    Error,
    TimedOut,
    Closed,
}

/// Message delivered on a subscription channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionMessage {
    Status(SubscriptionStatus),
    Event(ChangeEvent),
}
