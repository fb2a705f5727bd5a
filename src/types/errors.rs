use std::fmt;

// === LoadError ===

/// Errors from a full listing (initial load or refresh).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// The request never reached the data service or timed out.
    Network(String),
    /// The data service rejected the request.
    Backend(String),
    /// The response could not be decoded into bookmarks.
    Decode(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Network(msg) => write!(f, "Failed to load bookmarks: network error: {}", msg),
            LoadError::Backend(msg) => write!(f, "Failed to load bookmarks: {}", msg),
            LoadError::Decode(msg) => {
                write!(f, "Failed to load bookmarks: invalid response: {}", msg)
            }
        }
    }
}

impl std::error::Error for LoadError {}

// === InsertError ===

/// Errors from creating a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertError {
    /// Title or URL was empty after trimming.
    InvalidInput(String),
    /// The request never reached the data service or timed out.
    Network(String),
    /// The data service rejected the insert.
    Backend(String),
    /// The response did not contain the persisted record.
    Decode(String),
}

impl fmt::Display for InsertError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertError::InvalidInput(msg) => write!(f, "Invalid bookmark: {}", msg),
            InsertError::Network(msg) => write!(f, "Failed to add bookmark: network error: {}", msg),
            InsertError::Backend(msg) => write!(f, "Failed to add bookmark: {}", msg),
            InsertError::Decode(msg) => {
                write!(f, "Failed to add bookmark: invalid response: {}", msg)
            }
        }
    }
}

impl std::error::Error for InsertError {}

// === DeleteError ===

/// Errors from deleting a bookmark.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteError {
    /// No row with this id belongs to the user.
    NotFound(String),
    /// The request never reached the data service or timed out.
    Network(String),
    /// The data service rejected the delete.
    Backend(String),
}

impl fmt::Display for DeleteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeleteError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            DeleteError::Network(msg) => {
                write!(f, "Failed to delete bookmark: network error: {}", msg)
            }
            DeleteError::Backend(msg) => write!(f, "Failed to delete bookmark: {}", msg),
        }
    }
}

impl std::error::Error for DeleteError {}

// === BookmarkError ===

/// Errors from direct operations on the local SQLite store.
#[derive(Debug)]
pub enum BookmarkError {
    /// Bookmark with the given ID was not found.
    NotFound(String),
    /// Database operation failed.
    DatabaseError(String),
}

impl fmt::Display for BookmarkError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BookmarkError::NotFound(id) => write!(f, "Bookmark not found: {}", id),
            BookmarkError::DatabaseError(msg) => {
                write!(f, "Bookmark database error: {}", msg)
            }
        }
    }
}

impl std::error::Error for BookmarkError {}

// === SessionError ===

/// Errors returned by sync session operations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No user session is active.
    NotStarted,
    /// Listing failed.
    Load(LoadError),
    /// Creating a bookmark failed; the list was not touched.
    Insert(InsertError),
    /// Deleting a bookmark failed; the optimistic removal was rolled back.
    Delete(DeleteError),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::NotStarted => write!(f, "No active bookmark session"),
            SessionError::Load(e) => write!(f, "{}", e),
            SessionError::Insert(e) => write!(f, "{}", e),
            SessionError::Delete(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::NotStarted => None,
            SessionError::Load(e) => Some(e),
            SessionError::Insert(e) => Some(e),
            SessionError::Delete(e) => Some(e),
        }
    }
}

impl From<LoadError> for SessionError {
    fn from(e: LoadError) -> Self {
        SessionError::Load(e)
    }
}

impl From<InsertError> for SessionError {
    fn from(e: InsertError) -> Self {
        SessionError::Insert(e)
    }
}

impl From<DeleteError> for SessionError {
    fn from(e: DeleteError) -> Self {
        SessionError::Delete(e)
    }
}

// === SettingsError ===

/// Errors related to settings loading.
#[derive(Debug)]
pub enum SettingsError {
    /// An I/O error occurred while reading or writing settings.
    IoError(String),
    /// Failed to serialize or deserialize settings.
    SerializationError(String),
    /// A settings value is out of range or unparsable.
    InvalidValue(String),
}

impl fmt::Display for SettingsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettingsError::IoError(msg) => write!(f, "Settings I/O error: {}", msg),
            SettingsError::SerializationError(msg) => {
                write!(f, "Settings serialization error: {}", msg)
            }
            SettingsError::InvalidValue(msg) => {
                write!(f, "Invalid settings value: {}", msg)
            }
        }
    }
}

impl std::error::Error for SettingsError {}
