use serde::{Deserialize, Serialize};

/// Which remote data service backs the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Local SQLite file shared by every client on this machine.
    Sqlite,
    /// PostgREST-style HTTP endpoint.
    Rest,
}

/// Sync settings, stored as JSON.
///
/// Missing fields fall back to their defaults so older files keep loading.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncSettings {
    /// Poll period while the view is visible.
    pub poll_interval_ms: u64,
    pub backend: BackendKind,
    /// SQLite file for the `sqlite` backend. `None` uses the platform data dir.
    pub database_path: Option<String>,
    /// Base URL of the `rest` backend, without the `/rest/v1` suffix.
    pub rest_url: Option<String>,
    pub api_key: Option<String>,
    pub request_timeout_ms: u64,
    /// Capacity of each subscription channel.
    pub subscription_buffer: usize,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 3000,
            backend: BackendKind::Sqlite,
            database_path: None,
            rest_url: None,
            api_key: None,
            request_timeout_ms: 10_000,
            subscription_buffer: 64,
        }
    }
}
