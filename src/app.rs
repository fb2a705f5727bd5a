//! App Core for bookmark-sync.
//!
//! Holds the settings, the remote data service chosen by them, the sync
//! session and the add-form state driven through the RPC bridge.

use std::sync::Arc;

use tracing::info;

use crate::managers::sync_session::SyncSession;
use crate::platform;
use crate::services::remote_service::RemoteDataService;
use crate::services::sqlite_service::SqliteDataService;
use crate::types::settings::{BackendKind, SyncSettings};
use crate::types::view::AddFormState;

/// Central application struct.
pub struct App {
    pub settings: SyncSettings,
    pub service: Arc<dyn RemoteDataService>,
    pub session: SyncSession,
    pub form: AddFormState,
}

impl App {
    /// Creates the app with the backend named in `settings`.
    pub fn new(settings: SyncSettings) -> Result<Self, Box<dyn std::error::Error>> {
        let service = build_service(&settings)?;
        Ok(Self::with_service(settings, service))
    }

    /// Creates the app over an already constructed data service.
    pub fn with_service(settings: SyncSettings, service: Arc<dyn RemoteDataService>) -> Self {
        let session = SyncSession::new(service.clone(), &settings);
        Self {
            settings,
            service,
            session,
            form: AddFormState::new(),
        }
    }

    /// Shutdown sequence: end the session so no task outlives the app.
    pub fn shutdown(&mut self) {
        self.session.stop();
    }
}

/// Builds the remote data service selected by `settings.backend`.
pub fn build_service(
    settings: &SyncSettings,
) -> Result<Arc<dyn RemoteDataService>, Box<dyn std::error::Error>> {
    match settings.backend {
        BackendKind::Sqlite => {
            let path = match &settings.database_path {
                Some(p) => std::path::PathBuf::from(p),
                None => {
                    let dir = platform::get_data_dir();
                    std::fs::create_dir_all(&dir)
                        .map_err(|e| format!("Failed to create data directory: {}", e))?;
                    dir.join("bookmarks.db")
                }
            };
            info!(path = %path.display(), "using local SQLite bookmark store");
            let service = SqliteDataService::open(&path.to_string_lossy())
                .map_err(|e| format!("Failed to open bookmark store: {}", e))?
                .with_subscription_buffer(settings.subscription_buffer);
            Ok(Arc::new(service))
        }
        BackendKind::Rest => build_rest_service(settings),
    }
}

#[cfg(feature = "rest")]
fn build_rest_service(
    settings: &SyncSettings,
) -> Result<Arc<dyn RemoteDataService>, Box<dyn std::error::Error>> {
    use crate::services::rest_service::RestDataService;

    let url = settings.rest_url.as_deref().ok_or("rest backend requires rest_url")?;
    let key = settings.api_key.as_deref().ok_or("rest backend requires api_key")?;
    let timeout = std::time::Duration::from_millis(settings.request_timeout_ms);
    let service = RestDataService::new(url, key, timeout)?;
    info!(endpoint = %service.endpoint(), "using REST bookmark service");
    Ok(Arc::new(service))
}

#[cfg(not(feature = "rest"))]
fn build_rest_service(
    _settings: &SyncSettings,
) -> Result<Arc<dyn RemoteDataService>, Box<dyn std::error::Error>> {
    Err("rest backend not compiled in (enable the `rest` feature)".into())
}
