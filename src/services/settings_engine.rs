// bookmark-sync Settings Engine
// Loads sync settings from a JSON file, then applies environment overrides.
// A missing file means defaults; a malformed file is an error.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use tracing::{debug, info};

use crate::platform;
use crate::types::errors::SettingsError;
use crate::types::settings::{BackendKind, SyncSettings};

/// Environment variable naming an explicit settings file.
pub const CONFIG_PATH_ENV: &str = "BOOKMARK_SYNC_CONFIG";
pub const POLL_MS_ENV: &str = "BOOKMARK_SYNC_POLL_MS";
pub const BACKEND_ENV: &str = "BOOKMARK_SYNC_BACKEND";
pub const REST_URL_ENV: &str = "BOOKMARK_SYNC_REST_URL";
pub const API_KEY_ENV: &str = "BOOKMARK_SYNC_API_KEY";
pub const DB_PATH_ENV: &str = "BOOKMARK_SYNC_DB";

/// Trait defining the settings engine interface.
pub trait SettingsEngineTrait {
    fn load(&mut self) -> Result<SyncSettings, SettingsError>;
    fn save(&self) -> Result<(), SettingsError>;
    fn get_settings(&self) -> &SyncSettings;
    fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<(), SettingsError>;
    fn get_config_path(&self) -> &str;
}

/// Settings engine that persists settings as JSON on disk.
pub struct SettingsEngine {
    config_path: String,
    settings: SyncSettings,
}

impl SettingsEngine {
    /// Creates a new SettingsEngine.
    ///
    /// Without `path_override` the file is `bookmark-sync.json` in the
    /// platform config directory.
    pub fn new(path_override: Option<String>) -> Self {
        let config_path = match path_override {
            Some(p) => p,
            None => platform::get_config_dir()
                .join("bookmark-sync.json")
                .to_string_lossy()
                .to_string(),
        };

        Self {
            config_path,
            settings: SyncSettings::default(),
        }
    }

    /// Settings file from `BOOKMARK_SYNC_CONFIG`, loaded and overridden by
    /// the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        let mut engine = Self::new(std::env::var(CONFIG_PATH_ENV).ok());
        engine.load()?;
        let vars: HashMap<String, String> = std::env::vars().collect();
        engine.apply_overrides(&vars)?;
        Ok(engine)
    }

    fn parse_backend(value: &str) -> Result<BackendKind, SettingsError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "sqlite" => Ok(BackendKind::Sqlite),
            "rest" => Ok(BackendKind::Rest),
            other => Err(SettingsError::InvalidValue(format!(
                "{}: unknown backend '{}'",
                BACKEND_ENV, other
            ))),
        }
    }
}

impl SettingsEngineTrait for SettingsEngine {
    /// Loads settings from the JSON config file, or defaults if it does not exist.
    fn load(&mut self) -> Result<SyncSettings, SettingsError> {
        let path = Path::new(&self.config_path);

        if !path.exists() {
            debug!(path = %self.config_path, "no settings file, using defaults");
            self.settings = SyncSettings::default();
            return Ok(self.settings.clone());
        }

        let content = fs::read_to_string(path)
            .map_err(|e| SettingsError::IoError(format!("Failed to read config file: {}", e)))?;

        let settings: SyncSettings = serde_json::from_str(&content).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to parse config file: {}", e))
        })?;

        if settings.poll_interval_ms == 0 {
            return Err(SettingsError::InvalidValue(
                "poll_interval_ms must be greater than zero".to_string(),
            ));
        }

        info!(path = %self.config_path, "loaded settings");
        self.settings = settings;
        Ok(self.settings.clone())
    }

    /// Saves the current settings, creating parent directories as needed.
    fn save(&self) -> Result<(), SettingsError> {
        let path = Path::new(&self.config_path);

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                SettingsError::IoError(format!("Failed to create config directory: {}", e))
            })?;
        }

        let json = serde_json::to_string_pretty(&self.settings).map_err(|e| {
            SettingsError::SerializationError(format!("Failed to serialize settings: {}", e))
        })?;

        fs::write(path, json)
            .map_err(|e| SettingsError::IoError(format!("Failed to write config file: {}", e)))?;

        Ok(())
    }

    fn get_settings(&self) -> &SyncSettings {
        &self.settings
    }

    /// Applies `BOOKMARK_SYNC_*` overrides from the given variables.
    fn apply_overrides(&mut self, vars: &HashMap<String, String>) -> Result<(), SettingsError> {
        if let Some(value) = vars.get(POLL_MS_ENV) {
            let ms: u64 = value.trim().parse().map_err(|e| {
                SettingsError::InvalidValue(format!("{}: {}", POLL_MS_ENV, e))
            })?;
            if ms == 0 {
                return Err(SettingsError::InvalidValue(format!(
                    "{} must be greater than zero",
                    POLL_MS_ENV
                )));
            }
            self.settings.poll_interval_ms = ms;
        }
        if let Some(value) = vars.get(BACKEND_ENV) {
            self.settings.backend = Self::parse_backend(value)?;
        }
        if let Some(value) = vars.get(REST_URL_ENV) {
            self.settings.rest_url = Some(value.clone());
        }
        if let Some(value) = vars.get(API_KEY_ENV) {
            self.settings.api_key = Some(value.clone());
        }
        if let Some(value) = vars.get(DB_PATH_ENV) {
            self.settings.database_path = Some(value.clone());
        }
        Ok(())
    }

    fn get_config_path(&self) -> &str {
        &self.config_path
    }
}
