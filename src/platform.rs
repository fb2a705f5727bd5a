// Platform paths for bookmark-sync.
// Config: $XDG_CONFIG_HOME/bookmark-sync, ~/.config/bookmark-sync, or %APPDATA%\bookmark-sync
// Data:   $XDG_DATA_HOME/bookmark-sync, ~/.local/share/bookmark-sync, or %APPDATA%\bookmark-sync

use std::env;
use std::path::PathBuf;

const APP_DIR: &str = "bookmark-sync";

fn home_dir() -> PathBuf {
    env::var("HOME")
        .or_else(|_| env::var("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| env::temp_dir())
}

/// Directory holding `bookmark-sync.json`.
pub fn get_config_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = env::var("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
    }
    match env::var("XDG_CONFIG_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
        _ => home_dir().join(".config").join(APP_DIR),
    }
}

/// Directory holding the local SQLite store.
pub fn get_data_dir() -> PathBuf {
    if cfg!(target_os = "windows") {
        if let Ok(appdata) = env::var("APPDATA") {
            return PathBuf::from(appdata).join(APP_DIR);
        }
    }
    match env::var("XDG_DATA_HOME") {
        Ok(xdg) if !xdg.is_empty() => PathBuf::from(xdg).join(APP_DIR),
        _ => home_dir().join(".local").join("share").join(APP_DIR),
    }
}
