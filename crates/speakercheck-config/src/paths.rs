//! Platform-specific paths for settings and history.
//!
//! - **Config**: `~/.config/speakercheck/` (Linux), `~/Library/Application Support/speakercheck/` (macOS), `%APPDATA%\speakercheck\` (Windows)
//! - **Data**: `~/.local/share/speakercheck/` (Linux), `~/Library/Application Support/speakercheck/` (macOS), `%APPDATA%\speakercheck\` (Windows)

use std::path::PathBuf;

/// Application name used for directory paths.
const APP_NAME: &str = "speakercheck";

/// Settings file name inside the config directory.
const CONFIG_FILE: &str = "config.toml";

/// Returns the user-specific configuration directory.
///
/// Returns a fallback path if the config directory cannot be determined.
pub fn user_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}

/// Returns the default settings file path.
pub fn default_config_path() -> PathBuf {
    user_config_dir().join(CONFIG_FILE)
}

/// Returns the directory the test history is stored in.
///
/// Returns a fallback path if the data directory cannot be determined.
pub fn history_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
}
