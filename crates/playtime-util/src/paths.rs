//! Default paths for playtimed
//!
//! Paths are user-writable by default (no root required):
//! - Config: `$XDG_CONFIG_HOME/playtime/config.toml` or `~/.config/playtime/config.toml`
//! - Data: `$XDG_DATA_HOME/playtimed` or `~/.local/share/playtimed`

use std::path::PathBuf;

/// Environment variable for overriding the config file path
pub const PLAYTIME_CONFIG_ENV: &str = "PLAYTIME_CONFIG";

/// Environment variable for overriding the data directory
pub const PLAYTIME_DATA_DIR_ENV: &str = "PLAYTIME_DATA_DIR";

/// Counter store filename within the data directory
pub const STORE_FILENAME: &str = "playtime.db";

/// Application subdirectory name for data
const APP_DIR: &str = "playtimed";

/// Application subdirectory name for config
const CONFIG_APP_DIR: &str = "playtime";

const CONFIG_FILENAME: &str = "config.toml";

/// Get the default config file path.
///
/// Order of precedence:
/// 1. `$XDG_CONFIG_HOME/playtime/config.toml` (if XDG_CONFIG_HOME is set)
/// 2. `~/.config/playtime/config.toml`
/// 3. `/etc/playtime/config.toml` (no home directory)
pub fn default_config_path() -> PathBuf {
    if let Ok(config_home) = std::env::var("XDG_CONFIG_HOME") {
        return PathBuf::from(config_home)
            .join(CONFIG_APP_DIR)
            .join(CONFIG_FILENAME);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".config")
            .join(CONFIG_APP_DIR)
            .join(CONFIG_FILENAME);
    }

    PathBuf::from("/etc").join(CONFIG_APP_DIR).join(CONFIG_FILENAME)
}

/// Get the default data directory.
///
/// Order of precedence:
/// 1. `$PLAYTIME_DATA_DIR` environment variable (if set)
/// 2. `$XDG_DATA_HOME/playtimed` (if XDG_DATA_HOME is set)
/// 3. `~/.local/share/playtimed` (fallback)
pub fn default_data_dir() -> PathBuf {
    if let Ok(path) = std::env::var(PLAYTIME_DATA_DIR_ENV) {
        return PathBuf::from(path);
    }

    data_dir_without_env()
}

/// Get the data directory without checking PLAYTIME_DATA_DIR.
/// Used for config defaults where the env var is checked separately.
pub fn data_dir_without_env() -> PathBuf {
    if let Ok(data_home) = std::env::var("XDG_DATA_HOME") {
        return PathBuf::from(data_home).join(APP_DIR);
    }

    if let Ok(home) = std::env::var("HOME") {
        return PathBuf::from(home)
            .join(".local")
            .join("share")
            .join(APP_DIR);
    }

    PathBuf::from("/tmp").join(APP_DIR).join("data")
}
