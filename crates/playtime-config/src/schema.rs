//! Raw configuration schema (as parsed from TOML)

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Raw configuration as parsed from TOML
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RawConfig {
    /// Config schema version
    pub config_version: u32,

    /// Service-level settings
    #[serde(default)]
    pub service: RawServiceConfig,

    /// Cap and check cadence
    #[serde(default)]
    pub limits: RawLimits,
}

/// Service-level settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawServiceConfig {
    /// Data directory for the counter store
    pub data_dir: Option<PathBuf>,
}

/// Limit settings
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct RawLimits {
    /// Cap written to a fresh store; an existing stored cap always wins
    pub default_max_daily_minutes: Option<u64>,

    /// Period of the limit check over all active users
    pub check_interval_seconds: Option<u64>,

    /// Delay between a user becoming active and their first check
    pub join_check_delay_millis: Option<u64>,
}
