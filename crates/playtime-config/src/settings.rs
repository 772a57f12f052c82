//! Validated settings structures

use crate::schema::{RawConfig, RawLimits, RawServiceConfig};
use playtime_util::default_data_dir;
use std::path::PathBuf;
use std::time::Duration;

/// Default period of the limit check
pub const DEFAULT_CHECK_INTERVAL: Duration = Duration::from_secs(60);

/// Default delay before a newly active user's first check
pub const DEFAULT_JOIN_CHECK_DELAY: Duration = Duration::from_millis(1000);

/// Validated settings ready for use by the service
#[derive(Debug, Clone, Default)]
pub struct Settings {
    pub service: ServiceConfig,
    pub limits: LimitSettings,
}

impl Settings {
    /// Convert from raw config (after validation)
    pub fn from_raw(raw: RawConfig) -> Self {
        Self {
            service: ServiceConfig::from_raw(raw.service),
            limits: LimitSettings::from_raw(raw.limits),
        }
    }
}

/// Service-level settings
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub data_dir: PathBuf,
}

impl ServiceConfig {
    fn from_raw(raw: RawServiceConfig) -> Self {
        Self {
            data_dir: raw.data_dir.unwrap_or_else(default_data_dir),
        }
    }
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

/// Cap and check cadence
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LimitSettings {
    /// Cap seeded into an empty store. 0 disables enforcement.
    pub default_max_daily_minutes: u64,
    pub check_interval: Duration,
    pub join_check_delay: Duration,
}

impl LimitSettings {
    fn from_raw(raw: RawLimits) -> Self {
        Self {
            default_max_daily_minutes: raw.default_max_daily_minutes.unwrap_or(0),
            check_interval: raw
                .check_interval_seconds
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CHECK_INTERVAL),
            join_check_delay: raw
                .join_check_delay_millis
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_JOIN_CHECK_DELAY),
        }
    }
}

impl Default for LimitSettings {
    fn default() -> Self {
        Self {
            default_max_daily_minutes: 0,
            check_interval: DEFAULT_CHECK_INTERVAL,
            join_check_delay: DEFAULT_JOIN_CHECK_DELAY,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_empty_limits_table() {
        assert_eq!(LimitSettings::from_raw(RawLimits::default()), LimitSettings::default());
    }

    #[test]
    fn test_explicit_data_dir_wins() {
        let service = ServiceConfig::from_raw(RawServiceConfig {
            data_dir: Some(PathBuf::from("/tmp/pt")),
        });
        assert_eq!(service.data_dir, PathBuf::from("/tmp/pt"));
    }
}
