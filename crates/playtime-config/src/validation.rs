//! Configuration validation

use crate::schema::RawConfig;
use thiserror::Error;

const SECONDS_PER_DAY: u64 = 24 * 60 * 60;

/// Validation error
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("check_interval_seconds must be greater than zero")]
    ZeroCheckInterval,

    #[error("check_interval_seconds {0} exceeds one day")]
    CheckIntervalTooLong(u64),

    #[error("join_check_delay_millis must be greater than zero")]
    ZeroJoinCheckDelay,

    #[error("data_dir must not be empty")]
    EmptyDataDir,
}

/// Validate a raw configuration
pub fn validate_config(config: &RawConfig) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let limits = &config.limits;

    match limits.check_interval_seconds {
        Some(0) => errors.push(ValidationError::ZeroCheckInterval),
        Some(secs) if secs > SECONDS_PER_DAY => {
            errors.push(ValidationError::CheckIntervalTooLong(secs))
        }
        _ => {}
    }

    if limits.join_check_delay_millis == Some(0) {
        errors.push(ValidationError::ZeroJoinCheckDelay);
    }

    if let Some(dir) = &config.service.data_dir
        && dir.as_os_str().is_empty()
    {
        errors.push(ValidationError::EmptyDataDir);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(toml_str: &str) -> RawConfig {
        toml::from_str(toml_str).unwrap()
    }

    #[test]
    fn test_empty_config_is_valid() {
        assert!(validate_config(&raw("config_version = 1")).is_empty());
    }

    #[test]
    fn test_collects_every_error() {
        let config = raw(
            r#"
            config_version = 1
            [service]
            data_dir = ""
            [limits]
            check_interval_seconds = 0
            join_check_delay_millis = 0
            "#,
        );

        let errors = validate_config(&config);
        assert_eq!(
            errors,
            vec![
                ValidationError::ZeroCheckInterval,
                ValidationError::ZeroJoinCheckDelay,
                ValidationError::EmptyDataDir,
            ]
        );
    }

    #[test]
    fn test_interval_longer_than_a_day() {
        let config = raw("config_version = 1\n[limits]\ncheck_interval_seconds = 86401\n");
        assert_eq!(
            validate_config(&config),
            vec![ValidationError::CheckIntervalTooLong(86401)]
        );

        let config = raw("config_version = 1\n[limits]\ncheck_interval_seconds = 86400\n");
        assert!(validate_config(&config).is_empty());
    }
}
