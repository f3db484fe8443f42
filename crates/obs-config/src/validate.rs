//! Post-merge configuration validation.

use crate::error::{ConfigError, ConfigResult};
use crate::types::Config;

/// Validate a fully-merged and deserialized configuration.
///
/// # Errors
///
/// Returns the first validation error found.
pub fn validate(config: &Config) -> ConfigResult<()> {
    validate_service(config)?;
    validate_keys(config)?;
    validate_logging(config)?;
    Ok(())
}

fn validate_service(config: &Config) -> ConfigResult<()> {
    if config.service.save_root_path.trim().is_empty() {
        return Err(ConfigError::ValidationError {
            field: "service.save_root_path".to_owned(),
            message: "save_root_path must not be empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_keys(config: &Config) -> ConfigResult<()> {
    if config
        .keys
        .master_secret
        .as_deref()
        .is_some_and(|s| s.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "keys.master_secret".to_owned(),
            message: "master_secret is set but empty".to_owned(),
        });
    }

    if config
        .keys
        .master_secret_path
        .as_deref()
        .is_some_and(|p| p.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "keys.master_secret_path".to_owned(),
            message: "master_secret_path is set but empty".to_owned(),
        });
    }
    Ok(())
}

fn validate_logging(config: &Config) -> ConfigResult<()> {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.level".to_owned(),
            message: format!(
                "unsupported log level '{}'; expected one of: {}",
                config.logging.level,
                valid_levels.join(", ")
            ),
        });
    }

    let valid_formats = ["pretty", "compact", "json", "full"];
    if !valid_formats.contains(&config.logging.format.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.format".to_owned(),
            message: format!(
                "unsupported log format '{}'; expected one of: {}",
                config.logging.format,
                valid_formats.join(", ")
            ),
        });
    }

    let valid_targets = ["stderr", "stdout", "file"];
    if !valid_targets.contains(&config.logging.target.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.target".to_owned(),
            message: format!(
                "unsupported log target '{}'; expected one of: {}",
                config.logging.target,
                valid_targets.join(", ")
            ),
        });
    }

    let valid_rotations = ["daily", "hourly", "never"];
    if !valid_rotations.contains(&config.logging.rotation.as_str()) {
        return Err(ConfigError::ValidationError {
            field: "logging.rotation".to_owned(),
            message: format!(
                "unsupported log rotation '{}'; expected one of: {}",
                config.logging.rotation,
                valid_rotations.join(", ")
            ),
        });
    }

    if config.logging.target == "file"
        && config
            .logging
            .directory
            .as_deref()
            .is_none_or(|d| d.trim().is_empty())
    {
        return Err(ConfigError::ValidationError {
            field: "logging.directory".to_owned(),
            message: "a log directory is required when target is \"file\"".to_owned(),
        });
    }

    Ok(())
}
