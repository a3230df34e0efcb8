// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration validation
//!
//! All problems are collected and reported together so that a broken file can
//! be fixed in one pass.

use crate::{ConfigError, ConfigResult, EcobotConfig};

/// Validation errors that can occur during config validation
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValidationError {
    MissingRequired { field: String },
    InvalidValue { field: String, reason: String },
    TimeoutOutOfRange { field: String, secs: u64 },
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingRequired { field } => {
                write!(f, "Missing required configuration: {}", field)
            }
            Self::InvalidValue { field, reason } => {
                write!(f, "Invalid configuration value for {}: {}", field, reason)
            }
            Self::TimeoutOutOfRange { field, secs } => {
                write!(
                    f,
                    "Timeout {} = {}s is outside valid range (1-9s)",
                    field, secs
                )
            }
        }
    }
}

/// Remote calls must time out in under ten seconds
const TIMEOUT_RANGE_SECS: std::ops::RangeInclusive<u64> = 1..=9;

/// Validate the complete configuration
///
/// # Errors
///
/// Returns `ConfigError::ValidationError` listing every problem found
pub fn validate_config(config: &EcobotConfig) -> ConfigResult<()> {
    let errors = collect_validation_errors(config);

    if !errors.is_empty() {
        let error_messages = errors
            .iter()
            .map(|e| format!("  - {}", e))
            .collect::<Vec<_>>()
            .join("\n");

        return Err(ConfigError::ValidationError(format!(
            "Configuration validation failed:\n{}",
            error_messages
        )));
    }

    Ok(())
}

/// Every validation problem in `config`, in section order
pub fn collect_validation_errors(config: &EcobotConfig) -> Vec<ConfigValidationError> {
    let mut errors = Vec::new();
    validate_required_fields(config, &mut errors);
    validate_correlation(config, &mut errors);
    validate_timeouts(config, &mut errors);
    validate_load_cell(config, &mut errors);
    validate_logging(config, &mut errors);
    errors
}

fn validate_required_fields(config: &EcobotConfig, errors: &mut Vec<ConfigValidationError>) {
    let required = [
        ("device.device_id", &config.device.device_id),
        ("ledger.base_url", &config.ledger.base_url),
        ("bus.endpoint", &config.bus.endpoint),
        ("bus.default_topic", &config.bus.default_topic),
    ];
    for (field, value) in required {
        if value.trim().is_empty() {
            errors.push(ConfigValidationError::MissingRequired {
                field: field.to_string(),
            });
        }
    }

    if !config.ledger.base_url.trim().is_empty()
        && !(config.ledger.base_url.starts_with("http://")
            || config.ledger.base_url.starts_with("https://"))
    {
        errors.push(ConfigValidationError::InvalidValue {
            field: "ledger.base_url".to_string(),
            reason: "must start with http:// or https://".to_string(),
        });
    }

    if config.ledger.backup_enabled && config.ledger.connectivity_probe.trim().is_empty() {
        errors.push(ConfigValidationError::MissingRequired {
            field: "ledger.connectivity_probe".to_string(),
        });
    }
}

fn validate_correlation(config: &EcobotConfig, errors: &mut Vec<ConfigValidationError>) {
    let threshold = config.correlation.weight_threshold_g;
    if !threshold.is_finite() || threshold <= 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "correlation.weight_threshold_g".to_string(),
            reason: format!("must be a positive number of grams, got {}", threshold),
        });
    }
    if config.correlation.expiry_window_secs == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "correlation.expiry_window_secs".to_string(),
            reason: "must be at least 1 second".to_string(),
        });
    }
}

fn validate_timeouts(config: &EcobotConfig, errors: &mut Vec<ConfigValidationError>) {
    let timeouts = [
        ("ledger.request_timeout_secs", config.ledger.request_timeout_secs),
        (
            "ledger.connectivity_timeout_secs",
            config.ledger.connectivity_timeout_secs,
        ),
        ("bus.connect_timeout_secs", config.bus.connect_timeout_secs),
        ("bus.publish_timeout_secs", config.bus.publish_timeout_secs),
    ];
    for (field, secs) in timeouts {
        if !TIMEOUT_RANGE_SECS.contains(&secs) {
            errors.push(ConfigValidationError::TimeoutOutOfRange {
                field: field.to_string(),
                secs,
            });
        }
    }
}

fn validate_load_cell(config: &EcobotConfig, errors: &mut Vec<ConfigValidationError>) {
    if !config.load_cell.offset.is_finite() {
        errors.push(ConfigValidationError::InvalidValue {
            field: "load_cell.offset".to_string(),
            reason: "must be finite".to_string(),
        });
    }
    if !config.load_cell.scale.is_finite() || config.load_cell.scale == 0.0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "load_cell.scale".to_string(),
            reason: "must be finite and non-zero".to_string(),
        });
    }
    if config.load_cell.samples_per_reading == 0 {
        errors.push(ConfigValidationError::InvalidValue {
            field: "load_cell.samples_per_reading".to_string(),
            reason: "must be at least 1".to_string(),
        });
    }
}

fn validate_logging(config: &EcobotConfig, errors: &mut Vec<ConfigValidationError>) {
    let valid_levels = ["trace", "debug", "info", "warn", "error"];
    if !valid_levels.contains(&config.logging.level.to_lowercase().as_str()) {
        errors.push(ConfigValidationError::InvalidValue {
            field: "logging.level".to_string(),
            reason: format!("must be one of {:?}", valid_levels),
        });
    }
}
