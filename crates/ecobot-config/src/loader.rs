// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration file loading with override support
//!
//! Loading happens in three tiers, later tiers winning:
//! 1. TOML file (absent sections fall back to defaults)
//! 2. Environment variables
//! 3. CLI arguments

use crate::{ConfigError, ConfigResult, EcobotConfig};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = "ecobot_configuration.toml";

/// Find the ecobot configuration file
///
/// Search order:
/// 1. `ECOBOT_CONFIG_PATH` environment variable
/// 2. Current working directory
/// 3. Up to 5 parent directories
///
/// # Errors
///
/// Returns `ConfigError::FileNotFound` if no config file is found in any location
pub fn find_config_file() -> ConfigResult<PathBuf> {
    if let Ok(env_path) = env::var("ECOBOT_CONFIG_PATH") {
        let path = PathBuf::from(env_path);
        if path.exists() {
            return Ok(path);
        }
        return Err(ConfigError::FileNotFound(format!(
            "Config file specified by ECOBOT_CONFIG_PATH not found: {}",
            path.display()
        )));
    }

    let mut search_paths = Vec::new();
    if let Ok(cwd) = env::current_dir() {
        search_paths.push(cwd.join(CONFIG_FILE_NAME));

        let mut current = cwd.clone();
        for _ in 0..5 {
            if let Some(parent) = current.parent() {
                search_paths.push(parent.join(CONFIG_FILE_NAME));
                current = parent.to_path_buf();
            }
        }
    }

    if let Some(found) = search_paths.iter().find(|p| p.exists()) {
        return Ok(found.clone());
    }

    let search_list = search_paths
        .iter()
        .map(|p| format!("  - {}", p.display()))
        .collect::<Vec<_>>()
        .join("\n");

    Err(ConfigError::FileNotFound(format!(
        "'{}' not found in any of these locations:\n{}\n\nSet ECOBOT_CONFIG_PATH to specify a custom location.",
        CONFIG_FILE_NAME, search_list
    )))
}

/// Load configuration from a TOML file
///
/// * `config_path` - Optional path to config file. If `None`, the file is searched for.
/// * `cli_args` - Optional CLI argument overrides
///
/// # Errors
///
/// Returns error if the file is not found or contains invalid TOML.
/// Validation is a separate step (`validate_config`).
pub fn load_config(
    config_path: Option<&Path>,
    cli_args: Option<&HashMap<String, String>>,
) -> ConfigResult<EcobotConfig> {
    let config_file = match config_path {
        Some(path) => path.to_path_buf(),
        None => find_config_file()?,
    };

    let content = fs::read_to_string(&config_file)?;
    let mut config: EcobotConfig = toml::from_str(&content)?;

    apply_environment_overrides(&mut config);
    if let Some(cli) = cli_args {
        apply_cli_overrides(&mut config, cli);
    }

    Ok(config)
}

/// Apply environment variable overrides to configuration
///
/// Supported environment variables:
/// - `ECOBOT_DEVICE_ID` -> `device.device_id`
/// - `ECOBOT_LEDGER_URL` -> `ledger.base_url`
/// - `ECOBOT_BUS_ENDPOINT` -> `bus.endpoint`
/// - `ECOBOT_BUS_DEFAULT_TOPIC` -> `bus.default_topic`
/// - `ECOBOT_WEIGHT_THRESHOLD_G` -> `correlation.weight_threshold_g`
/// - `ECOBOT_EXPIRY_WINDOW_SECS` -> `correlation.expiry_window_secs`
/// - `ECOBOT_LOG_LEVEL` -> `logging.level`
///
/// Values that fail to parse are ignored.
pub fn apply_environment_overrides(config: &mut EcobotConfig) {
    if let Ok(value) = env::var("ECOBOT_DEVICE_ID") {
        config.device.device_id = value;
    }
    if let Ok(value) = env::var("ECOBOT_LEDGER_URL") {
        config.ledger.base_url = value;
    }
    if let Ok(value) = env::var("ECOBOT_BUS_ENDPOINT") {
        config.bus.endpoint = value;
    }
    if let Ok(value) = env::var("ECOBOT_BUS_DEFAULT_TOPIC") {
        config.bus.default_topic = value;
    }
    if let Ok(value) = env::var("ECOBOT_WEIGHT_THRESHOLD_G") {
        if let Ok(threshold) = value.parse::<f64>() {
            config.correlation.weight_threshold_g = threshold;
        }
    }
    if let Ok(value) = env::var("ECOBOT_EXPIRY_WINDOW_SECS") {
        if let Ok(secs) = value.parse::<u64>() {
            config.correlation.expiry_window_secs = secs;
        }
    }
    if let Ok(value) = env::var("ECOBOT_LOG_LEVEL") {
        config.logging.level = value;
    }
}

/// Apply CLI argument overrides to configuration
///
/// `cli_args` keys: `device_id`, `ledger_url`, `bus_endpoint`, `weight_threshold_g`,
/// `expiry_window_secs`, `log_level`, `backup`.
pub fn apply_cli_overrides(config: &mut EcobotConfig, cli_args: &HashMap<String, String>) {
    if let Some(value) = cli_args.get("device_id") {
        config.device.device_id = value.clone();
    }
    if let Some(value) = cli_args.get("ledger_url") {
        config.ledger.base_url = value.clone();
    }
    if let Some(value) = cli_args.get("bus_endpoint") {
        config.bus.endpoint = value.clone();
    }
    if let Some(value) = cli_args.get("weight_threshold_g") {
        if let Ok(threshold) = value.parse::<f64>() {
            config.correlation.weight_threshold_g = threshold;
        }
    }
    if let Some(value) = cli_args.get("expiry_window_secs") {
        if let Ok(secs) = value.parse::<u64>() {
            config.correlation.expiry_window_secs = secs;
        }
    }
    if let Some(value) = cli_args.get("log_level") {
        config.logging.level = value.clone();
    }
    if let Some(value) = cli_args.get("backup") {
        config.ledger.backup_enabled =
            value.to_lowercase() == "true" || value == "1" || value.to_lowercase() == "yes";
    }
}
