// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

//! Configuration type definitions
//!
//! This module defines all configuration structs that map to sections in
//! `ecobot_configuration.toml`.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct EcobotConfig {
    pub device: DeviceConfig,
    pub correlation: CorrelationConfig,
    pub ledger: LedgerConfig,
    pub bus: BusConfig,
    pub load_cell: LoadCellConfig,
    pub logging: LoggingConfig,
}

/// Identity of this collector
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Sent as `prototype_id` with every ledger record and bus payload
    pub device_id: String,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            device_id: "ecobot-dev".to_string(),
        }
    }
}

/// Detection/weight fusion parameters
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Minimum weight increase (grams) that confirms a pending detection
    pub weight_threshold_g: f64,
    /// Seconds a detection stays pending
    pub expiry_window_secs: u64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            weight_threshold_g: 5.0,
            expiry_window_secs: 10,
        }
    }
}

impl CorrelationConfig {
    pub fn expiry_window(&self) -> Duration {
        Duration::from_secs(self.expiry_window_secs)
    }
}

/// Remote accounting service
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Base URL; `/workPeriods`, `/sensors` and `/backup` are appended
    pub base_url: String,
    pub request_timeout_secs: u64,
    /// Extra attempts for transient failures (0 = single attempt)
    pub retry_attempts: u32,
    pub retry_backoff_ms: u64,
    /// Ask the ledger for a backup at startup when the network is reachable
    pub backup_enabled: bool,
    /// `host:port` probed to decide whether the network is reachable
    pub connectivity_probe: String,
    pub connectivity_timeout_secs: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080/sensors".to_string(),
            request_timeout_secs: 5,
            retry_attempts: 2,
            retry_backoff_ms: 250,
            backup_enabled: true,
            connectivity_probe: "8.8.8.8:53".to_string(),
            connectivity_timeout_secs: 3,
        }
    }
}

impl LedgerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn connectivity_timeout(&self) -> Duration {
        Duration::from_secs(self.connectivity_timeout_secs)
    }
}

/// Message bus (ZMQ PUB towards a broker/proxy)
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BusConfig {
    pub endpoint: String,
    pub connect_timeout_secs: u64,
    pub publish_timeout_secs: u64,
    /// Used when a publish call passes an empty topic
    pub default_topic: String,
    pub topics: TopicsConfig,
}

impl Default for BusConfig {
    fn default() -> Self {
        Self {
            endpoint: "tcp://127.0.0.1:5556".to_string(),
            connect_timeout_secs: 3,
            publish_timeout_secs: 5,
            default_topic: "sensors/data".to_string(),
            topics: TopicsConfig::default(),
        }
    }
}

impl BusConfig {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn publish_timeout(&self) -> Duration {
        Duration::from_secs(self.publish_timeout_secs)
    }
}

/// Topic names per producer
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TopicsConfig {
    pub weight: String,
    pub position: String,
    pub vision: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            weight: "weight".to_string(),
            position: "position".to_string(),
            vision: "vision".to_string(),
        }
    }
}

/// HX711 calibration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoadCellConfig {
    pub offset: f64,
    pub scale: f64,
    /// Raw samples averaged per reading
    pub samples_per_reading: usize,
}

impl Default for LoadCellConfig {
    fn default() -> Self {
        Self {
            offset: 14664.59,
            scale: 0.0388,
            samples_per_reading: 20,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when no debug flags are given (trace, debug, info, warn, error)
    pub level: String,
    /// Directory for rotating log files (`file-logging` feature)
    pub log_dir: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            log_dir: "./logs".to_string(),
        }
    }
}
