// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Simulator configuration.
//!
//! Supports both programmatic and TOML file-based configuration.

use crate::scheduler::StreamConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Which record source a stream runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamKind {
    Vehicle,
    Transport,
    Facility,
}

/// Top-level simulator configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// InfluxDB connection settings.
    pub influx: InfluxSettings,

    /// Throughput report interval (seconds).
    #[serde(default = "default_report_interval")]
    pub report_interval_secs: u64,

    /// Telemetry streams to drive.
    #[serde(default)]
    pub streams: Vec<StreamSettings>,
}

/// InfluxDB v2 connection settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InfluxSettings {
    /// InfluxDB URL (e.g. "http://localhost:8086").
    pub url: String,
    /// Organization.
    pub org: String,
    /// Bucket.
    pub bucket: String,
    /// Authentication token.
    pub token: String,
    /// Request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

/// One stream's settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamSettings {
    /// Stream name, must be unique.
    pub name: String,

    /// Record kind.
    pub kind: StreamKind,

    /// Points generated per cycle.
    #[serde(default = "default_points_per_cycle")]
    pub points_per_cycle: usize,

    /// Maximum points per remote write call.
    #[serde(default = "default_batch_capacity")]
    pub batch_capacity: usize,

    /// Inter-cycle delay in milliseconds.
    #[serde(default = "default_delay_ms")]
    pub delay_ms: u64,

    /// Encode worker count. 0 = available hardware parallelism.
    #[serde(default)]
    pub encode_parallelism: usize,
}

fn default_report_interval() -> u64 {
    60
}

fn default_timeout() -> u64 {
    10
}

fn default_points_per_cycle() -> usize {
    10_000
}

fn default_batch_capacity() -> usize {
    5_000
}

fn default_delay_ms() -> u64 {
    1_000
}

impl SimulatorConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Stock configuration: all three streams against a local InfluxDB.
    pub fn example() -> Self {
        Self {
            influx: InfluxSettings {
                url: "http://localhost:8086".to_string(),
                org: "sample".to_string(),
                bucket: "sample".to_string(),
                token: "changeme".to_string(),
                timeout_secs: default_timeout(),
            },
            report_interval_secs: default_report_interval(),
            streams: vec![
                StreamSettings {
                    name: "vehicle".to_string(),
                    kind: StreamKind::Vehicle,
                    points_per_cycle: default_points_per_cycle(),
                    batch_capacity: default_batch_capacity(),
                    delay_ms: default_delay_ms(),
                    encode_parallelism: 0,
                },
                StreamSettings {
                    name: "transport".to_string(),
                    kind: StreamKind::Transport,
                    points_per_cycle: 1_000,
                    batch_capacity: default_batch_capacity(),
                    delay_ms: default_delay_ms(),
                    encode_parallelism: 0,
                },
                StreamSettings {
                    name: "facility".to_string(),
                    kind: StreamKind::Facility,
                    points_per_cycle: 1_000,
                    batch_capacity: default_batch_capacity(),
                    delay_ms: default_delay_ms(),
                    encode_parallelism: 0,
                },
            ],
        }
    }

    /// Validate cross-field constraints.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.streams.is_empty() {
            return Err(ConfigError::Invalid("no streams configured".to_string()));
        }
        if self.report_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "report_interval_secs must be at least 1".to_string(),
            ));
        }

        let mut names = HashSet::new();
        for stream in &self.streams {
            if stream.name.is_empty() {
                return Err(ConfigError::Invalid("stream name is empty".to_string()));
            }
            if !names.insert(stream.name.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate stream name '{}'",
                    stream.name
                )));
            }
            if stream.points_per_cycle == 0 {
                return Err(ConfigError::Invalid(format!(
                    "stream '{}': points_per_cycle must be at least 1",
                    stream.name
                )));
            }
            if stream.batch_capacity == 0 {
                return Err(ConfigError::Invalid(format!(
                    "stream '{}': batch_capacity must be at least 1",
                    stream.name
                )));
            }
        }

        Ok(())
    }

    /// Render as TOML (for `gen-config`).
    pub fn to_toml(&self) -> String {
        toml::to_string_pretty(self).unwrap_or_default()
    }
}

impl StreamSettings {
    /// Convert into the scheduler's runtime config.
    pub fn to_stream_config(&self) -> StreamConfig {
        let mut config = StreamConfig::new(self.name.clone());
        config.points_per_cycle = self.points_per_cycle;
        config.batch_capacity = self.batch_capacity;
        config.delay = Duration::from_millis(self.delay_ms);
        if self.encode_parallelism > 0 {
            config.encode_parallelism = self.encode_parallelism;
        }
        config
    }
}
