//! Gateway configuration
//!
//! Loaded from an optional TOML file, then overridden by `N2K__*`
//! environment variables (e.g. `N2K__SERIAL__DEVICE=/dev/ttyS1`).
//! `N2K__SERIES__CHANNELS` takes a comma-separated channel list.

use n2k_protocol::address;
use serde::{Deserialize, Serialize};
use series_aggregator::{AggregatorConfig, AggregatorError};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    #[error("Invalid series configuration: {0}")]
    Series(#[from] AggregatorError),

    #[error("Invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Serial link to the CAN bridge
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    /// Serial device path (e.g., "/dev/ttyUSB0" or "COM3")
    pub device: String,
    pub baud_rate: u32,
}

impl Default for SerialConfig {
    fn default() -> Self {
        Self {
            device: "/dev/ttyUSB0".to_string(),
            baud_rate: 115_200,
        }
    }
}

/// Identity used for outbound autopilot frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CommandConfig {
    pub source_address: u8,
    /// CAN priority, 0 (highest) to 7
    pub priority: u8,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            source_address: address::DEFAULT_SOURCE,
            priority: address::DEFAULT_PRIORITY,
        }
    }
}

/// Where finalized samples go
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// CSV log directory; in-memory only when unset
    pub log_dir: Option<PathBuf>,
}

/// Top-level gateway configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    pub serial: SerialConfig,
    pub command: CommandConfig,
    pub series: AggregatorConfig,
    pub storage: StorageConfig,
    /// Default tracing filter, overridden by `RUST_LOG`
    pub log_level: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            serial: SerialConfig::default(),
            command: CommandConfig::default(),
            series: AggregatorConfig::default(),
            storage: StorageConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

impl GatewayConfig {
    /// Load from an optional file plus environment overrides
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, None)
    }

    /// Load with an explicit environment instead of the process one
    fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self, ConfigError> {
        let mut builder = config::Config::builder();
        if let Some(path) = path {
            builder = builder.add_source(config::File::from(path));
        }
        let environment = config::Environment::with_prefix("N2K")
            .separator("__")
            .list_separator(",")
            .with_list_parse_key("series.channels")
            .try_parsing(true)
            .source(env);
        let config: GatewayConfig = builder
            .add_source(environment)
            .build()?
            .try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// Check values the type system cannot
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.series.validate()?;
        if self.command.priority > 7 {
            return Err(ConfigError::Invalid {
                field: "command.priority",
                reason: format!("{} is outside 0..=7", self.command.priority),
            });
        }
        if self.serial.baud_rate == 0 {
            return Err(ConfigError::Invalid {
                field: "serial.baud_rate",
                reason: "must be greater than zero".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use series_aggregator::{Channel, SeriesConfig};
    use std::io::Write;

    #[test]
    fn test_defaults_valid() {
        let config = GatewayConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.command.source_address, 0x64);
        assert_eq!(config.series.medium_factor, 6);
        assert_eq!(config.series.coarse_factor, 4);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            "{}",
            r#"
log_level = "debug"

[serial]
device = "/dev/ttyS3"

[command]
source_address = 35

[series]
fine_capacity = 120
sample_interval_ms = 5000
channels = ["engine_rpm", { channel = "heading", interval_ms = 1000, capacity = 60 }]
"#
        )
        .unwrap();

        let config = GatewayConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.serial.device, "/dev/ttyS3");
        assert_eq!(config.serial.baud_rate, 115_200);
        assert_eq!(config.command.source_address, 35);
        assert_eq!(config.command.priority, 2);
        assert_eq!(config.series.fine_capacity, 120);
        assert_eq!(config.series.medium_factor, 6);
        assert_eq!(
            config.series.channels,
            vec![
                SeriesConfig::new(Channel::EngineRpm),
                SeriesConfig::new(Channel::Heading)
                    .with_capacity(60)
                    .with_interval_ms(1000),
            ]
        );
        assert_eq!(config.log_level, "debug");
    }

    #[test]
    fn test_environment_overrides() {
        let env: config::Map<String, String> = [
            ("N2K__SERIAL__BAUD_RATE", "57600"),
            ("N2K__SERIES__CHANNELS", "heading,true_wind_angle"),
            ("N2K__SERIES__SAMPLE_INTERVAL_MS", "2000"),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let config = GatewayConfig::load_with_env(None, Some(env)).unwrap();
        assert_eq!(config.serial.baud_rate, 57_600);
        assert_eq!(config.series.sample_interval_ms, 2000);
        assert_eq!(
            config.series.channels,
            vec![
                SeriesConfig::new(Channel::Heading),
                SeriesConfig::new(Channel::TrueWindAngle),
            ]
        );
    }

    #[test]
    fn test_invalid_priority_rejected() {
        let config = GatewayConfig {
            command: CommandConfig {
                source_address: 1,
                priority: 9,
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid {
                field: "command.priority",
                ..
            })
        ));
    }

    #[test]
    fn test_zero_interval_rejected() {
        let mut config = GatewayConfig::default();
        config.series.sample_interval_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Series(_))));
    }
}
