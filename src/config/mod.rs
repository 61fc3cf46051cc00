//! Application configuration.
//!
//! Aggregates the storage and monitoring sections into a single Config
//! struct that can be loaded from YAML files or environment variables.

mod monitoring;
mod storage;

pub use monitoring::{MonitoringConfig, MonitoringType};
pub use storage::{DynamoConfig, SqliteConfig, StorageConfig, StorageType};

use serde::Deserialize;

/// Default configuration file name.
pub const DEFAULT_CONFIG_FILE: &str = "config.yaml";
/// Environment variable for configuration file path.
pub const CONFIG_ENV_VAR: &str = "ALARM_REGISTRY_CONFIG";
/// Prefix for configuration environment variables.
pub const CONFIG_ENV_PREFIX: &str = "ALARM_REGISTRY";
/// Environment variable for logging configuration.
pub const LOG_ENV_VAR: &str = "ALARM_REGISTRY_LOG";

/// Legacy environment variable naming the subscription table.
pub const ALARMS_TABLE_ENV_VAR: &str = "ALARMS_TABLE_NAME";
/// Legacy environment variable naming the event log table.
pub const EVENTS_TABLE_ENV_VAR: &str = "EVENTS_TABLE_NAME";

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to load config: {0}")]
    Load(#[from] ::config::ConfigError),
}

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Monitoring configuration.
    pub monitoring: MonitoringConfig,
}

impl Config {
    /// Load configuration from file and environment.
    ///
    /// Configuration sources (in order of priority, later overrides earlier):
    /// 1. `config.yaml` in current directory (if exists)
    /// 2. File specified by `path` argument (if provided)
    /// 3. File specified by `CONFIG_ENV_VAR` environment variable (if set)
    /// 4. Environment variables with `CONFIG_ENV_PREFIX` prefix
    /// 5. Legacy `ALARMS_TABLE_NAME` / `EVENTS_TABLE_NAME`
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        use ::config::{Config as ConfigLib, Environment, File, FileFormat};

        let mut builder = ConfigLib::builder()
            .add_source(File::new(DEFAULT_CONFIG_FILE, FileFormat::Yaml).required(false));

        if let Some(config_path) = path {
            builder = builder.add_source(File::new(config_path, FileFormat::Yaml).required(true));
        }

        if let Ok(config_path) = std::env::var(CONFIG_ENV_VAR) {
            builder = builder.add_source(File::new(&config_path, FileFormat::Yaml).required(true));
        }

        let config = builder
            .add_source(
                Environment::with_prefix(CONFIG_ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("storage.dynamo.alarms_table", std::env::var(ALARMS_TABLE_ENV_VAR).ok())?
            .set_override_option("storage.dynamo.events_table", std::env::var(EVENTS_TABLE_ENV_VAR).ok())?
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Create config for testing: in-memory storage and mock monitoring.
    pub fn for_test() -> Self {
        Self {
            storage: StorageConfig {
                storage_type: StorageType::Memory,
                ..Default::default()
            },
            monitoring: MonitoringConfig {
                monitoring_type: MonitoringType::Mock,
                endpoint_url: None,
            },
        }
    }
}
