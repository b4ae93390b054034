//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `cmms.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::path::PathBuf;
use std::time::Duration;

use cmms_adapter_modbus::ModbusConfig;
use serde::Deserialize;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Task trigger scheduler settings.
    pub scheduler: SchedulerConfig,
    /// Data-provider runtime settings.
    pub data_providers: DataProvidersConfig,
    /// Modbus acquisition routine settings.
    pub modbus: ModbusConfig,
}

/// `SQLite` database configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// `SQLite` connection URL or file path.
    pub url: String,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
    /// Write diagnostics to this file instead of stderr.
    pub file: Option<PathBuf>,
}

/// Task trigger scheduler configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Seconds between two evaluation passes.
    pub tick_interval_secs: u64,
}

/// Data-provider runtime configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct DataProvidersConfig {
    /// Maximum number of acquisitions running at once.
    pub workers: usize,
}

impl Config {
    /// Load configuration from `cmms.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("cmms.toml")?;
        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &str) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("CMMS_DATABASE_URL") {
            self.database.url = val;
        }
        if let Ok(val) = std::env::var("CMMS_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("CMMS_LOG_FILE") {
            self.logging.file = Some(PathBuf::from(val));
        }
        if let Ok(val) = std::env::var("CMMS_TICK_INTERVAL_SECS")
            && let Ok(secs) = val.parse()
        {
            self.scheduler.tick_interval_secs = secs;
        }
        if let Ok(val) = std::env::var("CMMS_DPR_WORKERS")
            && let Ok(workers) = val.parse()
        {
            self.data_providers.workers = workers;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.scheduler.tick_interval_secs == 0 {
            return Err(ConfigError::Validation(
                "tick interval must be non-zero".to_string(),
            ));
        }
        if self.data_providers.workers == 0 {
            return Err(ConfigError::Validation(
                "worker count must be non-zero".to_string(),
            ));
        }
        if self.modbus.timeout_ms == 0 {
            return Err(ConfigError::Validation(
                "modbus timeout must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Return the database URL in `sqlx`-compatible format.
    #[must_use]
    pub fn database_url(&self) -> &str {
        &self.database.url
    }

    /// Return the period of the task trigger scheduler.
    #[must_use]
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.scheduler.tick_interval_secs)
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:cmms.db?mode=rwc".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "cmmsd=info,cmms_app=info,cmms_adapter_modbus=info".to_string(),
            file: None,
        }
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_secs: 300,
        }
    }
}

impl Default for DataProvidersConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_produce_sensible_defaults() {
        let config = Config::default();
        assert_eq!(config.database.url, "sqlite:cmms.db?mode=rwc");
        assert_eq!(config.tick_interval(), Duration::from_secs(300));
        assert_eq!(config.data_providers.workers, 4);
        assert_eq!(config.modbus.unit_id, 1);
        assert!(config.logging.file.is_none());
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.scheduler.tick_interval_secs, 300);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [database]
            url = 'sqlite:test.db'

            [logging]
            filter = 'debug'
            file = '/var/log/cmms.log'

            [scheduler]
            tick_interval_secs = 60

            [data_providers]
            workers = 2

            [modbus]
            unit_id = 3
            register = 100
            timeout_ms = 1500
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.database_url(), "sqlite:test.db");
        assert_eq!(config.logging.filter, "debug");
        assert_eq!(
            config.logging.file.as_deref(),
            Some(std::path::Path::new("/var/log/cmms.log"))
        );
        assert_eq!(config.tick_interval(), Duration::from_secs(60));
        assert_eq!(config.data_providers.workers, 2);
        assert_eq!(config.modbus.unit_id, 3);
        assert_eq!(config.modbus.register, 100);
        assert_eq!(config.modbus.timeout_ms, 1500);
    }

    #[test]
    fn should_parse_partial_toml_with_defaults() {
        let toml = "
            [modbus]
            register = 7
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.modbus.register, 7);
        assert_eq!(config.modbus.unit_id, 1);
        assert_eq!(config.modbus.timeout_ms, 3000);
        assert_eq!(config.database.url, "sqlite:cmms.db?mode=rwc");
    }

    #[test]
    fn should_return_default_when_file_not_found() {
        let config = Config::from_file("nonexistent.toml").unwrap();
        assert_eq!(config.data_providers.workers, 4);
    }

    #[test]
    fn should_reject_zero_tick_interval() {
        let mut config = Config::default();
        config.scheduler.tick_interval_secs = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_reject_zero_workers() {
        let mut config = Config::default();
        config.data_providers.workers = 0;
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn should_accept_defaults() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn should_report_parse_error_for_invalid_toml() {
        let result: Result<Config, _> = toml::from_str("invalid {{{");
        assert!(result.is_err());
    }
}
