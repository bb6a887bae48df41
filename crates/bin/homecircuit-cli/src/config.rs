//! Configuration loading — TOML file with environment variable overrides.
//!
//! Looks for `homecircuit.toml` in the working directory. Every field has a
//! sensible default so the file is optional. Environment variables take
//! precedence over file values.

use std::time::Duration;

use serde::Deserialize;

use homecircuit_app::engine::EngineConfig;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Snapshot persistence settings.
    pub storage: StorageConfig,
    /// Engine tunables.
    pub engine: EngineSection,
    /// Event bus settings.
    pub events: EventsConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
}

/// Snapshot file configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the JSON snapshot file.
    pub path: String,
}

/// Engine tunables.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EngineSection {
    /// Milliseconds a motion sensor must stay powered before it arms.
    pub arming_delay_ms: u64,
    /// Heat-alarm threshold in °C; the alarm needs strictly more.
    pub heat_threshold: i32,
}

/// In-process event bus configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventsConfig {
    /// Broadcast channel capacity.
    pub bus_capacity: usize,
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax).
    pub filter: String,
}

impl Config {
    /// Load configuration from `homecircuit.toml` (if present) then apply
    /// environment-variable overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = Self::from_file("homecircuit.toml")?;
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
        if let Ok(val) = std::env::var("HOMECIRCUIT_STORAGE_PATH") {
            self.storage.path = val;
        }
        if let Ok(val) = std::env::var("HOMECIRCUIT_ARMING_DELAY_MS") {
            if let Ok(ms) = val.parse() {
                self.engine.arming_delay_ms = ms;
            }
        }
        if let Ok(val) = std::env::var("HOMECIRCUIT_HEAT_THRESHOLD") {
            if let Ok(celsius) = val.parse() {
                self.engine.heat_threshold = celsius;
            }
        }
        if let Ok(val) = std::env::var("HOMECIRCUIT_LOG") {
            self.logging.filter = val;
        }
        if let Ok(val) = std::env::var("RUST_LOG") {
            self.logging.filter = val;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.engine.arming_delay_ms == 0 {
            return Err(ConfigError::Validation(
                "arming delay must be non-zero".to_string(),
            ));
        }
        if self.events.bus_capacity == 0 {
            return Err(ConfigError::Validation(
                "event bus capacity must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// The engine tunables in the form the engine takes them.
    #[must_use]
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            arming_delay: Duration::from_millis(self.engine.arming_delay_ms),
            heat_threshold: self.engine.heat_threshold,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            path: "homecircuit.json".to_string(),
        }
    }
}

impl Default for EngineSection {
    fn default() -> Self {
        Self {
            arming_delay_ms: 3000,
            heat_threshold: 40,
        }
    }
}

impl Default for EventsConfig {
    fn default() -> Self {
        Self { bus_capacity: 256 }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "homecircuit=info".to_string(),
        }
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
        assert_eq!(config.storage.path, "homecircuit.json");
        assert_eq!(config.engine.arming_delay_ms, 3000);
        assert_eq!(config.engine.heat_threshold, 40);
        assert_eq!(config.events.bus_capacity, 256);
    }

    #[test]
    fn should_parse_minimal_toml() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.engine.arming_delay_ms, 3000);
    }

    #[test]
    fn should_parse_full_toml() {
        let toml = "
            [storage]
            path = '/var/lib/homecircuit/state.json'

            [engine]
            arming_delay_ms = 5000
            heat_threshold = 35

            [events]
            bus_capacity = 64

            [logging]
            filter = 'debug'
        ";
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.storage.path, "/var/lib/homecircuit/state.json");
        assert_eq!(config.engine.arming_delay_ms, 5000);
        assert_eq!(config.engine.heat_threshold, 35);
        assert_eq!(config.events.bus_capacity, 64);
        assert_eq!(config.logging.filter, "debug");
    }

    #[test]
    fn should_reject_zero_arming_delay() {
        let config = Config {
            engine: EngineSection {
                arming_delay_ms: 0,
                ..EngineSection::default()
            },
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn should_convert_into_engine_config() {
        let config = Config::default();
        let engine = config.engine_config();
        assert_eq!(engine.arming_delay, Duration::from_millis(3000));
        assert_eq!(engine.heat_threshold, 40);
    }
}
