//! Configuration
//!
//! - `EngineConfig`: tunables of the persistence engine itself
//! - `Config`: the JSON file read by the `bitemporal` binary
//!
//! Config file format:
//!
//! ```json
//! {
//!   "data_dir": "/var/lib/bitemporal",
//!   "last_instant": "9999-12-31T23:59:59Z",
//!   "log_level": "info"
//! }
//! ```
//!
//! Only `data_dir` is required.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::{log_event_with_fields, Event, Severity};

/// Result type for configuration loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Engine tunables.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineConfig {
    /// Ceiling instant for "last" queries.
    pub last_instant: DateTime<Utc>,
}

impl EngineConfig {
    pub fn new() -> Self {
        Self {
            last_instant: DateTime::<Utc>::MAX_UTC,
        }
    }

    pub fn with_last_instant(mut self, last_instant: DateTime<Utc>) -> Self {
        self.last_instant = last_instant;
        self
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration file structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Data directory (required)
    pub data_dir: String,

    /// Ceiling for "last" queries (optional, default: max representable instant)
    #[serde(default)]
    pub last_instant: Option<DateTime<Utc>>,

    /// Minimum log severity (optional, default "info")
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Config with defaults for everything but the data directory.
    pub fn new(data_dir: impl Into<String>) -> Self {
        Self {
            data_dir: data_dir.into(),
            last_instant: None,
            log_level: default_log_level(),
        }
    }

    /// Load configuration from file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let config = Self::from_json(&content)?;

        let path_str = path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[
                ("path", path_str.as_str()),
                ("data_dir", config.data_dir.as_str()),
            ],
        );

        Ok(config)
    }

    /// Parse and validate configuration text
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Config = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> ConfigResult<()> {
        if self.data_dir.trim().is_empty() {
            return Err(ConfigError::Invalid("data_dir must not be empty".into()));
        }

        self.log_severity()?;

        Ok(())
    }

    /// Get data directory as Path
    pub fn data_path(&self) -> &Path {
        Path::new(&self.data_dir)
    }

    /// Parsed `log_level`
    pub fn log_severity(&self) -> ConfigResult<Severity> {
        self.log_level
            .parse::<Severity>()
            .map_err(|e| ConfigError::Invalid(format!("log_level: {}", e)))
    }

    /// Engine tunables derived from this file
    pub fn engine_config(&self) -> EngineConfig {
        match self.last_instant {
            Some(instant) => EngineConfig::new().with_last_instant(instant),
            None => EngineConfig::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_engine_config_defaults_to_max_instant() {
        assert_eq!(EngineConfig::default().last_instant, DateTime::<Utc>::MAX_UTC);
    }

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config = Config::from_json(r#"{"data_dir": "/tmp/bt"}"#).unwrap();
        assert_eq!(config.log_level, "info");
        assert!(config.last_instant.is_none());
        assert_eq!(config.log_severity().unwrap(), Severity::Info);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_last_instant_parsed() {
        let config = Config::from_json(
            r#"{"data_dir": "/tmp/bt", "last_instant": "2099-12-31T00:00:00Z"}"#,
        )
        .unwrap();
        assert_eq!(
            config.engine_config().last_instant,
            Utc.with_ymd_and_hms(2099, 12, 31, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn test_rejects_missing_data_dir() {
        assert!(matches!(
            Config::from_json(r#"{"log_level": "info"}"#),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            Config::from_json(r#"{"data_dir": "  "}"#),
            Err(ConfigError::Invalid(_))
        ));
    }

    #[test]
    fn test_rejects_unknown_log_level() {
        let err = Config::from_json(r#"{"data_dir": "/tmp/bt", "log_level": "loud"}"#).unwrap_err();
        assert!(err.to_string().contains("log_level"));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, r#"{{"data_dir": "/tmp/bt", "log_level": "warn"}}"#).unwrap();

        let config = Config::load(file.path()).unwrap();
        assert_eq!(config.log_severity().unwrap(), Severity::Warn);
    }

    #[test]
    fn test_load_missing_file() {
        let err = Config::load(Path::new("/definitely/not/here.json")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }
}
