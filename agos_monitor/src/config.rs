//! Runtime configuration loader.
//!
//! Schema of `agos.toml`:
//!   - `[store]`    which backend to talk to and how to reach it
//!   - `[map]`      fallback centre and initial zoom
//!   - `[defaults]` values written for newly registered devices
//!   - `[logging]`  level, optional file, timestamped console output
//!
//! Every field has a default, so a missing file or an empty one is valid.
//! Secrets normally come from the environment (or `.env`) rather than the
//! file: `AGOS_STORE_URL`, `AGOS_API_KEY`, `DATABASE_URL`.

use crate::form::GaugeDefaults;
use crate::logging::LogLevel;
use crate::model::{
    Coordinate, DEFAULT_MAX_CAPACITY_M, DEFAULT_REGION_DELTA, DEFAULT_WATER_LEVEL_M,
    FALLBACK_LATITUDE, FALLBACK_LONGITUDE, GAUGE_TABLE, GaugeStatus,
};
use serde::Deserialize;
use std::fmt;
use std::path::Path;

pub const DEFAULT_CONFIG_PATH: &str = "agos.toml";

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "Failed to read config file: {}", msg),
            ConfigError::Parse(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "Invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Root configuration structure
#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct AppConfig {
    pub store: StoreConfig,
    pub map: MapConfig,
    pub defaults: DefaultsConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Rest,
    Postgres,
    Demo,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    /// Project URL of the hosted store, e.g. `https://xyz.supabase.co`.
    pub url: Option<String>,
    pub api_key: Option<String>,
    pub table: String,
    pub timeout_seconds: u64,
    pub database_url: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            backend: StoreBackend::Rest,
            url: None,
            api_key: None,
            table: GAUGE_TABLE.to_string(),
            timeout_seconds: 15,
            database_url: None,
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
    pub latitude_delta: f64,
    pub longitude_delta: f64,
}

impl Default for MapConfig {
    fn default() -> Self {
        MapConfig {
            fallback_latitude: FALLBACK_LATITUDE,
            fallback_longitude: FALLBACK_LONGITUDE,
            latitude_delta: DEFAULT_REGION_DELTA,
            longitude_delta: DEFAULT_REGION_DELTA,
        }
    }
}

impl MapConfig {
    pub fn fallback(&self) -> Coordinate {
        Coordinate::new(self.fallback_latitude, self.fallback_longitude)
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct DefaultsConfig {
    pub water_level: f64,
    pub max_capacity: f64,
    pub status: String,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        DefaultsConfig {
            water_level: DEFAULT_WATER_LEVEL_M,
            max_capacity: DEFAULT_MAX_CAPACITY_M,
            status: "normal".to_string(),
        }
    }
}

impl DefaultsConfig {
    pub fn gauge_defaults(&self) -> GaugeDefaults {
        GaugeDefaults {
            water_level: self.water_level,
            max_capacity: self.max_capacity,
            status: GaugeStatus::parse(&self.status),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            file: None,
            timestamps: false,
        }
    }
}

impl LoggingConfig {
    pub fn min_level(&self) -> LogLevel {
        LogLevel::parse(&self.level).unwrap_or(LogLevel::Info)
    }
}

impl AppConfig {
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.as_ref().display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// Loads `path` if given (it must exist), otherwise `agos.toml` if it
    /// exists, otherwise the defaults. Environment overrides are applied and
    /// the result validated.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        dotenv::dotenv().ok();

        let mut config = match path {
            Some(p) => Self::load(p)?,
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(DEFAULT_CONFIG_PATH)?,
            None => AppConfig::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok());
        config.validate()?;
        Ok(config)
    }

    /// Applies environment-style overrides; `lookup` returns a variable's value.
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(url) = non_empty("AGOS_STORE_URL") {
            self.store.url = Some(url);
        }
        if let Some(key) = non_empty("AGOS_API_KEY") {
            self.store.api_key = Some(key);
        }
        if let Some(db) = non_empty("DATABASE_URL") {
            self.store.database_url = Some(db);
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.map.fallback().is_valid() {
            return Err(ConfigError::Invalid(format!(
                "map fallback centre out of range: {}",
                self.map.fallback()
            )));
        }
        if !(self.map.latitude_delta > 0.0 && self.map.longitude_delta > 0.0) {
            return Err(ConfigError::Invalid("map deltas must be positive".to_string()));
        }
        if !(self.defaults.max_capacity > 0.0) {
            return Err(ConfigError::Invalid("defaults.max_capacity must be positive".to_string()));
        }
        if self.store.table.trim().is_empty() {
            return Err(ConfigError::Invalid("store.table must not be empty".to_string()));
        }
        if LogLevel::parse(&self.logging.level).is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown logging.level: {}",
                self.logging.level
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_empty_config_uses_defaults() {
        let config = AppConfig::from_toml_str("").unwrap();
        assert_eq!(config.store.backend, StoreBackend::Rest);
        assert_eq!(config.store.table, "water_gauges");
        assert_eq!(config.map.fallback(), Coordinate::new(14.3833, 121.4667));
        assert_eq!(config.map.latitude_delta, 0.1);
        assert_eq!(config.defaults.gauge_defaults(), GaugeDefaults::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_sections_keep_other_defaults() {
        let config = AppConfig::from_toml_str(
            r#"
            [store]
            backend = "postgres"

            [defaults]
            max_capacity = 6.5
            "#,
        )
        .unwrap();
        assert_eq!(config.store.backend, StoreBackend::Postgres);
        assert_eq!(config.store.timeout_seconds, 15);
        assert_eq!(config.defaults.max_capacity, 6.5);
        assert_eq!(config.defaults.water_level, 0.0);
    }

    #[test]
    fn test_unknown_backend_is_a_parse_error() {
        let err = AppConfig::from_toml_str("[store]\nbackend = \"firebase\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_environment_overrides_file_values() {
        let mut config = AppConfig::from_toml_str(
            "[store]\nurl = \"https://file.example\"\napi_key = \"file-key\"",
        )
        .unwrap();
        config.apply_overrides(|key| match key {
            "AGOS_STORE_URL" => Some("https://env.example".to_string()),
            "AGOS_API_KEY" => Some("   ".to_string()),
            _ => None,
        });
        assert_eq!(config.store.url.as_deref(), Some("https://env.example"));
        assert_eq!(config.store.api_key.as_deref(), Some("file-key"), "blank values are ignored");
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        let out_of_range = AppConfig::from_toml_str("[map]\nfallback_latitude = 95.0").unwrap();
        assert!(matches!(out_of_range.validate(), Err(ConfigError::Invalid(_))));

        let zero_capacity = AppConfig::from_toml_str("[defaults]\nmax_capacity = 0.0").unwrap();
        assert!(zero_capacity.validate().is_err());

        let bad_level = AppConfig::from_toml_str("[logging]\nlevel = \"loud\"").unwrap();
        assert!(bad_level.validate().is_err());
    }

    #[test]
    fn test_load_reads_file_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[logging]\nlevel = \"debug\"\ntimestamps = true").unwrap();
        let config = AppConfig::load(file.path()).unwrap();
        assert_eq!(config.logging.min_level(), LogLevel::Debug);
        assert!(config.logging.timestamps);
    }

    #[test]
    fn test_missing_explicit_file_is_an_io_error() {
        let err = AppConfig::load("/nonexistent/agos.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
