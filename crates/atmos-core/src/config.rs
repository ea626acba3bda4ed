use anyhow::{Context, Result};
use atmos_weather::provider::{
    Endpoints, ARCHIVE_API_BASE, FORECAST_API_BASE, GEOCODING_API_BASE,
    REVERSE_GEOCODING_API_BASE,
};
use atmos_weather::Coordinates;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use url::Url;

use crate::error::{AppError, ConfigError};

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a user-friendly message summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub api: ApiConfig,

    #[serde(default)]
    pub cache: CacheConfig,

    #[serde(default)]
    pub lists: ListsConfig,

    #[serde(default)]
    pub location: LocationConfig,
}

/// Where persisted records live
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    /// Nothing survives the process
    Memory,
    /// One JSON file
    File,
    #[default]
    Sqlite,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorageConfig {
    #[serde(default)]
    pub backend: StorageBackend,

    /// Overrides the default data file location
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<PathBuf>,
}

impl StorageConfig {
    /// Configured path, or the platform data directory default for the backend.
    pub fn resolved_path(&self) -> Option<PathBuf> {
        if let Some(path) = &self.path {
            return Some(path.clone());
        }
        let file_name = match self.backend {
            StorageBackend::Memory => return None,
            StorageBackend::File => "atmos.json",
            StorageBackend::Sqlite => "atmos.db",
        };
        Some(data_dir().join(file_name))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiConfig {
    #[serde(default = "default_forecast_url")]
    pub forecast_url: String,

    #[serde(default = "default_archive_url")]
    pub archive_url: String,

    #[serde(default = "default_geocoding_url")]
    pub geocoding_url: String,

    #[serde(default = "default_reverse_geocoding_url")]
    pub reverse_geocoding_url: String,

    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

fn default_forecast_url() -> String {
    FORECAST_API_BASE.to_string()
}

fn default_archive_url() -> String {
    ARCHIVE_API_BASE.to_string()
}

fn default_geocoding_url() -> String {
    GEOCODING_API_BASE.to_string()
}

fn default_reverse_geocoding_url() -> String {
    REVERSE_GEOCODING_API_BASE.to_string()
}

fn default_timeout_seconds() -> u64 {
    10
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            forecast_url: default_forecast_url(),
            archive_url: default_archive_url(),
            geocoding_url: default_geocoding_url(),
            reverse_geocoding_url: default_reverse_geocoding_url(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl ApiConfig {
    pub fn endpoints(&self) -> Endpoints {
        Endpoints {
            forecast: self.forecast_url.trim_end_matches('/').to_string(),
            archive: self.archive_url.trim_end_matches('/').to_string(),
            geocoding: self.geocoding_url.trim_end_matches('/').to_string(),
            reverse_geocoding: self.reverse_geocoding_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Lifetime of live forecast entries (default: 10)
    #[serde(default = "default_weather_ttl")]
    pub weather_ttl_minutes: u64,

    /// Lifetime of archive entries (default: 60)
    #[serde(default = "default_historical_ttl")]
    pub historical_ttl_minutes: u64,

    /// Upper bound on cache records kept in the store (default: 200)
    #[serde(default = "default_max_entries")]
    pub max_entries: usize,
}

/// Longest accepted cache lifetime: one week
pub const MAX_TTL_MINUTES: u64 = 7 * 24 * 60;

fn default_weather_ttl() -> u64 {
    10
}

fn default_historical_ttl() -> u64 {
    60
}

fn default_max_entries() -> usize {
    200
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            weather_ttl_minutes: default_weather_ttl(),
            historical_ttl_minutes: default_historical_ttl(),
            max_entries: default_max_entries(),
        }
    }
}

impl CacheConfig {
    pub fn weather_ttl(&self) -> Duration {
        Duration::from_secs(self.weather_ttl_minutes.saturating_mul(60))
    }

    pub fn historical_ttl(&self) -> Duration {
        Duration::from_secs(self.historical_ttl_minutes.saturating_mul(60))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListsConfig {
    #[serde(default = "default_favorites_cap")]
    pub favorites_cap: usize,

    #[serde(default = "default_recents_cap")]
    pub recents_cap: usize,
}

fn default_favorites_cap() -> usize {
    atmos_weather::lists::FAVORITES_CAP
}

fn default_recents_cap() -> usize {
    atmos_weather::lists::RECENTS_CAP
}

impl Default for ListsConfig {
    fn default() -> Self {
        Self {
            favorites_cap: default_favorites_cap(),
            recents_cap: default_recents_cap(),
        }
    }
}

/// Fixed coordinates reported as the device position
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeLocation {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home: Option<HomeLocation>,

    /// How long to wait for a position fix (default: 10)
    #[serde(default = "default_locate_timeout")]
    pub timeout_seconds: u64,
}

fn default_locate_timeout() -> u64 {
    10
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            home: None,
            timeout_seconds: default_locate_timeout(),
        }
    }
}

impl LocationConfig {
    pub fn coordinates(&self) -> Option<Coordinates> {
        self.home.map(|home| Coordinates {
            latitude: home.latitude,
            longitude: home.longitude,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }
}

/// Platform data directory for Atmos, e.g. `~/.local/share/atmos`
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("atmos")
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> std::result::Result<Self, AppError> {
        Self::load_from(Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    ///
    /// A file that isn't valid TOML for `Config` is a `ConfigError::ParseError`.
    pub fn load_from<P: AsRef<Path>>(path: P) -> std::result::Result<Self, AppError> {
        let path = path.as_ref();

        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            tracing::info!("Wrote default configuration to {}", path.display());
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path)?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| ConfigError::ParseError(format!("{}: {}", path.display(), e)))?;

        Ok(config)
    }

    /// Validate, logging warnings. Errors are collected into `ConfigError::Invalid`.
    pub fn validated(&self) -> std::result::Result<ValidationResult, ConfigError> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()));
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    /// Validate the configuration
    ///
    /// Returns a ValidationResult containing any errors or warnings.
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.api.forecast_url, "api.forecast_url", &mut result);
        validate_url(&self.api.archive_url, "api.archive_url", &mut result);
        validate_url(&self.api.geocoding_url, "api.geocoding_url", &mut result);
        validate_url(
            &self.api.reverse_geocoding_url,
            "api.reverse_geocoding_url",
            &mut result,
        );

        if self.api.timeout_seconds == 0 {
            result.add_error("api.timeout_seconds", "Request timeout must be greater than 0");
        } else if self.api.timeout_seconds > 120 {
            result.add_warning("api.timeout_seconds", "Request timeout is unusually long (>120s)");
        }

        for (field, minutes) in [
            ("cache.weather_ttl_minutes", self.cache.weather_ttl_minutes),
            ("cache.historical_ttl_minutes", self.cache.historical_ttl_minutes),
        ] {
            if minutes == 0 {
                result.add_error(field, "TTL must be greater than 0");
            } else if minutes > MAX_TTL_MINUTES {
                result.add_error(field, "TTL must not exceed one week (10080 minutes)");
            }
        }
        if self.cache.max_entries == 0 {
            result.add_error("cache.max_entries", "Cache must hold at least one entry");
        }

        if self.lists.favorites_cap == 0 {
            result.add_error("lists.favorites_cap", "Capacity must be greater than 0");
        }
        if self.lists.recents_cap == 0 {
            result.add_error("lists.recents_cap", "Capacity must be greater than 0");
        }

        if self.storage.backend == StorageBackend::Memory && self.storage.path.is_some() {
            result.add_warning("storage.path", "Ignored by the memory backend");
        }

        match self.location.home {
            None => result.add_warning(
                "location.home",
                "No home location set - location detection will be unavailable",
            ),
            Some(home) => {
                if !(-90.0..=90.0).contains(&home.latitude) {
                    result.add_error("location.home.latitude", "Latitude must be within [-90, 90]");
                }
                if !(-180.0..=180.0).contains(&home.longitude) {
                    result.add_error(
                        "location.home.longitude",
                        "Longitude must be within [-180, 180]",
                    );
                }
            }
        }

        if self.location.timeout_seconds == 0 {
            result.add_error("location.timeout_seconds", "Timeout must be greater than 0");
        }

        result
    }

    /// Save configuration to the default location
    pub fn save(&self) -> Result<()> {
        self.save_to(Self::config_path()?)
    }

    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    pub fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("atmos");

        Ok(config_dir.join("config.toml"))
    }
}

/// Validate a URL field
fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }

            if url.port() == Some(0) {
                result.add_error(field_name, "Port cannot be 0");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
