//! Configuration management for the `HazardWatch` application
//!
//! Loads settings from a TOML file in the platform config directory, then
//! applies a small set of `HAZARDWATCH_`-prefixed environment overrides.
//! Everything has a serde default so an absent file yields a fully working
//! configuration; validation rejects out-of-range values.

use crate::HazardWatchError;
use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;

/// Root configuration structure for the `HazardWatch` application
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct HazardWatchConfig {
    /// Weather and air-quality feed settings
    pub weather: WeatherConfig,
    /// Geocoding feed settings
    pub geocoding: GeocodingConfig,
    /// Hazard layer feed settings
    pub hazards: HazardsConfig,
    /// Cyclone track feed settings
    pub cyclones: CyclonesConfig,
    /// Windy embed settings
    pub windy: WindyConfig,
    /// Cache settings
    pub cache: CacheConfig,
    /// Logging settings
    pub logging: LoggingConfig,
    /// Default dashboard settings
    pub defaults: DefaultsConfig,
}

/// Weather and air-quality feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Base URL for the forecast API
    pub base_url: String,
    /// Base URL for the air-quality API
    pub air_quality_base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
    /// TTL for cached current conditions, in minutes
    pub current_ttl_minutes: u32,
    /// TTL for cached hourly/daily series and air quality, in minutes
    pub series_ttl_minutes: u32,
}

/// Geocoding feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Base URL for the geocoding search API
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
    /// TTL for cached search results, in minutes
    pub ttl_minutes: u32,
}

/// Hazard layer feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HazardsConfig {
    /// Request timeout in seconds (feature services are slow)
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
    /// Result count cap passed to the feature service
    pub page_size: u32,
    /// TTL for cached layers, in minutes (jittered ±10% on write)
    pub ttl_minutes: u32,
}

/// Cyclone track feed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CyclonesConfig {
    /// Feed URL for ongoing tropical cyclone events
    pub feed_url: String,
    /// Request timeout in seconds
    pub timeout_seconds: u32,
    /// Maximum number of retries for failed requests
    pub max_retries: u32,
    /// TTL for cached tracks, in minutes
    pub ttl_minutes: u32,
}

/// Windy embed settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WindyConfig {
    /// Windy map-forecast API key. Required for the web dashboard,
    /// unused in report mode.
    pub map_key: Option<String>,
    /// Overlay layer shown by default (wind, rain, temp, pressure)
    pub default_layer: String,
}

/// Cache settings
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory; platform cache dir when empty
    pub location: String,
}

/// Logging settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    pub level: String,
}

/// Default dashboard settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DefaultsConfig {
    /// Fallback latitude when no place is given or geocoding fails
    pub latitude: f64,
    /// Fallback longitude
    pub longitude: f64,
    /// Fallback place name
    pub place_name: String,
    /// Timezone passed to the forecast API
    pub timezone: String,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com".to_string(),
            air_quality_base_url: "https://air-quality-api.open-meteo.com".to_string(),
            timeout_seconds: 20,
            max_retries: 3,
            current_ttl_minutes: 5,
            series_ttl_minutes: 30,
        }
    }
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://geocoding-api.open-meteo.com".to_string(),
            timeout_seconds: 10,
            max_retries: 3,
            ttl_minutes: 60,
        }
    }
}

impl Default for HazardsConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 30,
            max_retries: 2,
            page_size: 2000,
            ttl_minutes: 60,
        }
    }
}

impl Default for CyclonesConfig {
    fn default() -> Self {
        Self {
            feed_url: "https://www.gdacs.org/gdacsapi/api/TC/get?eventlist=ongoing".to_string(),
            timeout_seconds: 20,
            max_retries: 3,
            ttl_minutes: 15,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            latitude: 14.5995,
            longitude: 120.9842,
            place_name: "Manila".to_string(),
            timezone: "Asia/Manila".to_string(),
        }
    }
}

impl HazardWatchConfig {
    /// Load configuration from the default location and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from a specific path (or the default location)
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path
            .or_else(Self::config_path)
            .unwrap_or_else(|| PathBuf::from("config.toml"));

        let mut config: HazardWatchConfig = if config_file.exists() {
            let raw = std::fs::read_to_string(&config_file)
                .with_context(|| format!("Failed to read {}", config_file.display()))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse {}", config_file.display()))?
        } else {
            HazardWatchConfig::default()
        };

        config.apply_env_overrides();
        config.validate()?;
        Ok(config)
    }

    /// Default configuration file path
    #[must_use]
    pub fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "hazardwatch")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Cache directory, honoring the configured override
    #[must_use]
    pub fn cache_dir(&self) -> PathBuf {
        if !self.cache.location.is_empty() {
            return PathBuf::from(&self.cache.location);
        }
        ProjectDirs::from("", "", "hazardwatch")
            .map(|dirs| dirs.cache_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from(".hazardwatch-cache"))
    }

    /// Apply `HAZARDWATCH_`-prefixed environment overrides
    pub fn apply_env_overrides(&mut self) {
        if let Ok(key) = env::var("HAZARDWATCH_WINDY_MAP_KEY") {
            if !key.is_empty() {
                self.windy.map_key = Some(key);
            }
        }
        if let Ok(level) = env::var("HAZARDWATCH_LOG_LEVEL") {
            if !level.is_empty() {
                self.logging.level = level;
            }
        }
        if let Ok(dir) = env::var("HAZARDWATCH_CACHE_DIR") {
            if !dir.is_empty() {
                self.cache.location = dir;
            }
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    /// The Windy map key, demanded only when web mode actually needs it
    pub fn require_windy_key(&self) -> Result<&str> {
        match self.windy.map_key.as_deref() {
            Some(key) if !key.is_empty() => Ok(key),
            _ => Err(HazardWatchError::config(
                "Windy map key is required for the web dashboard. \
                 Set windy.map_key in config.toml or HAZARDWATCH_WINDY_MAP_KEY.",
            )
            .into()),
        }
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        for (name, timeout) in [
            ("weather", self.weather.timeout_seconds),
            ("geocoding", self.geocoding.timeout_seconds),
            ("hazards", self.hazards.timeout_seconds),
            ("cyclones", self.cyclones.timeout_seconds),
        ] {
            if timeout == 0 || timeout > 300 {
                return Err(HazardWatchError::config(format!(
                    "{name} timeout must be between 1 and 300 seconds"
                ))
                .into());
            }
        }

        for (name, retries) in [
            ("weather", self.weather.max_retries),
            ("geocoding", self.geocoding.max_retries),
            ("hazards", self.hazards.max_retries),
            ("cyclones", self.cyclones.max_retries),
        ] {
            if retries > 10 {
                return Err(HazardWatchError::config(format!(
                    "{name} max retries cannot exceed 10"
                ))
                .into());
            }
        }

        for (name, ttl) in [
            ("weather.current", self.weather.current_ttl_minutes),
            ("weather.series", self.weather.series_ttl_minutes),
            ("geocoding", self.geocoding.ttl_minutes),
            ("hazards", self.hazards.ttl_minutes),
            ("cyclones", self.cyclones.ttl_minutes),
        ] {
            if ttl == 0 || ttl > 24 * 60 {
                return Err(HazardWatchError::config(format!(
                    "{name} TTL must be between 1 minute and 24 hours"
                ))
                .into());
            }
        }

        if self.hazards.page_size == 0 || self.hazards.page_size > 10_000 {
            return Err(HazardWatchError::config(
                "Hazard page size must be between 1 and 10000 features",
            )
            .into());
        }

        if !(-90.0..=90.0).contains(&self.defaults.latitude) {
            return Err(HazardWatchError::config(
                "Default latitude must be between -90 and 90",
            )
            .into());
        }
        if !(-180.0..=180.0).contains(&self.defaults.longitude) {
            return Err(HazardWatchError::config(
                "Default longitude must be between -180 and 180",
            )
            .into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(HazardWatchError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        if !WindyConfig::LAYERS.contains(&self.windy.default_layer.as_str()) {
            return Err(HazardWatchError::config(format!(
                "Invalid Windy layer '{}'. Must be one of: {}",
                self.windy.default_layer,
                WindyConfig::LAYERS.join(", ")
            ))
            .into());
        }

        for (name, url) in [
            ("weather", &self.weather.base_url),
            ("air quality", &self.weather.air_quality_base_url),
            ("geocoding", &self.geocoding.base_url),
            ("cyclone feed", &self.cyclones.feed_url),
        ] {
            if !url.starts_with("http://") && !url.starts_with("https://") {
                return Err(HazardWatchError::config(format!(
                    "{name} URL must be a valid HTTP or HTTPS URL"
                ))
                .into());
            }
        }

        Ok(())
    }
}

impl WindyConfig {
    /// Layers the Windy embed understands
    pub const LAYERS: [&'static str; 4] = ["wind", "rain", "temp", "pressure"];
}

impl Default for WindyConfig {
    fn default() -> Self {
        Self {
            map_key: None,
            default_layer: "wind".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = HazardWatchConfig::default();
        assert_eq!(config.weather.base_url, "https://api.open-meteo.com");
        assert_eq!(config.weather.timeout_seconds, 20);
        assert_eq!(config.weather.current_ttl_minutes, 5);
        assert_eq!(config.geocoding.timeout_seconds, 10);
        assert_eq!(config.hazards.timeout_seconds, 30);
        assert_eq!(config.hazards.ttl_minutes, 60);
        assert_eq!(config.cyclones.ttl_minutes, 15);
        assert_eq!(config.defaults.place_name, "Manila");
        assert_eq!(config.defaults.timezone, "Asia/Manila");
        assert!(config.windy.map_key.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: HazardWatchConfig = toml::from_str(
            r#"
            [weather]
            timeout_seconds = 45

            [windy]
            map_key = "abcdef123456"
            "#,
        )
        .unwrap();

        assert_eq!(config.weather.timeout_seconds, 45);
        // Untouched fields keep their defaults
        assert_eq!(config.weather.max_retries, 3);
        assert_eq!(config.hazards.page_size, 2000);
        assert_eq!(config.windy.map_key.as_deref(), Some("abcdef123456"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_zero_timeout() {
        let mut config = HazardWatchConfig::default();
        config.weather.timeout_seconds = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_bad_log_level() {
        let mut config = HazardWatchConfig::default();
        config.logging.level = "verbose".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid log level"));
    }

    #[test]
    fn test_validation_rejects_unknown_windy_layer() {
        let mut config = HazardWatchConfig::default();
        config.windy.default_layer = "storm".to_string();
        let result = config.validate();
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Windy layer"));

        for layer in WindyConfig::LAYERS {
            config.windy.default_layer = layer.to_string();
            assert!(config.validate().is_ok());
        }
    }

    #[test]
    fn test_validation_rejects_bad_url() {
        let mut config = HazardWatchConfig::default();
        config.cyclones.feed_url = "ftp://example.com".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_rejects_out_of_range_defaults() {
        let mut config = HazardWatchConfig::default();
        config.defaults.latitude = 91.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_windy_key_required_for_web() {
        let mut config = HazardWatchConfig::default();
        assert!(config.require_windy_key().is_err());

        config.windy.map_key = Some(String::new());
        assert!(config.require_windy_key().is_err());

        config.windy.map_key = Some("abcdef123456".to_string());
        assert_eq!(config.require_windy_key().unwrap(), "abcdef123456");
    }

    #[test]
    fn test_cache_dir_override() {
        let mut config = HazardWatchConfig::default();
        config.cache.location = "/tmp/hazardwatch-test".to_string();
        assert_eq!(config.cache_dir(), PathBuf::from("/tmp/hazardwatch-test"));
    }
}
