//! `HazardWatch` - Philippine weather and hazard monitoring
//!
//! This library provides the core functionality for retrieving weather,
//! air-quality, hazard-zone and cyclone-track data from public services,
//! caching responses with per-feed TTLs, and rendering dashboard panels.

pub mod api;
pub mod cache;
pub mod config;
pub mod cyclones;
pub mod error;
pub mod geocoding;
pub mod hazards;
pub mod http;
pub mod models;
pub mod report;
pub mod weather;
pub mod web;

// Re-export core types for public API
pub use config::HazardWatchConfig;
pub use cyclones::CycloneClient;
pub use error::HazardWatchError;
pub use geocoding::{GeocodingClient, GeocodingMatch, Resolution};
pub use hazards::{HazardClient, HazardKind};
pub use models::{
    AirQuality, CurrentConditions, DailySeries, Feature, FeatureCollection, HourlySeries, Location,
};
pub use weather::WeatherClient;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, HazardWatchError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_is_set() {
        assert!(!VERSION.is_empty());
    }
}
