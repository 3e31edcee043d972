//! Data models for the `HazardWatch` application
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and metadata
//! - Weather: Current conditions, air quality and display mappings
//! - Forecast: Hourly and daily series as returned by the forecast API
//! - Geo: Minimal GeoJSON pass-through types for hazard and cyclone layers

pub mod forecast;
pub mod geo;
pub mod location;
pub mod weather;

// Re-export all public types for convenient access
pub use forecast::{DailyRow, DailySeries, HourlyRow, HourlySeries};
pub use geo::{Feature, FeatureCollection};
pub use location::Location;
pub use weather::{AirQuality, CurrentConditions};
