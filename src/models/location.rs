//! Location model for geographic coordinates and metadata

use serde::{Deserialize, Serialize};

/// Location coordinates
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Location {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Location name (city, municipality, etc.)
    pub name: String,
    /// Country code (ISO 3166-1 alpha-2)
    pub country: Option<String>,
}

impl Location {
    /// Create a new location
    #[must_use]
    pub fn new(latitude: f64, longitude: f64, name: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: None,
        }
    }

    /// Create location with country
    #[must_use]
    pub fn with_country(latitude: f64, longitude: f64, name: String, country: String) -> Self {
        Self {
            latitude,
            longitude,
            name,
            country: Some(country),
        }
    }

    /// Format location as coordinates string
    #[must_use]
    pub fn format_coordinates(&self) -> String {
        format!("{:.4}, {:.4}", self.latitude, self.longitude)
    }

    /// Round coordinates for cache key generation
    #[must_use]
    pub fn rounded_coordinates(&self, precision: u32) -> (f64, f64) {
        let multiplier = 10_f64.powi(i32::try_from(precision).unwrap_or(4));
        let lat = (self.latitude * multiplier).round() / multiplier;
        let lon = (self.longitude * multiplier).round() / multiplier;
        (lat, lon)
    }

    /// Generate cache key for a feed at this location
    #[must_use]
    pub fn cache_key(&self, feed: &str) -> String {
        let (lat, lon) = self.rounded_coordinates(2);
        format!("{feed}:{lat:.2}:{lon:.2}")
    }
}

impl Default for Location {
    /// Manila, the fallback when no place is entered or geocoding fails
    fn default() -> Self {
        Self::with_country(14.5995, 120.9842, "Manila".to_string(), "PH".to_string())
    }
}
