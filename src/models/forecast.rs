//! Hourly and daily forecast series
//!
//! The forecast API returns parallel arrays keyed by field name. The series
//! types keep that shape (it serializes compactly and caches well) and
//! `rows()` zips them into per-timestamp records for table rendering. A
//! missing field array, or a short one, yields `None` cells rather than an
//! error.

use serde::{Deserialize, Serialize};

/// Hourly forecast series for one location
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct HourlySeries {
    /// Timestamps as reported by the API (local to the query timezone)
    pub time: Vec<String>,
    /// Temperature in Celsius per hour
    pub temperature: Option<Vec<Option<f32>>>,
    /// Precipitation in mm per hour
    pub precipitation: Option<Vec<Option<f32>>>,
    /// Wind speed in km/h per hour
    pub wind_speed: Option<Vec<Option<f32>>>,
    /// Relative humidity in percent per hour
    pub relative_humidity: Option<Vec<Option<f32>>>,
}

/// One hour of forecast data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HourlyRow {
    pub time: String,
    pub temperature: Option<f32>,
    pub precipitation: Option<f32>,
    pub wind_speed: Option<f32>,
    pub relative_humidity: Option<f32>,
}

impl HourlySeries {
    /// Number of hours in the series
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the series carries any data points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Zip the parallel arrays into per-hour rows
    #[must_use]
    pub fn rows(&self) -> Vec<HourlyRow> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, time)| HourlyRow {
                time: time.clone(),
                temperature: column_value(&self.temperature, i),
                precipitation: column_value(&self.precipitation, i),
                wind_speed: column_value(&self.wind_speed, i),
                relative_humidity: column_value(&self.relative_humidity, i),
            })
            .collect()
    }
}

/// Daily forecast series for one location
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct DailySeries {
    /// Dates as reported by the API
    pub time: Vec<String>,
    /// Daily maximum temperature in Celsius
    pub temperature_max: Option<Vec<Option<f32>>>,
    /// Daily minimum temperature in Celsius
    pub temperature_min: Option<Vec<Option<f32>>>,
    /// Daily precipitation sum in mm
    pub precipitation_sum: Option<Vec<Option<f32>>>,
    /// Daily maximum wind speed in km/h
    pub wind_speed_max: Option<Vec<Option<f32>>>,
}

/// One day of forecast data
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyRow {
    pub time: String,
    pub temperature_max: Option<f32>,
    pub temperature_min: Option<f32>,
    pub precipitation_sum: Option<f32>,
    pub wind_speed_max: Option<f32>,
}

impl DailySeries {
    /// Number of days in the series
    #[must_use]
    pub fn len(&self) -> usize {
        self.time.len()
    }

    /// Whether the series carries any data points
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.time.is_empty()
    }

    /// Zip the parallel arrays into per-day rows
    #[must_use]
    pub fn rows(&self) -> Vec<DailyRow> {
        self.time
            .iter()
            .enumerate()
            .map(|(i, time)| DailyRow {
                time: time.clone(),
                temperature_max: column_value(&self.temperature_max, i),
                temperature_min: column_value(&self.temperature_min, i),
                precipitation_sum: column_value(&self.precipitation_sum, i),
                wind_speed_max: column_value(&self.wind_speed_max, i),
            })
            .collect()
    }
}

/// Safe lookup into an optional parallel array
fn column_value(column: &Option<Vec<Option<f32>>>, index: usize) -> Option<f32> {
    column.as_ref().and_then(|values| *values.get(index)?)
}
