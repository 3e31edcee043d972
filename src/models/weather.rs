//! Current conditions, air quality and display mappings

use serde::{Deserialize, Serialize};

/// Placeholder rendered for any field the upstream response did not carry
pub const MISSING: &str = "--";

/// Current weather conditions for a location.
///
/// Every field is optional: the upstream JSON is copied as-is and a missing
/// field renders as [`MISSING`] instead of failing the whole panel.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct CurrentConditions {
    /// Observation time as reported by the API (local to the query timezone)
    pub time: Option<String>,
    /// Temperature in Celsius
    pub temperature: Option<f32>,
    /// Apparent ("feels like") temperature in Celsius
    pub apparent_temperature: Option<f32>,
    /// Relative humidity in percent
    pub relative_humidity: Option<f32>,
    /// Wind speed in km/h
    pub wind_speed: Option<f32>,
    /// Wind direction in degrees (0-360, where 0/360 is North)
    pub wind_direction: Option<f32>,
    /// Wind gust speed in km/h
    pub wind_gusts: Option<f32>,
    /// Precipitation amount in mm
    pub precipitation: Option<f32>,
    /// Cloud cover percentage (0-100)
    pub cloud_cover: Option<f32>,
    /// Surface pressure in hPa
    pub surface_pressure: Option<f32>,
    /// UV index
    pub uv_index: Option<f32>,
    /// WMO weather code
    pub weather_code: Option<u8>,
    /// Human-readable description derived from the weather code
    pub description: String,
}

impl CurrentConditions {
    /// Format temperature with unit, or the placeholder
    #[must_use]
    pub fn format_temperature(&self) -> String {
        match self.temperature {
            Some(t) => format!("{t:.1} °C"),
            None => MISSING.to_string(),
        }
    }

    /// Format wind speed, cardinal direction and gusts
    #[must_use]
    pub fn format_wind(&self) -> String {
        let speed = match self.wind_speed {
            Some(s) => format!("{s:.1} km/h"),
            None => MISSING.to_string(),
        };
        let direction = match self.wind_direction {
            Some(d) => wind_direction_to_cardinal(d),
            None => MISSING,
        };
        match self.wind_gusts {
            Some(g) => format!("{speed} {direction} (gusts {g:.1} km/h)"),
            None => format!("{speed} {direction}"),
        }
    }

    /// Format relative humidity with unit, or the placeholder
    #[must_use]
    pub fn format_humidity(&self) -> String {
        match self.relative_humidity {
            Some(h) => format!("{h:.0} %"),
            None => MISSING.to_string(),
        }
    }

    /// Format surface pressure with unit, or the placeholder
    #[must_use]
    pub fn format_pressure(&self) -> String {
        match self.surface_pressure {
            Some(p) => format!("{p:.1} hPa"),
            None => MISSING.to_string(),
        }
    }

    /// Format UV index, or the placeholder
    #[must_use]
    pub fn format_uv_index(&self) -> String {
        match self.uv_index {
            Some(uv) => format!("{uv:.1}"),
            None => MISSING.to_string(),
        }
    }
}

/// Air quality snapshot with pollutant sub-indices
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct AirQuality {
    /// European air quality index (0-100+)
    pub european_aqi: Option<f32>,
    /// Particulate matter < 2.5 µm in µg/m³
    pub pm2_5: Option<f32>,
    /// Particulate matter < 10 µm in µg/m³
    pub pm10: Option<f32>,
    /// Ozone in µg/m³
    pub ozone: Option<f32>,
    /// Nitrogen dioxide in µg/m³
    pub nitrogen_dioxide: Option<f32>,
    /// Sulphur dioxide in µg/m³
    pub sulphur_dioxide: Option<f32>,
    /// Carbon monoxide in µg/m³
    pub carbon_monoxide: Option<f32>,
}

impl AirQuality {
    /// Map the european AQI value onto its severity band (1-6).
    ///
    /// Returns `None` when the index is missing or not a finite number.
    #[must_use]
    pub fn band(&self) -> Option<u8> {
        let aqi = self.european_aqi?;
        if !aqi.is_finite() || aqi < 0.0 {
            return None;
        }
        Some(match aqi {
            v if v < 20.0 => 1,
            v if v < 40.0 => 2,
            v if v < 60.0 => 3,
            v if v < 80.0 => 4,
            v if v <= 100.0 => 5,
            _ => 6,
        })
    }

    /// Severity label for the current index, or "Unknown"
    #[must_use]
    pub fn label(&self) -> &'static str {
        match self.band() {
            Some(band) => aqi_band_label(band),
            None => "Unknown",
        }
    }
}

/// Map an air quality severity band (1-6) to its label.
///
/// Any value outside the defined range maps to "Unknown".
#[must_use]
pub fn aqi_band_label(band: u8) -> &'static str {
    match band {
        1 => "Good",
        2 => "Fair",
        3 => "Moderate",
        4 => "Poor",
        5 => "Very Poor",
        6 => "Severe",
        _ => "Unknown",
    }
}

const CARDINALS: [&str; 16] = [
    "N", "NNE", "NE", "ENE", "E", "ESE", "SE", "SSE", "S", "SSW", "SW", "WSW", "W", "WNW", "NW",
    "NNW",
];

/// Convert wind direction degrees to a 16-point compass label.
///
/// Sectors are 22.5° wide and centered on the cardinal angle, so N covers
/// 348.75° through 11.24° and both 0° and 360° map to N. Values outside
/// 0-360 map to "Unknown".
#[must_use]
pub fn wind_direction_to_cardinal(degrees: f32) -> &'static str {
    if !degrees.is_finite() || !(0.0..=360.0).contains(&degrees) {
        return "Unknown";
    }
    let index = ((f64::from(degrees) / 22.5) + 0.5).floor() as usize % 16;
    CARDINALS[index]
}

/// Convert a WMO weather code to a human-readable description
#[must_use]
pub fn weather_code_to_description(code: u8) -> &'static str {
    match code {
        0 => "Clear sky",
        1 => "Mainly clear",
        2 => "Partly cloudy",
        3 => "Overcast",
        45 => "Fog",
        48 => "Depositing rime fog",
        51 => "Light drizzle",
        53 => "Moderate drizzle",
        55 => "Dense drizzle",
        56 => "Light freezing drizzle",
        57 => "Dense freezing drizzle",
        61 => "Slight rain",
        63 => "Moderate rain",
        65 => "Heavy rain",
        66 => "Light freezing rain",
        67 => "Heavy freezing rain",
        71 => "Slight snow fall",
        73 => "Moderate snow fall",
        75 => "Heavy snow fall",
        77 => "Snow grains",
        80 => "Slight rain showers",
        81 => "Moderate rain showers",
        82 => "Violent rain showers",
        85 => "Slight snow showers",
        86 => "Heavy snow showers",
        95 => "Thunderstorm",
        96 => "Thunderstorm with slight hail",
        99 => "Thunderstorm with heavy hail",
        _ => "Unknown",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(348.75, "N")]
    #[case(11.25, "NNE")]
    #[case(33.75, "NE")]
    #[case(56.25, "ENE")]
    #[case(78.75, "E")]
    #[case(101.25, "ESE")]
    #[case(123.75, "SE")]
    #[case(146.25, "SSE")]
    #[case(168.75, "S")]
    #[case(191.25, "SSW")]
    #[case(213.75, "SW")]
    #[case(236.25, "WSW")]
    #[case(258.75, "W")]
    #[case(281.25, "WNW")]
    #[case(303.75, "NW")]
    #[case(326.25, "NNW")]
    fn test_cardinal_sector_start(#[case] degrees: f32, #[case] expected: &str) {
        assert_eq!(wind_direction_to_cardinal(degrees), expected);
    }

    #[rstest]
    #[case(0.0, "N")]
    #[case(360.0, "N")]
    #[case(11.24, "N")]
    #[case(348.74, "NNW")]
    #[case(90.0, "E")]
    #[case(180.0, "S")]
    #[case(270.0, "W")]
    fn test_cardinal_well_known(#[case] degrees: f32, #[case] expected: &str) {
        assert_eq!(wind_direction_to_cardinal(degrees), expected);
    }

    #[test]
    fn test_cardinal_out_of_range() {
        assert_eq!(wind_direction_to_cardinal(-1.0), "Unknown");
        assert_eq!(wind_direction_to_cardinal(360.01), "Unknown");
        assert_eq!(wind_direction_to_cardinal(f32::NAN), "Unknown");
    }

    #[rstest]
    #[case(1, "Good")]
    #[case(2, "Fair")]
    #[case(3, "Moderate")]
    #[case(4, "Poor")]
    #[case(5, "Very Poor")]
    #[case(6, "Severe")]
    #[case(0, "Unknown")]
    #[case(7, "Unknown")]
    fn test_aqi_band_labels(#[case] band: u8, #[case] expected: &str) {
        assert_eq!(aqi_band_label(band), expected);
    }

    #[test]
    fn test_aqi_banding() {
        let aq = AirQuality {
            european_aqi: Some(15.0),
            ..AirQuality::default()
        };
        assert_eq!(aq.band(), Some(1));
        assert_eq!(aq.label(), "Good");

        let aq = AirQuality {
            european_aqi: Some(100.0),
            ..AirQuality::default()
        };
        assert_eq!(aq.band(), Some(5));

        let aq = AirQuality {
            european_aqi: Some(140.0),
            ..AirQuality::default()
        };
        assert_eq!(aq.label(), "Severe");

        let aq = AirQuality::default();
        assert_eq!(aq.band(), None);
        assert_eq!(aq.label(), "Unknown");
    }

    #[test]
    fn test_missing_fields_render_placeholder() {
        let conditions = CurrentConditions::default();
        assert_eq!(conditions.format_temperature(), MISSING);
        assert_eq!(conditions.format_humidity(), MISSING);
        assert_eq!(conditions.format_pressure(), MISSING);
        assert_eq!(conditions.format_uv_index(), MISSING);
        assert_eq!(conditions.format_wind(), "-- --");
    }

    #[test]
    fn test_present_fields_format_with_units() {
        let conditions = CurrentConditions {
            temperature: Some(31.4),
            relative_humidity: Some(78.0),
            wind_speed: Some(12.0),
            wind_direction: Some(90.0),
            wind_gusts: Some(20.5),
            surface_pressure: Some(1008.2),
            ..CurrentConditions::default()
        };
        assert_eq!(conditions.format_temperature(), "31.4 °C");
        assert_eq!(conditions.format_humidity(), "78 %");
        assert_eq!(conditions.format_wind(), "12.0 km/h E (gusts 20.5 km/h)");
        assert_eq!(conditions.format_pressure(), "1008.2 hPa");
    }

    #[test]
    fn test_weather_code_descriptions() {
        assert_eq!(weather_code_to_description(0), "Clear sky");
        assert_eq!(weather_code_to_description(95), "Thunderstorm");
        assert_eq!(weather_code_to_description(42), "Unknown");
    }
}
