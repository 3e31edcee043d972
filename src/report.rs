//! Terminal report rendering
//!
//! One report run mirrors one dashboard render: resolve the location, then
//! fetch and print each panel. A panel whose feed fails renders an inline
//! error in that panel only; every other panel still prints.

use anyhow::Result;
use chrono::Local;
use clap::ValueEnum;

use crate::config::HazardWatchConfig;
use crate::cyclones::CycloneClient;
use crate::geocoding::GeocodingClient;
use crate::hazards::{HazardClient, HazardKind};
use crate::models::weather::MISSING;
use crate::models::{AirQuality, CurrentConditions, DailySeries, Feature, FeatureCollection, HourlySeries, Location};
use crate::weather::WeatherClient;
use crate::HazardWatchError;

/// Which forecast panel to render
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ForecastMode {
    Current,
    Hourly,
    Daily,
}

/// One report run's inputs
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub place: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub mode: ForecastMode,
    pub hazards: Vec<HazardKind>,
    pub include_cyclones: bool,
}

/// Run a full report against the configured feeds and print it
pub async fn run(config: &HazardWatchConfig, request: ReportRequest) -> Result<()> {
    let geocoding = GeocodingClient::new(config)?;
    let weather = WeatherClient::new(config)?;
    let hazard_client = HazardClient::new(config)?;
    let cyclone_client = CycloneClient::new(config)?;

    let fallback = match (request.latitude, request.longitude) {
        (Some(lat), Some(lon)) => Location::new(lat, lon, format!("{lat:.4}, {lon:.4}")),
        _ => Location::with_country(
            config.defaults.latitude,
            config.defaults.longitude,
            config.defaults.place_name.clone(),
            "PH".to_string(),
        ),
    };

    let location = match &request.place {
        Some(place) => {
            let resolution = geocoding.resolve(place, &fallback).await;
            if resolution.matched {
                println!("Location matched: {}", resolution.location.name);
            } else {
                println!(
                    "Location not found, using {} ({})",
                    fallback.name,
                    fallback.format_coordinates()
                );
            }
            resolution.location
        }
        None => fallback,
    };

    println!();
    println!("PH Weather & Hazard Monitor");
    println!(
        "{} ({})  generated {}",
        location.name,
        location.format_coordinates(),
        Local::now().format("%Y-%m-%d %H:%M")
    );
    println!();

    match request.mode {
        ForecastMode::Current => {
            let air = weather.air_quality(&location).await.ok();
            match weather.current(&location).await {
                Ok(conditions) => print!("{}", current_panel(&conditions, air.as_ref())),
                Err(e) => print!("{}", panel_error("Current Weather", &e)),
            }
        }
        ForecastMode::Hourly => match weather.hourly(&location).await {
            Ok(series) => print!("{}", hourly_panel(&series)),
            Err(e) => print!("{}", panel_error("Hourly Forecast", &e)),
        },
        ForecastMode::Daily => match weather.daily(&location).await {
            Ok(series) => print!("{}", daily_panel(&series)),
            Err(e) => print!("{}", panel_error("Daily Forecast", &e)),
        },
    }

    if !request.hazards.is_empty() {
        println!();
        println!("Hazard Layers");
        for kind in &request.hazards {
            let collection = hazard_client.fetch(*kind).await;
            println!("{}", hazard_line(*kind, &collection));
        }
    }

    if request.include_cyclones {
        let tracks = cyclone_client.active_tracks().await;
        println!();
        print!("{}", cyclone_panel(&tracks));
    }

    Ok(())
}

/// Render the current-conditions panel
#[must_use]
pub fn current_panel(conditions: &CurrentConditions, air: Option<&AirQuality>) -> String {
    let mut out = String::new();
    out.push_str("Current Weather");
    if let Some(time) = &conditions.time {
        out.push_str(&format!("  ({time})"));
    }
    out.push('\n');
    out.push_str(&format!("  Conditions    {}\n", conditions.description));
    out.push_str(&format!(
        "  Temperature   {}\n",
        conditions.format_temperature()
    ));
    out.push_str(&format!("  Humidity      {}\n", conditions.format_humidity()));
    out.push_str(&format!("  Wind          {}\n", conditions.format_wind()));
    out.push_str(&format!(
        "  Pressure      {}\n",
        conditions.format_pressure()
    ));
    out.push_str(&format!(
        "  UV Index      {}\n",
        conditions.format_uv_index()
    ));
    match air {
        Some(air) => {
            let index = air
                .european_aqi
                .map_or_else(|| MISSING.to_string(), |v| format!("{v:.0}"));
            out.push_str(&format!("  Air Quality   {} ({index})\n", air.label()));
        }
        None => out.push_str(&format!("  Air Quality   {MISSING}\n")),
    }
    out
}

/// Render the hourly forecast table
#[must_use]
pub fn hourly_panel(series: &HourlySeries) -> String {
    let mut out = String::new();
    out.push_str(&format!("Hourly Forecast ({}h)\n", series.len()));
    out.push_str("  time              temp °C  rain mm  wind km/h  humid %\n");
    for row in series.rows() {
        out.push_str(&format!(
            "  {:<16} {} {} {}  {}\n",
            row.time,
            cell(row.temperature),
            cell(row.precipitation),
            cell(row.wind_speed),
            cell(row.relative_humidity),
        ));
    }
    if series.is_empty() {
        out.push_str("  (no data)\n");
    }
    out
}

/// Render the daily forecast table
#[must_use]
pub fn daily_panel(series: &DailySeries) -> String {
    let mut out = String::new();
    out.push_str(&format!("Daily Forecast ({}d)\n", series.len()));
    out.push_str("  date         max °C   min °C  rain mm  wind km/h\n");
    for row in series.rows() {
        out.push_str(&format!(
            "  {:<10} {} {} {} {}\n",
            row.time,
            cell(row.temperature_max),
            cell(row.temperature_min),
            cell(row.precipitation_sum),
            cell(row.wind_speed_max),
        ));
    }
    if series.is_empty() {
        out.push_str("  (no data)\n");
    }
    out
}

/// One summary line per hazard layer
#[must_use]
pub fn hazard_line(kind: HazardKind, collection: &FeatureCollection) -> String {
    if collection.is_empty() {
        format!("  {:<26} layer unavailable", kind.label())
    } else {
        format!("  {:<26} {} zones", kind.label(), collection.len())
    }
}

/// Render the cyclone overlay panel
#[must_use]
pub fn cyclone_panel(tracks: &[Feature]) -> String {
    let mut out = String::new();
    out.push_str("Typhoon Tracks\n");
    if tracks.is_empty() {
        out.push_str("  No ongoing tropical cyclones (or feed unavailable)\n");
        return out;
    }
    let mut names: Vec<&str> = tracks
        .iter()
        .filter_map(|feature| feature.property_str("eventname"))
        .collect();
    names.sort_unstable();
    names.dedup();
    if names.is_empty() {
        out.push_str(&format!("  {} track features\n", tracks.len()));
    } else {
        for name in names {
            out.push_str(&format!("  {name}\n"));
        }
    }
    out
}

/// Render a failed panel as an inline error instead of aborting the report
#[must_use]
pub fn panel_error(title: &str, error: &anyhow::Error) -> String {
    let message = match error.downcast_ref::<HazardWatchError>() {
        Some(err) => err.user_message(),
        None => format!("{error:#}"),
    };
    format!("{title}\n  error: {message}\n")
}

fn cell(value: Option<f32>) -> String {
    match value {
        Some(v) => format!("{v:>8.1}"),
        None => format!("{MISSING:>8}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_current_panel_with_placeholders() {
        let panel = current_panel(&CurrentConditions::default(), None);
        assert!(panel.contains("Current Weather"));
        assert!(panel.contains(&format!("Temperature   {MISSING}")));
        assert!(panel.contains(&format!("Air Quality   {MISSING}")));
    }

    #[test]
    fn test_current_panel_with_data() {
        let conditions = CurrentConditions {
            time: Some("2026-08-29T12:00".to_string()),
            temperature: Some(31.0),
            relative_humidity: Some(70.0),
            description: "Partly cloudy".to_string(),
            ..CurrentConditions::default()
        };
        let air = AirQuality {
            european_aqi: Some(25.0),
            ..AirQuality::default()
        };
        let panel = current_panel(&conditions, Some(&air));
        assert!(panel.contains("31.0 °C"));
        assert!(panel.contains("Partly cloudy"));
        assert!(panel.contains("Fair (25)"));
    }

    #[test]
    fn test_hourly_panel_rows_and_empty() {
        let series = HourlySeries {
            time: vec!["2026-08-29T00:00".to_string()],
            temperature: Some(vec![Some(27.5)]),
            ..HourlySeries::default()
        };
        let panel = hourly_panel(&series);
        assert!(panel.contains("2026-08-29T00:00"));
        assert!(panel.contains("27.5"));
        assert!(panel.contains(MISSING));

        assert!(hourly_panel(&HourlySeries::default()).contains("(no data)"));
    }

    #[test]
    fn test_hazard_line_states() {
        let empty = FeatureCollection::empty();
        assert!(hazard_line(HazardKind::Flood, &empty).contains("layer unavailable"));

        let collection = FeatureCollection::from_features(vec![Feature {
            feature_type: "Feature".to_string(),
            geometry: None,
            properties: None,
        }]);
        let line = hazard_line(HazardKind::Tsunami, &collection);
        assert!(line.contains("Tsunami Hazard"));
        assert!(line.contains("1 zones"));
    }

    #[test]
    fn test_cyclone_panel_names() {
        let tracks = vec![
            Feature {
                feature_type: "Feature".to_string(),
                geometry: None,
                properties: Some(json!({"eventname": "PAENG"})),
            },
            Feature {
                feature_type: "Feature".to_string(),
                geometry: None,
                properties: Some(json!({"eventname": "PAENG"})),
            },
        ];
        let panel = cyclone_panel(&tracks);
        assert_eq!(panel.matches("PAENG").count(), 1);

        assert!(cyclone_panel(&[]).contains("No ongoing tropical cyclones"));
    }

    #[test]
    fn test_panel_error_uses_user_message() {
        let error: anyhow::Error = HazardWatchError::feed("boom").into();
        let panel = panel_error("Current Weather", &error);
        assert!(panel.contains("Current Weather"));
        assert!(panel.contains("Unable to reach the upstream service"));
    }
}
