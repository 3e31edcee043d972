//! JSON API for the web dashboard
//!
//! Every panel of the frontend maps to one endpoint here. Feed failures that
//! have a configured empty default (hazard layers, cyclone tracks) return
//! that default with 200; the weather endpoints surface 502 with a
//! user-facing message the frontend renders inline in the affected panel.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Json},
    routing::{delete, get},
};
use serde::{Deserialize, Serialize};

use crate::cache;
use crate::config::{HazardWatchConfig, WindyConfig};
use crate::cyclones::CycloneClient;
use crate::geocoding::{GeocodingClient, GeocodingMatch};
use crate::hazards::{HazardClient, HazardKind};
use crate::models::{AirQuality, CurrentConditions, DailySeries, FeatureCollection, HourlySeries, Location};
use crate::weather::WeatherClient;
use crate::HazardWatchError;

/// Shared state behind every handler
pub struct AppState {
    config: HazardWatchConfig,
    geocoding: GeocodingClient,
    weather: WeatherClient,
    hazards: HazardClient,
    cyclones: CycloneClient,
    windy_key: String,
}

impl AppState {
    /// Build the state, failing fast when the Windy key is missing
    pub fn new(config: HazardWatchConfig) -> anyhow::Result<Self> {
        let windy_key = config.require_windy_key()?.to_string();
        Ok(Self {
            geocoding: GeocodingClient::new(&config)?,
            weather: WeatherClient::new(&config)?,
            hazards: HazardClient::new(&config)?,
            cyclones: CycloneClient::new(&config)?,
            windy_key,
            config,
        })
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/geocode", get(geocode))
        .route("/api/weather/current", get(current))
        .route("/api/weather/hourly", get(hourly))
        .route("/api/weather/daily", get(daily))
        .route("/api/air-quality", get(air_quality))
        .route("/api/hazards/{kind}", get(hazard_layer))
        .route("/api/cyclones", get(cyclones))
        .route("/api/cache", delete(clear_cache))
        .route("/windy", get(windy_page))
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct GeocodeQuery {
    q: String,
}

#[derive(Debug, Deserialize)]
struct Coords {
    lat: f64,
    lon: f64,
}

#[derive(Debug, Deserialize)]
struct WindyQuery {
    lat: Option<f64>,
    lon: Option<f64>,
    layer: Option<String>,
}

/// One hazard layer with its display metadata
#[derive(Debug, Serialize)]
pub struct LayerResponse {
    pub layer: &'static str,
    pub label: &'static str,
    pub color: &'static str,
    pub data: FeatureCollection,
}

#[derive(Debug, Serialize)]
struct CacheCleared {
    cleared: usize,
}

impl Coords {
    fn location(&self) -> Location {
        Location::new(self.lat, self.lon, format!("{:.4}, {:.4}", self.lat, self.lon))
    }
}

fn feed_error(error: anyhow::Error) -> (StatusCode, String) {
    let message = match error.downcast_ref::<HazardWatchError>() {
        Some(err) => err.user_message(),
        None => format!("{error:#}"),
    };
    (StatusCode::BAD_GATEWAY, message)
}

async fn geocode(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GeocodeQuery>,
) -> Result<Json<Vec<GeocodingMatch>>, (StatusCode, String)> {
    state
        .geocoding
        .search(&query.q)
        .await
        .map(Json)
        .map_err(feed_error)
}

async fn current(
    State(state): State<Arc<AppState>>,
    Query(coords): Query<Coords>,
) -> Result<Json<CurrentConditions>, (StatusCode, String)> {
    state
        .weather
        .current(&coords.location())
        .await
        .map(Json)
        .map_err(feed_error)
}

async fn hourly(
    State(state): State<Arc<AppState>>,
    Query(coords): Query<Coords>,
) -> Result<Json<HourlySeries>, (StatusCode, String)> {
    state
        .weather
        .hourly(&coords.location())
        .await
        .map(Json)
        .map_err(feed_error)
}

async fn daily(
    State(state): State<Arc<AppState>>,
    Query(coords): Query<Coords>,
) -> Result<Json<DailySeries>, (StatusCode, String)> {
    state
        .weather
        .daily(&coords.location())
        .await
        .map(Json)
        .map_err(feed_error)
}

async fn air_quality(
    State(state): State<Arc<AppState>>,
    Query(coords): Query<Coords>,
) -> Result<Json<AirQuality>, (StatusCode, String)> {
    state
        .weather
        .air_quality(&coords.location())
        .await
        .map(Json)
        .map_err(feed_error)
}

async fn hazard_layer(
    State(state): State<Arc<AppState>>,
    Path(kind): Path<String>,
) -> Result<Json<LayerResponse>, (StatusCode, String)> {
    let kind: HazardKind = kind
        .parse()
        .map_err(|message| (StatusCode::NOT_FOUND, message))?;
    let data = state.hazards.fetch(kind).await;
    Ok(Json(LayerResponse {
        layer: kind.slug(),
        label: kind.label(),
        color: kind.color(),
        data,
    }))
}

async fn cyclones(State(state): State<Arc<AppState>>) -> Json<FeatureCollection> {
    let tracks = state.cyclones.active_tracks().await;
    Json(FeatureCollection::from_features(tracks))
}

async fn clear_cache() -> Result<Json<CacheCleared>, (StatusCode, String)> {
    match cache::clear().await {
        Ok(cleared) => Ok(Json(CacheCleared { cleared })),
        Err(e) => Err((StatusCode::INTERNAL_SERVER_ERROR, format!("{e:#}"))),
    }
}

async fn windy_page(
    State(state): State<Arc<AppState>>,
    Query(query): Query<WindyQuery>,
) -> Html<String> {
    let lat = query.lat.unwrap_or(state.config.defaults.latitude);
    let lon = query.lon.unwrap_or(state.config.defaults.longitude);
    let layer = query
        .layer
        .filter(|layer| WindyConfig::LAYERS.contains(&layer.as_str()))
        .unwrap_or_else(|| state.config.windy.default_layer.clone());
    Html(windy_embed(&state.windy_key, lat, lon, &layer))
}

/// Build the Windy map-forecast embed page
#[must_use]
pub fn windy_embed(key: &str, lat: f64, lon: f64, layer: &str) -> String {
    format!(
        r#"<!doctype html>
<html>
<head><meta charset="utf-8"><title>Windy</title></head>
<body style="margin:0">
<div id="windy" style="width:100%;height:100vh;"></div>
<script src="https://api.windy.com/assets/map-forecast/libBoot.js"></script>
<script>
  const options = {{
    key: '{key}',
    lat: {lat},
    lon: {lon},
    zoom: 6,
    overlay: '{layer}'
  }};
  windyInit(options, windyAPI => {{
    const {{ picker }} = windyAPI;
    windyAPI.map.on('click', e => {{
      const {{ lat, lng }} = e.latlng;
      picker.open({{ lat: lat, lon: lng }});
    }});
  }});
</script>
</body>
</html>
"#
    )
}
