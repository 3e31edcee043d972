//! Weather and air-quality retrieval from the Open-Meteo forecast APIs
//!
//! Each operation is memoized in the persistent cache: current conditions
//! for a few minutes, the hourly/daily series and air quality for longer.
//! A failed fetch surfaces as an error on that panel only; the caller keeps
//! rendering everything else.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest_middleware::ClientWithMiddleware;
use tracing::{debug, instrument};

use crate::cache;
use crate::config::HazardWatchConfig;
use crate::http;
use crate::models::{AirQuality, CurrentConditions, DailySeries, HourlySeries, Location};
use crate::HazardWatchError;

const CURRENT_FIELDS: &str = "temperature_2m,relative_humidity_2m,apparent_temperature,\
precipitation,weather_code,cloud_cover,surface_pressure,wind_speed_10m,wind_direction_10m,\
wind_gusts_10m,uv_index";
const HOURLY_FIELDS: &str = "temperature_2m,precipitation,wind_speed_10m,relative_humidity_2m";
const DAILY_FIELDS: &str =
    "temperature_2m_max,temperature_2m_min,precipitation_sum,wind_speed_10m_max";
const AIR_QUALITY_FIELDS: &str = "european_aqi,pm10,pm2_5,carbon_monoxide,nitrogen_dioxide,\
sulphur_dioxide,ozone";

/// Client for the forecast and air-quality endpoints
pub struct WeatherClient {
    client: ClientWithMiddleware,
    base_url: String,
    air_quality_base_url: String,
    timezone: String,
    current_ttl: Duration,
    series_ttl: Duration,
}

impl WeatherClient {
    /// Create a new weather client from configuration
    pub fn new(config: &HazardWatchConfig) -> Result<Self> {
        let client =
            http::build_client(config.weather.timeout_seconds, config.weather.max_retries)?;
        Ok(Self {
            client,
            base_url: config.weather.base_url.clone(),
            air_quality_base_url: config.weather.air_quality_base_url.clone(),
            timezone: config.defaults.timezone.clone(),
            current_ttl: Duration::from_secs(u64::from(config.weather.current_ttl_minutes) * 60),
            series_ttl: Duration::from_secs(u64::from(config.weather.series_ttl_minutes) * 60),
        })
    }

    /// Current conditions for a location
    #[instrument(skip(self), fields(place = %location.name))]
    pub async fn current(&self, location: &Location) -> Result<CurrentConditions> {
        let key = location.cache_key("current");
        if let Some(cached) = cache::get::<CurrentConditions>(&key).await? {
            debug!("Current conditions served from cache");
            return Ok(cached);
        }

        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&current={}&timezone={}",
            self.base_url,
            location.latitude,
            location.longitude,
            CURRENT_FIELDS,
            urlencoding::encode(&self.timezone)
        );
        let response: openmeteo::ForecastResponse = self.fetch_json(&url).await?;

        let current = response.current.ok_or_else(|| {
            HazardWatchError::feed("No current weather data in forecast response")
        })?;
        let conditions = CurrentConditions::from(current);

        cache::put(&key, conditions.clone(), self.current_ttl).await?;
        Ok(conditions)
    }

    /// 48-hour hourly forecast for a location
    #[instrument(skip(self), fields(place = %location.name))]
    pub async fn hourly(&self, location: &Location) -> Result<HourlySeries> {
        let key = location.cache_key("hourly");
        if let Some(cached) = cache::get::<HourlySeries>(&key).await? {
            debug!("Hourly series served from cache");
            return Ok(cached);
        }

        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&hourly={}&forecast_days=2&timezone={}",
            self.base_url,
            location.latitude,
            location.longitude,
            HOURLY_FIELDS,
            urlencoding::encode(&self.timezone)
        );
        let response: openmeteo::ForecastResponse = self.fetch_json(&url).await?;

        let series = response
            .hourly
            .map(HourlySeries::from)
            .unwrap_or_default();

        cache::put(&key, series.clone(), self.series_ttl).await?;
        Ok(series)
    }

    /// 7-day daily forecast for a location
    #[instrument(skip(self), fields(place = %location.name))]
    pub async fn daily(&self, location: &Location) -> Result<DailySeries> {
        let key = location.cache_key("daily");
        if let Some(cached) = cache::get::<DailySeries>(&key).await? {
            debug!("Daily series served from cache");
            return Ok(cached);
        }

        let url = format!(
            "{}/v1/forecast?latitude={}&longitude={}&daily={}&forecast_days=7&timezone={}",
            self.base_url,
            location.latitude,
            location.longitude,
            DAILY_FIELDS,
            urlencoding::encode(&self.timezone)
        );
        let response: openmeteo::ForecastResponse = self.fetch_json(&url).await?;

        let series = response.daily.map(DailySeries::from).unwrap_or_default();

        cache::put(&key, series.clone(), self.series_ttl).await?;
        Ok(series)
    }

    /// Current air quality for a location
    #[instrument(skip(self), fields(place = %location.name))]
    pub async fn air_quality(&self, location: &Location) -> Result<AirQuality> {
        let key = location.cache_key("air");
        if let Some(cached) = cache::get::<AirQuality>(&key).await? {
            debug!("Air quality served from cache");
            return Ok(cached);
        }

        let url = format!(
            "{}/v1/air-quality?latitude={}&longitude={}&current={}&timezone={}",
            self.air_quality_base_url,
            location.latitude,
            location.longitude,
            AIR_QUALITY_FIELDS,
            urlencoding::encode(&self.timezone)
        );
        let response: openmeteo::AirQualityResponse = self.fetch_json(&url).await?;

        let air = response.current.map(AirQuality::from).unwrap_or_default();

        cache::put(&key, air.clone(), self.series_ttl).await?;
        Ok(air)
    }

    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<T> {
        let response = self
            .client
            .get(url)
            .send()
            .await?
            .error_for_status()
            .with_context(|| "Weather request failed")?;
        response
            .json()
            .await
            .with_context(|| "Failed to parse weather response")
    }
}

/// Open-Meteo API response structures and conversions
mod openmeteo {
    use serde::Deserialize;

    use crate::models::weather::weather_code_to_description;
    use crate::models::{AirQuality, CurrentConditions, DailySeries, HourlySeries};

    #[derive(Debug, Deserialize)]
    pub struct ForecastResponse {
        pub current: Option<CurrentData>,
        pub hourly: Option<HourlyData>,
        pub daily: Option<DailyData>,
    }

    /// Current conditions block; every field optional so a sparse response
    /// still parses
    #[derive(Debug, Deserialize)]
    pub struct CurrentData {
        pub time: Option<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<f32>,
        pub apparent_temperature: Option<f32>,
        #[serde(rename = "relative_humidity_2m")]
        pub relative_humidity: Option<f32>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<f32>,
        #[serde(rename = "wind_direction_10m")]
        pub wind_direction: Option<f32>,
        #[serde(rename = "wind_gusts_10m")]
        pub wind_gusts: Option<f32>,
        pub precipitation: Option<f32>,
        pub cloud_cover: Option<f32>,
        pub surface_pressure: Option<f32>,
        pub uv_index: Option<f32>,
        pub weather_code: Option<u8>,
    }

    #[derive(Debug, Deserialize)]
    pub struct HourlyData {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m")]
        pub temperature: Option<Vec<Option<f32>>>,
        pub precipitation: Option<Vec<Option<f32>>>,
        #[serde(rename = "wind_speed_10m")]
        pub wind_speed: Option<Vec<Option<f32>>>,
        #[serde(rename = "relative_humidity_2m")]
        pub relative_humidity: Option<Vec<Option<f32>>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct DailyData {
        #[serde(default)]
        pub time: Vec<String>,
        #[serde(rename = "temperature_2m_max")]
        pub temperature_max: Option<Vec<Option<f32>>>,
        #[serde(rename = "temperature_2m_min")]
        pub temperature_min: Option<Vec<Option<f32>>>,
        pub precipitation_sum: Option<Vec<Option<f32>>>,
        #[serde(rename = "wind_speed_10m_max")]
        pub wind_speed_max: Option<Vec<Option<f32>>>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AirQualityResponse {
        pub current: Option<AirQualityData>,
    }

    #[derive(Debug, Deserialize)]
    pub struct AirQualityData {
        pub european_aqi: Option<f32>,
        pub pm2_5: Option<f32>,
        pub pm10: Option<f32>,
        pub ozone: Option<f32>,
        pub nitrogen_dioxide: Option<f32>,
        pub sulphur_dioxide: Option<f32>,
        pub carbon_monoxide: Option<f32>,
    }

    impl From<CurrentData> for CurrentConditions {
        fn from(data: CurrentData) -> Self {
            let description = data
                .weather_code
                .map(weather_code_to_description)
                .unwrap_or("Unknown")
                .to_string();
            CurrentConditions {
                time: data.time,
                temperature: data.temperature,
                apparent_temperature: data.apparent_temperature,
                relative_humidity: data.relative_humidity,
                wind_speed: data.wind_speed,
                wind_direction: data.wind_direction,
                wind_gusts: data.wind_gusts,
                precipitation: data.precipitation,
                cloud_cover: data.cloud_cover,
                surface_pressure: data.surface_pressure,
                uv_index: data.uv_index,
                weather_code: data.weather_code,
                description,
            }
        }
    }

    impl From<HourlyData> for HourlySeries {
        fn from(data: HourlyData) -> Self {
            HourlySeries {
                time: data.time,
                temperature: data.temperature,
                precipitation: data.precipitation,
                wind_speed: data.wind_speed,
                relative_humidity: data.relative_humidity,
            }
        }
    }

    impl From<DailyData> for DailySeries {
        fn from(data: DailyData) -> Self {
            DailySeries {
                time: data.time,
                temperature_max: data.temperature_max,
                temperature_min: data.temperature_min,
                precipitation_sum: data.precipitation_sum,
                wind_speed_max: data.wind_speed_max,
            }
        }
    }

    impl From<AirQualityData> for AirQuality {
        fn from(data: AirQualityData) -> Self {
            AirQuality {
                european_aqi: data.european_aqi,
                pm2_5: data.pm2_5,
                pm10: data.pm10,
                ozone: data.ozone,
                nitrogen_dioxide: data.nitrogen_dioxide,
                sulphur_dioxide: data.sulphur_dioxide,
                carbon_monoxide: data.carbon_monoxide,
            }
        }
    }

    #[cfg(test)]
    mod tests {
        use super::*;

        #[test]
        fn test_sparse_current_block_parses() {
            // Only temperature present; everything else should be None
            let json = r#"{"current": {"temperature_2m": 30.5}}"#;
            let response: ForecastResponse = serde_json::from_str(json).unwrap();
            let conditions = CurrentConditions::from(response.current.unwrap());
            assert_eq!(conditions.temperature, Some(30.5));
            assert!(conditions.wind_speed.is_none());
            assert!(conditions.uv_index.is_none());
            assert_eq!(conditions.description, "Unknown");
        }

        #[test]
        fn test_full_current_block_parses() {
            let json = r#"{
                "current": {
                    "time": "2026-08-29T12:00",
                    "temperature_2m": 31.2,
                    "relative_humidity_2m": 75,
                    "wind_speed_10m": 14.5,
                    "wind_direction_10m": 250,
                    "surface_pressure": 1006.0,
                    "uv_index": 8.5,
                    "weather_code": 80
                }
            }"#;
            let response: ForecastResponse = serde_json::from_str(json).unwrap();
            let conditions = CurrentConditions::from(response.current.unwrap());
            assert_eq!(conditions.relative_humidity, Some(75.0));
            assert_eq!(conditions.description, "Slight rain showers");
        }

        #[test]
        fn test_hourly_block_into_series() {
            let json = r#"{
                "hourly": {
                    "time": ["2026-08-29T00:00"],
                    "temperature_2m": [27.9],
                    "precipitation": [null]
                }
            }"#;
            let response: ForecastResponse = serde_json::from_str(json).unwrap();
            let series = HourlySeries::from(response.hourly.unwrap());
            assert_eq!(series.len(), 1);
            let rows = series.rows();
            assert_eq!(rows[0].temperature, Some(27.9));
            assert_eq!(rows[0].precipitation, None);
            assert_eq!(rows[0].wind_speed, None);
        }

        #[test]
        fn test_air_quality_block_into_snapshot() {
            let json = r#"{"current": {"european_aqi": 35.0, "pm2_5": 14.2}}"#;
            let response: AirQualityResponse = serde_json::from_str(json).unwrap();
            let air = AirQuality::from(response.current.unwrap());
            assert_eq!(air.band(), Some(2));
            assert_eq!(air.label(), "Fair");
            assert_eq!(air.pm2_5, Some(14.2));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    #[test]
    fn test_field_lists_are_well_formed() {
        for fields in [CURRENT_FIELDS, HOURLY_FIELDS, DAILY_FIELDS, AIR_QUALITY_FIELDS] {
            assert!(!fields.contains(' '));
            assert!(!fields.contains(",,"));
            assert!(!fields.ends_with(','));
        }
    }

    /// Serve one canned forecast response per connection, counting hits
    async fn spawn_counting_stub(body: &'static str) -> (std::net::SocketAddr, Arc<AtomicUsize>) {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        tokio::spawn(async move {
            loop {
                let (mut socket, _) = listener.accept().await.unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\n\
                     content-length: {}\r\nconnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
            }
        });
        (addr, hits)
    }

    #[tokio::test(flavor = "multi_thread")]
    async fn test_warm_cache_skips_network() {
        let dir = tempfile::TempDir::new().unwrap();
        cache::init(dir.path().join("cache")).unwrap();

        let (addr, hits) =
            spawn_counting_stub(r#"{"current": {"temperature_2m": 30.0}}"#).await;

        let mut config = HazardWatchConfig::default();
        config.weather.base_url = format!("http://{addr}");
        let client = WeatherClient::new(&config).unwrap();
        let location = Location::default();

        let first = client.current(&location).await.unwrap();
        let second = client.current(&location).await.unwrap();
        assert_eq!(first.temperature, Some(30.0));
        assert_eq!(second.temperature, Some(30.0));
        // Second call inside the TTL window must not hit the stub
        assert_eq!(hits.load(Ordering::SeqCst), 1);
    }
}
