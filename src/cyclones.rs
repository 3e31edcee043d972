//! Tropical cyclone track retrieval from the GDACS feed
//!
//! The feed returns point and line GeoJSON features for ongoing events. Any
//! failure yields an empty list so the overlay is simply absent.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest_middleware::ClientWithMiddleware;
use serde::Deserialize;
use tracing::{debug, instrument, warn};

use crate::cache;
use crate::config::HazardWatchConfig;
use crate::http;
use crate::models::Feature;

#[derive(Debug, Deserialize)]
struct TrackResponse {
    #[serde(default)]
    features: Vec<Feature>,
}

/// Client for the cyclone tracking feed
pub struct CycloneClient {
    client: ClientWithMiddleware,
    feed_url: String,
    ttl: Duration,
}

impl CycloneClient {
    /// Create a new cyclone client from configuration
    pub fn new(config: &HazardWatchConfig) -> Result<Self> {
        let client =
            http::build_client(config.cyclones.timeout_seconds, config.cyclones.max_retries)?;
        Ok(Self {
            client,
            feed_url: config.cyclones.feed_url.clone(),
            ttl: Duration::from_secs(u64::from(config.cyclones.ttl_minutes) * 60),
        })
    }

    /// Track features for ongoing cyclones; empty when the feed is down
    #[instrument(skip(self))]
    pub async fn active_tracks(&self) -> Vec<Feature> {
        const KEY: &str = "cyclones:ongoing";
        // Track features keep untyped `serde_json::Value` fields, which
        // postcard cannot round-trip, so they cache as JSON text.
        match cache::get::<String>(KEY).await {
            Ok(Some(cached)) => match serde_json::from_str::<Vec<Feature>>(&cached) {
                Ok(features) => {
                    debug!("Cyclone tracks served from cache");
                    return features;
                }
                Err(e) => warn!("Discarding corrupt cyclone cache entry: {}", e),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed for cyclone tracks: {:#}", e),
        }

        match self.fetch().await {
            Ok(features) => {
                match serde_json::to_string(&features) {
                    Ok(raw) => {
                        if let Err(e) = cache::put(KEY, raw, self.ttl).await {
                            warn!("Failed to cache cyclone tracks: {:#}", e);
                        }
                    }
                    Err(e) => warn!("Failed to encode cyclone tracks for caching: {}", e),
                }
                features
            }
            Err(e) => {
                warn!("Cyclone feed unavailable: {:#}", e);
                Vec::new()
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Feature>> {
        let response = self
            .client
            .get(&self.feed_url)
            .send()
            .await?
            .error_for_status()
            .with_context(|| "Cyclone feed request failed")?;

        let parsed: TrackResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse cyclone feed response")?;
        Ok(parsed.features)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_track_response_parses_features() {
        let json = r#"{
            "type": "FeatureCollection",
            "features": [
                {
                    "type": "Feature",
                    "geometry": {"type": "Point", "coordinates": [125.3, 13.1]},
                    "properties": {"eventname": "PAENG", "eventtype": "TC"}
                },
                {
                    "type": "Feature",
                    "geometry": {"type": "LineString", "coordinates": [[125.3, 13.1], [124.0, 14.0]]},
                    "properties": {"eventname": "PAENG"}
                }
            ]
        }"#;
        let parsed: TrackResponse = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.features.len(), 2);
        assert_eq!(parsed.features[0].property_str("eventname"), Some("PAENG"));
    }

    #[test]
    fn test_track_response_without_features_is_empty() {
        let parsed: TrackResponse = serde_json::from_str(r#"{"type": "FeatureCollection"}"#).unwrap();
        assert!(parsed.features.is_empty());
    }
}
