//! Hazard layer retrieval from government ArcGIS feature services
//!
//! Each hazard kind queries a fixed feature-service URL with `where=1=1` and
//! a capped result count. Flood has a secondary source tried when the
//! primary fails. A layer that cannot be fetched from any source degrades to
//! an empty feature collection with a logged warning, so the map renders
//! without it. Successful fetches are cached with a jittered TTL so the
//! layers do not all expire in the same render.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::ValueEnum;
use rand::RngExt;
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache;
use crate::config::HazardWatchConfig;
use crate::http;
use crate::models::FeatureCollection;

const FLOOD_URL: &str = "https://controlmap.mgb.gov.ph/arcgis/rest/services/GeospatialDataInventory/GDI_Detailed_Flood_Susceptibility/FeatureServer/0/query";
const FLOOD_FALLBACK_URL: &str = "https://hazardhunter.georisk.gov.ph/server/rest/services/Flood/Flood_Hazard/MapServer/0/query";
const LANDSLIDE_URL: &str = "https://hazardhunter.georisk.gov.ph/server/rest/services/Landslide/Rain_Induced_Landslide_Hazard/MapServer/0/query";
const TSUNAMI_URL: &str = "https://hazardhunter.georisk.gov.ph/server/rest/services/Tsunami/Tsunami_Hazard/MapServer/0/query";
const RAINFALL_URL: &str = "https://portal.georisk.gov.ph/arcgis/rest/services/PAGASA/PAGASA/MapServer/0/query";

/// The hazard layers the dashboard can show
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum HazardKind {
    Flood,
    Landslide,
    Tsunami,
    RainfallRadar,
}

impl HazardKind {
    pub const ALL: [HazardKind; 4] = [
        HazardKind::Flood,
        HazardKind::Landslide,
        HazardKind::Tsunami,
        HazardKind::RainfallRadar,
    ];

    /// Primary feature-service query URL
    #[must_use]
    pub fn primary_url(self) -> &'static str {
        match self {
            HazardKind::Flood => FLOOD_URL,
            HazardKind::Landslide => LANDSLIDE_URL,
            HazardKind::Tsunami => TSUNAMI_URL,
            HazardKind::RainfallRadar => RAINFALL_URL,
        }
    }

    /// Secondary source tried when the primary fails
    #[must_use]
    pub fn fallback_url(self) -> Option<&'static str> {
        match self {
            HazardKind::Flood => Some(FLOOD_FALLBACK_URL),
            _ => None,
        }
    }

    /// Human-readable layer name
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            HazardKind::Flood => "Flood Susceptibility",
            HazardKind::Landslide => "Rain-Induced Landslide",
            HazardKind::Tsunami => "Tsunami Hazard",
            HazardKind::RainfallRadar => "Rainfall Radar",
        }
    }

    /// Static display color for map rendering
    #[must_use]
    pub fn color(self) -> &'static str {
        match self {
            HazardKind::Flood => "#1f77b4",
            HazardKind::Landslide => "#8c564b",
            HazardKind::Tsunami => "#9467bd",
            HazardKind::RainfallRadar => "#2ca02c",
        }
    }

    /// URL/cache-key slug
    #[must_use]
    pub fn slug(self) -> &'static str {
        match self {
            HazardKind::Flood => "flood",
            HazardKind::Landslide => "landslide",
            HazardKind::Tsunami => "tsunami",
            HazardKind::RainfallRadar => "rainfall-radar",
        }
    }
}

impl FromStr for HazardKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        HazardKind::ALL
            .into_iter()
            .find(|kind| kind.slug() == s)
            .ok_or_else(|| format!("Unknown hazard layer: {s}"))
    }
}

/// Client for the hazard feature services
pub struct HazardClient {
    client: ClientWithMiddleware,
    page_size: u32,
    ttl: Duration,
}

impl HazardClient {
    /// Create a new hazard client from configuration
    pub fn new(config: &HazardWatchConfig) -> Result<Self> {
        let client =
            http::build_client(config.hazards.timeout_seconds, config.hazards.max_retries)?;
        Ok(Self {
            client,
            page_size: config.hazards.page_size,
            ttl: Duration::from_secs(u64::from(config.hazards.ttl_minutes) * 60),
        })
    }

    /// Fetch a hazard layer, substituting an empty collection when every
    /// source fails
    #[instrument(skip(self), fields(layer = kind.slug()))]
    pub async fn fetch(&self, kind: HazardKind) -> FeatureCollection {
        // GeoJSON keeps untyped `serde_json::Value` fields, which postcard
        // cannot round-trip, so layers cache as JSON text.
        let key = format!("hazard:{}", kind.slug());
        match cache::get::<String>(&key).await {
            Ok(Some(cached)) => match serde_json::from_str::<FeatureCollection>(&cached) {
                Ok(collection) => {
                    debug!("Hazard layer served from cache");
                    return collection;
                }
                Err(e) => warn!("Discarding corrupt cache entry for {}: {}", kind.label(), e),
            },
            Ok(None) => {}
            Err(e) => warn!("Cache lookup failed for {}: {:#}", kind.label(), e),
        }

        let collection = match self.query(kind.primary_url()).await {
            Ok(collection) => collection,
            Err(primary_err) => {
                warn!(
                    "Primary source for {} failed: {:#}",
                    kind.label(),
                    primary_err
                );
                match kind.fallback_url() {
                    Some(url) => self.query(url).await.unwrap_or_else(|fallback_err| {
                        warn!(
                            "Fallback source for {} failed: {:#}",
                            kind.label(),
                            fallback_err
                        );
                        FeatureCollection::empty()
                    }),
                    None => FeatureCollection::empty(),
                }
            }
        };

        // Only successful fetches are cached; an empty substitute would hide
        // upstream recovery for a whole TTL window.
        if !collection.is_empty() {
            match serde_json::to_string(&collection) {
                Ok(raw) => {
                    if let Err(e) = cache::put(&key, raw, self.jittered_ttl()).await {
                        warn!("Failed to cache {} layer: {:#}", kind.label(), e);
                    }
                }
                Err(e) => warn!("Failed to encode {} layer for caching: {}", kind.label(), e),
            }
        }
        collection
    }

    async fn query(&self, url: &str) -> Result<FeatureCollection> {
        let page_size = self.page_size.to_string();
        let response = self
            .client
            .get(url)
            .query(&[
                ("where", "1=1"),
                ("outFields", "*"),
                ("f", "geojson"),
                ("returnGeometry", "true"),
                ("resultRecordCount", page_size.as_str()),
            ])
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("Feature service request failed: {url}"))?;

        response
            .json()
            .await
            .with_context(|| "Failed to parse feature service response")
    }

    fn jittered_ttl(&self) -> Duration {
        let jitter: f64 = rand::rng().random_range(0.9..1.1);
        Duration::from_secs((self.ttl.as_secs_f64() * jitter) as u64)
    }
}
