//! Geocoding lookup against the Open-Meteo search endpoint
//!
//! Free-text place input resolves to the first match (the dashboard also
//! exposes the full match list so a user can pick another). Transport
//! failures and empty result sets both leave the coordinates at their prior
//! or default value; geocoding never fails a render.

use std::time::Duration;

use anyhow::{Context, Result};
use reqwest_middleware::ClientWithMiddleware;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::cache;
use crate::config::HazardWatchConfig;
use crate::http;
use crate::models::Location;

/// One geocoding match from the search endpoint
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct GeocodingMatch {
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    pub country: Option<String>,
    pub admin1: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    results: Option<Vec<GeocodingMatch>>,
}

impl From<GeocodingMatch> for Location {
    fn from(m: GeocodingMatch) -> Self {
        let name = match &m.admin1 {
            Some(admin1) if !admin1.is_empty() && *admin1 != m.name => {
                format!("{}, {admin1}", m.name)
            }
            _ => m.name,
        };
        Location {
            latitude: m.latitude,
            longitude: m.longitude,
            name,
            country: m.country,
        }
    }
}

/// Outcome of resolving a free-text place input
#[derive(Debug, Clone)]
pub struct Resolution {
    pub location: Location,
    /// False when the query had no match and the fallback was kept
    pub matched: bool,
}

/// Client for the geocoding search endpoint
pub struct GeocodingClient {
    client: ClientWithMiddleware,
    base_url: String,
    ttl: Duration,
}

impl GeocodingClient {
    /// Create a new geocoding client from configuration
    pub fn new(config: &HazardWatchConfig) -> Result<Self> {
        let client = http::build_client(
            config.geocoding.timeout_seconds,
            config.geocoding.max_retries,
        )?;
        Ok(Self {
            client,
            base_url: config.geocoding.base_url.clone(),
            ttl: Duration::from_secs(u64::from(config.geocoding.ttl_minutes) * 60),
        })
    }

    /// Search for up to five matches for a free-text place name
    #[instrument(skip(self))]
    pub async fn search(&self, query: &str) -> Result<Vec<GeocodingMatch>> {
        let key = format!("geocode:{}", query.trim().to_lowercase());
        if let Some(cached) = cache::get::<Vec<GeocodingMatch>>(&key).await? {
            debug!("Geocoding served from cache");
            return Ok(cached);
        }

        let url = format!(
            "{}/v1/search?name={}&count=5&language=en&format=json",
            self.base_url,
            urlencoding::encode(query)
        );
        let response = self
            .client
            .get(&url)
            .send()
            .await?
            .error_for_status()
            .with_context(|| "Geocoding request failed")?;

        let parsed: SearchResponse = response
            .json()
            .await
            .with_context(|| "Failed to parse geocoding response")?;
        let matches = parsed.results.unwrap_or_default();

        cache::put(&key, matches.clone(), self.ttl).await?;
        Ok(matches)
    }

    /// Resolve a free-text place to a location, keeping `fallback` when the
    /// lookup fails or finds nothing
    pub async fn resolve(&self, query: &str, fallback: &Location) -> Resolution {
        match self.search(query).await {
            Ok(matches) => match matches.into_iter().next() {
                Some(first) => Resolution {
                    location: first.into(),
                    matched: true,
                },
                None => {
                    warn!("No geocoding match for '{}', keeping {}", query, fallback.name);
                    Resolution {
                        location: fallback.clone(),
                        matched: false,
                    }
                }
            },
            Err(e) => {
                warn!("Geocoding failed for '{}': {:#}, keeping {}", query, e, fallback.name);
                Resolution {
                    location: fallback.clone(),
                    matched: false,
                }
            }
        }
    }
}
