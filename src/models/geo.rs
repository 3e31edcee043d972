//! Minimal GeoJSON pass-through types
//!
//! Hazard layers and cyclone tracks are rendered by the frontend exactly as
//! the upstream services return them, so geometry and properties stay as raw
//! `serde_json::Value` instead of a typed geometry model.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A GeoJSON feature collection
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct FeatureCollection {
    #[serde(rename = "type", default = "feature_collection_type")]
    pub collection_type: String,
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// A single GeoJSON feature
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub feature_type: String,
    #[serde(default)]
    pub geometry: Option<Value>,
    #[serde(default)]
    pub properties: Option<Value>,
}

fn feature_collection_type() -> String {
    "FeatureCollection".to_string()
}

fn feature_type() -> String {
    "Feature".to_string()
}

impl FeatureCollection {
    /// The empty collection substituted when a layer cannot be fetched
    #[must_use]
    pub fn empty() -> Self {
        Self {
            collection_type: feature_collection_type(),
            features: Vec::new(),
        }
    }

    /// Wrap a list of features into a collection
    #[must_use]
    pub fn from_features(features: Vec<Feature>) -> Self {
        Self {
            collection_type: feature_collection_type(),
            features,
        }
    }

    /// Number of features in the collection
    #[must_use]
    pub fn len(&self) -> usize {
        self.features.len()
    }

    /// Whether the collection carries any features
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }
}

impl Feature {
    /// Read a string property by name, if present
    #[must_use]
    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.properties.as_ref()?.get(name)?.as_str()
    }
}
