//! Marketplace Offering models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wotgate_conv::DataField;

use super::form::Method;

/// Geographic bounding box an Offering's data refers to
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialExtent {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

/// Commercial metadata attached to a published route
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfferingMetadata {
    /// Offering name; defaults to the route URI
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category URN (e.g., "urn:ids:category:environment")
    #[serde(default)]
    pub category: String,
    /// License URL
    #[serde(default)]
    pub license: String,
    /// Price per access
    #[serde(default)]
    pub price: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_extent: Option<SpatialExtent>,
}

/// A marketplace resource backed by one gateway route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Offering {
    /// Marketplace-assigned identifier (set once registered)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub category: String,
    pub license: String,
    pub price: f64,
    /// Public URL consumers call
    pub endpoint: String,
    pub method: Method,
    /// Flat input fields, in positional order
    pub inputs: Vec<DataField>,
    /// Flat output fields, in positional order
    pub outputs: Vec<DataField>,
    /// Range filter fields (`min_*` / `max_*`) accepted on the endpoint
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub property_filters: Vec<DataField>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spatial_extent: Option<SpatialExtent>,
    pub created_at: DateTime<Utc>,
}
