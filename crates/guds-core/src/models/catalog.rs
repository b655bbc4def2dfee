//! GeoServer catalog vocabulary
//!
//! GeoServer lists collections as `{"<plural>": {"<singular>": [...]}}` and
//! returns `{"<plural>": ""}` when the collection is empty.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Store kinds a basin can hold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    /// Raster store, layers are coverages
    Coverage,
    /// Vector store, layers are feature types
    Data,
}

impl StoreKind {
    /// REST collection segment for the stores
    pub fn collection(&self) -> &'static str {
        match self {
            StoreKind::Coverage => "coveragestores",
            StoreKind::Data => "datastores",
        }
    }

    /// JSON keys of a store listing
    pub fn listing_keys(&self) -> (&'static str, &'static str) {
        match self {
            StoreKind::Coverage => ("coverageStores", "coverageStore"),
            StoreKind::Data => ("dataStores", "dataStore"),
        }
    }

    /// REST collection segment for layers inside a store
    pub fn layer_collection(&self) -> &'static str {
        match self {
            StoreKind::Coverage => "coverages",
            StoreKind::Data => "featuretypes",
        }
    }

    /// JSON keys of a layer listing
    pub fn layer_listing_keys(&self) -> (&'static str, &'static str) {
        match self {
            StoreKind::Coverage => ("coverages", "coverage"),
            StoreKind::Data => ("featureTypes", "featureType"),
        }
    }
}

/// Family of default style a layer gets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StyleCategory {
    Raster,
    Point,
    Line,
    Polygon,
}

impl StyleCategory {
    /// Name of the built-in GeoServer style for this family
    pub fn default_style(&self) -> &'static str {
        match self {
            StyleCategory::Raster => "raster",
            StyleCategory::Point => "point",
            StyleCategory::Line => "line",
            StyleCategory::Polygon => "polygon",
        }
    }
}

/// Names inside a GeoServer collection listing
///
/// Accepts the array form, a single object, and the empty-string form.
pub fn listing_names(listing: &Value, outer: &str, inner: &str) -> Vec<String> {
    let items = match listing.get(outer).and_then(|o| o.get(inner)) {
        Some(items) => items,
        None => return Vec::new(),
    };

    let name_of = |item: &Value| item.get("name").and_then(Value::as_str).map(str::to_string);

    match items {
        Value::Array(entries) => entries.iter().filter_map(name_of).collect(),
        Value::Object(_) => name_of(items).into_iter().collect(),
        _ => Vec::new(),
    }
}
