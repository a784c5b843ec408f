//! Layer-level summaries and map samples.

use serde::{Deserialize, Serialize};

use super::field::Field;

/// Summary of a layer, shown in the layer table of a product sheet.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSummary {
    /// Layer name.
    pub name: String,
    /// Total number of features, including those not shown on the map.
    pub feature_count: usize,
    /// Observed geometry types, in first-seen order.
    pub geometry_type: Vec<String>,
    /// Field catalog in schema order.
    pub fields: Vec<Field>,
    /// Truncation note, empty when every feature is shown.
    pub note: String,
}

impl LayerSummary {
    /// Number of features shown on the map for a given budget.
    pub fn shown(&self, budget: usize) -> usize {
        self.feature_count.min(budget)
    }
}

/// Sampled features of a layer for the interactive map.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSample {
    /// Layer name.
    pub name: String,
    /// GeoJSON FeatureCollection with stringified properties.
    pub data: geojson::FeatureCollection,
    /// Field names in schema order, for popup tables.
    pub field_order: Vec<String>,
    /// Field catalog, repeated for the map legend.
    pub fields: Vec<Field>,
}

impl LayerSample {
    /// Number of sampled features.
    pub fn len(&self) -> usize {
        self.data.features.len()
    }

    /// Check if no features were sampled.
    pub fn is_empty(&self) -> bool {
        self.data.features.is_empty()
    }
}

/// A layer that was skipped, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerSkip {
    /// Layer name.
    pub layer: String,
    /// Human-readable reason.
    pub reason: String,
}
