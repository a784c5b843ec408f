//! Centroid-based feature sampling for map previews.

use geo::{Centroid, Geometry, Point};
use geojson::{Feature as GeoJsonFeature, FeatureCollection, JsonObject, JsonValue};
use serde::{Deserialize, Serialize};

use super::geometry::{simplify_preserving, union_centroid};
use super::projection::Reprojector;
use crate::error::Result;
use crate::input::LayerData;

/// Sampling parameters for a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Feature budget shared by all layers of a dataset.
    pub max_total_features: usize,
    /// Simplification tolerance in degrees.
    pub simplify_tolerance: f64,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self {
            max_total_features: 2500,
            simplify_tolerance: 0.001,
        }
    }
}

/// Per-layer share of the global budget, at least one per layer.
pub fn per_layer_budget(max_total_features: usize, layer_count: usize) -> usize {
    if layer_count == 0 {
        return 0;
    }
    (max_total_features / layer_count).max(1)
}

/// Note shown under a layer whose map preview is truncated.
pub fn truncation_note(feature_count: usize, budget: usize) -> Option<String> {
    (feature_count > budget).then(|| {
        format!(
            "Only showing {} features in map, centered near dataset centroid.",
            budget
        )
    })
}

/// Selects the features nearest to a layer's centroid.
pub struct FeatureSampler<'a> {
    planar: &'a Reprojector,
    simplify_tolerance: f64,
}

impl<'a> FeatureSampler<'a> {
    /// Create a sampler measuring distances in the `planar` system.
    pub fn new(planar: &'a Reprojector, simplify_tolerance: f64) -> Self {
        Self {
            planar,
            simplify_tolerance,
        }
    }

    /// Indices of the `budget` features closest to the centroid of the
    /// layer's union geometry.
    ///
    /// Geometries are in WGS84 and projected before measuring. Features
    /// without geometry sort last; ties keep input order. The result is
    /// ordered by distance.
    pub fn select(&self, geometries: &[Option<&Geometry<f64>>], budget: usize) -> Result<Vec<usize>> {
        let projected = geometries
            .iter()
            .map(|g| g.map(|g| self.planar.transform(g)).transpose())
            .collect::<Result<Vec<_>>>()?;

        let center = union_centroid(projected.iter().flatten());

        let mut ranked: Vec<(usize, f64)> = projected
            .iter()
            .enumerate()
            .map(|(i, g)| (i, centroid_distance(g.as_ref(), center)))
            .collect();
        ranked.sort_by(|a, b| a.1.total_cmp(&b.1));
        ranked.truncate(budget);

        Ok(ranked.into_iter().map(|(i, _)| i).collect())
    }

    /// Sample a layer into a GeoJSON FeatureCollection.
    ///
    /// Selected geometries are simplified; attributes are stringified, with
    /// missing values as empty strings.
    pub fn sample(&self, layer: &LayerData, budget: usize) -> Result<FeatureCollection> {
        let geometries: Vec<Option<&Geometry<f64>>> =
            layer.features.iter().map(|f| f.geometry.as_ref()).collect();
        let selected = self.select(&geometries, budget)?;

        let features = selected
            .into_iter()
            .map(|index| {
                let feature = &layer.features[index];

                let mut properties = JsonObject::new();
                for (field, value) in layer.schema.iter().zip(feature.attributes.iter()) {
                    properties.insert(
                        field.name.clone(),
                        JsonValue::String(value.as_display().unwrap_or_default()),
                    );
                }

                let geometry = feature.geometry.as_ref().map(|g| {
                    geojson::Geometry::new(geojson::Value::from(&simplify_preserving(
                        g,
                        self.simplify_tolerance,
                    )))
                });

                GeoJsonFeature {
                    bbox: None,
                    geometry,
                    id: Some(geojson::feature::Id::String(index.to_string())),
                    properties: Some(properties),
                    foreign_members: None,
                }
            })
            .collect();

        Ok(FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        })
    }
}

fn centroid_distance(geometry: Option<&Geometry<f64>>, center: Option<Point<f64>>) -> f64 {
    match (geometry.and_then(|g| g.centroid()), center) {
        (Some(c), Some(center)) => (c.x() - center.x()).hypot(c.y() - center.y()),
        _ => f64::INFINITY,
    }
}
