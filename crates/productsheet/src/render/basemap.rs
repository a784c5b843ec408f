//! Shared world base map.

use std::path::Path;

use geo::Geometry;
use geojson::{Feature, FeatureCollection, GeoJson};
use tracing::{debug, warn};

use crate::error::{ProductSheetError, Result};
use crate::sampling::simplify_preserving;

/// Default base map location, relative to the input directory.
pub const DEFAULT_BASEMAP: &str = "assets/countries.geojson";

/// Default simplification tolerance of the base map, in degrees.
pub const DEFAULT_BASEMAP_TOLERANCE: f64 = 0.01;

/// Simplified country outlines drawn under every map.
#[derive(Debug, Clone)]
pub struct BaseMap {
    collection: FeatureCollection,
}

impl BaseMap {
    /// A base map without features.
    pub fn empty() -> Self {
        Self {
            collection: FeatureCollection {
                bbox: None,
                features: Vec::new(),
                foreign_members: None,
            },
        }
    }

    /// Load and simplify a GeoJSON base map.
    ///
    /// A missing file yields an empty map with a warning; a file that
    /// does not parse is an error.
    pub fn load(path: impl AsRef<Path>, tolerance: f64) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "Base map not found, maps will have no background");
            return Ok(Self::empty());
        }

        let text =
            std::fs::read_to_string(path).map_err(|e| ProductSheetError::io(path, e))?;
        let map = Self::parse(&text, tolerance)?;
        debug!(path = %path.display(), features = map.len(), "Loaded base map");
        Ok(map)
    }

    /// Parse GeoJSON text and simplify every feature.
    pub fn parse(text: &str, tolerance: f64) -> Result<Self> {
        let features = match text.parse::<GeoJson>()? {
            GeoJson::FeatureCollection(fc) => fc.features,
            GeoJson::Feature(f) => vec![f],
            GeoJson::Geometry(g) => vec![Feature {
                bbox: None,
                geometry: Some(g),
                id: None,
                properties: None,
                foreign_members: None,
            }],
        };

        let features = features
            .into_iter()
            .map(|feature| simplify_feature(feature, tolerance))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            collection: FeatureCollection {
                bbox: None,
                features,
                foreign_members: None,
            },
        })
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.collection.features.len()
    }

    /// Check if the map has no features.
    pub fn is_empty(&self) -> bool {
        self.collection.features.is_empty()
    }

    /// The simplified features.
    pub fn collection(&self) -> &FeatureCollection {
        &self.collection
    }

    /// Serialize as GeoJSON text.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.collection)?)
    }
}

fn simplify_feature(mut feature: Feature, tolerance: f64) -> Result<Feature> {
    if let Some(geometry) = feature.geometry.take() {
        let geometry: Geometry<f64> = geometry.value.try_into()?;
        let simplified = simplify_preserving(&geometry, tolerance);
        feature.geometry = Some(geojson::Geometry::new(geojson::Value::from(&simplified)));
    }
    feature.bbox = None;
    Ok(feature)
}
