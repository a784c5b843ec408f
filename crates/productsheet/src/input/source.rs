//! In-memory representation of container contents.

use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use geo::Geometry;
use rusqlite::types::ValueRef;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{ProductSheetError, Result};
use crate::schema::FieldType;

/// Metadata about a container file on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// File name without path.
    pub file: String,
    /// Full path to the file.
    pub path: PathBuf,
    /// Dataset identifier (file name without extension).
    pub identifier: String,
    /// SHA-256 hash of the file contents.
    pub hash: String,
    /// File size in bytes.
    pub size_bytes: u64,
}

impl SourceMetadata {
    /// Read and hash a container file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        let mut file = File::open(path).map_err(|e| ProductSheetError::io(path, e))?;
        let mut contents = Vec::new();
        file.read_to_end(&mut contents)
            .map_err(|e| ProductSheetError::io(path, e))?;

        let mut hasher = Sha256::new();
        hasher.update(&contents);
        let hash = format!("sha256:{:x}", hasher.finalize());

        Ok(Self {
            file: file_name(path),
            path: path.to_path_buf(),
            identifier: dataset_identifier(path),
            hash,
            size_bytes: contents.len() as u64,
        })
    }
}

/// File name component of a path, lossily converted.
pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Dataset identifier: the file name without its extension.
pub fn dataset_identifier(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// A single attribute value as stored in the container.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl AttributeValue {
    /// Whether the value counts as missing (NULL or NaN).
    pub fn is_missing(&self) -> bool {
        match self {
            AttributeValue::Null => true,
            AttributeValue::Real(v) => v.is_nan(),
            _ => false,
        }
    }

    /// String form of a non-missing value.
    pub fn as_display(&self) -> Option<String> {
        if self.is_missing() {
            None
        } else {
            Some(self.to_string())
        }
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Null => Ok(()),
            AttributeValue::Integer(v) => write!(f, "{}", v),
            AttributeValue::Real(v) => write!(f, "{}", format_real(*v)),
            AttributeValue::Text(s) => f.write_str(s),
            AttributeValue::Blob(b) => write!(f, "<{} bytes>", b.len()),
        }
    }
}

impl From<ValueRef<'_>> for AttributeValue {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => AttributeValue::Null,
            ValueRef::Integer(i) => AttributeValue::Integer(i),
            ValueRef::Real(r) => AttributeValue::Real(r),
            ValueRef::Text(t) => AttributeValue::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => AttributeValue::Blob(b.to_vec()),
        }
    }
}

static NULL_VALUE: AttributeValue = AttributeValue::Null;

/// Format a float so integral values keep one decimal (`3.0`).
pub fn format_real(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        format!("{}", value)
    }
}

/// Spatial reference of a layer as declared in the container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpatialRef {
    /// An EPSG coordinate reference system.
    Epsg(u32),
    /// `srs_id = 0`: undefined geographic coordinates.
    UndefinedGeographic,
    /// `srs_id = -1`: undefined Cartesian coordinates.
    UndefinedCartesian,
    /// A definition from another authority.
    Other { organization: String, id: i64 },
}

/// Read access to the layers of a container.
pub trait LayerSource {
    /// Layer names in container order.
    fn layer_names(&self) -> Result<Vec<String>>;

    /// Load a layer with its schema and features.
    fn load_layer(&self, name: &str) -> Result<LayerData>;

    /// Resolve a geometry column's `srs_id`.
    fn resolve_srs(&self, srs_id: i64) -> Result<SpatialRef>;
}

/// One attribute column of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaField {
    pub name: String,
    pub field_type: FieldType,
}

impl SchemaField {
    pub fn new(name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            name: name.into(),
            field_type,
        }
    }
}

/// Registered geometry column of a spatial layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeometryColumn {
    pub column_name: String,
    pub srs_id: i64,
}

/// One row of a layer.
#[derive(Debug, Clone)]
pub struct Feature {
    /// Decoded geometry (`None` for NULL or empty geometries).
    pub geometry: Option<Geometry<f64>>,
    /// Attribute values aligned with the layer schema.
    pub attributes: Vec<AttributeValue>,
}

impl Feature {
    pub fn new(geometry: Option<Geometry<f64>>, attributes: Vec<AttributeValue>) -> Self {
        Self {
            geometry,
            attributes,
        }
    }
}

/// A fully loaded layer.
#[derive(Debug, Clone)]
pub struct LayerData {
    /// Layer (table) name.
    pub name: String,
    /// Attribute columns in declaration order.
    pub schema: Vec<SchemaField>,
    /// Geometry column, absent for attribute-only tables.
    pub geometry_column: Option<GeometryColumn>,
    /// Rows in primary-key order.
    pub features: Vec<Feature>,
}

impl LayerData {
    /// Create a new layer.
    pub fn new(
        name: impl Into<String>,
        schema: Vec<SchemaField>,
        geometry_column: Option<GeometryColumn>,
        features: Vec<Feature>,
    ) -> Self {
        Self {
            name: name.into(),
            schema,
            geometry_column,
            features,
        }
    }

    /// Get the number of features.
    pub fn feature_count(&self) -> usize {
        self.features.len()
    }

    /// Check if the layer has no features.
    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Get all values for a column by schema index.
    pub fn column_values(&self, index: usize) -> impl Iterator<Item = &AttributeValue> {
        self.features
            .iter()
            .map(move |f| f.attributes.get(index).unwrap_or(&NULL_VALUE))
    }
}
