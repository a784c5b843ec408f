//! Input discovery and container/metadata readers.

mod discovery;
mod geopackage;
mod metadata;
mod source;

pub use discovery::{CONTAINER_EXTENSION, InputSet};
pub use geopackage::{GeoPackage, decode_geometry};
pub use metadata::MetadataTable;
pub use source::{
    AttributeValue, Feature, GeometryColumn, LayerData, LayerSource, SchemaField, SourceMetadata,
    SpatialRef, dataset_identifier, file_name, format_real,
};
