//! Error types for the product sheet library.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for product sheet generation.
#[derive(Debug, Error)]
pub enum ProductSheetError {
    /// Error reading or writing a file.
    #[error("IO error for '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Error from the SQLite layer of a GeoPackage.
    #[error("GeoPackage error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// A geometry blob could not be decoded.
    #[error("Geometry error: {0}")]
    Geometry(#[from] geozero::error::GeozeroError),

    /// Coordinate transformation failed.
    #[error("Projection error: {0}")]
    Projection(String),

    /// The layer's spatial reference cannot be resolved.
    #[error("Unsupported spatial reference for layer '{layer}': {message}")]
    UnsupportedSrs { layer: String, message: String },

    /// The layer has no registered geometry column.
    #[error("Layer '{0}' has no geometry column")]
    NoGeometry(String),

    /// Error from the spreadsheet reader.
    #[error("Spreadsheet error: {0}")]
    Spreadsheet(#[from] calamine::Error),

    /// Error from the CSV library.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// The metadata sheet is present but unusable.
    #[error("Metadata sheet error: {0}")]
    MetadataSheet(String),

    /// No metadata row matches the dataset identifier.
    #[error("No metadata found for {0}")]
    NoMetadata(String),

    /// A `code_<layer>_<field>` table cannot be used.
    #[error("Malformed code list table '{table}': {message}")]
    MalformedCodeList { table: String, message: String },

    /// A required input file was not found.
    #[error("Missing input: {0}")]
    MissingInput(String),

    /// Template loading or rendering failed.
    #[error("Template error: {0}")]
    Template(#[from] minijinja::Error),

    /// GeoJSON parsing error.
    #[error("GeoJSON error: {0}")]
    GeoJson(#[from] geojson::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

impl ProductSheetError {
    /// Wrap an IO error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        ProductSheetError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for product sheet operations.
pub type Result<T> = std::result::Result<T, ProductSheetError>;
