//! Productsheet: offline HTML product sheets for GeoPackage datasets.
//!
//! Every `.gpkg` file in a directory is matched against a metadata
//! spreadsheet and turned into one self-contained HTML page with the
//! dataset's metadata, a field catalog per layer and a map preview of the
//! features nearest each layer's centroid.
//!
//! # Core Principles
//!
//! - **Offline**: sheets embed their data and need no network at view time
//! - **Deterministic**: unchanged inputs give identical samples
//! - **Isolated failures**: a bad layer or dataset never stops the batch
//!
//! # Example
//!
//! ```no_run
//! use productsheet::{GeneratorConfig, ProductSheetGenerator};
//!
//! let config = GeneratorConfig {
//!     input_dir: "datasets".into(),
//!     ..GeneratorConfig::default()
//! };
//! let generator = ProductSheetGenerator::prepare(config).unwrap();
//! let report = generator.run_batch().unwrap();
//!
//! println!("Produced: {}", report.produced.len());
//! println!("Skipped: {}", report.skipped.len());
//! ```

pub mod error;
pub mod inference;
pub mod input;
pub mod metadata;
pub mod render;
pub mod sampling;
pub mod schema;

mod generator;

pub use crate::generator::{
    BatchReport, DEFAULT_TITLE_SUFFIX, DatasetEvent, DatasetOutcome, DatasetSkip,
    GeneratorConfig, InspectReport, ProcessedLayer, ProductSheetGenerator, inspect,
};
pub use error::{ProductSheetError, Result};
pub use inference::{CodeLists, EnumerationPolicy};
pub use input::{GeoPackage, LayerData, LayerSource, MetadataTable, SourceMetadata};
pub use metadata::{MergedMetadata, MetadataConfig};
pub use render::{BaseMap, ProductSheetRenderer};
pub use sampling::SamplingConfig;
pub use schema::{Field, FieldType, LayerSample, LayerSkip, LayerSummary};
