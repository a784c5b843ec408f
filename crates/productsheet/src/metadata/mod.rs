//! Dataset metadata lookup and merging.

mod merger;

pub use merger::{
    DATASET_SECTION, GENERAL_SECTION, GENERATED_FORMAT, GeneralMetadata, MergedMetadata,
    MetadataConfig, MetadataEntry, MetadataMerger, MetadataSection,
};
