//! Map sampling: reprojection, simplification, centroid selection.

mod geometry;
mod projection;
mod sampler;

pub use geometry::{
    geometry_type_name, observed_geometry_types, simplify_preserving, union_centroid,
};
pub use projection::{Reprojector, WEB_MERCATOR, WGS84};
pub use sampler::{FeatureSampler, SamplingConfig, per_layer_budget, truncation_note};
