//! Documentation model for layers and their fields.

mod field;
mod layer;
mod types;

pub use field::Field;
pub use layer::{LayerSample, LayerSkip, LayerSummary};
pub use types::FieldType;
