//! Field documentation records.

use serde::{Deserialize, Serialize};

use super::types::FieldType;

/// Documentation for one schema attribute of a layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    /// Field name.
    pub name: String,
    /// Declared data type.
    pub dtype: FieldType,
    /// First non-missing value observed, stringified.
    pub sample: String,
    /// Permitted values, from a code list or inferred.
    #[serde(
        rename = "allowedValues",
        skip_serializing_if = "Option::is_none",
        default
    )]
    pub allowed_values: Option<Vec<String>>,
}

impl Field {
    /// Create a field record without allowed values.
    pub fn new(name: impl Into<String>, dtype: FieldType, sample: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dtype,
            sample: sample.into(),
            allowed_values: None,
        }
    }
}
