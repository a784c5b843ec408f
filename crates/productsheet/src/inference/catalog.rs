//! Field catalog construction.

use crate::input::LayerData;
use crate::schema::Field;

use super::codelist::CodeLists;
use super::enumeration::EnumerationPolicy;

/// Builds the field documentation of a layer.
///
/// Allowed values come from a code list when one exists for the field;
/// otherwise text fields are passed through the [`EnumerationPolicy`].
pub struct FieldCatalogBuilder<'a> {
    code_lists: &'a CodeLists,
    policy: EnumerationPolicy,
}

impl<'a> FieldCatalogBuilder<'a> {
    /// Create a builder over a dataset's code lists.
    pub fn new(code_lists: &'a CodeLists, policy: EnumerationPolicy) -> Self {
        Self { code_lists, policy }
    }

    /// Produce one [`Field`] per schema entry, in schema order.
    pub fn build(&self, layer: &LayerData) -> Vec<Field> {
        layer
            .schema
            .iter()
            .enumerate()
            .map(|(index, schema_field)| {
                let sample = layer
                    .column_values(index)
                    .find_map(|v| v.as_display())
                    .unwrap_or_default();

                let mut field = Field::new(&schema_field.name, schema_field.field_type.clone(), sample);
                field.allowed_values = self.allowed_values(layer, index);
                field
            })
            .collect()
    }

    fn allowed_values(&self, layer: &LayerData, index: usize) -> Option<Vec<String>> {
        let schema_field = &layer.schema[index];

        if let Some(values) = self.code_lists.get(&layer.name, &schema_field.name) {
            if !values.is_empty() {
                return Some(values.to_vec());
            }
        }

        if !schema_field.field_type.is_textual() {
            return None;
        }
        self.policy
            .infer(layer.column_values(index).filter_map(|v| v.as_display()))
    }
}
