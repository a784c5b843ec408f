//! Code-list extraction from `code_<layer>_<field>` tables.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{ProductSheetError, Result};
use crate::input::LayerSource;

// Only the first two underscores split; the field part may contain more.
static CODE_TABLE_NAME: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^code_([^_]*)_(.*)$").expect("valid code table pattern"));

/// Split a code table name into (base layer, field).
///
/// Returns `None` for names that do not follow `code_<layer>_<field>`.
pub fn parse_code_table_name(name: &str) -> Option<(&str, &str)> {
    let caps = CODE_TABLE_NAME.captures(name)?;
    Some((caps.get(1)?.as_str(), caps.get(2)?.as_str()))
}

/// Allowed values keyed by lowercased layer name, then field name.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CodeLists {
    lists: IndexMap<String, IndexMap<String, Vec<String>>>,
}

impl CodeLists {
    /// Create an empty lookup.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a code list; a later insert for the same key replaces it.
    pub fn insert(&mut self, layer: &str, field: impl Into<String>, values: Vec<String>) {
        let field = field.into();
        let previous = self
            .lists
            .entry(layer.to_lowercase())
            .or_default()
            .insert(field.clone(), values);
        if previous.is_some() {
            debug!(layer, field = %field, "code list replaced by later table");
        }
    }

    /// Look up allowed values for a layer's field.
    pub fn get(&self, layer: &str, field: &str) -> Option<&[String]> {
        self.lists
            .get(&layer.to_lowercase())
            .and_then(|fields| fields.get(field))
            .map(|v| v.as_slice())
    }

    /// Number of recorded code lists.
    pub fn len(&self) -> usize {
        self.lists.values().map(|f| f.len()).sum()
    }

    /// Check if no code lists were found.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Builds [`CodeLists`] from the code tables of a container.
pub struct CodeListExtractor;

impl CodeListExtractor {
    /// Read every `code_<layer>_<field>` table among `layers`.
    ///
    /// Tables that do not follow the naming convention are ignored, as are
    /// tables with no rows. A matching table that cannot be read is an error
    /// for the whole dataset.
    pub fn extract(source: &dyn LayerSource, layers: &[String]) -> Result<CodeLists> {
        let mut code_lists = CodeLists::new();

        for table in layers {
            let Some((base, field)) = parse_code_table_name(table) else {
                continue;
            };

            let data = source
                .load_layer(table)
                .map_err(|e| ProductSheetError::MalformedCodeList {
                    table: table.clone(),
                    message: e.to_string(),
                })?;
            if data.is_empty() {
                debug!(table = %table, "skipping empty code table");
                continue;
            }
            if data.schema.is_empty() {
                return Err(ProductSheetError::MalformedCodeList {
                    table: table.clone(),
                    message: "table has no attribute columns".to_string(),
                });
            }

            let values: BTreeSet<String> = data
                .column_values(0)
                .filter_map(|v| v.as_display())
                .collect();
            if values.is_empty() {
                continue;
            }

            debug!(table = %table, values = values.len(), "found code list");
            code_lists.insert(base, field, values.into_iter().collect());
        }

        Ok(code_lists)
    }
}
