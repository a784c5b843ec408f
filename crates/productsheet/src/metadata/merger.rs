//! Joins spreadsheet metadata with computed dataset facts.

use chrono::{DateTime, Local};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{ProductSheetError, Result};
use crate::input::{MetadataTable, SourceMetadata};

/// Section holding the spreadsheet row.
pub const GENERAL_SECTION: &str = "General Metadata";

/// Section holding computed dataset facts.
pub const DATASET_SECTION: &str = "Dataset Metadata";

/// Timestamp format of the `Generated` entry.
pub const GENERATED_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Where and how metadata rows are looked up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataConfig {
    /// Worksheet name in spreadsheet sources.
    pub sheet: String,
    /// Column holding the dataset identifier.
    pub key_column: String,
    /// Column holding the dataset title.
    pub title_column: String,
}

impl Default for MetadataConfig {
    fn default() -> Self {
        Self {
            sheet: "metadata".to_string(),
            key_column: "dataset".to_string(),
            title_column: "title".to_string(),
        }
    }
}

/// One key/value line of a metadata section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataEntry {
    pub key: String,
    pub value: String,
}

/// A named group of metadata entries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataSection {
    pub name: String,
    pub entries: Vec<MetadataEntry>,
}

impl MetadataSection {
    fn from_map(name: &str, map: &IndexMap<String, String>) -> Self {
        Self {
            name: name.to_string(),
            entries: map
                .iter()
                .map(|(key, value)| MetadataEntry {
                    key: key.clone(),
                    value: value.clone(),
                })
                .collect(),
        }
    }

    /// Look up an entry by key.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key == key)
            .map(|e| e.value.as_str())
    }
}

/// Metadata of one dataset, ready for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MergedMetadata {
    /// Rendered title including the suffix.
    pub title: String,
    /// Sections in display order.
    pub sections: Vec<MetadataSection>,
}

impl MergedMetadata {
    /// Look up a section by name.
    pub fn section(&self, name: &str) -> Option<&MetadataSection> {
        self.sections.iter().find(|s| s.name == name)
    }
}

/// The metadata row matched for a dataset.
#[derive(Debug, Clone)]
pub struct GeneralMetadata {
    /// Dataset identifier used for the lookup.
    pub identifier: String,
    /// Non-missing cells except the key column, in column order.
    pub values: IndexMap<String, String>,
}

/// Looks up dataset rows and assembles [`MergedMetadata`].
pub struct MetadataMerger<'a> {
    table: &'a MetadataTable,
    config: &'a MetadataConfig,
    title_suffix: &'a str,
}

impl<'a> MetadataMerger<'a> {
    /// Create a merger over a loaded metadata table.
    pub fn new(table: &'a MetadataTable, config: &'a MetadataConfig, title_suffix: &'a str) -> Self {
        Self {
            table,
            config,
            title_suffix,
        }
    }

    /// Check that the key column exists; run once at startup.
    pub fn validate(&self) -> Result<()> {
        if self.table.column_index(&self.config.key_column).is_none() {
            return Err(ProductSheetError::MetadataSheet(format!(
                "Missing key column '{}'",
                self.config.key_column
            )));
        }
        Ok(())
    }

    /// Find the metadata row of a dataset.
    ///
    /// Returns [`ProductSheetError::NoMetadata`] when no row matches.
    pub fn lookup(&self, identifier: &str) -> Result<GeneralMetadata> {
        let values = self
            .table
            .find_row(&self.config.key_column, identifier)?
            .ok_or_else(|| ProductSheetError::NoMetadata(identifier.to_string()))?;
        Ok(GeneralMetadata {
            identifier: identifier.to_string(),
            values,
        })
    }

    /// Title of a dataset: the title column, else the identifier, plus suffix.
    pub fn title(&self, general: &GeneralMetadata) -> String {
        let base = general
            .values
            .get(&self.config.title_column)
            .map(String::as_str)
            .unwrap_or(&general.identifier);
        format!("{}{}", base, self.title_suffix)
    }

    /// Combine the matched row with computed dataset facts.
    pub fn merge(
        &self,
        general: &GeneralMetadata,
        source: &SourceMetadata,
        layer_count: usize,
        generated: DateTime<Local>,
    ) -> MergedMetadata {
        let mut dataset: IndexMap<String, String> = IndexMap::new();
        dataset.insert("File name".to_string(), source.file.clone());
        dataset.insert(
            "Generated".to_string(),
            generated.format(GENERATED_FORMAT).to_string(),
        );
        dataset.insert("Checksum".to_string(), source.hash.clone());
        dataset.insert("Number of layers".to_string(), layer_count.to_string());

        MergedMetadata {
            title: self.title(general),
            sections: vec![
                MetadataSection::from_map(GENERAL_SECTION, &general.values),
                MetadataSection::from_map(DATASET_SECTION, &dataset),
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::path::PathBuf;

    const SUFFIX: &str = " (NOR) - Product Sheet";

    fn table() -> MetadataTable {
        MetadataTable::parse_delimited(
            b"dataset,title,owner,licence\n\
              roads,Road network,NVDB,CC BY 4.0\n\
              rivers,,NVE,\n",
        )
        .unwrap()
    }

    fn source(identifier: &str) -> SourceMetadata {
        SourceMetadata {
            file: format!("{}.gpkg", identifier),
            path: PathBuf::from(format!("{}.gpkg", identifier)),
            identifier: identifier.to_string(),
            hash: "sha256:abc".to_string(),
            size_bytes: 10,
        }
    }

    #[test]
    fn test_lookup_and_merge() {
        let table = table();
        let config = MetadataConfig::default();
        let merger = MetadataMerger::new(&table, &config, SUFFIX);

        let general = merger.lookup("roads").unwrap();
        let generated = Local.with_ymd_and_hms(2024, 5, 17, 9, 30, 0).unwrap();
        let merged = merger.merge(&general, &source("roads"), 3, generated);

        assert_eq!(merged.title, "Road network (NOR) - Product Sheet");

        let general = merged.section(GENERAL_SECTION).unwrap();
        let keys: Vec<&str> = general.entries.iter().map(|e| e.key.as_str()).collect();
        assert_eq!(keys, vec!["title", "owner", "licence"]);

        let dataset = merged.section(DATASET_SECTION).unwrap();
        assert_eq!(dataset.get("File name"), Some("roads.gpkg"));
        assert_eq!(dataset.get("Generated"), Some("2024-05-17 09:30"));
        assert_eq!(dataset.get("Number of layers"), Some("3"));
    }

    #[test]
    fn test_title_falls_back_to_identifier() {
        let table = table();
        let config = MetadataConfig::default();
        let merger = MetadataMerger::new(&table, &config, SUFFIX);

        let general = merger.lookup("rivers").unwrap();
        assert_eq!(merger.title(&general), "rivers (NOR) - Product Sheet");
    }

    #[test]
    fn test_no_match_is_no_metadata() {
        let table = table();
        let config = MetadataConfig::default();
        let merger = MetadataMerger::new(&table, &config, SUFFIX);

        assert!(matches!(
            merger.lookup("lakes"),
            Err(ProductSheetError::NoMetadata(id)) if id == "lakes"
        ));
    }

    #[test]
    fn test_validate_key_column() {
        let table = table();
        let config = MetadataConfig {
            key_column: "id".to_string(),
            ..MetadataConfig::default()
        };
        let merger = MetadataMerger::new(&table, &config, SUFFIX);
        assert!(merger.validate().is_err());
    }
}
