//! Input discovery in a working directory.

use std::path::{Path, PathBuf};

use super::metadata::{DELIMITED_EXTENSIONS, SPREADSHEET_EXTENSIONS};
use crate::error::{ProductSheetError, Result};

/// Extension of container files.
pub const CONTAINER_EXTENSION: &str = "gpkg";

/// Inputs found for a batch run.
#[derive(Debug, Clone)]
pub struct InputSet {
    /// Container files, sorted by name.
    pub containers: Vec<PathBuf>,
    /// The metadata table to use.
    pub metadata: PathBuf,
}

impl InputSet {
    /// Discover containers and the metadata file in `dir`.
    ///
    /// Spreadsheets are preferred over delimited text; within a kind the
    /// first file by name wins. `metadata_override` skips metadata discovery.
    pub fn discover(dir: impl AsRef<Path>, metadata_override: Option<&Path>) -> Result<Self> {
        let dir = dir.as_ref();
        let files = list_files(dir)?;

        let containers: Vec<PathBuf> = files
            .iter()
            .filter(|p| has_extension(p, &[CONTAINER_EXTENSION]))
            .cloned()
            .collect();
        if containers.is_empty() {
            return Err(ProductSheetError::MissingInput(format!(
                "No .{} files found in {}",
                CONTAINER_EXTENSION,
                dir.display()
            )));
        }

        let metadata = match metadata_override {
            Some(path) if path.is_file() => path.to_path_buf(),
            Some(path) => {
                return Err(ProductSheetError::MissingInput(format!(
                    "Metadata file not found: {}",
                    path.display()
                )));
            }
            None => files
                .iter()
                .find(|p| has_extension(p, SPREADSHEET_EXTENSIONS))
                .or_else(|| files.iter().find(|p| has_extension(p, DELIMITED_EXTENSIONS)))
                .cloned()
                .ok_or_else(|| {
                    ProductSheetError::MissingInput(format!(
                        "No metadata spreadsheet (.xlsx) found in {}",
                        dir.display()
                    ))
                })?,
        };

        Ok(Self {
            containers,
            metadata,
        })
    }
}

/// Regular files in `dir`, sorted by name.
fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir).map_err(|e| ProductSheetError::io(dir, e))?;
    let mut files = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ProductSheetError::io(dir, e))?;
        let path = entry.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_extension(path: &Path, extensions: &[&str]) -> bool {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .map(|e| extensions.contains(&e.as_str()))
        .unwrap_or(false)
}
