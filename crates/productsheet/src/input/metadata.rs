//! Tabular metadata sources (spreadsheets and delimited text).

use std::io::{BufRead, BufReader};
use std::path::Path;

use calamine::{Data, Reader, open_workbook_auto};
use indexmap::IndexMap;

use crate::error::{ProductSheetError, Result};

/// Delimiters to try when auto-detecting.
const DELIMITERS: &[u8] = &[b'\t', b',', b';', b'|'];

/// Spreadsheet extensions readable through calamine.
pub const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xls", "ods"];

/// Delimited text extensions.
pub const DELIMITED_EXTENSIONS: &[&str] = &["csv", "tsv"];

/// A metadata table: a header row and string cells, `None` for missing.
#[derive(Debug, Clone)]
pub struct MetadataTable {
    /// Column headers.
    pub headers: Vec<String>,
    /// Row data (row-major order).
    pub rows: Vec<Vec<Option<String>>>,
}

impl MetadataTable {
    /// Create a new metadata table.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { headers, rows }
    }

    /// Load a metadata table, choosing the reader by file extension.
    ///
    /// `sheet` names the worksheet for spreadsheet sources and is ignored
    /// for delimited text.
    pub fn load(path: impl AsRef<Path>, sheet: &str) -> Result<Self> {
        let path = path.as_ref();
        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();

        if SPREADSHEET_EXTENSIONS.contains(&ext.as_str()) {
            Self::from_spreadsheet(path, sheet)
        } else if DELIMITED_EXTENSIONS.contains(&ext.as_str()) {
            Self::from_delimited(path)
        } else {
            Err(ProductSheetError::MetadataSheet(format!(
                "Unsupported metadata format: {}",
                path.display()
            )))
        }
    }

    /// Read a named worksheet. The first row is the header.
    pub fn from_spreadsheet(path: &Path, sheet: &str) -> Result<Self> {
        let mut workbook = open_workbook_auto(path)?;
        let range = workbook.worksheet_range(sheet).map_err(|e| {
            ProductSheetError::MetadataSheet(format!(
                "Could not read sheet '{}' in {}: {}",
                sheet,
                path.display(),
                e
            ))
        })?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header) => header
                .iter()
                .map(|c| cell_to_string(c).unwrap_or_default())
                .collect(),
            None => {
                return Err(ProductSheetError::MetadataSheet(format!(
                    "Sheet '{}' is empty",
                    sheet
                )));
            }
        };

        let rows = rows
            .map(|row| {
                let mut values: Vec<Option<String>> = row.iter().map(cell_to_string).collect();
                values.resize(headers.len(), None);
                values
            })
            .collect();

        Ok(Self::new(headers, rows))
    }

    /// Read a CSV/TSV file with delimiter detection.
    pub fn from_delimited(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| ProductSheetError::io(path, e))?;
        Self::parse_delimited(&bytes)
    }

    /// Parse delimited bytes with delimiter detection.
    pub fn parse_delimited(bytes: &[u8]) -> Result<Self> {
        let delimiter = detect_delimiter(bytes)?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(bytes);

        let headers: Vec<String> = reader.headers()?.iter().map(|s| s.to_string()).collect();
        if headers.is_empty() {
            return Err(ProductSheetError::MetadataSheet(
                "No columns found".to_string(),
            ));
        }

        let mut rows = Vec::new();
        for result in reader.records() {
            let record = result?;
            let mut row: Vec<Option<String>> = record.iter().map(text_cell).collect();
            row.resize(headers.len(), None);
            rows.push(row);
        }

        Ok(Self::new(headers, rows))
    }

    /// Get the number of rows (excluding header).
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Get the index of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Find the first row whose `key_column` equals `key`.
    ///
    /// Returns the row's non-missing cells, excluding the key column, in
    /// column order.
    pub fn find_row(&self, key_column: &str, key: &str) -> Result<Option<IndexMap<String, String>>> {
        let key_index = self.column_index(key_column).ok_or_else(|| {
            ProductSheetError::MetadataSheet(format!("Missing key column '{}'", key_column))
        })?;

        let row = self
            .rows
            .iter()
            .find(|row| row.get(key_index).and_then(|v| v.as_deref()) == Some(key));

        Ok(row.map(|row| {
            self.headers
                .iter()
                .zip(row.iter())
                .enumerate()
                .filter(|(i, _)| *i != key_index)
                .filter_map(|(_, (header, value))| {
                    value.as_ref().map(|v| (header.clone(), v.clone()))
                })
                .collect()
        }))
    }

    /// Check if a value represents a missing/null value.
    pub fn is_null_value(value: &str) -> bool {
        let trimmed = value.trim();
        trimmed.is_empty()
            || trimmed.eq_ignore_ascii_case("na")
            || trimmed.eq_ignore_ascii_case("n/a")
            || trimmed.eq_ignore_ascii_case("nan")
            || trimmed.eq_ignore_ascii_case("null")
            || trimmed.eq_ignore_ascii_case("none")
    }
}

fn text_cell(value: &str) -> Option<String> {
    if MetadataTable::is_null_value(value) {
        None
    } else {
        Some(value.to_string())
    }
}

/// Stringify a spreadsheet cell, `None` for empty and error cells.
fn cell_to_string(cell: &Data) -> Option<String> {
    match cell {
        Data::Empty | Data::Error(_) => None,
        Data::String(s) => text_cell(s),
        Data::Int(i) => Some(i.to_string()),
        Data::Float(f) if f.is_nan() => None,
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e16 => Some(format!("{}", *f as i64)),
        Data::Float(f) => Some(f.to_string()),
        Data::Bool(b) => Some(if *b { "True" } else { "False" }.to_string()),
        other => Some(other.to_string()),
    }
}

/// Detect the delimiter by analyzing the first few lines.
fn detect_delimiter(bytes: &[u8]) -> Result<u8> {
    let reader = BufReader::new(bytes);
    let lines: Vec<String> = reader
        .lines()
        .take(10)
        .filter_map(|l| l.ok())
        .filter(|l| !l.trim().is_empty())
        .collect();

    if lines.is_empty() {
        return Err(ProductSheetError::MetadataSheet(
            "Metadata file is empty".to_string(),
        ));
    }

    let mut best_delimiter = b',';
    let mut best_score = 0;

    for &delim in DELIMITERS {
        let counts: Vec<usize> = lines
            .iter()
            .map(|line| count_delimiter_in_line(line, delim))
            .collect();

        let first_count = counts[0];
        if first_count == 0 {
            continue;
        }

        // Consistent counts across lines win; tab breaks ties.
        let consistent = counts.iter().all(|&c| c == first_count);
        let score = if consistent {
            first_count * 1000 + if delim == b'\t' { 100 } else { 0 }
        } else {
            first_count
        };

        if score > best_score {
            best_score = score;
            best_delimiter = delim;
        }
    }

    Ok(best_delimiter)
}

/// Count delimiter occurrences in a line, respecting quotes.
fn count_delimiter_in_line(line: &str, delimiter: u8) -> usize {
    let delim_char = delimiter as char;
    let mut count = 0;
    let mut in_quotes = false;

    for ch in line.chars() {
        match ch {
            '"' => in_quotes = !in_quotes,
            c if c == delim_char && !in_quotes => count += 1,
            _ => {}
        }
    }

    count
}
