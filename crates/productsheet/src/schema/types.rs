//! Declared field types.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Declared data type of a layer field.
///
/// Displayed with the short vocabulary used in product sheets
/// (`str:80`, `int`, `float`, `date`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FieldType {
    /// Text, with an optional maximum width.
    Text(Option<u32>),
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// Boolean values.
    Boolean,
    /// Date only.
    Date,
    /// Date and time.
    DateTime,
    /// Binary data.
    Blob,
    /// Any other declared type, lowercased.
    Other(String),
}

impl FieldType {
    /// Map a declared SQLite column type to a field type.
    pub fn from_declared(declared: &str) -> Self {
        let upper = declared.trim().to_ascii_uppercase();
        let (base, width) = match upper.find('(') {
            Some(open) => {
                let width = upper[open + 1..]
                    .trim_end_matches(')')
                    .trim()
                    .parse::<u32>()
                    .ok();
                (upper[..open].trim(), width)
            }
            None => (upper.as_str(), None),
        };

        match base {
            "TEXT" | "VARCHAR" | "CHAR" | "CHARACTER" | "NVARCHAR" | "CLOB" => {
                FieldType::Text(width.filter(|w| *w > 0))
            }
            "INTEGER" | "INT" | "BIGINT" | "MEDIUMINT" | "SMALLINT" | "TINYINT" => {
                FieldType::Integer
            }
            "REAL" | "DOUBLE" | "FLOAT" | "NUMERIC" | "DECIMAL" => FieldType::Float,
            "BOOLEAN" | "BOOL" => FieldType::Boolean,
            "DATE" => FieldType::Date,
            "DATETIME" | "TIMESTAMP" => FieldType::DateTime,
            "BLOB" => FieldType::Blob,
            _ => FieldType::Other(declared.trim().to_lowercase()),
        }
    }

    /// Returns true if values of this type are text.
    pub fn is_textual(&self) -> bool {
        match self {
            FieldType::Text(_) => true,
            FieldType::Other(name) => name.contains("str"),
            _ => false,
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Text(Some(width)) => write!(f, "str:{}", width),
            FieldType::Text(None) => write!(f, "str"),
            FieldType::Integer => write!(f, "int"),
            FieldType::Float => write!(f, "float"),
            FieldType::Boolean => write!(f, "bool"),
            FieldType::Date => write!(f, "date"),
            FieldType::DateTime => write!(f, "datetime"),
            FieldType::Blob => write!(f, "bytes"),
            FieldType::Other(name) => f.write_str(name),
        }
    }
}

impl FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim().to_lowercase();
        if let Some(width) = lower.strip_prefix("str:") {
            let width = width
                .parse::<u32>()
                .map_err(|_| format!("Invalid text width: {}", s))?;
            return Ok(FieldType::Text(Some(width)));
        }
        Ok(match lower.as_str() {
            "str" => FieldType::Text(None),
            "int" => FieldType::Integer,
            "float" => FieldType::Float,
            "bool" => FieldType::Boolean,
            "date" => FieldType::Date,
            "datetime" => FieldType::DateTime,
            "bytes" => FieldType::Blob,
            "" => return Err("Empty field type".to_string()),
            _ => FieldType::Other(lower),
        })
    }
}

impl Serialize for FieldType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for FieldType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
