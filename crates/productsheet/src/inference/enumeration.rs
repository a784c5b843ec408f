//! Enumeration inference for low-cardinality text fields.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Policy deciding when a text field's observed values form a value domain.
///
/// A field qualifies when its distinct values number between
/// `min_distinct` and `max_distinct` (inclusive) and none of them is longer
/// than `max_value_len` characters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumerationPolicy {
    /// Longest value, in characters, that can belong to a domain.
    pub max_value_len: usize,
    /// Fewest distinct values for a domain.
    pub min_distinct: usize,
    /// Most distinct values for a domain.
    pub max_distinct: usize,
}

impl Default for EnumerationPolicy {
    fn default() -> Self {
        Self {
            max_value_len: 60,
            min_distinct: 2,
            max_distinct: 16,
        }
    }
}

impl EnumerationPolicy {
    /// Create a policy with explicit thresholds.
    pub fn new(max_value_len: usize, min_distinct: usize, max_distinct: usize) -> Self {
        Self {
            max_value_len,
            min_distinct,
            max_distinct,
        }
    }

    /// Infer the sorted value domain from observed values.
    ///
    /// Values are expected to be non-missing and already stringified.
    pub fn infer<I, S>(&self, values: I) -> Option<Vec<String>>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut distinct: BTreeSet<String> = BTreeSet::new();
        for value in values {
            let value = value.as_ref();
            if value.chars().count() > self.max_value_len {
                return None;
            }
            if !distinct.contains(value) {
                if distinct.len() == self.max_distinct {
                    return None;
                }
                distinct.insert(value.to_string());
            }
        }

        if distinct.len() < self.min_distinct {
            return None;
        }
        Some(distinct.into_iter().collect())
    }
}
