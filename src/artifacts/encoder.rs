//! Fitted one-hot encoder vocabulary
//!
//! Holds the categorical columns and the category lists observed at training
//! time, in fit order. Indicator column names are canonicalized with the same
//! rule as schema column names, which also strips the fitted `(automatic)`
//! suffix carried by some payment-method categories.

use serde::{Deserialize, Serialize};

use crate::pipeline::normalize::canonical_name;

/// One categorical column and its fitted category vocabulary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncoderColumn {
    /// Canonical input column name
    pub column: String,
    /// Categories observed at fit time, in fit order
    pub categories: Vec<String>,
}

impl EncoderColumn {
    /// Position of `value` in the fitted vocabulary, if it was seen at fit time
    pub fn category_index(&self, value: &str) -> Option<usize> {
        self.categories.iter().position(|c| c == value)
    }

    /// Canonical indicator column name for one category
    pub fn indicator_name(&self, category: &str) -> String {
        canonical_name(&format!("{}_{}", self.column, category))
    }
}

/// Fitted one-hot encoder: ordered categorical columns with their vocabularies
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OneHotEncoder {
    pub columns: Vec<EncoderColumn>,
}

impl OneHotEncoder {
    /// All indicator column names this encoder produces, in output order
    pub fn output_names(&self) -> Vec<String> {
        self.columns
            .iter()
            .flat_map(|col| {
                col.categories
                    .iter()
                    .map(|cat| col.indicator_name(cat))
                    .collect::<Vec<_>>()
            })
            .collect()
    }

    /// Names of the categorical input columns this encoder consumes
    pub fn input_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.column.as_str()).collect()
    }
}
