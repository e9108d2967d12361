//! Fitted numeric scaler
//!
//! Standard-score or min-max scaling with per-column parameters fixed at
//! training time. Which variant applies is recorded in the artifact itself.

use serde::{Deserialize, Serialize};

/// Per-column standard-score parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardColumn {
    pub name: String,
    pub mean: f64,
    pub scale: f64,
}

/// Per-column min-max parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MinMaxColumn {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

/// Fitted numeric scaler, tagged by the variant used at fit time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Scaler {
    Standard { columns: Vec<StandardColumn> },
    MinMax { columns: Vec<MinMaxColumn> },
}

impl Scaler {
    /// Names of the numeric columns this scaler was fitted on, in fit order
    pub fn column_names(&self) -> Vec<&str> {
        match self {
            Scaler::Standard { columns } => columns.iter().map(|c| c.name.as_str()).collect(),
            Scaler::MinMax { columns } => columns.iter().map(|c| c.name.as_str()).collect(),
        }
    }

    /// Scale a single value from the named column
    ///
    /// Returns `None` when the column was not part of the fit.
    pub fn transform_value(&self, column: &str, value: f64) -> Option<f64> {
        match self {
            Scaler::Standard { columns } => columns.iter().find(|c| c.name == column).map(|c| {
                if c.scale == 0.0 {
                    0.0
                } else {
                    (value - c.mean) / c.scale
                }
            }),
            Scaler::MinMax { columns } => columns.iter().find(|c| c.name == column).map(|c| {
                let range = c.max - c.min;
                if range == 0.0 {
                    0.0
                } else {
                    (value - c.min) / range
                }
            }),
        }
    }
}
