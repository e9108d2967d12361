//! Encoder/scaler/selector stage
//!
//! Applies the fitted one-hot encoder and numeric scaler to a normalized
//! table, then projects onto the selected feature subset. Unseen categorical
//! values reject the offending record instead of flowing downstream as a
//! partially-encoded row; a selected column missing from the encoded table is
//! a fatal artifact inconsistency.

use polars::prelude::*;
use serde::Serialize;
use thiserror::Error;

use crate::artifacts::Artifacts;

/// The fixed numeric feature set; everything else (minus the target) is
/// treated as categorical
pub const NUMERIC_COLUMNS: [&str; 3] = ["tenure", "monthly_charges", "total_charges"];

/// Target column excluded from encoding when present in training-style input
pub const TARGET_COLUMN: &str = "churn";

/// Pipeline stage errors
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Input is missing required column '{0}'")]
    MissingColumn(String),

    #[error(
        "Encoded table is missing selected feature column(s): {}",
        .columns.join(", ")
    )]
    MissingSelectedColumns { columns: Vec<String> },

    #[error(
        "Row {row} rejected: value '{value}' in column '{column}' was never seen at fit time"
    )]
    RecordRejected {
        row: usize,
        column: String,
        value: String,
    },

    #[error("Feature vector has {actual} values but the model expects {expected}")]
    FeatureShape { expected: usize, actual: usize },

    #[error("Row {row} is out of range for a table of {height} scored row(s)")]
    RowOutOfRange { row: usize, height: usize },

    #[error(transparent)]
    Polars(#[from] PolarsError),
}

/// A record the encoder refused, identified by its original row index
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RejectedRecord {
    pub row: usize,
    pub column: String,
    pub value: String,
}

/// Output of the transform stage
///
/// `features` holds every input row (rejected rows carry zeroed indicators);
/// callers must drop the rows listed in `rejected` before scoring.
#[derive(Debug, Clone)]
pub struct TransformedBatch {
    pub features: DataFrame,
    pub rejected: Vec<RejectedRecord>,
}

/// Encode, scale, and select a normalized table
pub fn transform(
    artifacts: &Artifacts,
    df: &DataFrame,
) -> Result<TransformedBatch, PipelineError> {
    let height = df.height();
    let mut rejected: Vec<RejectedRecord> = Vec::new();
    let mut columns: Vec<Column> = Vec::new();

    // Scale the numeric trio in place, in fit order
    for name in artifacts.scaler.column_names() {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::MissingColumn(name.to_string()))?;
        let values = column.cast(&DataType::Float64)?;
        let mut scaled = Vec::with_capacity(height);
        for (row, opt) in values.f64()?.into_iter().enumerate() {
            match opt {
                Some(v) => {
                    // Fit-time column set was validated at artifact load
                    let s = artifacts.scaler.transform_value(name, v).unwrap_or(v);
                    scaled.push(s);
                }
                None => {
                    rejected.push(RejectedRecord {
                        row,
                        column: name.to_string(),
                        value: "null".to_string(),
                    });
                    scaled.push(0.0);
                }
            }
        }
        columns.push(Column::new(name.into(), scaled));
    }

    // One-hot encode the categorical columns against the fitted vocabulary
    for vocab in &artifacts.encoder.columns {
        let column = df
            .column(&vocab.column)
            .map_err(|_| PipelineError::MissingColumn(vocab.column.clone()))?;
        let values = column_to_strings(column)?;

        let mut indicators: Vec<Vec<f64>> =
            vec![vec![0.0; height]; vocab.categories.len()];

        for (row, opt) in values.iter().enumerate() {
            match opt.as_deref().and_then(|v| vocab.category_index(v)) {
                Some(cat_idx) => indicators[cat_idx][row] = 1.0,
                None => rejected.push(RejectedRecord {
                    row,
                    column: vocab.column.clone(),
                    value: opt.clone().unwrap_or_else(|| "null".to_string()),
                }),
            }
        }

        for (cat, values) in vocab.categories.iter().zip(indicators) {
            columns.push(Column::new(vocab.indicator_name(cat).into(), values));
        }
    }

    let encoded = DataFrame::new(columns)?;

    // Project onto the fixed selected subset; a missing column means the
    // deployed artifacts disagree with each other
    let available: Vec<String> = encoded
        .get_column_names()
        .iter()
        .map(|s| s.to_string())
        .collect();
    let missing = artifacts.selector.missing_from(&available);
    if !missing.is_empty() {
        return Err(PipelineError::MissingSelectedColumns { columns: missing });
    }

    let features = encoded.select(artifacts.selector.features.iter().map(|s| s.as_str()))?;

    rejected.sort_by_key(|r| r.row);
    Ok(TransformedBatch { features, rejected })
}

/// Materialize a column as strings for vocabulary lookup
fn column_to_strings(col: &Column) -> Result<Vec<Option<String>>, PipelineError> {
    let values: Vec<Option<String>> = match col.dtype() {
        DataType::String => col
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
        DataType::Boolean => col
            .bool()?
            .into_iter()
            .map(|v| v.map(|b| b.to_string()))
            .collect(),
        dt if dt.is_float() => col
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            .map(|v| v.map(|n| format!("{}", n)))
            .collect(),
        dt if dt.is_primitive_numeric() => col
            .cast(&DataType::Int64)?
            .i64()?
            .into_iter()
            .map(|v| v.map(|n| n.to_string()))
            .collect(),
        _ => col
            .cast(&DataType::String)?
            .str()?
            .into_iter()
            .map(|v| v.map(|s| s.to_string()))
            .collect(),
    };

    Ok(values)
}
