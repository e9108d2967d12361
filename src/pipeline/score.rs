//! Scorer: churn probability for every surviving row
//!
//! Rejected rows are dropped before inference and reported by original row
//! index; surviving rows keep their relative order and the output carries a
//! `source_rows` mapping back to the input. The classification threshold is
//! the caller's concern; this stage emits probabilities only.

use std::collections::HashSet;

use polars::prelude::*;
use rayon::prelude::*;

use crate::artifacts::Artifacts;
use crate::pipeline::transform::{PipelineError, RejectedRecord, TransformedBatch};

/// Name of the probability column appended by the scorer
pub const PROBABILITY_COLUMN: &str = "churn_probability";

/// A scored batch: selected features plus `churn_probability`
#[derive(Debug, Clone)]
pub struct ScoredBatch {
    /// Selected feature columns plus the probability column, accepted rows only
    pub table: DataFrame,
    /// Original input row index for each output row
    pub source_rows: Vec<usize>,
    /// Records the encoder refused, by original row index
    pub rejected: Vec<RejectedRecord>,
}

impl ScoredBatch {
    /// Probabilities in output row order
    pub fn probabilities(&self) -> Result<Vec<f64>, PipelineError> {
        let values = self
            .table
            .column(PROBABILITY_COLUMN)?
            .f64()?
            .into_iter()
            .map(|v| v.unwrap_or(f64::NAN))
            .collect();
        Ok(values)
    }
}

/// Score a transformed batch
pub fn score_batch(
    artifacts: &Artifacts,
    transformed: &TransformedBatch,
) -> Result<ScoredBatch, PipelineError> {
    let rejected_rows: HashSet<usize> =
        transformed.rejected.iter().map(|r| r.row).collect();
    let source_rows: Vec<usize> = (0..transformed.features.height())
        .filter(|row| !rejected_rows.contains(row))
        .collect();

    let indices: IdxCa = IdxCa::from_vec(
        "idx".into(),
        source_rows.iter().map(|&i| i as IdxSize).collect(),
    );
    let mut table = transformed.features.take(&indices)?;

    let matrix = to_feature_matrix(&table, &artifacts.model.feature_names)?;
    let probabilities: Vec<f64> = matrix
        .par_iter()
        .map(|row| artifacts.model.predict_proba(row))
        .collect();

    table.with_column(Column::new(PROBABILITY_COLUMN.into(), probabilities))?;

    Ok(ScoredBatch {
        table,
        source_rows,
        rejected: transformed.rejected.clone(),
    })
}

/// Score a single record strictly: any rejection is an error
pub fn score_record(artifacts: &Artifacts, transformed: &TransformedBatch) -> Result<f64, PipelineError> {
    if let Some(rejection) = transformed.rejected.first() {
        return Err(PipelineError::RecordRejected {
            row: rejection.row,
            column: rejection.column.clone(),
            value: rejection.value.clone(),
        });
    }

    let matrix = to_feature_matrix(&transformed.features, &artifacts.model.feature_names)?;
    let row = matrix
        .first()
        .ok_or(PipelineError::FeatureShape {
            expected: artifacts.model.num_features(),
            actual: 0,
        })?;
    Ok(artifacts.model.predict_proba(row))
}

/// Materialize a selected-feature table as a row-major f64 matrix
///
/// Column order follows the model's feature contract exactly.
pub fn to_feature_matrix(
    df: &DataFrame,
    feature_names: &[String],
) -> Result<Vec<Vec<f64>>, PipelineError> {
    let mut by_column: Vec<Vec<f64>> = Vec::with_capacity(feature_names.len());
    for name in feature_names {
        let column = df
            .column(name)
            .map_err(|_| PipelineError::MissingColumn(name.clone()))?;
        let values: Vec<f64> = column
            .cast(&DataType::Float64)?
            .f64()?
            .into_iter()
            // Nulls were rejected upstream; a residual null scores as zero
            .map(|v| v.unwrap_or(0.0))
            .collect();
        by_column.push(values);
    }

    let height = df.height();
    let mut matrix = vec![vec![0.0; feature_names.len()]; height];
    for (c, column) in by_column.iter().enumerate() {
        for (r, &value) in column.iter().enumerate() {
            matrix[r][c] = value;
        }
    }
    Ok(matrix)
}
