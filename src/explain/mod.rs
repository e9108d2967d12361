//! Prediction explanations: ranked per-feature attributions
//!
//! Wraps the exact tree attribution in the output contract the callers
//! render: a full attribution vector plus a ranked top-N list with direction
//! and a human-readable rationale per feature.

pub mod treeshap;

pub use treeshap::tree_shap;

use polars::prelude::DataFrame;
use serde::Serialize;

use crate::artifacts::Artifacts;
use crate::pipeline::score::to_feature_matrix;
use crate::pipeline::transform::PipelineError;

/// One feature's contribution to a prediction, in raw log-odds space
#[derive(Debug, Clone, Serialize)]
pub struct Attribution {
    pub feature: String,
    pub value: f64,
}

impl Attribution {
    /// Whether this feature pushes the prediction toward churn
    pub fn increases_churn(&self) -> bool {
        self.value > 0.0
    }

    /// Human-readable rationale for this attribution
    pub fn rationale(&self) -> String {
        let direction = if self.increases_churn() {
            "increase"
        } else {
            "decrease"
        };
        format!(
            "`{}` tends to {} churn probability, attribution = {:.4}",
            self.feature, direction, self.value
        )
    }
}

/// Full explanation of a single record's prediction
#[derive(Debug, Clone, Serialize)]
pub struct Explanation {
    /// Expected raw score over the training distribution
    pub baseline: f64,
    /// Raw log-odds score for this record
    pub raw_score: f64,
    /// Churn probability for this record
    pub probability: f64,
    /// Attributions in model feature order; summed with `baseline` they
    /// reconstruct `raw_score`
    pub attributions: Vec<Attribution>,
}

impl Explanation {
    /// Top-N attributions ranked by absolute magnitude, largest first
    pub fn top(&self, n: usize) -> Vec<&Attribution> {
        let mut ranked: Vec<&Attribution> = self.attributions.iter().collect();
        ranked.sort_by(|a, b| {
            b.value
                .abs()
                .partial_cmp(&a.value.abs())
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        ranked.truncate(n);
        ranked
    }
}

/// Explain one feature vector against the model
pub fn explain_record(
    artifacts: &Artifacts,
    features: &[f64],
) -> Result<Explanation, PipelineError> {
    let model = &artifacts.model;
    if features.len() != model.num_features() {
        return Err(PipelineError::FeatureShape {
            expected: model.num_features(),
            actual: features.len(),
        });
    }

    let phi = tree_shap(model, features);
    let attributions = model
        .feature_names
        .iter()
        .zip(phi)
        .map(|(feature, value)| Attribution {
            feature: feature.clone(),
            value,
        })
        .collect();

    Ok(Explanation {
        baseline: model.expected_raw(),
        raw_score: model.predict_raw(features),
        probability: model.predict_proba(features),
        attributions,
    })
}

/// Explain one row of a selected-feature table
pub fn explain_row(
    artifacts: &Artifacts,
    table: &DataFrame,
    row: usize,
) -> Result<Explanation, PipelineError> {
    let matrix = to_feature_matrix(table, &artifacts.model.feature_names)?;
    let features = matrix.get(row).ok_or(PipelineError::RowOutOfRange {
        row,
        height: matrix.len(),
    })?;
    explain_record(artifacts, features)
}
