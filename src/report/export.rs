//! Scoring result export functionality

use std::path::Path;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::Serialize;

use crate::explain::Explanation;
use crate::pipeline::{RejectedRecord, ScoredBatch};

/// Metadata about the scoring run
#[derive(Serialize)]
pub struct ScoringMetadata {
    /// Timestamp of the run (ISO 8601 format)
    pub timestamp: String,
    /// Churnscore version
    pub churnscore_version: String,
    /// Input file path
    pub input_file: String,
    /// Artifact directory the model was loaded from
    pub artifacts_dir: String,
    /// Decision threshold applied by the caller
    pub threshold: f64,
}

/// Summary statistics of the scoring run
#[derive(Serialize)]
pub struct ScoringStats {
    pub total_records: usize,
    pub scored_records: usize,
    pub rejected_records: usize,
    pub likely_churners: usize,
    pub mean_probability: f64,
}

/// One scored row in the export
#[derive(Serialize)]
pub struct ScoredRow {
    /// Row index in the input table
    pub source_row: usize,
    pub churn_probability: f64,
    /// Whether the probability clears the decision threshold
    pub likely_churner: bool,
}

/// Complete scoring export with metadata
#[derive(Serialize)]
pub struct ScoringExport {
    pub metadata: ScoringMetadata,
    pub summary: ScoringStats,
    pub rows: Vec<ScoredRow>,
    pub rejected: Vec<RejectedRecord>,
    /// Optional single-record explanation requested by the caller
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<Explanation>,
}

/// Parameters for the scoring export
pub struct ExportParams<'a> {
    pub input_file: &'a str,
    pub artifacts_dir: &'a str,
    pub threshold: f64,
}

/// Export scoring results to a JSON file
///
/// # Arguments
/// * `scored` - The scored batch from the pipeline
/// * `probabilities` - Probabilities in output row order
/// * `explanation` - Optional explanation for one requested row
/// * `output_path` - Path to write the JSON file
/// * `params` - Export parameters for metadata
pub fn export_scoring_results(
    scored: &ScoredBatch,
    probabilities: &[f64],
    explanation: Option<Explanation>,
    output_path: &Path,
    params: &ExportParams,
) -> Result<()> {
    let rows: Vec<ScoredRow> = scored
        .source_rows
        .iter()
        .zip(probabilities.iter())
        .map(|(&source_row, &churn_probability)| ScoredRow {
            source_row,
            churn_probability,
            likely_churner: churn_probability >= params.threshold,
        })
        .collect();

    let rejected_rows = {
        let mut rows: Vec<usize> = scored.rejected.iter().map(|r| r.row).collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    };

    let mean_probability = if probabilities.is_empty() {
        0.0
    } else {
        probabilities.iter().sum::<f64>() / probabilities.len() as f64
    };

    let export = ScoringExport {
        metadata: ScoringMetadata {
            timestamp: Utc::now().to_rfc3339(),
            churnscore_version: env!("CARGO_PKG_VERSION").to_string(),
            input_file: params.input_file.to_string(),
            artifacts_dir: params.artifacts_dir.to_string(),
            threshold: params.threshold,
        },
        summary: ScoringStats {
            total_records: scored.source_rows.len() + rejected_rows,
            scored_records: scored.source_rows.len(),
            rejected_records: rejected_rows,
            likely_churners: rows.iter().filter(|r| r.likely_churner).count(),
            mean_probability,
        },
        rows,
        rejected: scored.rejected.clone(),
        explanation,
    };

    let json = serde_json::to_string_pretty(&export)
        .context("Failed to serialize scoring results to JSON")?;

    std::fs::write(output_path, json)
        .with_context(|| format!("Failed to write scoring results to {}", output_path.display()))?;

    Ok(())
}
