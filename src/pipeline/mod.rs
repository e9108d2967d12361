//! Pipeline module - normalize, transform, and score customer tables

pub mod loader;
pub mod normalize;
pub mod score;
pub mod transform;

pub use loader::*;
pub use normalize::{canonical_name, normalize};
pub use score::{score_batch, score_record, ScoredBatch, PROBABILITY_COLUMN};
pub use transform::{
    transform, PipelineError, RejectedRecord, TransformedBatch, NUMERIC_COLUMNS, TARGET_COLUMN,
};

use anyhow::Result;
use polars::prelude::DataFrame;

use crate::artifacts::Artifacts;

/// Run the full pipeline on a raw table: normalize, transform, score
///
/// Rejected records are reported in the result; configuration-level failures
/// abort the whole call.
pub fn score_table(artifacts: &Artifacts, raw: DataFrame) -> Result<ScoredBatch> {
    let normalized = normalize(raw)?;
    let transformed = transform(artifacts, &normalized)?;
    let scored = score_batch(artifacts, &transformed)?;
    Ok(scored)
}
