//! `validate` subcommand: preflight a deployed artifact directory

use std::path::Path;

use anyhow::{Context, Result};
use console::style;

use crate::artifacts::Artifacts;
use crate::utils::{print_info, print_success};

/// Load and cross-validate an artifact directory, printing its shape
///
/// A process that fails here must refuse to serve; the command exits
/// non-zero with the inconsistency in the message.
pub fn run_validate(artifacts_dir: &Path) -> Result<()> {
    let artifacts = Artifacts::load(artifacts_dir).with_context(|| {
        format!(
            "Artifact directory '{}' failed validation",
            artifacts_dir.display()
        )
    })?;

    print_success(&format!(
        "Artifacts in '{}' are consistent",
        artifacts_dir.display()
    ));
    println!();

    let indicator_count: usize = artifacts
        .encoder
        .columns
        .iter()
        .map(|c| c.categories.len())
        .sum();

    print_info(&format!(
        "Encoder: {} categorical column(s), {} indicator column(s)",
        artifacts.encoder.columns.len(),
        indicator_count
    ));
    print_info(&format!(
        "Scaler: {}",
        artifacts.scaler.column_names().join(", ")
    ));
    print_info(&format!(
        "Selector: {} selected feature(s)",
        artifacts.selector.len()
    ));
    print_info(&format!(
        "Model: {} tree(s) over {} feature(s), base score {}",
        artifacts.model.num_trees(),
        artifacts.model.num_features(),
        style(artifacts.model.base_score).yellow()
    ));

    Ok(())
}
