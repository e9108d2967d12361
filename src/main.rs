//! Churnscore: Customer Churn Scoring CLI
//!
//! Scores raw customer tables against a pretrained classifier using fitted
//! preprocessing artifacts, and explains single predictions with exact
//! per-feature attribution.

use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;
use polars::prelude::*;

use churnscore::artifacts::Artifacts;
use churnscore::cli::{run_validate, Cli, Commands};
use churnscore::explain::explain_row;
use churnscore::pipeline::{
    load_dataset, normalize, save_dataset, score_batch, transform, TARGET_COLUMN,
};
use churnscore::report::{export_scoring_results, ExportParams, ScoringSummary};
use churnscore::utils::{
    create_spinner, finish_with_success, finish_with_warning, print_banner, print_completion,
    print_config, print_count, print_info, print_step_header, print_step_time, print_success,
    print_warning,
};

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Handle subcommands
    if let Some(command) = &cli.command {
        return match command {
            Commands::Validate { artifacts } => run_validate(artifacts),
        };
    }

    // Main scoring pipeline - require input
    let input = cli.input().ok_or_else(|| {
        anyhow::anyhow!("Input file is required. Use -i/--input to specify a file.")
    })?;

    // Derive output path from input if not provided
    let output_path = cli.output_path().unwrap();

    // Print styled banner and configuration card
    print_banner(env!("CARGO_PKG_VERSION"));
    print_config(input, &cli.artifacts, &output_path, cli.threshold);

    // Step 1: Load artifacts - a process with inconsistent artifacts must
    // refuse to serve
    print_step_header(1, "Load Artifacts");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading fitted artifacts...");
    let artifacts = match Artifacts::load(&cli.artifacts) {
        Ok(artifacts) => {
            finish_with_success(&spinner, "Artifacts loaded and validated");
            artifacts
        }
        Err(e) => {
            finish_with_warning(&spinner, "Artifact loading failed");
            return Err(e).with_context(|| {
                format!(
                    "Refusing to serve: artifact directory '{}' is unusable",
                    cli.artifacts.display()
                )
            });
        }
    };
    print_info(&format!(
        "Model: {} tree(s) over {} selected feature(s)",
        artifacts.model.num_trees(),
        artifacts.model.num_features()
    ));
    print_step_time(step_start.elapsed());

    // Step 2: Load dataset
    print_step_header(2, "Load Dataset");
    let step_start = Instant::now();
    let spinner = create_spinner("Loading dataset...");
    let raw = load_dataset(input)?;
    let (rows, cols) = raw.shape();
    finish_with_success(&spinner, "Dataset loaded");
    println!("\n    {} Dataset Statistics:", style("✧").cyan());
    println!("      Rows: {}", rows);
    println!("      Columns: {}", cols);

    let mut summary = ScoringSummary::new(rows, cli.threshold);
    summary.set_load_time(step_start.elapsed());
    print_step_time(step_start.elapsed());

    // Step 3: Normalize schema
    print_step_header(3, "Normalize Schema");
    let step_start = Instant::now();
    let normalized = normalize(raw)?;
    // Ground-truth labels (batch uploads may carry them) ride along to the
    // output but never enter the feature pipeline
    let churn_labels = normalized
        .column(TARGET_COLUMN)
        .ok()
        .map(|c| c.as_materialized_series().clone());
    print_success("Schema normalized");
    print_step_time(step_start.elapsed());

    // Step 4: Encode, scale, and select features
    print_step_header(4, "Encode, Scale, Select");
    let step_start = Instant::now();
    let transformed = transform(&artifacts, &normalized)?;
    if transformed.rejected.is_empty() {
        print_info("All records encoded against the fitted vocabulary");
    } else {
        let rejected_rows = {
            let mut rows: Vec<usize> = transformed.rejected.iter().map(|r| r.row).collect();
            rows.sort_unstable();
            rows.dedup();
            rows.len()
        };
        print_count("rejected record(s)", rejected_rows, Some("(unseen values)"));
        print_warning("Rejected records are excluded from scoring and listed in the summary");
    }
    summary.set_transform_time(step_start.elapsed());
    print_step_time(step_start.elapsed());

    // Step 5: Score
    print_step_header(5, "Score");
    let step_start = Instant::now();
    let scored = score_batch(&artifacts, &transformed)?;
    let probabilities = scored.probabilities()?;
    summary.record_scores(&probabilities);
    summary.record_rejections(scored.rejected.clone());
    print_success(&format!("Scored {} record(s)", probabilities.len()));
    print_count(
        "likely churner(s)",
        summary.likely_churners,
        Some(&format!("(≥{:.2})", cli.threshold)),
    );
    summary.set_score_time(step_start.elapsed());
    print_step_time(step_start.elapsed());

    let mut next_step = 6u8;

    // Optional: explain one scored row
    let explanation = if let Some(row) = cli.explain {
        print_step_header(next_step, "Explain");
        next_step += 1;

        let explanation = explain_row(&artifacts, &scored.table, row).with_context(|| {
            format!("Failed to explain output row {} (0-based, scored rows only)", row)
        })?;

        println!(
            "      Row {} (input row {}): churn probability {}",
            row,
            scored.source_rows[row],
            style(format!("{:.4}", explanation.probability)).yellow().bold()
        );
        println!(
            "      Baseline (expected raw score): {:.4}",
            explanation.baseline
        );
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Feature").add_attribute(Attribute::Bold),
            Cell::new("Direction").add_attribute(Attribute::Bold),
            Cell::new("Attribution").add_attribute(Attribute::Bold),
        ]);
        for attribution in explanation.top(cli.top) {
            let (direction, color) = if attribution.increases_churn() {
                ("increases churn", Color::Red)
            } else {
                ("decreases churn", Color::Green)
            };
            table.add_row(vec![
                Cell::new(&attribution.feature),
                Cell::new(direction).fg(color),
                Cell::new(format!("{:+.4}", attribution.value)),
            ]);
        }
        for line in table.to_string().lines() {
            println!("      {}", line);
        }
        println!();
        for attribution in explanation.top(cli.top) {
            println!("      {} {}", style("•").dim(), attribution.rationale());
        }

        Some(explanation)
    } else {
        None
    };

    // Save results
    print_step_header(next_step, "Save Results");
    let step_start = Instant::now();
    let spinner = create_spinner("Writing output file...");

    let mut output_table = scored.table.clone();
    if let Some(labels) = churn_labels {
        let indices: IdxCa = IdxCa::from_vec(
            "idx".into(),
            scored.source_rows.iter().map(|&i| i as IdxSize).collect(),
        );
        let labels = labels.take(&indices)?;
        output_table.with_column(labels.with_name(TARGET_COLUMN.into()))?;
    }
    save_dataset(&mut output_table, &output_path)?;
    finish_with_success(&spinner, &format!("Saved to {}", output_path.display()));

    if cli.export_json {
        let report_path = cli.report_path().unwrap();
        export_scoring_results(
            &scored,
            &probabilities,
            explanation,
            &report_path,
            &ExportParams {
                input_file: &input.display().to_string(),
                artifacts_dir: &cli.artifacts.display().to_string(),
                threshold: cli.threshold,
            },
        )?;
        print_success(&format!("Report written to {}", report_path.display()));
    }
    print_step_time(step_start.elapsed());

    // Display summary
    summary.display();

    // Final completion message
    print_completion();

    Ok(())
}
