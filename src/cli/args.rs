//! Command-line argument definitions using clap

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Churnscore - Score customer records for churn risk and explain predictions
#[derive(Parser, Debug)]
#[command(name = "churnscore")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Input file path (CSV or Parquet) with raw customer records
    #[arg(short, long)]
    pub input: Option<PathBuf>,

    /// Directory containing the fitted artifacts
    /// (encoder.json, scaler.json, selected_features.json, model.json)
    #[arg(short, long, default_value = "artifacts")]
    pub artifacts: PathBuf,

    /// Output file path (CSV or Parquet, determined by extension).
    /// Defaults to input directory with a '_scored' suffix (e.g. data.csv → data_scored.csv).
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Decision threshold for counting likely churners in the summary.
    /// The output always carries the raw probability; the threshold only
    /// affects reporting.
    #[arg(long, default_value = "0.5", value_parser = validate_threshold)]
    pub threshold: f64,

    /// Explain one scored row: print the top-N feature attributions for the
    /// given output row index
    #[arg(long)]
    pub explain: Option<usize>,

    /// Number of top attributions to show with --explain
    #[arg(long, default_value = "3")]
    pub top: usize,

    /// Write a JSON report (probabilities, rejections, optional explanation)
    /// next to the output file
    #[arg(long, default_value = "false")]
    pub export_json: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate a deployed artifact directory without scoring anything
    Validate {
        /// Directory containing the fitted artifacts
        artifacts: PathBuf,
    },
}

impl Cli {
    /// Get the input path when running the scoring pipeline
    pub fn input(&self) -> Option<&PathBuf> {
        self.input.as_ref()
    }

    /// Get the output path, deriving from input if not explicitly provided.
    /// The derived path will be in the same directory as the input with a
    /// '_scored' suffix.
    pub fn output_path(&self) -> Option<PathBuf> {
        let input = self.input.as_ref()?;
        Some(self.output.clone().unwrap_or_else(|| {
            let parent = input.parent().unwrap_or_else(|| std::path::Path::new("."));
            let stem = input
                .file_stem()
                .and_then(|s| s.to_str())
                .unwrap_or("output");
            let extension = input
                .extension()
                .and_then(|e| e.to_str())
                .unwrap_or("csv");
            parent.join(format!("{}_scored.{}", stem, extension))
        }))
    }

    /// Get the JSON report path, derived from the output file
    pub fn report_path(&self) -> Option<PathBuf> {
        let output = self.output_path()?;
        let parent = output.parent().unwrap_or_else(|| std::path::Path::new("."));
        let stem = output.file_stem().and_then(|s| s.to_str())?;
        Some(parent.join(format!("{}_report.json", stem)))
    }
}

/// Validator for the threshold parameter
fn validate_threshold(s: &str) -> Result<f64, String> {
    let value: f64 = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;

    if !(0.0..=1.0).contains(&value) {
        Err(format!(
            "threshold must be between 0.0 and 1.0, got {}",
            value
        ))
    } else {
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_output_path_derivation() {
        let cli = Cli::parse_from(["churnscore", "-i", "data/customers.csv"]);
        assert_eq!(
            cli.output_path().unwrap(),
            PathBuf::from("data/customers_scored.csv")
        );
    }

    #[test]
    fn test_report_path_derivation() {
        let cli = Cli::parse_from(["churnscore", "-i", "customers.csv"]);
        assert_eq!(
            cli.report_path().unwrap(),
            PathBuf::from("customers_scored_report.json")
        );
    }

    #[test]
    fn test_threshold_validation() {
        assert!(Cli::try_parse_from(["churnscore", "--threshold", "1.5"]).is_err());
        let cli = Cli::parse_from(["churnscore", "--threshold", "0.7"]);
        assert!((cli.threshold - 0.7).abs() < 1e-12);
    }
}
