//! Scoring summary report generation

use std::time::Duration;

use comfy_table::{presets::UTF8_FULL_CONDENSED, Attribute, Cell, Color, Table};
use console::style;

use crate::pipeline::RejectedRecord;

/// Summary of one scoring run
#[derive(Debug, Default)]
pub struct ScoringSummary {
    pub total_records: usize,
    pub scored_records: usize,
    pub likely_churners: usize,
    pub threshold: f64,
    pub mean_probability: f64,
    pub rejected: Vec<RejectedRecord>,
    pub load_time: Duration,
    pub transform_time: Duration,
    pub score_time: Duration,
}

impl ScoringSummary {
    pub fn new(total_records: usize, threshold: f64) -> Self {
        Self {
            total_records,
            threshold,
            ..Default::default()
        }
    }

    pub fn record_scores(&mut self, probabilities: &[f64]) {
        self.scored_records = probabilities.len();
        self.likely_churners = probabilities
            .iter()
            .filter(|p| **p >= self.threshold)
            .count();
        self.mean_probability = if probabilities.is_empty() {
            0.0
        } else {
            probabilities.iter().sum::<f64>() / probabilities.len() as f64
        };
    }

    pub fn record_rejections(&mut self, rejected: Vec<RejectedRecord>) {
        self.rejected = rejected;
    }

    pub fn set_load_time(&mut self, elapsed: Duration) {
        self.load_time = elapsed;
    }

    pub fn set_transform_time(&mut self, elapsed: Duration) {
        self.transform_time = elapsed;
    }

    pub fn set_score_time(&mut self, elapsed: Duration) {
        self.score_time = elapsed;
    }

    pub fn display(&self) {
        println!();
        println!(
            "    {} {}",
            style("📋").cyan(),
            style("SCORING SUMMARY").white().bold()
        );
        println!("    {}", style("─".repeat(50)).dim());
        println!();

        let mut table = Table::new();
        table.load_preset(UTF8_FULL_CONDENSED);
        table.set_header(vec![
            Cell::new("Metric").add_attribute(Attribute::Bold),
            Cell::new("Value").add_attribute(Attribute::Bold),
        ]);

        table.add_row(vec![
            Cell::new("📁 Input Records"),
            Cell::new(self.total_records),
        ]);

        table.add_row(vec![
            Cell::new("✅ Scored Records"),
            Cell::new(self.scored_records)
                .fg(Color::Green)
                .add_attribute(Attribute::Bold),
        ]);

        let rejected_rows = self.rejected_row_count();
        table.add_row(vec![
            Cell::new("🚫 Rejected Records"),
            Cell::new(rejected_rows).fg(if rejected_rows == 0 {
                Color::White
            } else {
                Color::Red
            }),
        ]);

        table.add_row(vec![
            Cell::new(format!("🔥 Likely Churners (≥{:.2})", self.threshold)),
            Cell::new(self.likely_churners).fg(if self.likely_churners == 0 {
                Color::White
            } else {
                Color::Yellow
            }),
        ]);

        table.add_row(vec![
            Cell::new("📈 Mean Probability"),
            Cell::new(format!("{:.4}", self.mean_probability)),
        ]);

        // Indent the table
        for line in table.to_string().lines() {
            println!("    {}", line);
        }

        if !self.rejected.is_empty() {
            println!();
            println!(
                "    {} {}",
                style("📝").cyan(),
                style("REJECTED RECORDS").white().bold()
            );
            println!("    {}", style("─".repeat(50)).dim());
            println!();
            for rejection in &self.rejected {
                println!(
                    "      {} row {}: '{}' in column '{}' was never seen at fit time",
                    style("•").dim(),
                    rejection.row,
                    rejection.value,
                    rejection.column
                );
            }
        }
    }

    /// Distinct rejected rows (one row can fail on several columns)
    pub fn rejected_row_count(&self) -> usize {
        let mut rows: Vec<usize> = self.rejected.iter().map(|r| r.row).collect();
        rows.sort_unstable();
        rows.dedup();
        rows.len()
    }
}
