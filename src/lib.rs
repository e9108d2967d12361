//! Churnscore: Customer Churn Scoring Library
//!
//! A library for scoring telco customer records against a pretrained
//! gradient-boosted-tree classifier using fitted preprocessing artifacts,
//! with exact per-feature attribution for single-record explanations.

pub mod artifacts;
pub mod cli;
pub mod explain;
pub mod pipeline;
pub mod report;
pub mod utils;
