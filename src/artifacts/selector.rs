//! Fitted feature selector
//!
//! A fixed, ordered subset of the encoded column names, decided at training
//! time. Never recomputed at inference time.

use serde::{Deserialize, Serialize};

/// Ordered list of selected encoded column names
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureSelector {
    pub features: Vec<String>,
}

impl FeatureSelector {
    pub fn new(features: Vec<String>) -> Self {
        Self { features }
    }

    pub fn len(&self) -> usize {
        self.features.len()
    }

    pub fn is_empty(&self) -> bool {
        self.features.is_empty()
    }

    /// Selected columns missing from `available`, in selection order
    pub fn missing_from(&self, available: &[String]) -> Vec<String> {
        self.features
            .iter()
            .filter(|f| !available.contains(f))
            .cloned()
            .collect()
    }
}
