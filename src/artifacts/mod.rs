//! Fitted artifacts: encoder, scaler, selector, and classifier
//!
//! Loaded once at process start from a versioned artifact directory and
//! treated as read-only for the process lifetime. Construction validates each
//! artifact and their cross-consistency; a process that fails here must
//! refuse to serve rather than score with inconsistent artifacts.

pub mod encoder;
pub mod model;
pub mod scaler;
pub mod selector;

pub use encoder::{EncoderColumn, OneHotEncoder};
pub use model::{GbdtModel, ModelError, Node, Tree};
pub use scaler::{MinMaxColumn, Scaler, StandardColumn};
pub use selector::FeatureSelector;

use std::fs;
use std::path::Path;
use thiserror::Error;

/// Artifact file names inside the artifact directory
pub const ENCODER_FILE: &str = "encoder.json";
pub const SCALER_FILE: &str = "scaler.json";
pub const SELECTOR_FILE: &str = "selected_features.json";
pub const MODEL_FILE: &str = "model.json";

/// Artifact loading and consistency errors
#[derive(Error, Debug)]
pub enum ArtifactError {
    #[error("Failed to read artifact file '{file}': {source}")]
    Read {
        file: String,
        source: std::io::Error,
    },

    #[error("Failed to parse artifact file '{file}': {source}")]
    Parse {
        file: String,
        source: serde_json::Error,
    },

    #[error(transparent)]
    Model(#[from] ModelError),

    #[error("Deployed artifacts are inconsistent: {0}")]
    Inconsistent(String),
}

/// Immutable bundle of all fitted artifacts
///
/// Constructed once at startup and passed by reference into every pipeline
/// call.
#[derive(Debug, Clone)]
pub struct Artifacts {
    pub encoder: OneHotEncoder,
    pub scaler: Scaler,
    pub selector: FeatureSelector,
    pub model: GbdtModel,
}

impl Artifacts {
    /// Load all artifacts from a directory and validate their consistency
    pub fn load<P: AsRef<Path>>(dir: P) -> Result<Self, ArtifactError> {
        let dir = dir.as_ref();

        let encoder: OneHotEncoder = read_json(dir, ENCODER_FILE)?;
        let scaler: Scaler = read_json(dir, SCALER_FILE)?;
        let selector: FeatureSelector = read_json(dir, SELECTOR_FILE)?;
        let model = GbdtModel::load_json(dir.join(MODEL_FILE))?;

        let artifacts = Self {
            encoder,
            scaler,
            selector,
            model,
        };
        artifacts.validate()?;
        Ok(artifacts)
    }

    /// Cross-validate the artifact set
    ///
    /// The scaler must cover exactly the fixed numeric set, the encoded
    /// column set (scaled numerics + indicator columns) must cover every
    /// selected feature, and the selector's output must match the model's
    /// feature contract exactly, in order.
    pub fn validate(&self) -> Result<(), ArtifactError> {
        if self.selector.is_empty() {
            return Err(ArtifactError::Inconsistent(
                "feature selector selects no columns".to_string(),
            ));
        }

        if self.scaler.column_names() != crate::pipeline::transform::NUMERIC_COLUMNS {
            return Err(ArtifactError::Inconsistent(format!(
                "scaler was fitted on [{}] but the pipeline's numeric set is [{}]",
                self.scaler.column_names().join(", "),
                crate::pipeline::transform::NUMERIC_COLUMNS.join(", ")
            )));
        }

        let mut encoded: Vec<String> = self
            .scaler
            .column_names()
            .iter()
            .map(|s| s.to_string())
            .collect();
        encoded.extend(self.encoder.output_names());

        let missing = self.selector.missing_from(&encoded);
        if !missing.is_empty() {
            return Err(ArtifactError::Inconsistent(format!(
                "selected feature(s) not produced by the encoder/scaler stage: {}",
                missing.join(", ")
            )));
        }

        if self.selector.features != self.model.feature_names {
            return Err(ArtifactError::Inconsistent(format!(
                "selector output ({} columns) does not match the model feature contract ({} columns)",
                self.selector.len(),
                self.model.num_features()
            )));
        }

        Ok(())
    }
}

fn read_json<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<T, ArtifactError> {
    let path = dir.join(file);
    let contents = fs::read_to_string(&path).map_err(|source| ArtifactError::Read {
        file: path.display().to_string(),
        source,
    })?;
    serde_json::from_str(&contents).map_err(|source| ArtifactError::Parse {
        file: path.display().to_string(),
        source,
    })
}
