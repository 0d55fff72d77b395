//! Persisted model artifact

use crate::error::ScoringError;
use chrono::{DateTime, Utc};
use linfa_trees::DecisionTree;
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::info;

/// The trained scoring model together with everything inference needs to
/// validate its input: the exact feature schema (sorted column order) and the
/// holdout per-class precision reported as the decision confidence.
///
/// Immutable once loaded; shared read-only across all inference calls.
#[derive(Debug, Serialize, Deserialize)]
pub struct ModelArtifact {
    /// Fitted decision tree (class 0 = approve, class 1 = reject)
    pub tree: DecisionTree<f64, usize>,
    /// Feature names in training column order
    pub feature_names: Vec<String>,
    /// Holdout precision per class, indexed by class label
    pub class_precision: [f64; 2],
    /// When the artifact was produced
    pub trained_at: DateTime<Utc>,
}

impl ModelArtifact {
    /// Persist the artifact to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScoringError> {
        let bytes = bincode::serialize(self)
            .map_err(|e| ScoringError::Artifact(format!("failed to encode model: {}", e)))?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            ScoringError::Artifact(format!(
                "failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        info!(path = %path.as_ref().display(), "Model saved");
        Ok(())
    }

    /// Load a persisted artifact.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoringError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            ScoringError::Artifact(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let artifact: Self = bincode::deserialize(&bytes)
            .map_err(|e| ScoringError::Artifact(format!("failed to decode model: {}", e)))?;
        info!(
            path = %path.as_ref().display(),
            features = artifact.feature_names.len(),
            trained_at = %artifact.trained_at,
            "Model loaded"
        );
        Ok(artifact)
    }
}
