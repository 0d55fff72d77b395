//! Error types for the scoring pipeline.

use thiserror::Error;

/// Errors surfaced by the scoring pipeline.
///
/// All variants propagate to the interaction layer, which renders a failure
/// page instead of a decision. None are retried automatically.
#[derive(Debug, Error)]
pub enum ScoringError {
    /// The assembled feature vector does not match the trained schema.
    #[error("feature schema mismatch: missing {missing:?}, unexpected {unexpected:?}")]
    SchemaMismatch {
        missing: Vec<String>,
        unexpected: Vec<String>,
    },

    /// A categorical value was not present when the encoder was fitted.
    #[error("unknown category {value:?} for feature {column:?}")]
    UnknownCategory { column: String, value: String },

    /// The numeric vector handed to the model has the wrong shape or order.
    #[error("model input error: {0}")]
    ModelInput(String),

    /// The feature server could not be reached or returned a failure.
    #[error("feature store unavailable: {0}")]
    ServiceUnavailable(String),

    /// A persisted artifact could not be read or decoded.
    #[error("artifact error: {0}")]
    Artifact(String),
}

impl ScoringError {
    /// Short stable name for metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            ScoringError::SchemaMismatch { .. } => "schema_mismatch",
            ScoringError::UnknownCategory { .. } => "unknown_category",
            ScoringError::ModelInput(_) => "model_input",
            ScoringError::ServiceUnavailable(_) => "service_unavailable",
            ScoringError::Artifact(_) => "artifact",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds_are_stable() {
        let err = ScoringError::UnknownCategory {
            column: "city".to_string(),
            value: "Atlantis".to_string(),
        };
        assert_eq!(err.kind(), "unknown_category");

        let err = ScoringError::SchemaMismatch {
            missing: vec!["population".to_string()],
            unexpected: vec![],
        };
        assert_eq!(err.kind(), "schema_mismatch");
    }

    #[test]
    fn test_display_names_offending_fields() {
        let err = ScoringError::UnknownCategory {
            column: "state".to_string(),
            value: "ZZ".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("state"));
        assert!(msg.contains("ZZ"));
    }
}
