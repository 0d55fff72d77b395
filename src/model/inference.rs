//! Inference over the loaded decision tree.

use crate::error::ScoringError;
use crate::model::artifact::ModelArtifact;
use crate::types::{Decision, FeatureVector};
use linfa::prelude::*;
use ndarray::Array2;
use tracing::debug;

/// Result of one model invocation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Prediction {
    pub decision: Decision,
    /// Holdout precision of the predicted class, in [0, 1]
    pub score: f64,
}

/// Runs the scoring model over fully numeric feature vectors.
///
/// Holds the artifact read-only; `predict` takes `&self`, so one engine is
/// safely shared across concurrent requests without locking.
pub struct InferenceEngine {
    artifact: ModelArtifact,
}

impl InferenceEngine {
    pub fn new(artifact: ModelArtifact) -> Self {
        Self { artifact }
    }

    /// Feature schema the model was trained on, in column order.
    pub fn feature_names(&self) -> &[String] {
        &self.artifact.feature_names
    }

    /// Score one fully numeric feature vector.
    ///
    /// A single deterministic pass: identical inputs always yield the same
    /// decision and score. Fails with `ModelInput` when the vector's name set
    /// or order differs from the trained schema, or a value is still
    /// categorical.
    pub fn predict(&self, vector: &FeatureVector) -> Result<Prediction, ScoringError> {
        self.check_schema(vector)?;

        let row = vector.to_dense(&self.artifact.feature_names)?;
        let records = Array2::from_shape_vec((1, row.len()), row)
            .map_err(|e| ScoringError::ModelInput(e.to_string()))?;

        let classes = self.artifact.tree.predict(&records);
        let class = classes[0];
        let decision = Decision::from_class(class);
        let score = self
            .artifact
            .class_precision
            .get(class)
            .copied()
            .unwrap_or(0.5)
            .clamp(0.0, 1.0);

        debug!(class = class, decision = %decision, score = score, "Model invoked");

        Ok(Prediction { decision, score })
    }

    fn check_schema(&self, vector: &FeatureVector) -> Result<(), ScoringError> {
        if vector.len() != self.artifact.feature_names.len() {
            return Err(ScoringError::ModelInput(format!(
                "vector has {} features, model was trained on {}",
                vector.len(),
                self.artifact.feature_names.len()
            )));
        }
        for (name, expected) in vector.names().zip(&self.artifact.feature_names) {
            if name != expected {
                return Err(ScoringError::ModelInput(format!(
                    "feature {:?} where model expects {:?}",
                    name, expected
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::training::{self, TrainingRow};
    use crate::types::FeatureValue;

    /// Train a tiny model over two numeric columns; label follows `debt > 5`.
    fn trained_engine() -> InferenceEngine {
        let rows: Vec<TrainingRow> = (0..20)
            .map(|i| {
                let debt = (i % 10) as i64;
                let mut features = FeatureVector::new();
                features.insert("debt", FeatureValue::Int(debt));
                features.insert("income", FeatureValue::Int(50000 + i * 100));
                features.insert("person_home_ownership", FeatureValue::Text("RENT".into()));
                features.insert("loan_intent", FeatureValue::Text("PERSONAL".into()));
                features.insert("city", FeatureValue::Text("Oakland".into()));
                features.insert("state", FeatureValue::Text("CA".into()));
                features.insert("location_type", FeatureValue::Text("urban".into()));
                TrainingRow {
                    features,
                    label: (debt > 5) as usize,
                }
            })
            .collect();

        let (artifact, _encoder, _report) = training::train(&rows).unwrap();
        InferenceEngine::new(artifact)
    }

    fn numeric_vector(engine: &InferenceEngine, debt: f64) -> FeatureVector {
        engine
            .feature_names()
            .iter()
            .map(|name| {
                let value = match name.as_str() {
                    "debt" => FeatureValue::Float(debt),
                    "income" => FeatureValue::Float(50000.0),
                    _ => FeatureValue::Float(0.0),
                };
                (name.clone(), value)
            })
            .collect()
    }

    #[test]
    fn test_predict_is_deterministic() {
        let engine = trained_engine();
        let vector = numeric_vector(&engine, 8.0);

        let first = engine.predict(&vector).unwrap();
        let second = engine.predict(&vector).unwrap();

        assert_eq!(first, second);
        assert!((0.0..=1.0).contains(&first.score));
    }

    #[test]
    fn test_predict_separates_classes() {
        let engine = trained_engine();

        let low = engine.predict(&numeric_vector(&engine, 1.0)).unwrap();
        let high = engine.predict(&numeric_vector(&engine, 9.0)).unwrap();

        assert_eq!(low.decision, Decision::Approve);
        assert_eq!(high.decision, Decision::Reject);
    }

    #[test]
    fn test_wrong_dimensionality_is_model_input_error() {
        let engine = trained_engine();
        let mut vector = FeatureVector::new();
        vector.insert("debt", FeatureValue::Float(1.0));

        let err = engine.predict(&vector).unwrap_err();
        assert_eq!(err.kind(), "model_input");
    }

    #[test]
    fn test_wrong_feature_name_is_model_input_error() {
        let engine = trained_engine();
        let mut vector = numeric_vector(&engine, 1.0);
        // Same cardinality, one renamed column.
        let mut renamed = FeatureVector::new();
        let mut replaced = false;
        for (name, value) in vector.iter() {
            if !replaced && name == "debt" {
                renamed.insert("dept", value.clone());
                replaced = true;
            } else {
                renamed.insert(name, value.clone());
            }
        }
        vector = renamed;

        let err = engine.predict(&vector).unwrap_err();
        assert_eq!(err.kind(), "model_input");
    }

    #[test]
    fn test_categorical_value_is_model_input_error() {
        let engine = trained_engine();
        let mut vector = numeric_vector(&engine, 1.0);
        vector.insert("city", FeatureValue::Text("Oakland".into()));

        let err = engine.predict(&vector).unwrap_err();
        assert_eq!(err.kind(), "model_input");
    }
}
