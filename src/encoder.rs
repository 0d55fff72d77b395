//! Ordinal encoding of categorical features.
//!
//! The same fitted encoder runs at training and serving time; any drift
//! between the two vocabularies is a correctness bug, so the vocabulary is
//! persisted next to the model and loaded read-only at serve start.

use crate::error::ScoringError;
use crate::types::{FeatureValue, FeatureVector};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use tracing::info;

/// Categorical features that require encoding before training or prediction.
pub const CATEGORICAL_FEATURES: [&str; 5] = [
    "person_home_ownership",
    "loan_intent",
    "city",
    "state",
    "location_type",
];

/// Ordinal assigned to categories outside the fitted vocabulary when the
/// fallback policy is active.
pub const UNKNOWN_CATEGORY_FALLBACK: f64 = -1.0;

/// Behavior when a category was not present during encoder fitting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownCategoryPolicy {
    /// Fail the request with an explicit error.
    #[default]
    Reject,
    /// Encode the unknown category as [`UNKNOWN_CATEGORY_FALLBACK`].
    Fallback,
}

/// A fitted mapping from categorical value to ordinal integer.
///
/// Each column's vocabulary is kept sorted; the ordinal of a category is its
/// index in that sorted list, so encoding is deterministic across processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrdinalEncoder {
    vocabularies: BTreeMap<String, Vec<String>>,
}

impl OrdinalEncoder {
    /// Fit the encoder over the categorical columns of the given rows.
    ///
    /// Every row must carry every categorical column; a missing column is a
    /// schema mismatch in the training frame.
    pub fn fit(rows: &[FeatureVector]) -> Result<Self, ScoringError> {
        let mut sets: BTreeMap<String, BTreeSet<String>> = CATEGORICAL_FEATURES
            .iter()
            .map(|column| (column.to_string(), BTreeSet::new()))
            .collect();

        for row in rows {
            for column in CATEGORICAL_FEATURES {
                match row.get(column) {
                    Some(FeatureValue::Text(value)) => {
                        sets.get_mut(column)
                            .expect("categorical column set")
                            .insert(value.clone());
                    }
                    Some(other) => {
                        return Err(ScoringError::SchemaMismatch {
                            missing: vec![],
                            unexpected: vec![format!("{} has non-text value {}", column, other)],
                        });
                    }
                    None => {
                        return Err(ScoringError::SchemaMismatch {
                            missing: vec![column.to_string()],
                            unexpected: vec![],
                        });
                    }
                }
            }
        }

        let vocabularies = sets
            .into_iter()
            .map(|(column, set)| (column, set.into_iter().collect()))
            .collect();

        Ok(Self { vocabularies })
    }

    /// Columns this encoder was fitted on.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.vocabularies.keys().map(String::as_str)
    }

    /// Fitted vocabulary for one column.
    pub fn vocabulary(&self, column: &str) -> Option<&[String]> {
        self.vocabularies.get(column).map(Vec::as_slice)
    }

    /// Ordinal for one categorical value.
    pub fn encode(
        &self,
        column: &str,
        value: &str,
        policy: UnknownCategoryPolicy,
    ) -> Result<f64, ScoringError> {
        let vocabulary = self.vocabularies.get(column).ok_or_else(|| {
            ScoringError::UnknownCategory {
                column: column.to_string(),
                value: value.to_string(),
            }
        })?;

        match vocabulary.binary_search_by(|known| known.as_str().cmp(value)) {
            Ok(index) => Ok(index as f64),
            Err(_) => match policy {
                UnknownCategoryPolicy::Fallback => Ok(UNKNOWN_CATEGORY_FALLBACK),
                UnknownCategoryPolicy::Reject => Err(ScoringError::UnknownCategory {
                    column: column.to_string(),
                    value: value.to_string(),
                }),
            },
        }
    }

    /// Encode every categorical column of the vector, leaving numeric values
    /// untouched. Applying the transform to an already-encoded vector is a
    /// no-op, so the operation is idempotent.
    pub fn transform(
        &self,
        vector: &FeatureVector,
        policy: UnknownCategoryPolicy,
    ) -> Result<FeatureVector, ScoringError> {
        let mut encoded = FeatureVector::new();
        for (name, value) in vector.iter() {
            match value {
                FeatureValue::Text(text) if self.vocabularies.contains_key(name) => {
                    let ordinal = self.encode(name, text, policy)?;
                    encoded.insert(name, FeatureValue::Float(ordinal));
                }
                other => encoded.insert(name, other.clone()),
            }
        }
        Ok(encoded)
    }

    /// Persist the encoder to disk.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<(), ScoringError> {
        let bytes = bincode::serialize(self)
            .map_err(|e| ScoringError::Artifact(format!("failed to encode encoder: {}", e)))?;
        std::fs::write(path.as_ref(), bytes).map_err(|e| {
            ScoringError::Artifact(format!(
                "failed to write {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        info!(path = %path.as_ref().display(), "Encoder saved");
        Ok(())
    }

    /// Load a persisted encoder.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ScoringError> {
        let bytes = std::fs::read(path.as_ref()).map_err(|e| {
            ScoringError::Artifact(format!(
                "failed to read {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        let encoder: Self = bincode::deserialize(&bytes)
            .map_err(|e| ScoringError::Artifact(format!("failed to decode encoder: {}", e)))?;
        info!(
            path = %path.as_ref().display(),
            columns = encoder.vocabularies.len(),
            "Encoder loaded"
        );
        Ok(encoder)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_row(ownership: &str, intent: &str, city: &str) -> FeatureVector {
        let mut row = FeatureVector::new();
        row.insert("person_home_ownership", FeatureValue::Text(ownership.into()));
        row.insert("loan_intent", FeatureValue::Text(intent.into()));
        row.insert("city", FeatureValue::Text(city.into()));
        row.insert("state", FeatureValue::Text("CA".into()));
        row.insert("location_type", FeatureValue::Text("urban".into()));
        row.insert("person_income", FeatureValue::Int(60000));
        row
    }

    fn fitted_encoder() -> OrdinalEncoder {
        let rows = vec![
            sample_row("RENT", "PERSONAL", "San Francisco"),
            sample_row("OWN", "MEDICAL", "Oakland"),
            sample_row("MORTGAGE", "VENTURE", "San Francisco"),
        ];
        OrdinalEncoder::fit(&rows).unwrap()
    }

    #[test]
    fn test_vocabulary_is_sorted() {
        let encoder = fitted_encoder();
        assert_eq!(
            encoder.vocabulary("person_home_ownership").unwrap().to_vec(),
            vec!["MORTGAGE", "OWN", "RENT"]
        );
    }

    #[test]
    fn test_encode_known_category() {
        let encoder = fitted_encoder();
        let ordinal = encoder
            .encode("person_home_ownership", "OWN", UnknownCategoryPolicy::Reject)
            .unwrap();
        assert_eq!(ordinal, 1.0);
    }

    #[test]
    fn test_unknown_category_rejected() {
        let encoder = fitted_encoder();
        let err = encoder
            .encode("city", "Atlantis", UnknownCategoryPolicy::Reject)
            .unwrap_err();
        assert_eq!(err.kind(), "unknown_category");
    }

    #[test]
    fn test_unknown_category_fallback() {
        let encoder = fitted_encoder();
        let ordinal = encoder
            .encode("city", "Atlantis", UnknownCategoryPolicy::Fallback)
            .unwrap();
        assert_eq!(ordinal, UNKNOWN_CATEGORY_FALLBACK);
    }

    #[test]
    fn test_transform_is_idempotent() {
        let encoder = fitted_encoder();
        let row = sample_row("RENT", "PERSONAL", "Oakland");

        let once = encoder
            .transform(&row, UnknownCategoryPolicy::Reject)
            .unwrap();
        let twice = encoder
            .transform(&once, UnknownCategoryPolicy::Reject)
            .unwrap();

        assert_eq!(once, twice);
        assert!(once.get("city").unwrap().as_f64().is_some());
        // Numeric fields pass through untouched.
        assert_eq!(
            once.get("person_income"),
            Some(&FeatureValue::Int(60000))
        );
    }

    #[test]
    fn test_fit_rejects_missing_column() {
        let mut row = FeatureVector::new();
        row.insert("loan_intent", FeatureValue::Text("PERSONAL".into()));
        let err = OrdinalEncoder::fit(&[row]).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let encoder = fitted_encoder();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("encoder.bin");

        encoder.save(&path).unwrap();
        let loaded = OrdinalEncoder::load(&path).unwrap();

        assert_eq!(encoder, loaded);
    }
}
