//! Feature vector representation shared by training and serving.

use crate::error::ScoringError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A single feature value as stored in the feature store or entered in the UI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Int(i64),
    Float(f64),
    Text(String),
}

impl FeatureValue {
    /// Numeric view of the value. Categorical text has no numeric form until
    /// it has been ordinal-encoded.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            FeatureValue::Int(v) => Some(*v as f64),
            FeatureValue::Float(v) => Some(*v),
            FeatureValue::Text(_) => None,
        }
    }

    /// Convert a JSON value from the feature server or a dataset row.
    pub fn from_json(value: &serde_json::Value) -> Option<Self> {
        match value {
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(FeatureValue::Int(i))
                } else {
                    n.as_f64().map(FeatureValue::Float)
                }
            }
            serde_json::Value::String(s) => Some(FeatureValue::Text(s.clone())),
            serde_json::Value::Bool(b) => Some(FeatureValue::Int(*b as i64)),
            _ => None,
        }
    }
}

impl std::fmt::Display for FeatureValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FeatureValue::Int(v) => write!(f, "{}", v),
            FeatureValue::Float(v) => write!(f, "{}", v),
            FeatureValue::Text(v) => write!(f, "{}", v),
        }
    }
}

/// Ordered mapping from feature name to value.
///
/// Keys iterate in sorted order, which is also the column order the model was
/// trained on. The name set must exactly match the trained schema before the
/// vector reaches the model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    values: BTreeMap<String, FeatureValue>,
}

impl FeatureVector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: FeatureValue) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &str) -> Option<&FeatureValue> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Feature names in sorted (training column) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Densify into the given column order. Fails if a column is absent or
    /// still categorical.
    pub fn to_dense(&self, columns: &[String]) -> Result<Vec<f64>, ScoringError> {
        let mut row = Vec::with_capacity(columns.len());
        for column in columns {
            let value = self.values.get(column).ok_or_else(|| {
                ScoringError::ModelInput(format!("feature {:?} missing from vector", column))
            })?;
            let numeric = value.as_f64().ok_or_else(|| {
                ScoringError::ModelInput(format!(
                    "feature {:?} is still categorical ({})",
                    column, value
                ))
            })?;
            row.push(numeric);
        }
        Ok(row)
    }
}

impl FromIterator<(String, FeatureValue)> for FeatureVector {
    fn from_iter<T: IntoIterator<Item = (String, FeatureValue)>>(iter: T) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names_are_sorted() {
        let mut vector = FeatureVector::new();
        vector.insert("population", FeatureValue::Int(10000));
        vector.insert("city", FeatureValue::Text("Oakland".to_string()));
        vector.insert("loan_amnt", FeatureValue::Int(10000));

        let names: Vec<&str> = vector.names().collect();
        assert_eq!(names, vec!["city", "loan_amnt", "population"]);
    }

    #[test]
    fn test_to_dense_follows_column_order() {
        let mut vector = FeatureVector::new();
        vector.insert("a", FeatureValue::Int(1));
        vector.insert("b", FeatureValue::Float(2.5));

        let columns = vec!["b".to_string(), "a".to_string()];
        let dense = vector.to_dense(&columns).unwrap();
        assert_eq!(dense, vec![2.5, 1.0]);
    }

    #[test]
    fn test_to_dense_rejects_missing_column() {
        let vector = FeatureVector::new();
        let columns = vec!["population".to_string()];
        let err = vector.to_dense(&columns).unwrap_err();
        assert_eq!(err.kind(), "model_input");
    }

    #[test]
    fn test_to_dense_rejects_unencoded_text() {
        let mut vector = FeatureVector::new();
        vector.insert("city", FeatureValue::Text("Oakland".to_string()));
        let columns = vec!["city".to_string()];
        let err = vector.to_dense(&columns).unwrap_err();
        assert_eq!(err.kind(), "model_input");
    }

    #[test]
    fn test_from_json_values() {
        assert_eq!(
            FeatureValue::from_json(&serde_json::json!(720)),
            Some(FeatureValue::Int(720))
        );
        assert_eq!(
            FeatureValue::from_json(&serde_json::json!(12.5)),
            Some(FeatureValue::Float(12.5))
        );
        assert_eq!(
            FeatureValue::from_json(&serde_json::json!("RENT")),
            Some(FeatureValue::Text("RENT".to_string()))
        );
        assert_eq!(FeatureValue::from_json(&serde_json::Value::Null), None);
    }
}
