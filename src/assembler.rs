//! Feature vector assembly for loan applications.
//!
//! Combines the fields entered in the UI with the features fetched from the
//! feature store into one ordered vector whose key set must exactly match the
//! schema the model was trained on.

use crate::error::ScoringError;
use crate::types::{FeatureValue, FeatureVector, LoanApplication};
use std::collections::HashMap;

/// Entity-key columns that are used for lookup but never fed to the model.
const ENTITY_KEY_COLUMNS: [&str; 2] = ["zipcode", "dob_ssn"];

/// Assembles one feature vector per application against a fixed schema.
pub struct FeatureAssembler {
    schema: Vec<String>,
}

impl FeatureAssembler {
    /// Create an assembler for the trained schema (sorted feature names).
    pub fn new(schema: Vec<String>) -> Self {
        Self { schema }
    }

    /// Feature names the assembled vector must carry.
    pub fn schema(&self) -> &[String] {
        &self.schema
    }

    /// Merge applicant fields with fetched features into a complete vector.
    ///
    /// Entity-key echoes from the provider are dropped. Fails with
    /// `SchemaMismatch` when the merged key set differs from the schema in
    /// either direction.
    pub fn assemble(
        &self,
        application: &LoanApplication,
        fetched: HashMap<String, FeatureValue>,
    ) -> Result<FeatureVector, ScoringError> {
        let mut vector = FeatureVector::new();

        vector.insert("person_age", FeatureValue::Int(application.person_age));
        vector.insert("person_income", FeatureValue::Int(application.person_income));
        vector.insert(
            "person_home_ownership",
            FeatureValue::Text(application.person_home_ownership.clone()),
        );
        vector.insert(
            "person_emp_length",
            FeatureValue::Float(application.person_emp_length),
        );
        vector.insert(
            "loan_intent",
            FeatureValue::Text(application.loan_intent.clone()),
        );
        vector.insert("loan_amnt", FeatureValue::Int(application.loan_amnt));
        vector.insert(
            "loan_int_rate",
            FeatureValue::Float(application.loan_int_rate),
        );

        for (name, value) in fetched {
            if ENTITY_KEY_COLUMNS.contains(&name.as_str()) {
                continue;
            }
            vector.insert(name, value);
        }

        self.check_schema(&vector)?;
        Ok(vector)
    }

    fn check_schema(&self, vector: &FeatureVector) -> Result<(), ScoringError> {
        let missing: Vec<String> = self
            .schema
            .iter()
            .filter(|name| !vector.contains(name))
            .cloned()
            .collect();
        let unexpected: Vec<String> = vector
            .names()
            .filter(|name| !self.schema.iter().any(|s| s == name))
            .map(str::to_string)
            .collect();

        if !missing.is_empty() || !unexpected.is_empty() {
            return Err(ScoringError::SchemaMismatch {
                missing,
                unexpected,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature_store::{feature_name, FEATURE_REFS};

    fn sample_application() -> LoanApplication {
        LoanApplication {
            zipcode: 94107,
            dob_ssn: "19860319_3643".to_string(),
            person_age: 25,
            person_income: 60000,
            person_home_ownership: "RENT".to_string(),
            person_emp_length: 12.0,
            loan_intent: "PERSONAL".to_string(),
            loan_amnt: 10000,
            loan_int_rate: 12.0,
        }
    }

    fn fetched_features() -> HashMap<String, FeatureValue> {
        FEATURE_REFS
            .iter()
            .map(|reference| {
                let name = feature_name(reference);
                let value = match name {
                    "city" => FeatureValue::Text("San Francisco".to_string()),
                    "state" => FeatureValue::Text("CA".to_string()),
                    "location_type" => FeatureValue::Text("urban".to_string()),
                    "total_debt_due" => FeatureValue::Float(17000.0),
                    _ => FeatureValue::Int(720),
                };
                (name.to_string(), value)
            })
            .collect()
    }

    fn full_schema() -> Vec<String> {
        let mut schema: Vec<String> = FEATURE_REFS
            .iter()
            .map(|r| feature_name(r).to_string())
            .collect();
        schema.extend(
            [
                "person_age",
                "person_income",
                "person_home_ownership",
                "person_emp_length",
                "loan_intent",
                "loan_amnt",
                "loan_int_rate",
            ]
            .iter()
            .map(|s| s.to_string()),
        );
        schema.sort();
        schema
    }

    #[test]
    fn test_assembled_vector_matches_schema_exactly() {
        let assembler = FeatureAssembler::new(full_schema());
        let vector = assembler
            .assemble(&sample_application(), fetched_features())
            .unwrap();

        let names: Vec<&str> = vector.names().collect();
        let expected: Vec<&str> = assembler.schema().iter().map(String::as_str).collect();
        assert_eq!(names, expected);
    }

    #[test]
    fn test_user_fields_and_fetched_features_are_merged() {
        let assembler = FeatureAssembler::new(full_schema());
        let vector = assembler
            .assemble(&sample_application(), fetched_features())
            .unwrap();

        assert_eq!(vector.get("loan_amnt"), Some(&FeatureValue::Int(10000)));
        assert_eq!(vector.get("person_income"), Some(&FeatureValue::Int(60000)));
        assert_eq!(vector.get("credit_card_due"), Some(&FeatureValue::Int(720)));
    }

    #[test]
    fn test_entity_key_echo_is_dropped() {
        let assembler = FeatureAssembler::new(full_schema());
        let mut fetched = fetched_features();
        fetched.insert("zipcode".to_string(), FeatureValue::Int(94107));
        fetched.insert(
            "dob_ssn".to_string(),
            FeatureValue::Text("19860319_3643".to_string()),
        );

        let vector = assembler.assemble(&sample_application(), fetched).unwrap();
        assert!(!vector.contains("zipcode"));
        assert!(!vector.contains("dob_ssn"));
    }

    #[test]
    fn test_missing_feature_is_schema_mismatch() {
        let assembler = FeatureAssembler::new(full_schema());
        let mut fetched = fetched_features();
        fetched.remove("population");

        let err = assembler
            .assemble(&sample_application(), fetched)
            .unwrap_err();
        match err {
            ScoringError::SchemaMismatch { missing, unexpected } => {
                assert_eq!(missing, vec!["population".to_string()]);
                assert!(unexpected.is_empty());
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_extra_feature_is_schema_mismatch() {
        let assembler = FeatureAssembler::new(full_schema());
        let mut fetched = fetched_features();
        fetched.insert("surprise_feature".to_string(), FeatureValue::Int(1));

        let err = assembler
            .assemble(&sample_application(), fetched)
            .unwrap_err();
        match err {
            ScoringError::SchemaMismatch { missing, unexpected } => {
                assert!(missing.is_empty());
                assert_eq!(unexpected, vec!["surprise_feature".to_string()]);
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }
}
