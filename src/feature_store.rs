//! Client for the online feature server.
//!
//! The feature store itself (registry, online/offline stores, materialization)
//! is an external product; this module only fetches current feature values for
//! a fixed, pre-registered set of feature views over the server's JSON API.

use crate::config::FeatureStoreConfig;
use crate::error::ScoringError;
use crate::types::{EntityKeys, FeatureValue};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::future::Future;
use std::time::Duration;
use tracing::{debug, info};

/// Feature references fetched for every application, as registered in the
/// feature repository: `feature_view:feature_name`.
pub const FEATURE_REFS: [&str; 16] = [
    "zipcode_features:city",
    "zipcode_features:state",
    "zipcode_features:location_type",
    "zipcode_features:tax_returns_filed",
    "zipcode_features:population",
    "zipcode_features:total_wages",
    "credit_history:credit_card_due",
    "credit_history:mortgage_due",
    "credit_history:student_loan_due",
    "credit_history:vehicle_loan_due",
    "credit_history:hard_pulls",
    "credit_history:missed_payments_2y",
    "credit_history:missed_payments_1y",
    "credit_history:missed_payments_6m",
    "credit_history:bankruptcies",
    "total_debt_calc:total_debt_due",
];

/// Short feature name of a `view:name` reference.
pub fn feature_name(reference: &str) -> &str {
    reference
        .split_once(':')
        .map(|(_, name)| name)
        .unwrap_or(reference)
}

/// Supplies current feature values for one applicant's entity keys.
pub trait FeatureProvider: Send + Sync {
    /// Fetch the catalog's feature values for the given entity keys.
    fn online_features(
        &self,
        keys: &EntityKeys,
    ) -> impl Future<Output = Result<HashMap<String, FeatureValue>, ScoringError>> + Send;
}

#[derive(Debug, Serialize)]
struct OnlineFeaturesRequest {
    features: Vec<String>,
    entities: EntityRows,
    request_context: RequestContext,
}

#[derive(Debug, Serialize)]
struct EntityRows {
    zipcode: Vec<i64>,
    dob_ssn: Vec<String>,
}

#[derive(Debug, Serialize)]
struct RequestContext {
    loan_amnt: Vec<i64>,
}

/// Online-serving response: `feature_names` and `results` are parallel
/// arrays, one result per feature, one value per entity row.
#[derive(Debug, Deserialize)]
struct OnlineFeaturesResponse {
    metadata: ResponseMetadata,
    results: Vec<FeatureResult>,
}

#[derive(Debug, Deserialize)]
struct ResponseMetadata {
    feature_names: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct FeatureResult {
    values: Vec<serde_json::Value>,
    #[serde(default)]
    statuses: Vec<String>,
}

/// HTTP client for a Feast-compatible online feature server.
pub struct FeatureStoreClient {
    client: reqwest::Client,
    endpoint: String,
}

impl FeatureStoreClient {
    /// Create a client from configuration.
    pub fn new(config: &FeatureStoreConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()
            .context("Failed to build feature server HTTP client")?;

        let endpoint = format!(
            "{}/get-online-features",
            config.base_url.trim_end_matches('/')
        );
        info!(endpoint = %endpoint, timeout_ms = config.timeout_ms, "Feature store client initialized");

        Ok(Self { client, endpoint })
    }

    async fn fetch(
        &self,
        keys: &EntityKeys,
    ) -> Result<HashMap<String, FeatureValue>, ScoringError> {
        let request = OnlineFeaturesRequest {
            features: FEATURE_REFS.iter().map(|r| r.to_string()).collect(),
            entities: EntityRows {
                zipcode: vec![keys.zipcode],
                dob_ssn: vec![keys.dob_ssn.clone()],
            },
            request_context: RequestContext {
                loan_amnt: vec![keys.loan_amnt],
            },
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| ScoringError::ServiceUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ScoringError::ServiceUnavailable(format!(
                "feature server returned {}",
                response.status()
            )));
        }

        let body: OnlineFeaturesResponse = response
            .json()
            .await
            .map_err(|e| ScoringError::ServiceUnavailable(format!("invalid response: {}", e)))?;

        let features = parse_response(body)?;
        debug!(zipcode = keys.zipcode, count = features.len(), "Fetched online features");
        Ok(features)
    }
}

impl FeatureProvider for FeatureStoreClient {
    fn online_features(
        &self,
        keys: &EntityKeys,
    ) -> impl Future<Output = Result<HashMap<String, FeatureValue>, ScoringError>> + Send {
        self.fetch(keys)
    }
}

/// Map the parallel response arrays onto the catalog's short feature names.
///
/// Entity-key echoes in the response are skipped; a catalog feature that is
/// absent, null, or not `PRESENT` is a schema mismatch.
fn parse_response(
    body: OnlineFeaturesResponse,
) -> Result<HashMap<String, FeatureValue>, ScoringError> {
    let mut features = HashMap::with_capacity(FEATURE_REFS.len());
    let mut missing = Vec::new();

    for reference in FEATURE_REFS {
        let name = feature_name(reference);
        let index = body
            .metadata
            .feature_names
            .iter()
            .position(|n| n == name || n == reference);

        let Some(index) = index else {
            missing.push(name.to_string());
            continue;
        };

        let result = body.results.get(index).ok_or_else(|| {
            ScoringError::ServiceUnavailable(format!(
                "feature server response has no result column for {:?}",
                name
            ))
        })?;

        if let Some(status) = result.statuses.first() {
            if status != "PRESENT" {
                missing.push(name.to_string());
                continue;
            }
        }

        match result.values.first().and_then(FeatureValue::from_json) {
            Some(value) => {
                features.insert(name.to_string(), value);
            }
            None => missing.push(name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(ScoringError::SchemaMismatch {
            missing,
            unexpected: vec![],
        });
    }

    Ok(features)
}

/// In-memory feature provider for tests and local demos without a feature
/// server. Rows are keyed by `(zipcode, dob_ssn)`.
#[derive(Debug, Default)]
pub struct MemoryFeatureStore {
    rows: HashMap<(i64, String), HashMap<String, FeatureValue>>,
}

impl MemoryFeatureStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the stored features for one entity.
    pub fn insert(
        &mut self,
        zipcode: i64,
        dob_ssn: impl Into<String>,
        features: HashMap<String, FeatureValue>,
    ) {
        self.rows.insert((zipcode, dob_ssn.into()), features);
    }
}

impl FeatureProvider for MemoryFeatureStore {
    fn online_features(
        &self,
        keys: &EntityKeys,
    ) -> impl Future<Output = Result<HashMap<String, FeatureValue>, ScoringError>> + Send {
        let features = self
            .rows
            .get(&(keys.zipcode, keys.dob_ssn.clone()))
            .cloned()
            .unwrap_or_default();
        std::future::ready(Ok(features))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feature_name_strips_view() {
        assert_eq!(feature_name("zipcode_features:city"), "city");
        assert_eq!(feature_name("total_debt_calc:total_debt_due"), "total_debt_due");
        assert_eq!(feature_name("bare_name"), "bare_name");
    }

    #[test]
    fn test_catalog_has_sixteen_references() {
        assert_eq!(FEATURE_REFS.len(), 16);
    }

    fn full_response() -> OnlineFeaturesResponse {
        let feature_names: Vec<String> = FEATURE_REFS
            .iter()
            .map(|r| feature_name(r).to_string())
            .collect();
        let results = feature_names
            .iter()
            .map(|name| FeatureResult {
                values: vec![if name == "city" || name == "state" || name == "location_type" {
                    serde_json::json!("SOMEVALUE")
                } else {
                    serde_json::json!(42)
                }],
                statuses: vec!["PRESENT".to_string()],
            })
            .collect();
        OnlineFeaturesResponse {
            metadata: ResponseMetadata { feature_names },
            results,
        }
    }

    #[test]
    fn test_parse_full_response() {
        let features = parse_response(full_response()).unwrap();
        assert_eq!(features.len(), FEATURE_REFS.len());
        assert_eq!(
            features.get("city"),
            Some(&FeatureValue::Text("SOMEVALUE".to_string()))
        );
        assert_eq!(features.get("population"), Some(&FeatureValue::Int(42)));
    }

    #[test]
    fn test_parse_rejects_missing_feature() {
        let mut body = full_response();
        body.metadata.feature_names.retain(|n| n != "population");
        body.results.pop();

        let err = parse_response(body).unwrap_err();
        match err {
            ScoringError::SchemaMismatch { missing, .. } => {
                assert!(missing.contains(&"population".to_string()));
            }
            other => panic!("expected SchemaMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects_absent_status() {
        let mut body = full_response();
        body.results[0].statuses = vec!["NOT_FOUND".to_string()];

        let err = parse_response(body).unwrap_err();
        assert_eq!(err.kind(), "schema_mismatch");
    }

    #[tokio::test]
    async fn test_memory_store_lookup() {
        let mut store = MemoryFeatureStore::new();
        let mut features = HashMap::new();
        features.insert("population".to_string(), FeatureValue::Int(88000));
        store.insert(94109, "19860319_3643", features);

        let keys = EntityKeys {
            zipcode: 94109,
            dob_ssn: "19860319_3643".to_string(),
            loan_amnt: 10000,
        };
        let fetched = store.online_features(&keys).await.unwrap();
        assert_eq!(fetched.get("population"), Some(&FeatureValue::Int(88000)));

        let unknown = EntityKeys {
            zipcode: 11111,
            dob_ssn: "x".to_string(),
            loan_amnt: 1,
        };
        let fetched = store.online_features(&unknown).await.unwrap();
        assert!(fetched.is_empty());
    }
}
