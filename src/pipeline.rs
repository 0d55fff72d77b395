//! The scoring pipeline: one synchronous pass per submission.

use crate::assembler::FeatureAssembler;
use crate::encoder::{OrdinalEncoder, UnknownCategoryPolicy};
use crate::error::ScoringError;
use crate::feature_store::FeatureProvider;
use crate::metrics::ApplicationMetrics;
use crate::model::{InferenceEngine, ModelArtifact};
use crate::types::{LoanApplication, LoanDecision};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Runs feature lookup, assembly, encoding, and inference for one
/// application.
///
/// Holds the loaded artifacts read-only; generic over the feature provider so
/// tests run against an in-memory store. There is no shared mutable state, so
/// one service is safely shared across concurrent requests.
pub struct ScoringService<P> {
    provider: P,
    assembler: FeatureAssembler,
    encoder: OrdinalEncoder,
    engine: InferenceEngine,
    policy: UnknownCategoryPolicy,
    metrics: Arc<ApplicationMetrics>,
}

impl<P: FeatureProvider> ScoringService<P> {
    pub fn new(
        provider: P,
        artifact: ModelArtifact,
        encoder: OrdinalEncoder,
        policy: UnknownCategoryPolicy,
        metrics: Arc<ApplicationMetrics>,
    ) -> Self {
        let assembler = FeatureAssembler::new(artifact.feature_names.clone());
        let engine = InferenceEngine::new(artifact);
        Self {
            provider,
            assembler,
            encoder,
            engine,
            policy,
            metrics,
        }
    }

    /// Score one application.
    ///
    /// Any failure aborts the pass; no decision is ever produced from
    /// partial data, and nothing is retried.
    pub async fn score(&self, application: &LoanApplication) -> Result<LoanDecision, ScoringError> {
        let start = Instant::now();
        match self.score_inner(application).await {
            Ok(decision) => {
                let elapsed = start.elapsed();
                self.metrics.record_application(elapsed, &decision);
                info!(
                    decision_id = %decision.decision_id,
                    outcome = %decision.decision,
                    score = decision.score,
                    processing_time_us = elapsed.as_micros() as u64,
                    "Application scored"
                );
                Ok(decision)
            }
            Err(err) => {
                self.metrics.record_failure(err.kind());
                Err(err)
            }
        }
    }

    async fn score_inner(
        &self,
        application: &LoanApplication,
    ) -> Result<LoanDecision, ScoringError> {
        let keys = application.entity_keys();
        let fetched = self.provider.online_features(&keys).await?;
        let vector = self.assembler.assemble(application, fetched)?;
        let encoded = self.encoder.transform(&vector, self.policy)?;
        let prediction = self.engine.predict(&encoded)?;
        Ok(LoanDecision::new(prediction.decision, prediction.score))
    }
}
