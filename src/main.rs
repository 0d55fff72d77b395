//! Credit Scoring Pipeline - Serving Entry Point
//!
//! Loads the persisted model and encoder, connects to the online feature
//! server, and serves the loan application UI.

use anyhow::{Context, Result};
use credit_scoring_pipeline::{
    config::AppConfig, encoder::OrdinalEncoder, feature_store::FeatureStoreClient,
    metrics::{ApplicationMetrics, MetricsReporter},
    model::ModelArtifact, pipeline::ScoringService, server,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("credit_scoring_pipeline=info".parse()?),
        )
        .init();

    info!("Starting Credit Scoring Pipeline");

    // Load configuration
    let config = AppConfig::load()?;
    info!("Configuration loaded successfully");
    info!(
        "Unknown-category policy: {:?}, artifacts: {} / {}",
        config.decision.on_unknown_category,
        config.artifacts.model_path,
        config.artifacts.encoder_path
    );

    // Load the artifacts produced by the train binary. Both are read-only
    // for the process lifetime.
    let artifact = ModelArtifact::load(&config.artifacts.model_path)
        .context("Model artifact missing or unreadable; run the train binary first")?;
    let encoder = OrdinalEncoder::load(&config.artifacts.encoder_path)
        .context("Encoder artifact missing or unreadable; run the train binary first")?;
    info!(
        features = artifact.feature_names.len(),
        trained_at = %artifact.trained_at,
        "Scoring artifacts loaded"
    );

    // Initialize the feature server client
    let provider = FeatureStoreClient::new(&config.feature_store)?;

    // Initialize metrics
    let metrics = Arc::new(ApplicationMetrics::new());

    // Start metrics reporter (prints summary every 30 seconds)
    let metrics_clone = metrics.clone();
    tokio::spawn(async move {
        let reporter = MetricsReporter::new(metrics_clone, 30);
        reporter.start().await;
    });

    let service = Arc::new(ScoringService::new(
        provider,
        artifact,
        encoder,
        config.decision.on_unknown_category,
        metrics,
    ));

    let addr: SocketAddr = config
        .server
        .bind_addr
        .parse()
        .with_context(|| format!("Invalid bind address {:?}", config.server.bind_addr))?;
    info!("Listening on http://{}", addr);

    warp::serve(server::routes(service)).run(addr).await;

    Ok(())
}
