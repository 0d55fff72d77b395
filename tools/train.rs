//! Offline Training Entry Point
//!
//! Reads the pre-built historical training frame, fits the encoder and the
//! decision tree, and writes the two serving artifacts.

use anyhow::Result;
use credit_scoring_pipeline::{config::AppConfig, model::training};
use tracing::{info, warn};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("credit_scoring_pipeline=info".parse()?)
                .add_directive("train=info".parse()?),
        )
        .init();

    let config = match AppConfig::load() {
        Ok(config) => config,
        Err(err) => {
            warn!(error = %err, "No usable config file, using defaults");
            AppConfig::default()
        }
    };

    let dataset_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/loan_history.jsonl".to_string());

    info!(path = %dataset_path, "Loading historical training frame");
    let rows = training::load_dataset(&dataset_path)?;
    info!(rows = rows.len(), "Training frame loaded");

    let (artifact, encoder, report) = training::train(&rows)?;

    encoder.save(&config.artifacts.encoder_path)?;
    artifact.save(&config.artifacts.model_path)?;

    info!(
        rows = report.rows,
        holdout_rows = report.holdout_rows,
        accuracy = format!("{:.3}", report.accuracy),
        approve_precision = format!("{:.3}", report.class_precision[0]),
        reject_precision = format!("{:.3}", report.class_precision[1]),
        "Model and encoder written"
    );

    Ok(())
}
