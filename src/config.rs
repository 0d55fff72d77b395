//! Configuration management for the credit scoring pipeline

use crate::encoder::UnknownCategoryPolicy;
use anyhow::{Context, Result};
use config::{Config, File};
use serde::Deserialize;
use std::path::Path;

/// Main application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub feature_store: FeatureStoreConfig,
    pub artifacts: ArtifactsConfig,
    #[serde(default)]
    pub decision: DecisionConfig,
    pub logging: LoggingConfig,
}

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Socket address the UI listens on
    pub bind_addr: String,
}

/// Feature server connection configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FeatureStoreConfig {
    /// Base URL of the online feature server
    pub base_url: String,
    /// Request timeout in milliseconds
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_timeout_ms() -> u64 {
    2000
}

/// Persisted artifact locations
#[derive(Debug, Clone, Deserialize)]
pub struct ArtifactsConfig {
    /// Path of the serialized decision-tree model
    #[serde(default = "default_model_path")]
    pub model_path: String,
    /// Path of the serialized ordinal encoder
    #[serde(default = "default_encoder_path")]
    pub encoder_path: String,
}

fn default_model_path() -> String {
    "model.bin".to_string()
}

fn default_encoder_path() -> String {
    "encoder.bin".to_string()
}

/// Decision behavior configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DecisionConfig {
    /// What to do with a categorical value absent from the encoder vocabulary:
    /// "reject" fails the request, "fallback" encodes it as -1.
    #[serde(default)]
    pub on_unknown_category: UnknownCategoryPolicy,
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,
    /// Log format (json, pretty)
    pub format: String,
}

impl AppConfig {
    /// Load configuration from file
    pub fn load() -> Result<Self> {
        Self::load_from_path("config/config.toml")
    }

    /// Load configuration from a specific path
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                bind_addr: "127.0.0.1:8080".to_string(),
            },
            feature_store: FeatureStoreConfig {
                base_url: "http://localhost:6566".to_string(),
                timeout_ms: default_timeout_ms(),
            },
            artifacts: ArtifactsConfig {
                model_path: default_model_path(),
                encoder_path: default_encoder_path(),
            },
            decision: DecisionConfig::default(),
            logging: LoggingConfig {
                level: "info".to_string(),
                format: "pretty".to_string(),
            },
        }
    }
}
