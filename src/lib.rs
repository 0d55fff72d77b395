//! Credit Scoring Pipeline Library
//!
//! Real-time loan approval scoring: features fetched from an online feature
//! store are merged with applicant input, ordinal-encoded, and scored by a
//! persisted decision-tree model behind a small web UI.

pub mod assembler;
pub mod config;
pub mod encoder;
pub mod error;
pub mod feature_store;
pub mod metrics;
pub mod model;
pub mod pipeline;
pub mod server;
pub mod types;

pub use assembler::FeatureAssembler;
pub use config::AppConfig;
pub use encoder::OrdinalEncoder;
pub use error::ScoringError;
pub use feature_store::{FeatureProvider, FeatureStoreClient};
pub use model::{InferenceEngine, ModelArtifact};
pub use pipeline::ScoringService;
pub use types::{Decision, LoanApplication, LoanDecision};
