//! Scoring model: persisted artifact, inference, and offline training

pub mod artifact;
pub mod inference;
pub mod training;

pub use artifact::ModelArtifact;
pub use inference::{InferenceEngine, Prediction};
