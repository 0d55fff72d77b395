//! Type definitions for the scoring pipeline

pub mod application;
pub mod decision;
pub mod feature;

pub use application::{EntityKeys, LoanApplication};
pub use decision::{Decision, LoanDecision};
pub use feature::{FeatureValue, FeatureVector};
