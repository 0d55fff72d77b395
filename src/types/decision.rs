//! Loan decision data structures

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Binary loan decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Approve,
    Reject,
}

impl Decision {
    /// Map the classifier's class label to a decision.
    ///
    /// The training label convention is 0 = approved, 1 = rejected.
    pub fn from_class(class: usize) -> Self {
        if class == 0 {
            Decision::Approve
        } else {
            Decision::Reject
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The outcome rendered to the applicant for one submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanDecision {
    /// Unique decision identifier
    pub decision_id: String,

    /// Approve or reject
    pub decision: Decision,

    /// Confidence score in [0, 1]
    pub score: f64,

    /// Decision timestamp
    pub timestamp: DateTime<Utc>,
}

impl LoanDecision {
    pub fn new(decision: Decision, score: f64) -> Self {
        Self {
            decision_id: uuid::Uuid::new_v4().to_string(),
            decision,
            score,
            timestamp: Utc::now(),
        }
    }
}
