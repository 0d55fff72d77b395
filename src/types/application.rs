//! Loan application data structures

use serde::{Deserialize, Serialize};

/// Entity keys used to look up stored features for one applicant.
///
/// `loan_amnt` rides along as request context for the on-demand
/// `total_debt_calc` feature view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityKeys {
    pub zipcode: i64,
    pub dob_ssn: String,
    pub loan_amnt: i64,
}

/// A loan application as submitted through the UI.
///
/// Created per submission and dropped once a decision (or failure) has been
/// rendered; nothing here is persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanApplication {
    /// Applicant zip code (entity key for `zipcode_features`)
    pub zipcode: i64,

    /// Date of birth and last four SSN digits, e.g. `19860319_3643`
    /// (entity key for `credit_history`)
    pub dob_ssn: String,

    /// Age in years
    pub person_age: i64,

    /// Yearly income
    pub person_income: i64,

    /// Home ownership: RENT, MORTGAGE or OWN
    pub person_home_ownership: String,

    /// Employment length in months
    pub person_emp_length: f64,

    /// Stated purpose of the loan
    pub loan_intent: String,

    /// Requested loan amount
    pub loan_amnt: i64,

    /// Preferred interest rate
    pub loan_int_rate: f64,
}

impl LoanApplication {
    /// Entity keys for the feature store lookup.
    pub fn entity_keys(&self) -> EntityKeys {
        EntityKeys {
            zipcode: self.zipcode,
            dob_ssn: self.dob_ssn.clone(),
            loan_amnt: self.loan_amnt,
        }
    }
}
