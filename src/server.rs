//! Web UI for loan applications.
//!
//! One form, one submit action, one decision display. Every submission runs
//! the full pipeline once; a failure anywhere renders an error page instead
//! of a decision.

use crate::error::ScoringError;
use crate::feature_store::FeatureProvider;
use crate::pipeline::ScoringService;
use crate::types::{Decision, LoanApplication, LoanDecision};
use serde::Deserialize;
use std::convert::Infallible;
use std::sync::Arc;
use tracing::{error, warn};
use warp::http::StatusCode;
use warp::{Filter, Reply};

/// Fields submitted by the application form.
#[derive(Debug, Deserialize)]
pub struct ApplicationForm {
    pub zipcode: i64,
    /// `YYYY-MM-DD`, from the date input
    pub date_of_birth: String,
    pub ssn_last_four: String,
    pub person_age: i64,
    pub person_income: i64,
    pub person_home_ownership: String,
    pub person_emp_length: f64,
    pub loan_intent: String,
    pub loan_amnt: i64,
    pub loan_int_rate: f64,
}

impl ApplicationForm {
    /// Build the applicant record, composing the `dob_ssn` entity key.
    pub fn into_application(self) -> LoanApplication {
        let dob_ssn = format!(
            "{}_{}",
            self.date_of_birth.replace('-', ""),
            self.ssn_last_four
        );
        LoanApplication {
            zipcode: self.zipcode,
            dob_ssn,
            person_age: self.person_age,
            person_income: self.person_income,
            person_home_ownership: self.person_home_ownership,
            person_emp_length: self.person_emp_length,
            loan_intent: self.loan_intent,
            loan_amnt: self.loan_amnt,
            loan_int_rate: self.loan_int_rate,
        }
    }
}

/// Build the route tree: the form, the submit handler, and a health probe.
pub fn routes<P>(
    service: Arc<ScoringService<P>>,
) -> impl Filter<Extract = (impl Reply,), Error = warp::Rejection> + Clone
where
    P: FeatureProvider + Send + Sync + 'static,
{
    let with_service = warp::any().map(move || service.clone());

    let index = warp::path::end()
        .and(warp::get())
        .map(|| warp::reply::html(render_form()));

    let apply = warp::path("apply")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::form::<ApplicationForm>())
        .and(with_service)
        .and_then(handle_apply);

    let healthz = warp::path("healthz").and(warp::get()).map(|| "ok");

    index.or(apply).or(healthz)
}

async fn handle_apply<P>(
    form: ApplicationForm,
    service: Arc<ScoringService<P>>,
) -> Result<warp::reply::WithStatus<warp::reply::Html<String>>, Infallible>
where
    P: FeatureProvider + Send + Sync + 'static,
{
    let application = form.into_application();
    match service.score(&application).await {
        Ok(decision) => Ok(warp::reply::with_status(
            warp::reply::html(render_decision(&decision)),
            StatusCode::OK,
        )),
        Err(err) => {
            let status = match &err {
                ScoringError::ServiceUnavailable(_) => {
                    error!(error = %err, "Feature lookup failed");
                    StatusCode::BAD_GATEWAY
                }
                _ => {
                    warn!(error = %err, "Application could not be scored");
                    StatusCode::UNPROCESSABLE_ENTITY
                }
            };
            Ok(warp::reply::with_status(
                warp::reply::html(render_failure(&err)),
                status,
            ))
        }
    }
}

fn page(body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><title>Loan Application</title>\
         <style>body{{font-family:sans-serif;max-width:40rem;margin:2rem auto}}\
         label{{display:block;margin-top:.6rem}}\
         .approve{{color:#1a7f37}}.reject{{color:#b42318}}.failure{{color:#b42318}}</style>\
         </head><body>{}</body></html>",
        body
    )
}

fn render_form() -> String {
    page(
        r#"<h1>Loan Application</h1>
<form method="post" action="/apply">
  <label>Zip code <input name="zipcode" type="number" value="94109" required></label>
  <label>Date of birth <input name="date_of_birth" type="date" value="1986-03-19" required></label>
  <label>Last four digits of SSN <input name="ssn_last_four" value="3643" required></label>
  <label>Age <input name="person_age" type="number" min="0" max="130" value="25" required></label>
  <label>Yearly income <input name="person_income" type="number" min="0" value="120000" required></label>
  <label>Do you own or rent your home?
    <select name="person_home_ownership">
      <option>RENT</option><option>MORTGAGE</option><option>OWN</option>
    </select></label>
  <label>Employment length (months) <input name="person_emp_length" type="number" step="0.5" min="0" value="12" required></label>
  <label>Why do you want to apply for a loan?
    <select name="loan_intent">
      <option>PERSONAL</option><option>VENTURE</option><option>HOMEIMPROVEMENT</option>
      <option>EDUCATION</option><option>MEDICAL</option><option>DEBTCONSOLIDATION</option>
    </select></label>
  <label>Loan amount <input name="loan_amnt" type="number" min="0" value="10000" required></label>
  <label>Preferred interest rate <input name="loan_int_rate" type="number" step="0.1" min="1" max="25" value="12.0" required></label>
  <button type="submit">Submit application</button>
</form>"#,
    )
}

fn render_decision(decision: &LoanDecision) -> String {
    let body = match decision.decision {
        Decision::Approve => format!(
            "<h1>Application Status</h1><p class=\"approve\">Your loan has been approved!</p>\
             <p>Confidence: {:.0}%</p><p><a href=\"/\">Submit another application</a></p>",
            decision.score * 100.0
        ),
        Decision::Reject => format!(
            "<h1>Application Status</h1><p class=\"reject\">Your loan has been rejected.</p>\
             <p>Confidence: {:.0}%</p><p><a href=\"/\">Submit another application</a></p>",
            decision.score * 100.0
        ),
    };
    page(&body)
}

fn render_failure(err: &ScoringError) -> String {
    let body = format!(
        "<h1>Application Status</h1><p class=\"failure\">Your application could not be scored: {}.</p>\
         <p>Please resubmit or try again later.</p><p><a href=\"/\">Back to the form</a></p>",
        escape_html(&err.to_string())
    );
    page(&body)
}

fn escape_html(raw: &str) -> String {
    raw.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
