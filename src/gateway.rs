//! Business challenge proposals: field-presence validation only. Nothing is stored.

use serde_json::Value;
use tracing::{debug, instrument};

use crate::domain::marker_color_for;
use crate::error::ApiError;
use crate::util::trunc_for_log;

/// Checked in this order; the first one missing is reported.
pub const REQUIRED_FIELDS: [&str; 12] = [
  "businessName",
  "contactName",
  "email",
  "phone",
  "address",
  "challengeTitle",
  "category",
  "difficulty",
  "estimatedTime",
  "points",
  "description",
  "tasks",
];

/// Loggable digest of an accepted proposal.
#[derive(Debug, PartialEq)]
pub struct ProposalSummary {
  pub business_name: String,
  pub challenge_title: String,
  pub category: String,
  /// Color the proposal's marker would get; unknown categories get the default.
  pub marker_color: &'static str,
  pub has_notes: bool,
}

/// Absent, null, false, "" and 0 all count as not filled in.
fn is_blank(v: Option<&Value>) -> bool {
  match v {
    None | Some(Value::Null) | Some(Value::Bool(false)) => true,
    Some(Value::String(s)) => s.is_empty(),
    Some(Value::Number(n)) => n.as_f64() == Some(0.0),
    Some(_) => false,
  }
}

fn as_text(v: Option<&Value>) -> String {
  match v {
    Some(Value::String(s)) => trunc_for_log(s, 80),
    Some(other) => trunc_for_log(&other.to_string(), 80),
    None => String::new(),
  }
}

pub fn first_missing_field(body: &Value) -> Option<&'static str> {
  REQUIRED_FIELDS.into_iter().find(|f| is_blank(body.get(*f)))
}

/// Parse and validate a raw proposal body.
///
/// Unparseable JSON or a `null` body is an unexpected failure (500). Any other
/// non-object simply has none of the fields and fails on the first one.
#[instrument(level = "debug", skip(raw), fields(body_len = raw.len()))]
pub fn validate_proposal(raw: &[u8]) -> Result<ProposalSummary, ApiError> {
  let body: Value = serde_json::from_slice(raw).map_err(|e| ApiError::Unexpected(e.to_string()))?;
  if body.is_null() {
    return Err(ApiError::Unexpected("request body is null".into()));
  }
  if let Some(field) = first_missing_field(&body) {
    debug!(target: "questmap_backend", field, "Proposal rejected");
    return Err(ApiError::MissingField(field));
  }
  Ok(ProposalSummary {
    business_name: as_text(body.get("businessName")),
    challenge_title: as_text(body.get("challengeTitle")),
    category: as_text(body.get("category")),
    marker_color: marker_color_for(body.get("category").and_then(Value::as_str).unwrap_or_default()),
    has_notes: !is_blank(body.get("notes")),
  })
}
