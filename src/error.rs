//! HTTP-facing errors. Each maps to a status code and a small JSON body.

use axum::{
  http::StatusCode,
  response::{IntoResponse, Response},
  Json,
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
  #[error("Missing required field: {0}")]
  MissingField(&'static str),

  #[error("Unknown challenge: {0}")]
  NotFound(String),

  #[error("Failed to process challenge submission")]
  Unexpected(String),
}

#[derive(Serialize)]
struct ErrorBody {
  error: String,
  #[serde(skip_serializing_if = "Option::is_none")]
  details: Option<String>,
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match self {
      ApiError::MissingField(_) => StatusCode::BAD_REQUEST,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Unexpected(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    let details = match &self {
      ApiError::Unexpected(d) => Some(d.clone()),
      _ => None,
    };
    (status, Json(ErrorBody { error: self.to_string(), details })).into_response()
  }
}
