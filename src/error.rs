use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::inference::InferenceError;

pub const UNAVAILABLE_DETAIL: &str = "AI client is not initialized. Check your GITHUB_TOKEN.";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
  UpstreamUnavailable,
  Upstream,
}

#[derive(Error, Debug)]
pub enum RelayError {
  /// The inference client was never created.
  #[error("{0}")]
  UpstreamUnavailable(String),

  #[error("{context}: {source}")]
  Upstream {
    context: &'static str,
    #[source]
    source: InferenceError,
  },
}

impl RelayError {
  pub fn unavailable() -> Self {
    RelayError::UpstreamUnavailable(UNAVAILABLE_DETAIL.to_string())
  }

  pub fn upstream(context: &'static str, source: InferenceError) -> Self {
    RelayError::Upstream { context, source }
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      RelayError::UpstreamUnavailable(_) => ErrorKind::UpstreamUnavailable,
      RelayError::Upstream { .. } => ErrorKind::Upstream,
    }
  }

  /// Every relay failure surfaces as a 500, whatever the provider answered.
  pub fn status_code(&self) -> StatusCode {
    StatusCode::INTERNAL_SERVER_ERROR
  }
}

impl IntoResponse for RelayError {
  fn into_response(self) -> Response {
    let body = Json(serde_json::json!({ "detail": self.to_string() }));
    (self.status_code(), body).into_response()
  }
}
