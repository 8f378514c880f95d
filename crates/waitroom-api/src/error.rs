//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use waitroom_core::Error as CoreError;
use waitroom_engine::{TurnError, TurnReply};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("conflict: {0}")]
  Conflict(String),

  /// The turn fell back; the patient still gets `reply`.
  #[error("upstream failure: {message}")]
  Upstream { reply: TurnReply, message: String },

  #[error("store error: {0}")]
  Store(#[source] BoxError),

  #[error("internal error: {0}")]
  Internal(#[source] BoxError),
}

impl ApiError {
  pub(crate) fn store(e: impl std::error::Error + Send + Sync + 'static) -> Self {
    Self::Store(Box::new(e))
  }
}

impl From<TurnError> for ApiError {
  fn from(e: TurnError) -> Self {
    match e {
      TurnError::Rejected(CoreError::EmptyMessage) => {
        Self::BadRequest(CoreError::EmptyMessage.to_string())
      }
      TurnError::Rejected(e @ CoreError::SessionNotFound(_)) => Self::NotFound(e.to_string()),
      TurnError::Rejected(e @ CoreError::SessionClosed(_)) => Self::Conflict(e.to_string()),
      TurnError::Rejected(e) => Self::Internal(Box::new(e)),
      TurnError::Upstream { reply, source } => {
        Self::Upstream { reply, message: source.to_string() }
      }
      TurnError::Store(e) => Self::Store(e),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let (status, message) = match self {
      ApiError::NotFound(m) => (StatusCode::NOT_FOUND, m),
      ApiError::BadRequest(m) => (StatusCode::BAD_REQUEST, m),
      ApiError::Conflict(m) => (StatusCode::CONFLICT, m),
      ApiError::Upstream { reply, message } => {
        let body = json!({ "reply": reply.reply, "capped": reply.capped, "error": message });
        return (StatusCode::BAD_GATEWAY, Json(body)).into_response();
      }
      ApiError::Store(e) | ApiError::Internal(e) => {
        tracing::error!(error = %e, "request failed");
        (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
      }
    };
    (status, Json(json!({ "error": message }))).into_response()
  }
}
