//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::{HeaderValue, StatusCode, header},
  response::{IntoResponse, Response},
};
use overseer_core::{ErrorKind, auth::Permission};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("not authenticated")]
  Unauthorized,

  #[error("caller does not have {0} permission")]
  Forbidden(Permission),

  #[error("not found: {0}")]
  NotFound(String),

  #[error(transparent)]
  Ledger(#[from] overseer_core::Error),
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = match &self {
      ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
      ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
      ApiError::NotFound(_) => StatusCode::NOT_FOUND,
      ApiError::Ledger(e) => match e.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Transaction => {
          tracing::error!(error = %e, "ledger transaction failed");
          StatusCode::INTERNAL_SERVER_ERROR
        }
      },
    };

    let mut res =
      (status, Json(json!({ "error": self.to_string() }))).into_response();
    if status == StatusCode::UNAUTHORIZED {
      res.headers_mut().insert(
        header::WWW_AUTHENTICATE,
        HeaderValue::from_static("Basic realm=\"overseer\""),
      );
    }
    res
  }
}
