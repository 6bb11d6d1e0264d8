//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  extract::rejection::{JsonRejection, QueryRejection},
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;
use vidtube_core::{Error, ErrorKind, store::StoreError};

/// An error returned by an API handler. Wraps the core taxonomy and decides
/// the HTTP status.
#[derive(Debug, Error)]
#[error(transparent)]
pub struct ApiError(#[from] pub Error);

impl ApiError {
  pub fn status(&self) -> StatusCode {
    match self.0.kind() {
      ErrorKind::InvalidArgument => StatusCode::BAD_REQUEST,
      ErrorKind::Unauthenticated => StatusCode::UNAUTHORIZED,
      ErrorKind::Forbidden => StatusCode::FORBIDDEN,
      ErrorKind::NotFound => StatusCode::NOT_FOUND,
      ErrorKind::AlreadyExists | ErrorKind::Conflict => StatusCode::CONFLICT,
      ErrorKind::StorageUnavailable => StatusCode::SERVICE_UNAVAILABLE,
      ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let status = self.status();
    if status.is_server_error() {
      tracing::debug!(error = ?self.0, %status, "request failed");
    }
    let body = json!({
      "error": {
        "kind":    self.0.kind(),
        "message": self.0.public_message(),
      }
    });
    (status, Json(body)).into_response()
  }
}

// Extractor rejections are client mistakes; axum's own text names the
// offending field.
impl From<JsonRejection> for ApiError {
  fn from(rejection: JsonRejection) -> Self {
    ApiError(Error::InvalidArgument(rejection.body_text()))
  }
}

impl From<QueryRejection> for ApiError {
  fn from(rejection: QueryRejection) -> Self {
    ApiError(Error::InvalidArgument(rejection.body_text()))
  }
}

/// Classify a store error, reporting a uniqueness conflict as
/// [`Error::AlreadyExists`] with `message`.
pub(crate) fn exists_on_conflict<E: StoreError>(message: &'static str) -> impl FnOnce(E) -> Error {
  move |err| {
    if err.is_conflict() {
      Error::AlreadyExists(message.to_owned())
    } else {
      Error::store(err)
    }
  }
}
