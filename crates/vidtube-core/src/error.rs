//! Error types for `vidtube-core`.
//!
//! Every failure that reaches the transport layer is one of these variants.
//! Storage errors are classified through [`StoreError`](crate::store::StoreError)
//! by [`Error::store`]; backend messages are logged there and never carried
//! into the user-visible text.

use serde::Serialize;
use thiserror::Error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum Error {
  #[error("invalid argument: {0}")]
  InvalidArgument(String),

  #[error("missing actor identity")]
  Unauthenticated,

  #[error("forbidden: {0}")]
  Forbidden(String),

  #[error("{0}")]
  NotFound(String),

  #[error("already exists: {0}")]
  AlreadyExists(String),

  /// A concurrent write hit a uniqueness constraint. Resolved inside the
  /// toggle retry loop; only escapes when a caller has no better mapping.
  #[error("conflicting concurrent write")]
  Conflict,

  #[error("storage unavailable")]
  StorageUnavailable(String),

  #[error("internal error")]
  Internal(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Stable, machine-readable error kind used in response bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
  InvalidArgument,
  Unauthenticated,
  Forbidden,
  NotFound,
  AlreadyExists,
  Conflict,
  StorageUnavailable,
  Internal,
}

impl Error {
  /// Classify a backend error into the public taxonomy.
  pub fn store<E: StoreError>(err: E) -> Self {
    if err.is_conflict() {
      Error::Conflict
    } else if err.is_not_found() {
      Error::NotFound(err.to_string())
    } else if err.is_unavailable() {
      tracing::warn!(error = %err, "storage unavailable");
      Error::StorageUnavailable(err.to_string())
    } else {
      tracing::error!(error = %err, "storage failure");
      Error::Internal(err.to_string())
    }
  }

  pub fn invalid(msg: impl Into<String>) -> Self {
    Error::InvalidArgument(msg.into())
  }

  pub fn not_found(what: &str, id: impl std::fmt::Display) -> Self {
    Error::NotFound(format!("{what} {id} not found"))
  }

  pub fn kind(&self) -> ErrorKind {
    match self {
      Error::InvalidArgument(_) => ErrorKind::InvalidArgument,
      Error::Unauthenticated => ErrorKind::Unauthenticated,
      Error::Forbidden(_) => ErrorKind::Forbidden,
      Error::NotFound(_) => ErrorKind::NotFound,
      Error::AlreadyExists(_) => ErrorKind::AlreadyExists,
      Error::Conflict => ErrorKind::Conflict,
      Error::StorageUnavailable(_) => ErrorKind::StorageUnavailable,
      Error::Internal(_) => ErrorKind::Internal,
    }
  }

  /// The text shown to clients. Storage details stay in the logs.
  pub fn public_message(&self) -> String {
    match self {
      Error::StorageUnavailable(_) => {
        "storage is temporarily unavailable, please retry".to_owned()
      }
      Error::Internal(_) => "an internal error occurred".to_owned(),
      other => other.to_string(),
    }
  }
}
