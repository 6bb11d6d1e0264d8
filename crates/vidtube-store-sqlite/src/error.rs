//! Error type for `vidtube-store-sqlite`.

use rusqlite::ErrorCode;
use thiserror::Error;
use vidtube_core::{membership::TargetRef, store::StoreError};

#[derive(Debug, Error)]
pub enum Error {
  #[error("database error: {0}")]
  Database(tokio_rusqlite::Error),

  #[error("json error: {0}")]
  Json(#[from] serde_json::Error),

  #[error("uuid parse error: {0}")]
  Uuid(#[from] uuid::Error),

  #[error("date/time parse error: {0}")]
  DateParse(String),

  #[error("cannot decode column: {0}")]
  Decode(String),

  /// Attempted to delete an edge that is not present.
  #[error("membership edge not found: {0}")]
  EdgeNotFound(uuid::Uuid),

  #[error("{0} not found")]
  TargetNotFound(TargetRef),

  /// A foreign key points at a row that was deleted before the write landed.
  #[error("referenced record no longer exists")]
  MissingReference,
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
  fn sqlite_failure(&self) -> Option<&rusqlite::ffi::Error> {
    match self {
      Error::Database(tokio_rusqlite::Error::Rusqlite(
        rusqlite::Error::SqliteFailure(e, _),
      )) => Some(e),
      _ => None,
    }
  }
}

impl From<tokio_rusqlite::Error> for Error {
  fn from(err: tokio_rusqlite::Error) -> Self {
    match &err {
      tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(e, _))
        if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY =>
      {
        Error::MissingReference
      }
      _ => Error::Database(err),
    }
  }
}

impl StoreError for Error {
  fn is_conflict(&self) -> bool {
    self.sqlite_failure().is_some_and(|e| {
      e.code == ErrorCode::ConstraintViolation
        && matches!(
          e.extended_code,
          rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
            | rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY
        )
    })
  }

  fn is_not_found(&self) -> bool {
    matches!(
      self,
      Error::EdgeNotFound(_) | Error::TargetNotFound(_) | Error::MissingReference
    )
  }

  fn is_unavailable(&self) -> bool {
    matches!(self, Error::Database(tokio_rusqlite::Error::ConnectionClosed))
      || self.sqlite_failure().is_some_and(|e| {
        matches!(e.code, ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked)
      })
  }
}

/// Wrap a non-SQLite failure raised inside a connection closure.
pub(crate) fn other<E>(err: E) -> tokio_rusqlite::Error
where
  E: std::error::Error + Send + Sync + 'static,
{
  tokio_rusqlite::Error::Other(Box::new(err))
}

#[cfg(test)]
mod tests {
  use std::ffi::c_int;

  use super::*;

  fn failure(code: c_int) -> Error {
    Error::from(tokio_rusqlite::Error::Rusqlite(rusqlite::Error::SqliteFailure(
      rusqlite::ffi::Error::new(code),
      None,
    )))
  }

  #[test]
  fn busy_and_locked_are_unavailable() {
    for code in [rusqlite::ffi::SQLITE_BUSY, rusqlite::ffi::SQLITE_LOCKED] {
      let err = failure(code);
      assert!(err.is_unavailable(), "{err}");
      assert!(!err.is_conflict());
      assert!(!err.is_not_found());
    }
    assert!(Error::from(tokio_rusqlite::Error::ConnectionClosed).is_unavailable());
  }

  #[test]
  fn unique_violations_are_conflicts() {
    for code in [
      rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE,
      rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY,
    ] {
      let err = failure(code);
      assert!(err.is_conflict(), "{err}");
      assert!(!err.is_unavailable());
    }
  }

  #[test]
  fn foreign_key_violation_is_not_found() {
    let err = failure(rusqlite::ffi::SQLITE_CONSTRAINT_FOREIGNKEY);
    assert!(matches!(err, Error::MissingReference));
    assert!(err.is_not_found());
    assert!(!err.is_conflict());
  }

  #[test]
  fn other_failures_are_unclassified() {
    let err = failure(rusqlite::ffi::SQLITE_CORRUPT);
    assert!(!err.is_conflict());
    assert!(!err.is_not_found());
    assert!(!err.is_unavailable());
  }
}
