//! Identifier parsing.

use uuid::Uuid;

use crate::{Error, Result};

/// Parse a client-supplied identifier, naming the field in the error.
pub fn parse_id(raw: &str, what: &str) -> Result<Uuid> {
  Uuid::parse_str(raw.trim())
    .map_err(|_| Error::invalid(format!("invalid {what} id: {raw:?}")))
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn accepts_hyphenated_uuid() {
    let id = Uuid::new_v4();
    assert_eq!(parse_id(&id.to_string(), "video").unwrap(), id);
  }

  #[test]
  fn rejects_garbage() {
    let err = parse_id("not-an-id", "video").unwrap_err();
    assert!(matches!(err, Error::InvalidArgument(m) if m.contains("video")));
  }
}
