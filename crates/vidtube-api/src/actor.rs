//! The acting user, taken from the `x-actor-id` header.
//!
//! The header is set by an upstream identity layer and trusted as-is. Routes
//! that need an actor take [`Actor`]; routes where one is optional take
//! `Option<Actor>`. A header that is present but malformed is rejected in
//! both cases.

use axum::{
  extract::{FromRequestParts, OptionalFromRequestParts},
  http::{HeaderMap, request::Parts},
};
use uuid::Uuid;
use vidtube_core::{Error, Result, id::parse_id};

use crate::error::ApiError;

pub const ACTOR_HEADER: &str = "x-actor-id";

/// Identity of the user making the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor(pub Uuid);

fn read_actor(headers: &HeaderMap) -> Result<Option<Uuid>> {
  let Some(value) = headers.get(ACTOR_HEADER) else {
    return Ok(None);
  };
  let raw = value
    .to_str()
    .map_err(|_| Error::invalid(format!("{ACTOR_HEADER} must be visible ASCII")))?;
  parse_id(raw.trim(), "actor").map(Some)
}

impl<S> FromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
    read_actor(&parts.headers)?
      .map(Actor)
      .ok_or(ApiError(Error::Unauthenticated))
  }
}

impl<S> OptionalFromRequestParts<S> for Actor
where
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request_parts(
    parts: &mut Parts,
    _state: &S,
  ) -> Result<Option<Self>, Self::Rejection> {
    Ok(read_actor(&parts.headers)?.map(Actor))
  }
}

#[cfg(test)]
mod tests {
  use axum::http::Request;

  use super::*;

  async fn extract(req: Request<()>) -> Result<Actor, ApiError> {
    let (mut parts, _) = req.into_parts();
    <Actor as FromRequestParts<()>>::from_request_parts(&mut parts, &()).await
  }

  #[tokio::test]
  async fn valid_header() {
    let id = Uuid::new_v4();
    let req = Request::builder()
      .header(ACTOR_HEADER, id.to_string())
      .body(())
      .unwrap();
    assert_eq!(extract(req).await.unwrap(), Actor(id));
  }

  #[tokio::test]
  async fn missing_header_is_unauthenticated() {
    let req = Request::builder().body(()).unwrap();
    let err = extract(req).await.unwrap_err();
    assert!(matches!(err.0, Error::Unauthenticated));
  }

  #[tokio::test]
  async fn malformed_header_is_invalid_even_when_optional() {
    let req = Request::builder()
      .header(ACTOR_HEADER, "bob")
      .body(())
      .unwrap();
    let (mut parts, _) = req.into_parts();
    let err = <Actor as OptionalFromRequestParts<()>>::from_request_parts(&mut parts, &())
      .await
      .unwrap_err();
    assert!(matches!(err.0, Error::InvalidArgument(_)));
  }
}
