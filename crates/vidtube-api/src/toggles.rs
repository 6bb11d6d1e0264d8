//! Like and subscribe endpoints. Each one flips the actor's membership on
//! the target and answers `{"state": "added"|"removed", "count": n}`.

use axum::extract::{Path, State};
use uuid::Uuid;
use vidtube_core::{
  id::parse_id,
  membership::{TargetKind, TargetRef, ToggleOutcome},
  store::PlatformStore,
};

use crate::{AppState, actor::Actor, error::ApiError, extract::Json};

async fn toggle<S: PlatformStore>(
  state: &AppState<S>,
  actor_id: Uuid,
  raw_target: &str,
  kind: TargetKind,
) -> Result<Json<ToggleOutcome>, ApiError> {
  let target = TargetRef::new(kind, parse_id(raw_target, kind.as_str())?);
  let outcome = state.toggles.toggle_ref(actor_id, target).await?;
  tracing::info!(
    actor_id = %actor_id,
    target = %target,
    state = ?outcome.state,
    count = outcome.count,
    "toggle"
  );
  Ok(Json(outcome))
}

/// `POST /videos/{video_id}/like`
pub async fn like_video<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(video_id): Path<String>,
) -> Result<Json<ToggleOutcome>, ApiError> {
  toggle(&state, actor_id, &video_id, TargetKind::Video).await
}

/// `POST /comments/{comment_id}/like`
pub async fn like_comment<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(comment_id): Path<String>,
) -> Result<Json<ToggleOutcome>, ApiError> {
  toggle(&state, actor_id, &comment_id, TargetKind::Comment).await
}

/// `POST /tweets/{tweet_id}/like`
pub async fn like_tweet<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(tweet_id): Path<String>,
) -> Result<Json<ToggleOutcome>, ApiError> {
  toggle(&state, actor_id, &tweet_id, TargetKind::Tweet).await
}

/// `POST /channels/{channel_id}/subscribe`
pub async fn subscribe<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(channel_id): Path<String>,
) -> Result<Json<ToggleOutcome>, ApiError> {
  toggle(&state, actor_id, &channel_id, TargetKind::Channel).await
}
