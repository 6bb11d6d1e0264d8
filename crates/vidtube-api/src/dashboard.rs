//! Channel dashboard: aggregate stats and the full video list.

use axum::extract::{Path, State};
use vidtube_core::{
  Error,
  entity::{ChannelStats, Video},
  id::parse_id,
  store::{PlatformStore, VideoStore},
};

use crate::{AppState, error::ApiError, extract::Json, users::load_user};

/// `GET /channels/{channel_id}/stats`
pub async fn stats<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(channel_id): Path<String>,
) -> Result<Json<ChannelStats>, ApiError> {
  let id = parse_id(&channel_id, "channel")?;
  load_user(state.store.as_ref(), id).await?;
  let stats = state.store.channel_stats(id).await.map_err(Error::store)?;
  Ok(Json(stats))
}

/// `GET /channels/{channel_id}/videos`: published or not, newest first.
pub async fn videos<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(channel_id): Path<String>,
) -> Result<Json<Vec<Video>>, ApiError> {
  let id = parse_id(&channel_id, "channel")?;
  load_user(state.store.as_ref(), id).await?;
  let videos = state
    .store
    .list_channel_videos(id)
    .await
    .map_err(Error::store)?;
  Ok(Json(videos))
}
