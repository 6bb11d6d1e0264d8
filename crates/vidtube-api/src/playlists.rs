//! Handlers for playlists.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `POST`   | `/playlists` | Actor required; body: [`NewPlaylistBody`]; returns 201 |
//! | `GET`    | `/users/{user_id}/playlists` | |
//! | `GET`    | `/playlists/{playlist_id}` | Playlist with its videos resolved |
//! | `PATCH`  | `/playlists/{playlist_id}` | Owner only |
//! | `DELETE` | `/playlists/{playlist_id}` | Owner only; returns 204 |
//! | `POST`   | `/playlists/{playlist_id}/videos/{video_id}` | Owner only; 409 on duplicate |
//! | `DELETE` | `/playlists/{playlist_id}/videos/{video_id}` | Owner only; idempotent |

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vidtube_core::{
  Error, Result,
  entity::{
    NewPlaylist, Playlist, PlaylistDetail, PlaylistPatch, ensure_owner, require_text,
  },
  id::parse_id,
  store::{PlatformStore, PlaylistStore, VideoStore},
};

use crate::{
  AppState,
  actor::Actor,
  error::{ApiError, exists_on_conflict},
  extract::Json,
  users::load_user,
  videos::load_video,
};

async fn load_owned<S: PlaylistStore>(store: &S, raw_id: &str, actor_id: Uuid) -> Result<Playlist> {
  let id = parse_id(raw_id, "playlist")?;
  let playlist = store
    .get_playlist(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("playlist", id))?;
  ensure_owner(actor_id, playlist.owner_id, "playlist")?;
  Ok(playlist)
}

// ─── Create / read ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct NewPlaylistBody {
  pub name:        Option<String>,
  pub description: Option<String>,
}

/// `POST /playlists`
pub async fn create<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Json(body): Json<NewPlaylistBody>,
) -> Result<impl IntoResponse, ApiError> {
  let name = require_text("name", body.name)?;
  let description = body.description.map(|d| d.trim().to_owned()).unwrap_or_default();
  load_user(state.store.as_ref(), actor_id).await?;

  let playlist = state
    .store
    .insert_playlist(NewPlaylist { owner_id: actor_id, name, description })
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(playlist)))
}

/// `GET /users/{user_id}/playlists`
pub async fn list_for_user<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<Playlist>>, ApiError> {
  let id = parse_id(&user_id, "user")?;
  load_user(state.store.as_ref(), id).await?;
  let playlists = state
    .store
    .list_user_playlists(id)
    .await
    .map_err(Error::store)?;
  Ok(Json(playlists))
}

/// `GET /playlists/{playlist_id}`
pub async fn get_one<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(playlist_id): Path<String>,
) -> Result<Json<PlaylistDetail>, ApiError> {
  let id = parse_id(&playlist_id, "playlist")?;
  let playlist = state
    .store
    .get_playlist(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("playlist", id))?;
  let entries = state
    .store
    .get_videos(playlist.videos.clone())
    .await
    .map_err(Error::store)?;
  Ok(Json(PlaylistDetail { playlist, entries }))
}

// ─── Update / delete ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct PlaylistPatchBody {
  pub name:        Option<String>,
  pub description: Option<String>,
}

/// `PATCH /playlists/{playlist_id}`
pub async fn update<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(playlist_id): Path<String>,
  Json(body): Json<PlaylistPatchBody>,
) -> Result<Json<Playlist>, ApiError> {
  if body.name.is_none() && body.description.is_none() {
    return Err(Error::invalid("nothing to update").into());
  }
  let patch = PlaylistPatch {
    name:        body.name.map(|n| require_text("name", Some(n))).transpose()?,
    description: body.description.map(|d| d.trim().to_owned()),
  };
  let playlist = load_owned(state.store.as_ref(), &playlist_id, actor_id).await?;

  let updated = state
    .store
    .update_playlist(playlist.playlist_id, patch)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("playlist", playlist.playlist_id))?;
  Ok(Json(updated))
}

/// `DELETE /playlists/{playlist_id}`
pub async fn remove<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(playlist_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let playlist = load_owned(state.store.as_ref(), &playlist_id, actor_id).await?;
  if !state
    .store
    .delete_playlist(playlist.playlist_id)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::not_found("playlist", playlist.playlist_id).into());
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Entries ─────────────────────────────────────────────────────────────────

/// `POST /playlists/{playlist_id}/videos/{video_id}`
pub async fn add_video<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<Json<Playlist>, ApiError> {
  let video_id = parse_id(&video_id, "video")?;
  let playlist = load_owned(state.store.as_ref(), &playlist_id, actor_id).await?;
  load_video(state.store.as_ref(), video_id).await?;

  let updated = state
    .store
    .add_playlist_video(playlist.playlist_id, video_id)
    .await
    .map_err(exists_on_conflict("video is already in this playlist"))?
    .ok_or_else(|| Error::not_found("playlist", playlist.playlist_id))?;
  Ok(Json(updated))
}

/// `DELETE /playlists/{playlist_id}/videos/{video_id}`
pub async fn remove_video<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path((playlist_id, video_id)): Path<(String, String)>,
) -> Result<Json<Playlist>, ApiError> {
  let video_id = parse_id(&video_id, "video")?;
  let playlist = load_owned(state.store.as_ref(), &playlist_id, actor_id).await?;

  let updated = state
    .store
    .remove_playlist_video(playlist.playlist_id, video_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("playlist", playlist.playlist_id))?;
  Ok(Json(updated))
}
