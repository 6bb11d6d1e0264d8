//! Handlers for users and channels.
//!
//! | Method | Path | Notes |
//! |--------|------|-------|
//! | `POST` | `/users` | Body: [`RegisterBody`]; returns 201 + user |
//! | `GET`  | `/users/{user_id}` | |
//! | `GET`  | `/channels/{channel_id}` | Profile with `is_subscribed` for the actor |
//! | `GET`  | `/channels/{channel_id}/subscribers` | Paginated users |
//! | `GET`  | `/users/me/history` | Actor required; `?limit` |
//! | `GET`  | `/users/me/subscriptions` | Actor required; paginated channels |
//! | `GET`  | `/users/me/liked-videos` | Actor required; paginated videos |

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vidtube_core::{
  Error, Result,
  entity::{ChannelProfile, NewUser, User, Video, WatchedVideo, require_text},
  id::parse_id,
  membership::{TargetKind, TargetRef},
  page::{Page, PageRequest},
  store::{MembershipStore, PlatformStore, UserStore, VideoStore},
};

use crate::{
  AppState,
  actor::Actor,
  error::{ApiError, exists_on_conflict},
  extract::{Json, Query},
  params::PageParams,
  password::hash_password,
};

/// Fetch a user or fail with [`Error::NotFound`].
pub(crate) async fn load_user<S: UserStore>(store: &S, id: Uuid) -> Result<User> {
  store
    .get_user(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("user", id))
}

// ─── Register ────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct RegisterBody {
  pub full_name:       Option<String>,
  pub email:           Option<String>,
  pub username:        Option<String>,
  pub password:        Option<String>,
  pub avatar_url:      Option<String>,
  pub cover_image_url: Option<String>,
}

/// `POST /users`
pub async fn register<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Json(body): Json<RegisterBody>,
) -> Result<impl IntoResponse, ApiError> {
  let full_name = require_text("full_name", body.full_name)?;
  let email = require_text("email", body.email)?;
  let username = require_text("username", body.username)?.to_lowercase();
  let password = require_text("password", body.password)?;
  let avatar_url = require_text("avatar_url", body.avatar_url)?;
  let cover_image_url = body
    .cover_image_url
    .map(|url| url.trim().to_owned())
    .filter(|url| !url.is_empty());

  let password_hash = hash_password(password).await?;
  let user = state
    .store
    .insert_user(NewUser {
      username,
      email,
      full_name,
      avatar_url,
      cover_image_url,
      password_hash,
    })
    .await
    .map_err(exists_on_conflict("username or email is already taken"))?;

  tracing::info!(user_id = %user.user_id, username = %user.username, "user registered");
  Ok((StatusCode::CREATED, Json(user)))
}

// ─── Lookup ──────────────────────────────────────────────────────────────────

/// `GET /users/{user_id}`
pub async fn get_one<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<User>, ApiError> {
  let id = parse_id(&user_id, "user")?;
  Ok(Json(load_user(state.store.as_ref(), id).await?))
}

/// `GET /channels/{channel_id}`
pub async fn channel_profile<S: PlatformStore>(
  State(state): State<AppState<S>>,
  actor: Option<Actor>,
  Path(channel_id): Path<String>,
) -> Result<Json<ChannelProfile>, ApiError> {
  let id = parse_id(&channel_id, "channel")?;
  let user = load_user(state.store.as_ref(), id).await?;

  let is_subscribed = match actor {
    Some(Actor(actor_id)) => {
      state
        .toggles
        .is_member(actor_id, TargetRef::new(TargetKind::Channel, id))
        .await?
    }
    None => false,
  };

  Ok(Json(ChannelProfile {
    subscribed_to_count: user.subscribed_to.len(),
    is_subscribed,
    user,
  }))
}

// ─── Membership listings ─────────────────────────────────────────────────────

/// `GET /channels/{channel_id}/subscribers`, oldest subscriber first.
pub async fn subscribers<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(channel_id): Path<String>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<User>>, ApiError> {
  let id = parse_id(&channel_id, "channel")?;
  let page = params.to_request()?;
  load_user(state.store.as_ref(), id).await?;

  let edges = state
    .store
    .list_edges_for_target(TargetRef::new(TargetKind::Channel, id), page)
    .await
    .map_err(Error::store)?;
  let ids = edges.items.iter().map(|e| e.actor_id).collect();
  let users = state.store.get_users(ids).await.map_err(Error::store)?;
  Ok(Json(edges.map_items(users)))
}

/// `GET /users/me/subscriptions`, newest first.
pub async fn subscriptions<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<User>>, ApiError> {
  let page = params.to_request()?;
  let edges = state
    .store
    .list_edges_for_actor(actor_id, TargetKind::Channel, page)
    .await
    .map_err(Error::store)?;
  let ids = edges.items.iter().map(|e| e.target.id).collect();
  let channels = state.store.get_users(ids).await.map_err(Error::store)?;
  Ok(Json(edges.map_items(channels)))
}

/// `GET /users/me/liked-videos`, most recently liked first.
pub async fn liked_videos<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<Video>>, ApiError> {
  let page = params.to_request()?;
  let edges = state
    .store
    .list_edges_for_actor(actor_id, TargetKind::Video, page)
    .await
    .map_err(Error::store)?;
  let ids = edges.items.iter().map(|e| e.target.id).collect();
  let videos = state.store.get_videos(ids).await.map_err(Error::store)?;
  Ok(Json(edges.map_items(videos)))
}

// ─── Watch history ───────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
  pub limit: Option<u32>,
}

/// `GET /users/me/history`
pub async fn watch_history<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Query(params): Query<HistoryParams>,
) -> Result<Json<Vec<WatchedVideo>>, ApiError> {
  let limit = PageRequest::new(None, params.limit)?.limit;
  let history = state
    .store
    .watch_history(actor_id, limit)
    .await
    .map_err(Error::store)?;
  Ok(Json(history))
}
