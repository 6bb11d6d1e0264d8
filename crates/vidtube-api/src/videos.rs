//! Handlers for `/videos`.
//!
//! | Method   | Path | Notes |
//! |----------|------|-------|
//! | `GET`    | `/videos` | Published videos; `?page&limit&query&sort_by&sort_type&user_id` |
//! | `POST`   | `/videos` | Actor required; body: [`NewVideoBody`]; returns 201 |
//! | `GET`    | `/videos/{video_id}` | Counts a view; records history for an actor |
//! | `PATCH`  | `/videos/{video_id}` | Owner only; body: [`VideoPatchBody`] |
//! | `DELETE` | `/videos/{video_id}` | Owner only; cascades; returns 204 |
//! | `PATCH`  | `/videos/{video_id}/publish` | Owner only; flips `is_published` |

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vidtube_core::{
  Error, Result,
  entity::{NewVideo, Video, VideoPatch, ensure_owner, require_text},
  id::parse_id,
  page::{Page, PageRequest, SortOrder, VideoQuery, VideoSort},
  store::{PlatformStore, VideoStore},
};

use crate::{
  AppState,
  actor::Actor,
  error::ApiError,
  extract::{Json, Query},
  users::load_user,
};

/// Fetch a video or fail with [`Error::NotFound`].
pub(crate) async fn load_video<S: VideoStore>(store: &S, id: Uuid) -> Result<Video> {
  store
    .get_video(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("video", id))
}

/// Load a video and check that `actor_id` owns it.
async fn load_owned<S: VideoStore>(store: &S, raw_id: &str, actor_id: Uuid) -> Result<Video> {
  let id = parse_id(raw_id, "video")?;
  let video = load_video(store, id).await?;
  ensure_owner(actor_id, video.owner_id, "video")?;
  Ok(video)
}

// ─── List ────────────────────────────────────────────────────────────────────

#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
  pub page:      Option<u32>,
  pub limit:     Option<u32>,
  /// Case-insensitive substring over title and description.
  pub query:     Option<String>,
  pub sort_by:   Option<String>,
  pub sort_type: Option<String>,
  pub user_id:   Option<String>,
}

impl ListParams {
  fn into_query(self) -> Result<VideoQuery> {
    Ok(VideoQuery {
      text:           self.query,
      owner_id:       self
        .user_id
        .as_deref()
        .map(|raw| parse_id(raw, "user"))
        .transpose()?,
      sort:           self
        .sort_by
        .as_deref()
        .map(VideoSort::parse)
        .transpose()?
        .unwrap_or_default(),
      order:          self
        .sort_type
        .as_deref()
        .map(SortOrder::parse)
        .transpose()?
        .unwrap_or_default(),
      published_only: true,
      page:           PageRequest::new(self.page, self.limit)?,
    })
  }
}

/// `GET /videos`
pub async fn list<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Query(params): Query<ListParams>,
) -> Result<Json<Page<Video>>, ApiError> {
  let query = params.into_query()?;
  let page = state.store.list_videos(query).await.map_err(Error::store)?;
  Ok(Json(page))
}

// ─── Create ──────────────────────────────────────────────────────────────────

/// JSON body accepted by `POST /videos`. Asset URLs point at the external
/// media host; uploads never pass through this service.
#[derive(Debug, Deserialize)]
pub struct NewVideoBody {
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub video_url:     Option<String>,
  pub thumbnail_url: Option<String>,
  #[serde(default)]
  pub duration_secs: f64,
}

/// `POST /videos`
pub async fn create<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Json(body): Json<NewVideoBody>,
) -> Result<impl IntoResponse, ApiError> {
  let input = NewVideo {
    owner_id:      actor_id,
    title:         require_text("title", body.title)?,
    description:   require_text("description", body.description)?,
    video_url:     require_text("video_url", body.video_url)?,
    thumbnail_url: require_text("thumbnail_url", body.thumbnail_url)?,
    duration_secs: body.duration_secs,
  };
  if !input.duration_secs.is_finite() || input.duration_secs < 0.0 {
    return Err(Error::invalid("duration_secs must be a non-negative number").into());
  }
  load_user(state.store.as_ref(), actor_id).await?;

  let video = state.store.insert_video(input).await.map_err(Error::store)?;
  tracing::info!(video_id = %video.video_id, owner_id = %actor_id, "video published");
  Ok((StatusCode::CREATED, Json(video)))
}

// ─── Get one ─────────────────────────────────────────────────────────────────

/// `GET /videos/{video_id}`
pub async fn get_one<S: PlatformStore>(
  State(state): State<AppState<S>>,
  actor: Option<Actor>,
  Path(video_id): Path<String>,
) -> Result<Json<Video>, ApiError> {
  let id = parse_id(&video_id, "video")?;
  let viewer = actor.map(|Actor(id)| id);
  let video = state
    .store
    .record_view(id, viewer)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("video", id))?;
  Ok(Json(video))
}

// ─── Update ──────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct VideoPatchBody {
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub thumbnail_url: Option<String>,
}

impl VideoPatchBody {
  /// Present fields must be non-blank; at least one must be present.
  fn into_patch(self) -> Result<VideoPatch> {
    let patch = VideoPatch {
      title:         self.title.map(|v| require_text("title", Some(v))).transpose()?,
      description:   self
        .description
        .map(|v| require_text("description", Some(v)))
        .transpose()?,
      thumbnail_url: self
        .thumbnail_url
        .map(|v| require_text("thumbnail_url", Some(v)))
        .transpose()?,
    };
    if patch.is_empty() {
      return Err(Error::invalid("nothing to update"));
    }
    Ok(patch)
  }
}

/// `PATCH /videos/{video_id}`
pub async fn update<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(video_id): Path<String>,
  Json(body): Json<VideoPatchBody>,
) -> Result<Json<Video>, ApiError> {
  let patch = body.into_patch()?;
  let video = load_owned(state.store.as_ref(), &video_id, actor_id).await?;
  let updated = state
    .store
    .update_video(video.video_id, patch)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("video", video.video_id))?;
  Ok(Json(updated))
}

/// `PATCH /videos/{video_id}/publish`
pub async fn toggle_publish<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(video_id): Path<String>,
) -> Result<Json<Video>, ApiError> {
  let video = load_owned(state.store.as_ref(), &video_id, actor_id).await?;
  let updated = state
    .store
    .toggle_published(video.video_id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("video", video.video_id))?;
  tracing::info!(
    video_id = %updated.video_id,
    is_published = updated.is_published,
    "publish status changed"
  );
  Ok(Json(updated))
}

// ─── Delete ──────────────────────────────────────────────────────────────────

/// `DELETE /videos/{video_id}`
pub async fn remove<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(video_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let video = load_owned(state.store.as_ref(), &video_id, actor_id).await?;
  if !state
    .store
    .delete_video(video.video_id)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::not_found("video", video.video_id).into());
  }
  tracing::info!(video_id = %video.video_id, "video deleted");
  Ok(StatusCode::NO_CONTENT)
}
