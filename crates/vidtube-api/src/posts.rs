//! Handlers for comments and tweets.
//!
//! Both are short owned texts with a bounded edit history; edits and deletes
//! are owner-only.

use axum::{
  extract::{Path, State},
  http::StatusCode,
  response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;
use vidtube_core::{
  Error, Result,
  entity::{Comment, NewComment, NewTweet, Tweet, ensure_owner, require_text},
  id::parse_id,
  page::Page,
  store::{CommentStore, PlatformStore, TweetStore},
};

use crate::{
  AppState,
  actor::Actor,
  error::ApiError,
  extract::{Json, Query},
  params::PageParams,
  users::load_user,
  videos::load_video,
};

/// `{"content": "..."}` for creating or editing a comment or tweet.
#[derive(Debug, Deserialize)]
pub struct ContentBody {
  pub content: Option<String>,
}

// ─── Comments ────────────────────────────────────────────────────────────────

/// `GET /videos/{video_id}/comments`, newest first.
pub async fn list_comments<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(video_id): Path<String>,
  Query(params): Query<PageParams>,
) -> Result<Json<Page<Comment>>, ApiError> {
  let id = parse_id(&video_id, "video")?;
  let page = params.to_request()?;
  load_video(state.store.as_ref(), id).await?;

  let comments = state
    .store
    .list_comments(id, page)
    .await
    .map_err(Error::store)?;
  Ok(Json(comments))
}

/// `POST /videos/{video_id}/comments`
pub async fn create_comment<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(video_id): Path<String>,
  Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let id = parse_id(&video_id, "video")?;
  let content = require_text("content", body.content)?;
  load_video(state.store.as_ref(), id).await?;
  load_user(state.store.as_ref(), actor_id).await?;

  let comment = state
    .store
    .insert_comment(NewComment { video_id: id, owner_id: actor_id, content })
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(comment)))
}

async fn load_owned_comment<S: CommentStore>(
  store: &S,
  raw_id: &str,
  actor_id: Uuid,
) -> Result<Comment> {
  let id = parse_id(raw_id, "comment")?;
  let comment = store
    .get_comment(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("comment", id))?;
  ensure_owner(actor_id, comment.owner_id, "comment")?;
  Ok(comment)
}

/// `PATCH /comments/{comment_id}`
pub async fn update_comment<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(comment_id): Path<String>,
  Json(body): Json<ContentBody>,
) -> Result<Json<Comment>, ApiError> {
  let content = require_text("content", body.content)?;
  let comment = load_owned_comment(state.store.as_ref(), &comment_id, actor_id).await?;

  let edited = state
    .store
    .edit_comment(comment.comment_id, content, state.settings.edit_history_limit)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("comment", comment.comment_id))?;
  Ok(Json(edited))
}

/// `DELETE /comments/{comment_id}`
pub async fn remove_comment<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(comment_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let comment = load_owned_comment(state.store.as_ref(), &comment_id, actor_id).await?;
  if !state
    .store
    .delete_comment(comment.comment_id)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::not_found("comment", comment.comment_id).into());
  }
  Ok(StatusCode::NO_CONTENT)
}

// ─── Tweets ──────────────────────────────────────────────────────────────────

/// `POST /tweets`
pub async fn create_tweet<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Json(body): Json<ContentBody>,
) -> Result<impl IntoResponse, ApiError> {
  let content = require_text("content", body.content)?;
  load_user(state.store.as_ref(), actor_id).await?;

  let tweet = state
    .store
    .insert_tweet(NewTweet { owner_id: actor_id, content })
    .await
    .map_err(Error::store)?;
  Ok((StatusCode::CREATED, Json(tweet)))
}

/// `GET /users/{user_id}/tweets`, newest first.
pub async fn list_tweets<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Path(user_id): Path<String>,
) -> Result<Json<Vec<Tweet>>, ApiError> {
  let id = parse_id(&user_id, "user")?;
  load_user(state.store.as_ref(), id).await?;
  let tweets = state.store.list_user_tweets(id).await.map_err(Error::store)?;
  Ok(Json(tweets))
}

async fn load_owned_tweet<S: TweetStore>(
  store: &S,
  raw_id: &str,
  actor_id: Uuid,
) -> Result<Tweet> {
  let id = parse_id(raw_id, "tweet")?;
  let tweet = store
    .get_tweet(id)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("tweet", id))?;
  ensure_owner(actor_id, tweet.owner_id, "tweet")?;
  Ok(tweet)
}

/// `PATCH /tweets/{tweet_id}`
pub async fn update_tweet<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(tweet_id): Path<String>,
  Json(body): Json<ContentBody>,
) -> Result<Json<Tweet>, ApiError> {
  let content = require_text("content", body.content)?;
  let tweet = load_owned_tweet(state.store.as_ref(), &tweet_id, actor_id).await?;

  let edited = state
    .store
    .edit_tweet(tweet.tweet_id, content, state.settings.edit_history_limit)
    .await
    .map_err(Error::store)?
    .ok_or_else(|| Error::not_found("tweet", tweet.tweet_id))?;
  Ok(Json(edited))
}

/// `DELETE /tweets/{tweet_id}`
pub async fn remove_tweet<S: PlatformStore>(
  State(state): State<AppState<S>>,
  Actor(actor_id): Actor,
  Path(tweet_id): Path<String>,
) -> Result<StatusCode, ApiError> {
  let tweet = load_owned_tweet(state.store.as_ref(), &tweet_id, actor_id).await?;
  if !state
    .store
    .delete_tweet(tweet.tweet_id)
    .await
    .map_err(Error::store)?
  {
    return Err(Error::not_found("tweet", tweet.tweet_id).into());
  }
  Ok(StatusCode::NO_CONTENT)
}
