//! JSON REST API for vidtube.
//!
//! Exposes an axum [`Router`] backed by any [`PlatformStore`]. Identity,
//! TLS and transport concerns are the caller's responsibility: the actor is
//! whatever upstream put in the `x-actor-id` header.
//!
//! # Mounting
//!
//! ```rust,ignore
//! let app = vidtube_api::api_router(AppState::new(store, ApiSettings::default()));
//! ```

pub mod actor;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod health;
pub mod params;
pub mod password;
pub mod playlists;
pub mod posts;
pub mod toggles;
pub mod users;
pub mod videos;

use std::sync::Arc;

use axum::{
  Router,
  routing::{get, patch, post},
};
use vidtube_core::{store::PlatformStore, toggle::ToggleService};

pub use error::ApiError;

// ─── Settings ────────────────────────────────────────────────────────────────

/// Knobs the handlers need from the server configuration.
#[derive(Debug, Clone)]
pub struct ApiSettings {
  /// Previous bodies kept per comment or tweet. `0` disables history.
  pub edit_history_limit: usize,
}

impl Default for ApiSettings {
  fn default() -> Self { Self { edit_history_limit: 10 } }
}

// ─── Application state ───────────────────────────────────────────────────────

/// Shared state threaded through all axum handlers.
pub struct AppState<S> {
  pub store:    Arc<S>,
  pub toggles:  ToggleService<S>,
  pub settings: Arc<ApiSettings>,
}

impl<S> Clone for AppState<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      toggles:  self.toggles.clone(),
      settings: Arc::clone(&self.settings),
    }
  }
}

impl<S: PlatformStore> AppState<S> {
  pub fn new(store: Arc<S>, settings: ApiSettings) -> Self {
    Self {
      toggles: ToggleService::new(Arc::clone(&store)),
      store,
      settings: Arc::new(settings),
    }
  }
}

// ─── Router ──────────────────────────────────────────────────────────────────

/// Build a fully-materialised API router for `state`.
///
/// The returned `Router<()>` can be nested into any parent router regardless
/// of its own state type.
pub fn api_router<S>(state: AppState<S>) -> Router<()>
where
  S: PlatformStore + 'static,
{
  Router::new()
    .route("/healthcheck", get(health::handler))
    // Users and channels
    .route("/users", post(users::register::<S>))
    .route("/users/me/history", get(users::watch_history::<S>))
    .route("/users/me/subscriptions", get(users::subscriptions::<S>))
    .route("/users/me/liked-videos", get(users::liked_videos::<S>))
    .route("/users/{user_id}", get(users::get_one::<S>))
    .route("/users/{user_id}/tweets", get(posts::list_tweets::<S>))
    .route("/users/{user_id}/playlists", get(playlists::list_for_user::<S>))
    .route("/channels/{channel_id}", get(users::channel_profile::<S>))
    .route("/channels/{channel_id}/subscribers", get(users::subscribers::<S>))
    .route("/channels/{channel_id}/subscribe", post(toggles::subscribe::<S>))
    .route("/channels/{channel_id}/stats", get(dashboard::stats::<S>))
    .route("/channels/{channel_id}/videos", get(dashboard::videos::<S>))
    // Videos
    .route("/videos", get(videos::list::<S>).post(videos::create::<S>))
    .route(
      "/videos/{video_id}",
      get(videos::get_one::<S>)
        .patch(videos::update::<S>)
        .delete(videos::remove::<S>),
    )
    .route("/videos/{video_id}/publish", patch(videos::toggle_publish::<S>))
    .route("/videos/{video_id}/like", post(toggles::like_video::<S>))
    .route(
      "/videos/{video_id}/comments",
      get(posts::list_comments::<S>).post(posts::create_comment::<S>),
    )
    // Comments and tweets
    .route(
      "/comments/{comment_id}",
      patch(posts::update_comment::<S>).delete(posts::remove_comment::<S>),
    )
    .route("/comments/{comment_id}/like", post(toggles::like_comment::<S>))
    .route("/tweets", post(posts::create_tweet::<S>))
    .route(
      "/tweets/{tweet_id}",
      patch(posts::update_tweet::<S>).delete(posts::remove_tweet::<S>),
    )
    .route("/tweets/{tweet_id}/like", post(toggles::like_tweet::<S>))
    // Playlists
    .route("/playlists", post(playlists::create::<S>))
    .route(
      "/playlists/{playlist_id}",
      get(playlists::get_one::<S>)
        .patch(playlists::update::<S>)
        .delete(playlists::remove::<S>),
    )
    .route(
      "/playlists/{playlist_id}/videos/{video_id}",
      post(playlists::add_video::<S>).delete(playlists::remove_video::<S>),
    )
    .with_state(state)
}

#[cfg(test)]
mod tests;
