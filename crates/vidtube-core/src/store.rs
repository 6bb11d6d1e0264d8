//! Storage traits.
//!
//! The traits are implemented by storage backends (e.g.
//! `vidtube-store-sqlite`). Higher layers (`vidtube-api`, the toggle and
//! reconciliation services) depend on these abstractions, not on any concrete
//! backend.
//!
//! All methods return `Send` futures so the traits can be used in
//! multi-threaded async runtimes (e.g. tokio with `axum`).

use std::future::Future;

use uuid::Uuid;

use crate::{
  entity::{
    ChannelStats, Comment, NewComment, NewPlaylist, NewTweet, NewUser,
    NewVideo, Playlist, PlaylistPatch, Tweet, User, Video, VideoPatch,
    WatchedVideo,
  },
  membership::{
    CounterAdjustment, CounterDelta, MembershipEdge, TargetKind, TargetRef,
    ToggleCommit, ToggleWrite,
  },
  page::{Page, PageRequest, VideoQuery},
};

// ─── Errors ──────────────────────────────────────────────────────────────────

/// Classification hooks every backend error must provide so that services
/// can translate failures without knowing the backend.
pub trait StoreError: std::error::Error + Send + Sync + 'static {
  /// A uniqueness constraint rejected the write.
  fn is_conflict(&self) -> bool;

  /// The referenced row does not exist.
  fn is_not_found(&self) -> bool;

  /// Transient failure (busy, locked, timed out, connection gone); the
  /// operation is safe to retry.
  fn is_unavailable(&self) -> bool;
}

/// Shared error type for all storage traits of one backend.
pub trait StoreBackend: Send + Sync {
  type Error: StoreError;
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub trait UserStore: StoreBackend {
  /// Persist a new user. Fails with a conflict if the username or email is
  /// taken.
  fn insert_user(
    &self,
    input: NewUser,
  ) -> impl Future<Output = Result<User, Self::Error>> + Send + '_;

  /// Retrieve a user by id. Returns `None` if not found.
  fn get_user(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<User>, Self::Error>> + Send + '_;

  /// Retrieve several users, preserving the order of `ids`. Missing ids are
  /// skipped.
  fn get_users(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<User>, Self::Error>> + Send + '_;

  /// The user's most recently watched videos, newest first, one entry per
  /// video.
  fn watch_history(
    &self,
    user_id: Uuid,
    limit: u32,
  ) -> impl Future<Output = Result<Vec<WatchedVideo>, Self::Error>> + Send + '_;
}

// ─── Videos ──────────────────────────────────────────────────────────────────

pub trait VideoStore: StoreBackend {
  fn insert_video(
    &self,
    input: NewVideo,
  ) -> impl Future<Output = Result<Video, Self::Error>> + Send + '_;

  fn get_video(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Video>, Self::Error>> + Send + '_;

  /// Retrieve several videos, preserving the order of `ids`.
  fn get_videos(
    &self,
    ids: Vec<Uuid>,
  ) -> impl Future<Output = Result<Vec<Video>, Self::Error>> + Send + '_;

  fn list_videos(
    &self,
    query: VideoQuery,
  ) -> impl Future<Output = Result<Page<Video>, Self::Error>> + Send + '_;

  /// Every video owned by `owner_id`, published or not, newest first.
  fn list_channel_videos(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Video>, Self::Error>> + Send + '_;

  fn update_video(
    &self,
    id: Uuid,
    patch: VideoPatch,
  ) -> impl Future<Output = Result<Option<Video>, Self::Error>> + Send + '_;

  /// Flip `is_published` atomically.
  fn toggle_published(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Video>, Self::Error>> + Send + '_;

  /// Atomically increment `views` and, when `viewer` is set, append a watch
  /// history entry.
  fn record_view(
    &self,
    id: Uuid,
    viewer: Option<Uuid>,
  ) -> impl Future<Output = Result<Option<Video>, Self::Error>> + Send + '_;

  /// Delete a video with its comments, all like edges on either, its watch
  /// history entries and playlist references. Returns `false` if absent.
  fn delete_video(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  fn channel_stats(
    &self,
    channel_id: Uuid,
  ) -> impl Future<Output = Result<ChannelStats, Self::Error>> + Send + '_;
}

// ─── Comments ────────────────────────────────────────────────────────────────

pub trait CommentStore: StoreBackend {
  fn insert_comment(
    &self,
    input: NewComment,
  ) -> impl Future<Output = Result<Comment, Self::Error>> + Send + '_;

  fn get_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Comments on a video, newest first.
  fn list_comments(
    &self,
    video_id: Uuid,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<Comment>, Self::Error>> + Send + '_;

  /// Replace the body, pushing the previous one onto a history bounded by
  /// `history_limit`.
  fn edit_comment(
    &self,
    id: Uuid,
    content: String,
    history_limit: usize,
  ) -> impl Future<Output = Result<Option<Comment>, Self::Error>> + Send + '_;

  /// Delete a comment and its like edges. Returns `false` if absent.
  fn delete_comment(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Tweets ──────────────────────────────────────────────────────────────────

pub trait TweetStore: StoreBackend {
  fn insert_tweet(
    &self,
    input: NewTweet,
  ) -> impl Future<Output = Result<Tweet, Self::Error>> + Send + '_;

  fn get_tweet(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Tweet>, Self::Error>> + Send + '_;

  /// Tweets by `owner_id`, newest first.
  fn list_user_tweets(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Tweet>, Self::Error>> + Send + '_;

  fn edit_tweet(
    &self,
    id: Uuid,
    content: String,
    history_limit: usize,
  ) -> impl Future<Output = Result<Option<Tweet>, Self::Error>> + Send + '_;

  /// Delete a tweet and its like edges. Returns `false` if absent.
  fn delete_tweet(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;
}

// ─── Playlists ───────────────────────────────────────────────────────────────

pub trait PlaylistStore: StoreBackend {
  fn insert_playlist(
    &self,
    input: NewPlaylist,
  ) -> impl Future<Output = Result<Playlist, Self::Error>> + Send + '_;

  fn get_playlist(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<Option<Playlist>, Self::Error>> + Send + '_;

  fn list_user_playlists(
    &self,
    owner_id: Uuid,
  ) -> impl Future<Output = Result<Vec<Playlist>, Self::Error>> + Send + '_;

  fn update_playlist(
    &self,
    id: Uuid,
    patch: PlaylistPatch,
  ) -> impl Future<Output = Result<Option<Playlist>, Self::Error>> + Send + '_;

  fn delete_playlist(
    &self,
    id: Uuid,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Append a video. Fails with a conflict if it is already present.
  fn add_playlist_video(
    &self,
    playlist_id: Uuid,
    video_id: Uuid,
  ) -> impl Future<Output = Result<Option<Playlist>, Self::Error>> + Send + '_;

  /// Remove a video; a no-op if it is not present.
  fn remove_playlist_video(
    &self,
    playlist_id: Uuid,
    video_id: Uuid,
  ) -> impl Future<Output = Result<Option<Playlist>, Self::Error>> + Send + '_;
}

// ─── Membership edges ────────────────────────────────────────────────────────

/// Persistence for membership edges. Uniqueness of
/// `(actor, target, kind)` is enforced by the storage layer, never by a
/// check-then-act sequence in application code.
pub trait MembershipStore: StoreBackend {
  fn find_edge(
    &self,
    actor_id: Uuid,
    target: TargetRef,
  ) -> impl Future<Output = Result<Option<MembershipEdge>, Self::Error>> + Send + '_;

  /// Insert a bare edge without touching counters. Fails with a conflict if
  /// the tuple already exists.
  fn create_edge(
    &self,
    actor_id: Uuid,
    target: TargetRef,
  ) -> impl Future<Output = Result<MembershipEdge, Self::Error>> + Send + '_;

  /// Delete a bare edge without touching counters. Fails with not-found if
  /// absent.
  fn delete_edge(
    &self,
    edge_id: Uuid,
  ) -> impl Future<Output = Result<(), Self::Error>> + Send + '_;

  fn count_edges(
    &self,
    target: TargetRef,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;

  /// Edges pointing at `target`, oldest first.
  fn list_edges_for_target(
    &self,
    target: TargetRef,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<MembershipEdge>, Self::Error>> + Send + '_;

  /// Edges of `kind` created by `actor_id`, newest first.
  fn list_edges_for_actor(
    &self,
    actor_id: Uuid,
    kind: TargetKind,
    page: PageRequest,
  ) -> impl Future<Output = Result<Page<MembershipEdge>, Self::Error>> + Send + '_;

  /// Apply the edge write, its counter delta and any secondary-cache update
  /// as one unit. Conflicts and missing edges leave everything untouched.
  fn commit_toggle(
    &self,
    write: ToggleWrite,
  ) -> impl Future<Output = Result<ToggleCommit, Self::Error>> + Send + '_;

  /// Recompute every user's `subscribed_to` list from channel edges.
  /// Returns the number of users whose cache changed.
  fn rebuild_subscription_cache(
    &self,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Counters ────────────────────────────────────────────────────────────────

/// Atomic access to the denormalised counter on each target.
pub trait CounterStore: StoreBackend {
  /// Current counter value, or `None` if the target does not exist.
  fn read_counter(
    &self,
    target: TargetRef,
  ) -> impl Future<Output = Result<Option<u64>, Self::Error>> + Send + '_;

  /// Apply `delta` in a single storage-level update, clamping at zero.
  /// Returns `None` if the target does not exist.
  fn adjust_counter(
    &self,
    target: TargetRef,
    delta: CounterDelta,
  ) -> impl Future<Output = Result<Option<CounterAdjustment>, Self::Error>> + Send + '_;

  /// Overwrite a counter. Returns `false` if the target does not exist.
  fn set_counter(
    &self,
    target: TargetRef,
    value: u64,
  ) -> impl Future<Output = Result<bool, Self::Error>> + Send + '_;

  /// Recompute every counter of `kind` from the edge set. Returns the number
  /// of targets whose stored value was wrong.
  fn recompute_counters(
    &self,
    kind: TargetKind,
  ) -> impl Future<Output = Result<u64, Self::Error>> + Send + '_;
}

// ─── Everything ──────────────────────────────────────────────────────────────

/// A backend implementing every storage trait.
pub trait PlatformStore:
  UserStore
  + VideoStore
  + CommentStore
  + TweetStore
  + PlaylistStore
  + MembershipStore
  + CounterStore
{
}

impl<T> PlatformStore for T where
  T: UserStore
    + VideoStore
    + CommentStore
    + TweetStore
    + PlaylistStore
    + MembershipStore
    + CounterStore
{
}
