//! Platform entities: users (channels), videos, comments, tweets, playlists.
//!
//! Counters on these types (`likes`, `subscriber_count`) are cached
//! aggregates of membership edges. They are written only through
//! [`CounterMaintainer`](crate::counter::CounterMaintainer) and the toggle
//! commit path, never by the `*Patch` inputs below.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{Error, Result};

// ─── Users / channels ────────────────────────────────────────────────────────

/// A registered user. Every user is also a channel others may subscribe to.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
  pub user_id:          Uuid,
  /// Always lowercase; unique.
  pub username:         String,
  pub email:            String,
  pub full_name:        String,
  pub avatar_url:       String,
  pub cover_image_url:  Option<String>,
  pub subscriber_count: u64,
  /// Channels this user subscribes to. Secondary cache of the edge set.
  pub subscribed_to:    Vec<Uuid>,
  pub created_at:       DateTime<Utc>,
  pub updated_at:       DateTime<Utc>,
}

/// Input to [`crate::store::UserStore::insert_user`].
/// The password arrives already hashed; plain text never reaches the store.
#[derive(Debug, Clone)]
pub struct NewUser {
  pub username:        String,
  pub email:           String,
  pub full_name:       String,
  pub avatar_url:      String,
  pub cover_image_url: Option<String>,
  pub password_hash:   String,
}

/// A user as seen on their channel page.
#[derive(Debug, Clone, Serialize)]
pub struct ChannelProfile {
  #[serde(flatten)]
  pub user:                User,
  pub subscribed_to_count: usize,
  /// Whether the requesting actor subscribes to this channel.
  pub is_subscribed:       bool,
}

/// Aggregates shown on a channel dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelStats {
  pub total_videos:      u64,
  pub total_views:       u64,
  pub total_subscribers: u64,
  pub total_likes:       u64,
}

// ─── Videos ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Video {
  pub video_id:      Uuid,
  pub owner_id:      Uuid,
  pub title:         String,
  pub description:   String,
  /// Opaque URL on the external asset host.
  pub video_url:     String,
  pub thumbnail_url: String,
  pub duration_secs: f64,
  pub views:         u64,
  pub likes:         u64,
  pub is_published:  bool,
  pub created_at:    DateTime<Utc>,
  pub updated_at:    DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
  pub owner_id:      Uuid,
  pub title:         String,
  pub description:   String,
  pub video_url:     String,
  pub thumbnail_url: String,
  pub duration_secs: f64,
}

/// Partial update of a video's descriptive fields.
#[derive(Debug, Clone, Default)]
pub struct VideoPatch {
  pub title:         Option<String>,
  pub description:   Option<String>,
  pub thumbnail_url: Option<String>,
}

impl VideoPatch {
  pub fn is_empty(&self) -> bool {
    self.title.is_none()
      && self.description.is_none()
      && self.thumbnail_url.is_none()
  }
}

/// A video from the actor's watch history.
#[derive(Debug, Clone, Serialize)]
pub struct WatchedVideo {
  pub video:      Video,
  pub watched_at: DateTime<Utc>,
}

// ─── Comments and tweets ─────────────────────────────────────────────────────

/// A previous body of an edited comment or tweet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Revision {
  pub content:     String,
  pub replaced_at: DateTime<Utc>,
}

impl Revision {
  /// Append `content` to `history`, keeping only the newest `limit` entries.
  /// A limit of zero disables history.
  pub fn push_bounded(
    history: &mut Vec<Revision>,
    content: String,
    replaced_at: DateTime<Utc>,
    limit: usize,
  ) {
    if limit == 0 {
      history.clear();
      return;
    }
    history.push(Revision { content, replaced_at });
    if history.len() > limit {
      let excess = history.len() - limit;
      history.drain(..excess);
    }
  }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
  pub comment_id: Uuid,
  pub video_id:   Uuid,
  pub owner_id:   Uuid,
  pub content:    String,
  pub likes:      u64,
  pub history:    Vec<Revision>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewComment {
  pub video_id: Uuid,
  pub owner_id: Uuid,
  pub content:  String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tweet {
  pub tweet_id:   Uuid,
  pub owner_id:   Uuid,
  pub content:    String,
  pub likes:      u64,
  pub history:    Vec<Revision>,
  pub created_at: DateTime<Utc>,
  pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewTweet {
  pub owner_id: Uuid,
  pub content:  String,
}

// ─── Playlists ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Playlist {
  pub playlist_id: Uuid,
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: String,
  /// Ordered, duplicate-free.
  pub videos:      Vec<Uuid>,
  pub created_at:  DateTime<Utc>,
  pub updated_at:  DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPlaylist {
  pub owner_id:    Uuid,
  pub name:        String,
  pub description: String,
}

#[derive(Debug, Clone, Default)]
pub struct PlaylistPatch {
  pub name:        Option<String>,
  pub description: Option<String>,
}

/// A playlist with its videos resolved, in playlist order.
#[derive(Debug, Clone, Serialize)]
pub struct PlaylistDetail {
  #[serde(flatten)]
  pub playlist: Playlist,
  pub entries:  Vec<Video>,
}

// ─── Ownership ───────────────────────────────────────────────────────────────

/// Fail with [`Error::Forbidden`] unless `actor_id` owns the resource.
pub fn ensure_owner(actor_id: Uuid, owner_id: Uuid, what: &str) -> Result<()> {
  if actor_id == owner_id {
    Ok(())
  } else {
    Err(Error::Forbidden(format!("only the owner may modify this {what}")))
  }
}

/// Trim `value` and reject it if blank.
pub fn require_text(field: &str, value: Option<String>) -> Result<String> {
  match value.map(|v| v.trim().to_owned()) {
    Some(v) if !v.is_empty() => Ok(v),
    _ => Err(Error::invalid(format!("{field} is required"))),
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn revisions(n: usize) -> Vec<Revision> {
    (0..n)
      .map(|i| Revision { content: format!("v{i}"), replaced_at: Utc::now() })
      .collect()
  }

  #[test]
  fn push_bounded_drops_oldest() {
    let mut history = revisions(3);
    Revision::push_bounded(&mut history, "v3".into(), Utc::now(), 3);
    let bodies: Vec<_> = history.iter().map(|r| r.content.as_str()).collect();
    assert_eq!(bodies, ["v1", "v2", "v3"]);
  }

  #[test]
  fn push_bounded_zero_limit_disables_history() {
    let mut history = revisions(2);
    Revision::push_bounded(&mut history, "v2".into(), Utc::now(), 0);
    assert!(history.is_empty());
  }

  #[test]
  fn require_text_trims_and_rejects_blank() {
    assert_eq!(require_text("name", Some("  x ".into())).unwrap(), "x");
    assert!(require_text("name", Some("   ".into())).is_err());
    assert!(require_text("name", None).is_err());
  }

  #[test]
  fn ensure_owner_rejects_other_actor() {
    let owner = Uuid::new_v4();
    assert!(ensure_owner(owner, owner, "video").is_ok());
    assert!(matches!(
      ensure_owner(Uuid::new_v4(), owner, "video"),
      Err(Error::Forbidden(_))
    ));
  }
}
