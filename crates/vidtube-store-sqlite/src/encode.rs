//! Encoding and decoding helpers between Rust domain types and the plain-text
//! representations stored in SQLite columns.
//!
//! All timestamps are stored as fixed-width RFC 3339 UTC strings so that
//! lexical order is chronological. Lists (`subscribed_to`, edit history) are
//! stored as compact JSON. UUIDs are stored as hyphenated lowercase strings.

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::Row;
use uuid::Uuid;
use vidtube_core::{
  entity::{Comment, Playlist, Revision, Tweet, User, Video},
  membership::{MembershipEdge, TargetKind, TargetRef},
};

use crate::{Error, Result};

// ─── Scalars ─────────────────────────────────────────────────────────────────

pub fn encode_uuid(id: Uuid) -> String { id.hyphenated().to_string() }

pub fn decode_uuid(s: &str) -> Result<Uuid> { Ok(Uuid::parse_str(s)?) }

pub fn encode_dt(dt: DateTime<Utc>) -> String {
  dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub fn decode_dt(s: &str) -> Result<DateTime<Utc>> {
  DateTime::parse_from_rfc3339(s)
    .map(|dt| dt.with_timezone(&Utc))
    .map_err(|e| Error::DateParse(e.to_string()))
}

pub fn decode_count(n: i64) -> Result<u64> {
  u64::try_from(n).map_err(|_| Error::Decode(format!("negative counter: {n}")))
}

pub fn encode_target_kind(k: TargetKind) -> &'static str { k.as_str() }

pub fn decode_target_kind(s: &str) -> Result<TargetKind> {
  match s {
    "video" => Ok(TargetKind::Video),
    "comment" => Ok(TargetKind::Comment),
    "tweet" => Ok(TargetKind::Tweet),
    "channel" => Ok(TargetKind::Channel),
    other => Err(Error::Decode(format!("unknown target kind: {other:?}"))),
  }
}

/// `(table, id column, counter column)` holding the counter for `kind`.
pub fn counter_location(kind: TargetKind) -> (&'static str, &'static str, &'static str) {
  match kind {
    TargetKind::Video => ("videos", "video_id", "likes"),
    TargetKind::Comment => ("comments", "comment_id", "likes"),
    TargetKind::Tweet => ("tweets", "tweet_id", "likes"),
    TargetKind::Channel => ("users", "user_id", "subscriber_count"),
  }
}

/// Escape `%`, `_` and `\` so user text matches literally inside a
/// `LIKE ... ESCAPE '\'` pattern.
pub fn like_pattern(text: &str) -> String {
  let mut out = String::with_capacity(text.len() + 2);
  out.push('%');
  for c in text.chars() {
    if matches!(c, '%' | '_' | '\\') {
      out.push('\\');
    }
    out.push(c);
  }
  out.push('%');
  out
}

// ─── Users ───────────────────────────────────────────────────────────────────

pub const USER_COLUMNS: &str = "u.user_id, u.username, u.email, u.full_name, \
   u.avatar_url, u.cover_image_url, u.subscriber_count, u.subscribed_to, \
   u.created_at, u.updated_at";

/// Raw strings read directly from a `users` row.
pub struct RawUser {
  pub user_id:          String,
  pub username:         String,
  pub email:            String,
  pub full_name:        String,
  pub avatar_url:       String,
  pub cover_image_url:  Option<String>,
  pub subscriber_count: i64,
  pub subscribed_to:    String,
  pub created_at:       String,
  pub updated_at:       String,
}

impl RawUser {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      user_id:          row.get(0)?,
      username:         row.get(1)?,
      email:            row.get(2)?,
      full_name:        row.get(3)?,
      avatar_url:       row.get(4)?,
      cover_image_url:  row.get(5)?,
      subscriber_count: row.get(6)?,
      subscribed_to:    row.get(7)?,
      created_at:       row.get(8)?,
      updated_at:       row.get(9)?,
    })
  }

  pub fn into_user(self) -> Result<User> {
    Ok(User {
      user_id:          decode_uuid(&self.user_id)?,
      username:         self.username,
      email:            self.email,
      full_name:        self.full_name,
      avatar_url:       self.avatar_url,
      cover_image_url:  self.cover_image_url,
      subscriber_count: decode_count(self.subscriber_count)?,
      subscribed_to:    serde_json::from_str(&self.subscribed_to)?,
      created_at:       decode_dt(&self.created_at)?,
      updated_at:       decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Videos ──────────────────────────────────────────────────────────────────

pub const VIDEO_COLUMNS: &str = "v.video_id, v.owner_id, v.title, \
   v.description, v.video_url, v.thumbnail_url, v.duration_secs, v.views, \
   v.likes, v.is_published, v.created_at, v.updated_at";

pub struct RawVideo {
  pub video_id:      String,
  pub owner_id:      String,
  pub title:         String,
  pub description:   String,
  pub video_url:     String,
  pub thumbnail_url: String,
  pub duration_secs: f64,
  pub views:         i64,
  pub likes:         i64,
  pub is_published:  bool,
  pub created_at:    String,
  pub updated_at:    String,
}

impl RawVideo {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      video_id:      row.get(0)?,
      owner_id:      row.get(1)?,
      title:         row.get(2)?,
      description:   row.get(3)?,
      video_url:     row.get(4)?,
      thumbnail_url: row.get(5)?,
      duration_secs: row.get(6)?,
      views:         row.get(7)?,
      likes:         row.get(8)?,
      is_published:  row.get(9)?,
      created_at:    row.get(10)?,
      updated_at:    row.get(11)?,
    })
  }

  pub fn into_video(self) -> Result<Video> {
    Ok(Video {
      video_id:      decode_uuid(&self.video_id)?,
      owner_id:      decode_uuid(&self.owner_id)?,
      title:         self.title,
      description:   self.description,
      video_url:     self.video_url,
      thumbnail_url: self.thumbnail_url,
      duration_secs: self.duration_secs,
      views:         decode_count(self.views)?,
      likes:         decode_count(self.likes)?,
      is_published:  self.is_published,
      created_at:    decode_dt(&self.created_at)?,
      updated_at:    decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Comments and tweets ─────────────────────────────────────────────────────

pub const COMMENT_COLUMNS: &str = "c.comment_id, c.video_id, c.owner_id, \
   c.content, c.likes, c.history, c.created_at, c.updated_at";

pub struct RawComment {
  pub comment_id: String,
  pub video_id:   String,
  pub owner_id:   String,
  pub content:    String,
  pub likes:      i64,
  pub history:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawComment {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      comment_id: row.get(0)?,
      video_id:   row.get(1)?,
      owner_id:   row.get(2)?,
      content:    row.get(3)?,
      likes:      row.get(4)?,
      history:    row.get(5)?,
      created_at: row.get(6)?,
      updated_at: row.get(7)?,
    })
  }

  pub fn into_comment(self) -> Result<Comment> {
    Ok(Comment {
      comment_id: decode_uuid(&self.comment_id)?,
      video_id:   decode_uuid(&self.video_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      content:    self.content,
      likes:      decode_count(self.likes)?,
      history:    decode_history(&self.history)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub const TWEET_COLUMNS: &str =
  "t.tweet_id, t.owner_id, t.content, t.likes, t.history, t.created_at, t.updated_at";

pub struct RawTweet {
  pub tweet_id:   String,
  pub owner_id:   String,
  pub content:    String,
  pub likes:      i64,
  pub history:    String,
  pub created_at: String,
  pub updated_at: String,
}

impl RawTweet {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      tweet_id:   row.get(0)?,
      owner_id:   row.get(1)?,
      content:    row.get(2)?,
      likes:      row.get(3)?,
      history:    row.get(4)?,
      created_at: row.get(5)?,
      updated_at: row.get(6)?,
    })
  }

  pub fn into_tweet(self) -> Result<Tweet> {
    Ok(Tweet {
      tweet_id:   decode_uuid(&self.tweet_id)?,
      owner_id:   decode_uuid(&self.owner_id)?,
      content:    self.content,
      likes:      decode_count(self.likes)?,
      history:    decode_history(&self.history)?,
      created_at: decode_dt(&self.created_at)?,
      updated_at: decode_dt(&self.updated_at)?,
    })
  }
}

pub fn encode_history(history: &[Revision]) -> serde_json::Result<String> {
  serde_json::to_string(history)
}

pub fn decode_history(s: &str) -> Result<Vec<Revision>> {
  Ok(serde_json::from_str(s)?)
}

// ─── Playlists ───────────────────────────────────────────────────────────────

pub const PLAYLIST_COLUMNS: &str =
  "p.playlist_id, p.owner_id, p.name, p.description, p.created_at, p.updated_at";

/// A `playlists` row plus its video ids in position order.
pub struct RawPlaylist {
  pub playlist_id: String,
  pub owner_id:    String,
  pub name:        String,
  pub description: String,
  pub created_at:  String,
  pub updated_at:  String,
  pub videos:      Vec<String>,
}

impl RawPlaylist {
  /// Read the row; `videos` is filled in separately.
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      playlist_id: row.get(0)?,
      owner_id:    row.get(1)?,
      name:        row.get(2)?,
      description: row.get(3)?,
      created_at:  row.get(4)?,
      updated_at:  row.get(5)?,
      videos:      Vec::new(),
    })
  }

  pub fn into_playlist(self) -> Result<Playlist> {
    Ok(Playlist {
      playlist_id: decode_uuid(&self.playlist_id)?,
      owner_id:    decode_uuid(&self.owner_id)?,
      name:        self.name,
      description: self.description,
      videos:      self
        .videos
        .iter()
        .map(|v| decode_uuid(v))
        .collect::<Result<_>>()?,
      created_at:  decode_dt(&self.created_at)?,
      updated_at:  decode_dt(&self.updated_at)?,
    })
  }
}

// ─── Membership edges ────────────────────────────────────────────────────────

pub const EDGE_COLUMNS: &str =
  "m.edge_id, m.actor_id, m.target_kind, m.target_id, m.created_at";

pub struct RawEdge {
  pub edge_id:     String,
  pub actor_id:    String,
  pub target_kind: String,
  pub target_id:   String,
  pub created_at:  String,
}

impl RawEdge {
  pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
    Ok(Self {
      edge_id:     row.get(0)?,
      actor_id:    row.get(1)?,
      target_kind: row.get(2)?,
      target_id:   row.get(3)?,
      created_at:  row.get(4)?,
    })
  }

  pub fn into_edge(self) -> Result<MembershipEdge> {
    Ok(MembershipEdge {
      edge_id:    decode_uuid(&self.edge_id)?,
      actor_id:   decode_uuid(&self.actor_id)?,
      target:     TargetRef::new(
        decode_target_kind(&self.target_kind)?,
        decode_uuid(&self.target_id)?,
      ),
      created_at: decode_dt(&self.created_at)?,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn like_pattern_escapes_wildcards() {
    assert_eq!(like_pattern("50%_off\\"), "%50\\%\\_off\\\\%");
  }

  #[test]
  fn timestamps_sort_lexically() {
    let a = DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z")
      .unwrap()
      .with_timezone(&Utc);
    let b = a + chrono::Duration::microseconds(1);
    assert!(encode_dt(a) < encode_dt(b));
    assert_eq!(decode_dt(&encode_dt(b)).unwrap(), b);
  }

  #[test]
  fn target_kind_strings_match_serde_names() {
    for kind in TargetKind::ALL {
      let json = serde_json::to_string(&kind).unwrap();
      assert_eq!(json.trim_matches('"'), encode_target_kind(kind));
      assert_eq!(decode_target_kind(encode_target_kind(kind)).unwrap(), kind);
    }
  }
}
