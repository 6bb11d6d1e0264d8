//! [`CommentStore`] and [`TweetStore`] for [`SqliteStore`].
//!
//! Both carry a bounded edit history stored as JSON next to the body. An
//! edit reads the row, pushes the old body and writes both back inside one
//! transaction.

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use vidtube_core::{
  entity::{Comment, NewComment, NewTweet, Revision, Tweet},
  page::{Page, PageRequest},
  store::{CommentStore, TweetStore},
};

use crate::{
  Result,
  encode::{
    COMMENT_COLUMNS, RawComment, RawTweet, TWEET_COLUMNS, decode_count, encode_dt,
    encode_history, encode_uuid,
  },
  error::other,
  store::{SqliteStore, to_sql_int},
};

fn select_comment(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawComment>> {
  conn
    .query_row(
      &format!("SELECT {COMMENT_COLUMNS} FROM comments c WHERE c.comment_id = ?1"),
      rusqlite::params![id_str],
      RawComment::from_row,
    )
    .optional()
}

fn select_tweet(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawTweet>> {
  conn
    .query_row(
      &format!("SELECT {TWEET_COLUMNS} FROM tweets t WHERE t.tweet_id = ?1"),
      rusqlite::params![id_str],
      RawTweet::from_row,
    )
    .optional()
}

/// Push `(previous body, now)` onto the stored history and write the new
/// body. `table` and `id_col` come from this module only.
fn apply_edit(
  conn: &rusqlite::Connection,
  table: &str,
  id_col: &str,
  id_str: &str,
  content: String,
  history_limit: usize,
) -> tokio_rusqlite::Result<bool> {
  let current: Option<(String, String)> = conn
    .query_row(
      &format!("SELECT content, history FROM {table} WHERE {id_col} = ?1"),
      rusqlite::params![id_str],
      |row| Ok((row.get(0)?, row.get(1)?)),
    )
    .optional()?;
  let Some((previous, history_json)) = current else {
    return Ok(false);
  };

  let now = Utc::now();
  let mut history: Vec<Revision> = serde_json::from_str(&history_json).map_err(other)?;
  Revision::push_bounded(&mut history, previous, now, history_limit);
  let history_json = encode_history(&history).map_err(other)?;

  conn.execute(
    &format!(
      "UPDATE {table} SET content = ?2, history = ?3, updated_at = ?4 WHERE {id_col} = ?1"
    ),
    rusqlite::params![id_str, content, history_json, encode_dt(now)],
  )?;
  Ok(true)
}

// ─── Comments ────────────────────────────────────────────────────────────────

impl CommentStore for SqliteStore {
  async fn insert_comment(&self, input: NewComment) -> Result<Comment> {
    let now = Utc::now();
    let comment = Comment {
      comment_id: Uuid::new_v4(),
      video_id:   input.video_id,
      owner_id:   input.owner_id,
      content:    input.content,
      likes:      0,
      history:    Vec::new(),
      created_at: now,
      updated_at: now,
    };

    let id_str    = encode_uuid(comment.comment_id);
    let video_str = encode_uuid(comment.video_id);
    let owner_str = encode_uuid(comment.owner_id);
    let content   = comment.content.clone();
    let at_str    = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO comments (comment_id, video_id, owner_id, content, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, video_str, owner_str, content, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(comment)
  }

  async fn get_comment(&self, id: Uuid) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_comment(conn, &id_str)?))
      .await?;
    raw.map(RawComment::into_comment).transpose()
  }

  async fn list_comments(&self, video_id: Uuid, page: PageRequest) -> Result<Page<Comment>> {
    let video_str  = encode_uuid(video_id);
    let limit_val  = i64::from(page.limit);
    let offset_val = to_sql_int(page.offset());

    let (total, raws): (i64, Vec<RawComment>) = self
      .conn
      .call(move |conn| {
        let total: i64 = conn.query_row(
          "SELECT COUNT(*) FROM comments WHERE video_id = ?1",
          rusqlite::params![video_str],
          |row| row.get(0),
        )?;
        let mut stmt = conn.prepare(&format!(
          "SELECT {COMMENT_COLUMNS} FROM comments c
           WHERE c.video_id = ?1
           ORDER BY c.created_at DESC, c.rowid DESC
           LIMIT ?2 OFFSET ?3"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![video_str, limit_val, offset_val], RawComment::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok((total, rows))
      })
      .await?;

    let comments = raws
      .into_iter()
      .map(RawComment::into_comment)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(comments, page, decode_count(total)?))
  }

  async fn edit_comment(
    &self,
    id: Uuid,
    content: String,
    history_limit: usize,
  ) -> Result<Option<Comment>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !apply_edit(&tx, "comments", "comment_id", &id_str, content, history_limit)? {
          return Ok(None);
        }
        let raw = select_comment(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawComment::into_comment).transpose()
  }

  async fn delete_comment(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM memberships WHERE target_kind = 'comment' AND target_id = ?1",
          rusqlite::params![id_str],
        )?;
        let removed =
          tx.execute("DELETE FROM comments WHERE comment_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(removed > 0)
      })
      .await?;

    Ok(deleted)
  }
}

// ─── Tweets ──────────────────────────────────────────────────────────────────

impl TweetStore for SqliteStore {
  async fn insert_tweet(&self, input: NewTweet) -> Result<Tweet> {
    let now = Utc::now();
    let tweet = Tweet {
      tweet_id:   Uuid::new_v4(),
      owner_id:   input.owner_id,
      content:    input.content,
      likes:      0,
      history:    Vec::new(),
      created_at: now,
      updated_at: now,
    };

    let id_str    = encode_uuid(tweet.tweet_id);
    let owner_str = encode_uuid(tweet.owner_id);
    let content   = tweet.content.clone();
    let at_str    = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO tweets (tweet_id, owner_id, content, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?4)",
          rusqlite::params![id_str, owner_str, content, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(tweet)
  }

  async fn get_tweet(&self, id: Uuid) -> Result<Option<Tweet>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_tweet(conn, &id_str)?))
      .await?;
    raw.map(RawTweet::into_tweet).transpose()
  }

  async fn list_user_tweets(&self, owner_id: Uuid) -> Result<Vec<Tweet>> {
    let owner_str = encode_uuid(owner_id);

    let raws: Vec<RawTweet> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {TWEET_COLUMNS} FROM tweets t
           WHERE t.owner_id = ?1
           ORDER BY t.created_at DESC, t.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawTweet::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawTweet::into_tweet).collect()
  }

  async fn edit_tweet(
    &self,
    id: Uuid,
    content: String,
    history_limit: usize,
  ) -> Result<Option<Tweet>> {
    let id_str = encode_uuid(id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if !apply_edit(&tx, "tweets", "tweet_id", &id_str, content, history_limit)? {
          return Ok(None);
        }
        let raw = select_tweet(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawTweet::into_tweet).transpose()
  }

  async fn delete_tweet(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM memberships WHERE target_kind = 'tweet' AND target_id = ?1",
          rusqlite::params![id_str],
        )?;
        let removed =
          tx.execute("DELETE FROM tweets WHERE tweet_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(removed > 0)
      })
      .await?;

    Ok(deleted)
  }
}
