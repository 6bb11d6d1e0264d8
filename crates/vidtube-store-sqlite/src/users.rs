//! [`UserStore`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use vidtube_core::{
  entity::{NewUser, User, WatchedVideo},
  store::UserStore,
};

use crate::{
  Result,
  encode::{RawUser, RawVideo, USER_COLUMNS, VIDEO_COLUMNS, decode_dt, encode_dt, encode_uuid},
  store::{SqliteStore, in_order, placeholders},
};

impl UserStore for SqliteStore {
  async fn insert_user(&self, input: NewUser) -> Result<User> {
    let now = Utc::now();
    let user = User {
      user_id:          Uuid::new_v4(),
      username:         input.username,
      email:            input.email,
      full_name:        input.full_name,
      avatar_url:       input.avatar_url,
      cover_image_url:  input.cover_image_url,
      subscriber_count: 0,
      subscribed_to:    Vec::new(),
      created_at:       now,
      updated_at:       now,
    };

    let id_str        = encode_uuid(user.user_id);
    let username      = user.username.clone();
    let email         = user.email.clone();
    let full_name     = user.full_name.clone();
    let avatar_url    = user.avatar_url.clone();
    let cover_url     = user.cover_image_url.clone();
    let password_hash = input.password_hash;
    let at_str        = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO users (
             user_id, username, email, full_name, avatar_url,
             cover_image_url, password_hash, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            id_str,
            username,
            email,
            full_name,
            avatar_url,
            cover_url,
            password_hash,
            at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(user)
  }

  async fn get_user(&self, id: Uuid) -> Result<Option<User>> {
    let id_str = encode_uuid(id);

    let raw: Option<RawUser> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {USER_COLUMNS} FROM users u WHERE u.user_id = ?1"),
              rusqlite::params![id_str],
              RawUser::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawUser::into_user).transpose()
  }

  async fn get_users(&self, ids: Vec<Uuid>) -> Result<Vec<User>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawUser> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {USER_COLUMNS} FROM users u WHERE u.user_id IN ({})",
          placeholders(id_strs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), RawUser::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let users = raws
      .into_iter()
      .map(RawUser::into_user)
      .collect::<Result<Vec<_>>>()?;
    Ok(in_order(&ids, users, |u| u.user_id))
  }

  async fn watch_history(&self, user_id: Uuid, limit: u32) -> Result<Vec<WatchedVideo>> {
    let id_str = encode_uuid(user_id);

    let raws: Vec<(RawVideo, String)> = self
      .conn
      .call(move |conn| {
        // One row per video, keyed on its latest watch.
        let mut stmt = conn.prepare(&format!(
          "SELECT {VIDEO_COLUMNS}, MAX(w.watched_at) AS last_watched
           FROM watch_history w
           JOIN videos v ON v.video_id = w.video_id
           WHERE w.user_id = ?1
           GROUP BY v.video_id
           ORDER BY last_watched DESC, MAX(w.entry_id) DESC
           LIMIT ?2"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![id_str, limit], |row| {
            Ok((RawVideo::from_row(row)?, row.get(12)?))
          })?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws
      .into_iter()
      .map(|(raw, watched_at)| {
        Ok(WatchedVideo {
          video:      raw.into_video()?,
          watched_at: decode_dt(&watched_at)?,
        })
      })
      .collect()
  }
}
