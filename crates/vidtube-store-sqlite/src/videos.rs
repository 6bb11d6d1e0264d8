//! [`VideoStore`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use vidtube_core::{
  entity::{ChannelStats, NewVideo, Video, VideoPatch},
  page::{Page, SortOrder, VideoQuery, VideoSort},
  store::VideoStore,
};

use crate::{
  Result,
  encode::{RawVideo, VIDEO_COLUMNS, decode_count, encode_dt, encode_uuid, like_pattern},
  store::{SqliteStore, in_order, placeholders, to_sql_int},
};

fn select_video(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawVideo>> {
  conn
    .query_row(
      &format!("SELECT {VIDEO_COLUMNS} FROM videos v WHERE v.video_id = ?1"),
      rusqlite::params![id_str],
      RawVideo::from_row,
    )
    .optional()
}

fn sort_column(sort: VideoSort) -> &'static str {
  match sort {
    VideoSort::CreatedAt => "v.created_at",
    VideoSort::Views => "v.views",
    VideoSort::Likes => "v.likes",
    VideoSort::Duration => "v.duration_secs",
    VideoSort::Title => "v.title COLLATE NOCASE",
  }
}

fn sort_direction(order: SortOrder) -> &'static str {
  match order {
    SortOrder::Asc => "ASC",
    SortOrder::Desc => "DESC",
  }
}

impl VideoStore for SqliteStore {
  async fn insert_video(&self, input: NewVideo) -> Result<Video> {
    let now = Utc::now();
    let video = Video {
      video_id:      Uuid::new_v4(),
      owner_id:      input.owner_id,
      title:         input.title,
      description:   input.description,
      video_url:     input.video_url,
      thumbnail_url: input.thumbnail_url,
      duration_secs: input.duration_secs,
      views:         0,
      likes:         0,
      is_published:  true,
      created_at:    now,
      updated_at:    now,
    };

    let id_str    = encode_uuid(video.video_id);
    let owner_str = encode_uuid(video.owner_id);
    let title     = video.title.clone();
    let desc      = video.description.clone();
    let video_url = video.video_url.clone();
    let thumb_url = video.thumbnail_url.clone();
    let duration  = video.duration_secs;
    let at_str    = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO videos (
             video_id, owner_id, title, description, video_url,
             thumbnail_url, duration_secs, created_at, updated_at
           ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)",
          rusqlite::params![
            id_str, owner_str, title, desc, video_url, thumb_url, duration, at_str,
          ],
        )?;
        Ok(())
      })
      .await?;

    Ok(video)
  }

  async fn get_video(&self, id: Uuid) -> Result<Option<Video>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(select_video(conn, &id_str)?))
      .await?;
    raw.map(RawVideo::into_video).transpose()
  }

  async fn get_videos(&self, ids: Vec<Uuid>) -> Result<Vec<Video>> {
    if ids.is_empty() {
      return Ok(Vec::new());
    }
    let id_strs: Vec<String> = ids.iter().copied().map(encode_uuid).collect();

    let raws: Vec<RawVideo> = self
      .conn
      .call(move |conn| {
        let sql = format!(
          "SELECT {VIDEO_COLUMNS} FROM videos v WHERE v.video_id IN ({})",
          placeholders(id_strs.len())
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
          .query_map(rusqlite::params_from_iter(id_strs.iter()), RawVideo::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    let videos = raws
      .into_iter()
      .map(RawVideo::into_video)
      .collect::<Result<Vec<_>>>()?;
    Ok(in_order(&ids, videos, |v| v.video_id))
  }

  async fn list_videos(&self, query: VideoQuery) -> Result<Page<Video>> {
    let text_pattern = query
      .text
      .as_deref()
      .map(str::trim)
      .filter(|t| !t.is_empty())
      .map(like_pattern);
    let owner_str  = query.owner_id.map(encode_uuid);
    let published  = query.published_only;
    let limit_val  = i64::from(query.page.limit);
    let offset_val = to_sql_int(query.page.offset());
    let order_by   = format!(
      "{} {}, v.rowid {}",
      sort_column(query.sort),
      sort_direction(query.order),
      sort_direction(query.order),
    );

    let (total, raws): (i64, Vec<RawVideo>) = self
      .conn
      .call(move |conn| {
        // Every filter is always bound; a NULL parameter disables its clause.
        let filter = "(?1 IS NULL OR v.title LIKE ?1 ESCAPE '\\' OR v.description LIKE ?1 ESCAPE '\\')
           AND (?2 IS NULL OR v.owner_id = ?2)
           AND (?3 = 0 OR v.is_published = 1)";

        let total: i64 = conn.query_row(
          &format!("SELECT COUNT(*) FROM videos v WHERE {filter}"),
          rusqlite::params![text_pattern.as_deref(), owner_str.as_deref(), published],
          |row| row.get(0),
        )?;

        let mut stmt = conn.prepare(&format!(
          "SELECT {VIDEO_COLUMNS} FROM videos v
           WHERE {filter}
           ORDER BY {order_by}
           LIMIT ?4 OFFSET ?5"
        ))?;
        let rows = stmt
          .query_map(
            rusqlite::params![
              text_pattern.as_deref(),
              owner_str.as_deref(),
              published,
              limit_val,
              offset_val,
            ],
            RawVideo::from_row,
          )?
          .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok((total, rows))
      })
      .await?;

    let videos = raws
      .into_iter()
      .map(RawVideo::into_video)
      .collect::<Result<Vec<_>>>()?;
    Ok(Page::new(videos, query.page, decode_count(total)?))
  }

  async fn list_channel_videos(&self, owner_id: Uuid) -> Result<Vec<Video>> {
    let owner_str = encode_uuid(owner_id);

    let raws: Vec<RawVideo> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {VIDEO_COLUMNS} FROM videos v
           WHERE v.owner_id = ?1
           ORDER BY v.created_at DESC, v.rowid DESC"
        ))?;
        let rows = stmt
          .query_map(rusqlite::params![owner_str], RawVideo::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(rows)
      })
      .await?;

    raws.into_iter().map(RawVideo::into_video).collect()
  }

  async fn update_video(&self, id: Uuid, patch: VideoPatch) -> Result<Option<Video>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE videos SET
             title         = COALESCE(?2, title),
             description   = COALESCE(?3, description),
             thumbnail_url = COALESCE(?4, thumbnail_url),
             updated_at    = ?5
           WHERE video_id = ?1",
          rusqlite::params![id_str, patch.title, patch.description, patch.thumbnail_url, at_str],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        Ok(select_video(conn, &id_str)?)
      })
      .await?;

    raw.map(RawVideo::into_video).transpose()
  }

  async fn toggle_published(&self, id: Uuid) -> Result<Option<Video>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE videos SET is_published = NOT is_published, updated_at = ?2
           WHERE video_id = ?1",
          rusqlite::params![id_str, at_str],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        Ok(select_video(conn, &id_str)?)
      })
      .await?;

    raw.map(RawVideo::into_video).transpose()
  }

  async fn record_view(&self, id: Uuid, viewer: Option<Uuid>) -> Result<Option<Video>> {
    let id_str     = encode_uuid(id);
    let viewer_str = viewer.map(encode_uuid);
    let at_str     = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let updated = tx.execute(
          "UPDATE videos SET views = views + 1 WHERE video_id = ?1",
          rusqlite::params![id_str],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        if let Some(viewer) = viewer_str {
          // Unknown viewers are counted but leave no history.
          tx.execute(
            "INSERT INTO watch_history (user_id, video_id, watched_at)
             SELECT ?1, ?2, ?3 WHERE EXISTS (SELECT 1 FROM users WHERE user_id = ?1)",
            rusqlite::params![viewer, id_str, at_str],
          )?;
        }
        let raw = select_video(&tx, &id_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawVideo::into_video).transpose()
  }

  async fn delete_video(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM memberships
           WHERE target_kind = 'comment'
             AND target_id IN (SELECT comment_id FROM comments WHERE video_id = ?1)",
          rusqlite::params![id_str],
        )?;
        tx.execute("DELETE FROM comments WHERE video_id = ?1", rusqlite::params![id_str])?;
        tx.execute(
          "DELETE FROM memberships WHERE target_kind = 'video' AND target_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.execute("DELETE FROM watch_history WHERE video_id = ?1", rusqlite::params![id_str])?;
        tx.execute("DELETE FROM playlist_videos WHERE video_id = ?1", rusqlite::params![id_str])?;
        let removed = tx.execute("DELETE FROM videos WHERE video_id = ?1", rusqlite::params![id_str])?;
        tx.commit()?;
        Ok(removed > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn channel_stats(&self, channel_id: Uuid) -> Result<ChannelStats> {
    let id_str = encode_uuid(channel_id);

    let (videos, views, subscribers, likes): (i64, i64, i64, i64) = self
      .conn
      .call(move |conn| {
        let (videos, views) = conn.query_row(
          "SELECT COUNT(*), COALESCE(SUM(views), 0) FROM videos WHERE owner_id = ?1",
          rusqlite::params![id_str],
          |row| Ok((row.get(0)?, row.get(1)?)),
        )?;
        let subscribers = conn.query_row(
          "SELECT COUNT(*) FROM memberships
           WHERE target_kind = 'channel' AND target_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        let likes = conn.query_row(
          "SELECT COUNT(*) FROM memberships m
           JOIN videos v ON m.target_kind = 'video' AND m.target_id = v.video_id
           WHERE v.owner_id = ?1",
          rusqlite::params![id_str],
          |row| row.get(0),
        )?;
        Ok((videos, views, subscribers, likes))
      })
      .await?;

    Ok(ChannelStats {
      total_videos:      decode_count(videos)?,
      total_views:       decode_count(views)?,
      total_subscribers: decode_count(subscribers)?,
      total_likes:       decode_count(likes)?,
    })
  }
}
