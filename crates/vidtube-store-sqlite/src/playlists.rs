//! [`PlaylistStore`] for [`SqliteStore`].

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use vidtube_core::{
  entity::{NewPlaylist, Playlist, PlaylistPatch},
  store::PlaylistStore,
};

use crate::{
  Result,
  encode::{PLAYLIST_COLUMNS, RawPlaylist, encode_dt, encode_uuid},
  store::SqliteStore,
};

/// Read one playlist row together with its video ids in position order.
fn load_playlist(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Option<RawPlaylist>> {
  let raw = conn
    .query_row(
      &format!("SELECT {PLAYLIST_COLUMNS} FROM playlists p WHERE p.playlist_id = ?1"),
      rusqlite::params![id_str],
      RawPlaylist::from_row,
    )
    .optional()?;
  let Some(mut raw) = raw else {
    return Ok(None);
  };
  raw.videos = playlist_video_ids(conn, id_str)?;
  Ok(Some(raw))
}

fn playlist_video_ids(
  conn: &rusqlite::Connection,
  id_str: &str,
) -> rusqlite::Result<Vec<String>> {
  let mut stmt = conn.prepare_cached(
    "SELECT video_id FROM playlist_videos WHERE playlist_id = ?1 ORDER BY position",
  )?;
  stmt
    .query_map(rusqlite::params![id_str], |row| row.get(0))?
    .collect()
}

fn touch(conn: &rusqlite::Connection, id_str: &str) -> rusqlite::Result<usize> {
  conn.execute(
    "UPDATE playlists SET updated_at = ?2 WHERE playlist_id = ?1",
    rusqlite::params![id_str, encode_dt(Utc::now())],
  )
}

impl PlaylistStore for SqliteStore {
  async fn insert_playlist(&self, input: NewPlaylist) -> Result<Playlist> {
    let now = Utc::now();
    let playlist = Playlist {
      playlist_id: Uuid::new_v4(),
      owner_id:    input.owner_id,
      name:        input.name,
      description: input.description,
      videos:      Vec::new(),
      created_at:  now,
      updated_at:  now,
    };

    let id_str    = encode_uuid(playlist.playlist_id);
    let owner_str = encode_uuid(playlist.owner_id);
    let name      = playlist.name.clone();
    let desc      = playlist.description.clone();
    let at_str    = encode_dt(now);

    self
      .conn
      .call(move |conn| {
        conn.execute(
          "INSERT INTO playlists (playlist_id, owner_id, name, description, created_at, updated_at)
           VALUES (?1, ?2, ?3, ?4, ?5, ?5)",
          rusqlite::params![id_str, owner_str, name, desc, at_str],
        )?;
        Ok(())
      })
      .await?;

    Ok(playlist)
  }

  async fn get_playlist(&self, id: Uuid) -> Result<Option<Playlist>> {
    let id_str = encode_uuid(id);
    let raw = self
      .conn
      .call(move |conn| Ok(load_playlist(conn, &id_str)?))
      .await?;
    raw.map(RawPlaylist::into_playlist).transpose()
  }

  async fn list_user_playlists(&self, owner_id: Uuid) -> Result<Vec<Playlist>> {
    let owner_str = encode_uuid(owner_id);

    let raws: Vec<RawPlaylist> = self
      .conn
      .call(move |conn| {
        let mut stmt = conn.prepare(&format!(
          "SELECT {PLAYLIST_COLUMNS} FROM playlists p
           WHERE p.owner_id = ?1
           ORDER BY p.created_at DESC, p.rowid DESC"
        ))?;
        let mut raws = stmt
          .query_map(rusqlite::params![owner_str], RawPlaylist::from_row)?
          .collect::<rusqlite::Result<Vec<_>>>()?;
        for raw in &mut raws {
          raw.videos = playlist_video_ids(conn, &raw.playlist_id)?;
        }
        Ok(raws)
      })
      .await?;

    raws.into_iter().map(RawPlaylist::into_playlist).collect()
  }

  async fn update_playlist(&self, id: Uuid, patch: PlaylistPatch) -> Result<Option<Playlist>> {
    let id_str = encode_uuid(id);
    let at_str = encode_dt(Utc::now());

    let raw = self
      .conn
      .call(move |conn| {
        let updated = conn.execute(
          "UPDATE playlists SET
             name        = COALESCE(?2, name),
             description = COALESCE(?3, description),
             updated_at  = ?4
           WHERE playlist_id = ?1",
          rusqlite::params![id_str, patch.name, patch.description, at_str],
        )?;
        if updated == 0 {
          return Ok(None);
        }
        Ok(load_playlist(conn, &id_str)?)
      })
      .await?;

    raw.map(RawPlaylist::into_playlist).transpose()
  }

  async fn delete_playlist(&self, id: Uuid) -> Result<bool> {
    let id_str = encode_uuid(id);

    let deleted = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        tx.execute(
          "DELETE FROM playlist_videos WHERE playlist_id = ?1",
          rusqlite::params![id_str],
        )?;
        let removed = tx.execute(
          "DELETE FROM playlists WHERE playlist_id = ?1",
          rusqlite::params![id_str],
        )?;
        tx.commit()?;
        Ok(removed > 0)
      })
      .await?;

    Ok(deleted)
  }

  async fn add_playlist_video(&self, playlist_id: Uuid, video_id: Uuid) -> Result<Option<Playlist>> {
    let pid_str = encode_uuid(playlist_id);
    let vid_str = encode_uuid(video_id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if touch(&tx, &pid_str)? == 0 {
          return Ok(None);
        }
        // The primary key rejects a second copy of the same video.
        tx.execute(
          "INSERT INTO playlist_videos (playlist_id, video_id, position)
           SELECT ?1, ?2, COALESCE(MAX(position) + 1, 0)
           FROM playlist_videos WHERE playlist_id = ?1",
          rusqlite::params![pid_str, vid_str],
        )?;
        let raw = load_playlist(&tx, &pid_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawPlaylist::into_playlist).transpose()
  }

  async fn remove_playlist_video(
    &self,
    playlist_id: Uuid,
    video_id: Uuid,
  ) -> Result<Option<Playlist>> {
    let pid_str = encode_uuid(playlist_id);
    let vid_str = encode_uuid(video_id);

    let raw = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        if touch(&tx, &pid_str)? == 0 {
          return Ok(None);
        }
        tx.execute(
          "DELETE FROM playlist_videos WHERE playlist_id = ?1 AND video_id = ?2",
          rusqlite::params![pid_str, vid_str],
        )?;
        let raw = load_playlist(&tx, &pid_str)?;
        tx.commit()?;
        Ok(raw)
      })
      .await?;

    raw.map(RawPlaylist::into_playlist).transpose()
  }
}
