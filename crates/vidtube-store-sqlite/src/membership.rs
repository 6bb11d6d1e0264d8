//! [`MembershipStore`] for [`SqliteStore`].
//!
//! `commit_toggle` is the only path that writes an edge together with its
//! counter. The edge insert or delete, the counter adjustment and, for channel
//! edges, the subscriber's `subscribed_to` cache all happen in one
//! transaction. A unique-constraint failure on insert aborts the transaction
//! and surfaces as a conflict.

use chrono::Utc;
use rusqlite::OptionalExtension as _;
use uuid::Uuid;
use vidtube_core::{
  membership::{
    CounterAdjustment, MembershipEdge, TargetKind, TargetRef, ToggleCommit, ToggleWrite,
  },
  page::{Page, PageRequest},
  store::MembershipStore,
};

use crate::{
  Error, Result,
  counters::adjust_counter_in,
  encode::{EDGE_COLUMNS, RawEdge, decode_count, encode_dt, encode_target_kind, encode_uuid},
  error::other,
  store::{SqliteStore, to_sql_int},
};

/// Outcome of the transactional part of a toggle commit.
enum Applied {
  Done(CounterAdjustment),
  EdgeMissing,
  TargetMissing,
}

fn insert_edge(conn: &rusqlite::Connection, edge: &MembershipEdge) -> rusqlite::Result<()> {
  conn.execute(
    "INSERT INTO memberships (edge_id, actor_id, target_kind, target_id, created_at)
     VALUES (?1, ?2, ?3, ?4, ?5)",
    rusqlite::params![
      encode_uuid(edge.edge_id),
      encode_uuid(edge.actor_id),
      encode_target_kind(edge.target.kind),
      encode_uuid(edge.target.id),
      encode_dt(edge.created_at),
    ],
  )?;
  Ok(())
}

/// Rewrite one user's `subscribed_to` list from their channel edges, oldest
/// subscription first. Returns whether the stored value changed.
fn refresh_subscribed_to(
  conn: &rusqlite::Connection,
  actor_str: &str,
) -> tokio_rusqlite::Result<bool> {
  let mut stmt = conn.prepare_cached(
    "SELECT target_id FROM memberships
     WHERE actor_id = ?1 AND target_kind = 'channel'
     ORDER BY created_at, rowid",
  )?;
  let channels = stmt
    .query_map(rusqlite::params![actor_str], |row| row.get::<_, String>(0))?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  let json = serde_json::to_string(&channels).map_err(other)?;

  let changed = conn.execute(
    "UPDATE users SET subscribed_to = ?2 WHERE user_id = ?1 AND subscribed_to IS NOT ?2",
    rusqlite::params![actor_str, json],
  )?;
  Ok(changed > 0)
}

fn edge_page(
  conn: &rusqlite::Connection,
  filter: &str,
  order: &str,
  key: &str,
  kind_str: &str,
  page: PageRequest,
) -> rusqlite::Result<(i64, Vec<RawEdge>)> {
  let total: i64 = conn.query_row(
    &format!("SELECT COUNT(*) FROM memberships m WHERE {filter}"),
    rusqlite::params![key, kind_str],
    |row| row.get(0),
  )?;
  let mut stmt = conn.prepare(&format!(
    "SELECT {EDGE_COLUMNS} FROM memberships m
     WHERE {filter}
     ORDER BY m.created_at {order}, m.rowid {order}
     LIMIT ?3 OFFSET ?4"
  ))?;
  let rows = stmt
    .query_map(
      rusqlite::params![key, kind_str, i64::from(page.limit), to_sql_int(page.offset())],
      RawEdge::from_row,
    )?
    .collect::<rusqlite::Result<Vec<_>>>()?;
  Ok((total, rows))
}

fn into_edge_page(
  (total, raws): (i64, Vec<RawEdge>),
  page: PageRequest,
) -> Result<Page<MembershipEdge>> {
  let edges = raws
    .into_iter()
    .map(RawEdge::into_edge)
    .collect::<Result<Vec<_>>>()?;
  Ok(Page::new(edges, page, decode_count(total)?))
}

impl MembershipStore for SqliteStore {
  async fn find_edge(&self, actor_id: Uuid, target: TargetRef) -> Result<Option<MembershipEdge>> {
    let actor_str  = encode_uuid(actor_id);
    let kind_str   = encode_target_kind(target.kind);
    let target_str = encode_uuid(target.id);

    let raw: Option<RawEdge> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!(
                "SELECT {EDGE_COLUMNS} FROM memberships m
                 WHERE m.actor_id = ?1 AND m.target_kind = ?2 AND m.target_id = ?3"
              ),
              rusqlite::params![actor_str, kind_str, target_str],
              RawEdge::from_row,
            )
            .optional()?,
        )
      })
      .await?;

    raw.map(RawEdge::into_edge).transpose()
  }

  async fn create_edge(&self, actor_id: Uuid, target: TargetRef) -> Result<MembershipEdge> {
    let edge = MembershipEdge {
      edge_id: Uuid::new_v4(),
      actor_id,
      target,
      created_at: Utc::now(),
    };

    let row = edge.clone();
    self
      .conn
      .call(move |conn| {
        insert_edge(conn, &row)?;
        Ok(())
      })
      .await?;

    Ok(edge)
  }

  async fn delete_edge(&self, edge_id: Uuid) -> Result<()> {
    let id_str = encode_uuid(edge_id);

    let removed = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          "DELETE FROM memberships WHERE edge_id = ?1",
          rusqlite::params![id_str],
        )?)
      })
      .await?;

    if removed == 0 {
      return Err(Error::EdgeNotFound(edge_id));
    }
    Ok(())
  }

  async fn count_edges(&self, target: TargetRef) -> Result<u64> {
    let kind_str   = encode_target_kind(target.kind);
    let target_str = encode_uuid(target.id);

    let n: i64 = self
      .conn
      .call(move |conn| {
        Ok(conn.query_row(
          "SELECT COUNT(*) FROM memberships WHERE target_kind = ?1 AND target_id = ?2",
          rusqlite::params![kind_str, target_str],
          |row| row.get(0),
        )?)
      })
      .await?;

    decode_count(n)
  }

  async fn list_edges_for_target(
    &self,
    target: TargetRef,
    page: PageRequest,
  ) -> Result<Page<MembershipEdge>> {
    let kind_str   = encode_target_kind(target.kind);
    let target_str = encode_uuid(target.id);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(edge_page(
          conn,
          "m.target_id = ?1 AND m.target_kind = ?2",
          "ASC",
          &target_str,
          kind_str,
          page,
        )?)
      })
      .await?;

    into_edge_page(rows, page)
  }

  async fn list_edges_for_actor(
    &self,
    actor_id: Uuid,
    kind: TargetKind,
    page: PageRequest,
  ) -> Result<Page<MembershipEdge>> {
    let actor_str = encode_uuid(actor_id);
    let kind_str  = encode_target_kind(kind);

    let rows = self
      .conn
      .call(move |conn| {
        Ok(edge_page(
          conn,
          "m.actor_id = ?1 AND m.target_kind = ?2",
          "DESC",
          &actor_str,
          kind_str,
          page,
        )?)
      })
      .await?;

    into_edge_page(rows, page)
  }

  async fn commit_toggle(&self, write: ToggleWrite) -> Result<ToggleCommit> {
    let target = write.target();
    let delta  = write.delta();
    let edge = match write {
      ToggleWrite::Add { actor_id, target } => MembershipEdge {
        edge_id: Uuid::new_v4(),
        actor_id,
        target,
        created_at: Utc::now(),
      },
      ToggleWrite::Remove { edge } => edge,
    };
    let adding = delta.as_i64() > 0;

    let row = edge.clone();
    let applied = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let target_str = encode_uuid(row.target.id);

        if adding {
          insert_edge(&tx, &row)?;
        } else {
          let removed = tx.execute(
            "DELETE FROM memberships WHERE edge_id = ?1",
            rusqlite::params![encode_uuid(row.edge_id)],
          )?;
          if removed == 0 {
            return Ok(Applied::EdgeMissing);
          }
        }

        let Some(adjustment) = adjust_counter_in(&tx, row.target.kind, &target_str, delta)? else {
          return Ok(Applied::TargetMissing);
        };

        if row.target.kind == TargetKind::Channel {
          refresh_subscribed_to(&tx, &encode_uuid(row.actor_id))?;
        }

        tx.commit()?;
        Ok(Applied::Done(adjustment))
      })
      .await?;

    match applied {
      Applied::Done(counter) => Ok(ToggleCommit { edge, counter }),
      Applied::EdgeMissing => Err(Error::EdgeNotFound(edge.edge_id)),
      Applied::TargetMissing => Err(Error::TargetNotFound(target)),
    }
  }

  async fn rebuild_subscription_cache(&self) -> Result<u64> {
    let changed = self
      .conn
      .call(|conn| {
        let tx = conn.transaction()?;
        let user_ids = {
          let mut stmt = tx.prepare("SELECT user_id FROM users")?;
          stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?
        };
        let mut changed = 0_u64;
        for user_id in &user_ids {
          if refresh_subscribed_to(&tx, user_id)? {
            changed += 1;
          }
        }
        tx.commit()?;
        Ok(changed)
      })
      .await?;

    Ok(changed)
  }
}
