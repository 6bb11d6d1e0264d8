//! [`CounterStore`] for [`SqliteStore`].
//!
//! Counters live on the target rows themselves (`videos.likes`,
//! `users.subscriber_count`, ...). Each adjustment is an `UPDATE ...
//! RETURNING`; the stored value is never computed in Rust.

use rusqlite::OptionalExtension as _;
use vidtube_core::{
  membership::{CounterAdjustment, CounterDelta, TargetKind, TargetRef},
  store::CounterStore,
};

use crate::{
  Result,
  encode::{counter_location, decode_count, encode_uuid},
  store::{SqliteStore, to_sql_int},
};

/// Apply `delta` to the counter of `(kind, id_str)` on an open connection or
/// transaction. Returns `None` if the target row does not exist.
///
/// A delta that would go below zero leaves the counter at `0` and reports
/// `underflow`.
pub(crate) fn adjust_counter_in(
  conn: &rusqlite::Connection,
  kind: TargetKind,
  id_str: &str,
  delta: CounterDelta,
) -> rusqlite::Result<Option<CounterAdjustment>> {
  let (table, id_col, counter_col) = counter_location(kind);

  let applied: Option<i64> = conn
    .query_row(
      &format!(
        "UPDATE {table} SET {counter_col} = {counter_col} + ?2
         WHERE {id_col} = ?1 AND {counter_col} + ?2 >= 0
         RETURNING {counter_col}"
      ),
      rusqlite::params![id_str, delta.as_i64()],
      |row| row.get(0),
    )
    .optional()?;
  if let Some(count) = applied {
    return Ok(Some(CounterAdjustment {
      count:     u64::try_from(count).unwrap_or(0),
      underflow: false,
    }));
  }

  // Either the row is missing or the delta would underflow.
  let clamped: Option<i64> = conn
    .query_row(
      &format!("UPDATE {table} SET {counter_col} = 0 WHERE {id_col} = ?1 RETURNING {counter_col}"),
      rusqlite::params![id_str],
      |row| row.get(0),
    )
    .optional()?;

  Ok(clamped.map(|_| CounterAdjustment { count: 0, underflow: true }))
}

impl CounterStore for SqliteStore {
  async fn read_counter(&self, target: TargetRef) -> Result<Option<u64>> {
    let (table, id_col, counter_col) = counter_location(target.kind);
    let id_str = encode_uuid(target.id);

    let value: Option<i64> = self
      .conn
      .call(move |conn| {
        Ok(
          conn
            .query_row(
              &format!("SELECT {counter_col} FROM {table} WHERE {id_col} = ?1"),
              rusqlite::params![id_str],
              |row| row.get(0),
            )
            .optional()?,
        )
      })
      .await?;

    value.map(decode_count).transpose()
  }

  async fn adjust_counter(
    &self,
    target: TargetRef,
    delta: CounterDelta,
  ) -> Result<Option<CounterAdjustment>> {
    let id_str = encode_uuid(target.id);

    let adjustment = self
      .conn
      .call(move |conn| {
        let tx = conn.transaction()?;
        let adjustment = adjust_counter_in(&tx, target.kind, &id_str, delta)?;
        tx.commit()?;
        Ok(adjustment)
      })
      .await?;

    Ok(adjustment)
  }

  async fn set_counter(&self, target: TargetRef, value: u64) -> Result<bool> {
    let (table, id_col, counter_col) = counter_location(target.kind);
    let id_str = encode_uuid(target.id);
    let value = to_sql_int(value);

    let updated = self
      .conn
      .call(move |conn| {
        Ok(conn.execute(
          &format!("UPDATE {table} SET {counter_col} = ?2 WHERE {id_col} = ?1"),
          rusqlite::params![id_str, value],
        )?)
      })
      .await?;

    Ok(updated > 0)
  }

  async fn recompute_counters(&self, kind: TargetKind) -> Result<u64> {
    let (table, id_col, counter_col) = counter_location(kind);
    let kind_str = kind.as_str();

    let repaired = self
      .conn
      .call(move |conn| {
        let edge_count = format!(
          "(SELECT COUNT(*) FROM memberships m
            WHERE m.target_kind = ?1 AND m.target_id = {table}.{id_col})"
        );
        Ok(conn.execute(
          &format!(
            "UPDATE {table} SET {counter_col} = {edge_count}
             WHERE {counter_col} != {edge_count}"
          ),
          rusqlite::params![kind_str],
        )?)
      })
      .await?;

    Ok(repaired as u64)
  }
}
