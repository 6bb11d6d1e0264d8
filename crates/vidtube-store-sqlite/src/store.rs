//! [`SqliteStore`]: the SQLite implementation of the vidtube storage traits.
//!
//! The trait impls live in one module per resource; this module owns the
//! connection, schema initialisation and helpers shared between them.

use std::{collections::HashMap, hash::Hash, path::Path};

use vidtube_core::store::StoreBackend;

use crate::{Result, schema::SCHEMA};

// ─── Store ───────────────────────────────────────────────────────────────────

/// A vidtube store backed by a single SQLite file.
///
/// Cloning is cheap; the inner connection is reference-counted. All calls
/// run one at a time on the connection's dedicated thread, so each
/// `call` closure (and each transaction inside one) is atomic with respect to
/// every other request.
#[derive(Clone)]
pub struct SqliteStore {
  pub(crate) conn: tokio_rusqlite::Connection,
}

impl SqliteStore {
  /// Open (or create) a store at `path` and run schema initialisation.
  pub async fn open(path: impl AsRef<Path>) -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open(path).await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  /// Open an in-memory store, for tests.
  pub async fn open_in_memory() -> Result<Self> {
    let conn = tokio_rusqlite::Connection::open_in_memory().await?;
    let store = Self { conn };
    store.init_schema().await?;
    Ok(store)
  }

  async fn init_schema(&self) -> Result<()> {
    self
      .conn
      .call(|conn| {
        conn.execute_batch(SCHEMA)?;
        Ok(())
      })
      .await?;
    Ok(())
  }
}

impl StoreBackend for SqliteStore {
  type Error = crate::Error;
}

// ─── Shared helpers ──────────────────────────────────────────────────────────

/// `?1, ?2, …, ?n` for an `IN (…)` list.
pub(crate) fn placeholders(n: usize) -> String {
  (1..=n).map(|i| format!("?{i}")).collect::<Vec<_>>().join(", ")
}

/// Reorder `items` to follow `order`, dropping ids with no matching item.
pub(crate) fn in_order<K, T>(order: &[K], items: Vec<T>, key: impl Fn(&T) -> K) -> Vec<T>
where
  K: Eq + Hash,
{
  let mut by_key: HashMap<K, T> = items.into_iter().map(|t| (key(&t), t)).collect();
  order.iter().filter_map(|k| by_key.remove(k)).collect()
}

/// Clamp an unsigned value into SQLite's signed integer range.
pub(crate) fn to_sql_int(n: u64) -> i64 { i64::try_from(n).unwrap_or(i64::MAX) }

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn placeholders_are_numbered() {
    assert_eq!(placeholders(3), "?1, ?2, ?3");
  }

  #[test]
  fn in_order_follows_requested_order_and_skips_missing() {
    let items = vec![(2, "b"), (1, "a")];
    let ordered = in_order(&[1, 3, 2], items, |t| t.0);
    assert_eq!(ordered, vec![(1, "a"), (2, "b")]);
  }
}
