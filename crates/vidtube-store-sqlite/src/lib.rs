//! SQLite backend for the vidtube platform store.
//!
//! Wraps [`tokio_rusqlite`] so all database access runs on a dedicated thread
//! without blocking the async runtime.

mod counters;
mod encode;
mod membership;
mod playlists;
mod posts;
mod schema;
mod store;
mod users;
mod videos;

pub mod error;

pub use error::{Error, Result};
pub use store::SqliteStore;
