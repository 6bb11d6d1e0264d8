//! Core types and trait definitions for the vidtube platform.
//!
//! This crate is deliberately free of HTTP and database dependencies.
//! Storage backends implement the traits in [`store`]; the HTTP layer drives
//! the services in [`toggle`], [`counter`] and [`reconcile`].

// We intentionally use native `async fn` in traits (stabilised in Rust 1.75).
// Suppress the advisory lint about `Send` bounds on the returned futures.
#![allow(async_fn_in_trait)]

pub mod counter;
pub mod entity;
pub mod error;
pub mod id;
pub mod membership;
pub mod page;
pub mod reconcile;
pub mod store;
pub mod toggle;

pub use error::{Error, ErrorKind, Result};
