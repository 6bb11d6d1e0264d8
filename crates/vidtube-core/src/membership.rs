//! Membership edges, as in "user X likes video Y", "user X subscribes to channel Z".
//!
//! An edge exists at most once per `(actor, target, kind)`. Each target owns a
//! denormalised counter that must equal the number of edges referencing it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ─── Targets ─────────────────────────────────────────────────────────────────

/// The kind of entity an edge points at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetKind {
  Video,
  Comment,
  Tweet,
  Channel,
}

impl TargetKind {
  pub const ALL: [TargetKind; 4] = [
    TargetKind::Video,
    TargetKind::Comment,
    TargetKind::Tweet,
    TargetKind::Channel,
  ];

  pub fn as_str(self) -> &'static str {
    match self {
      Self::Video => "video",
      Self::Comment => "comment",
      Self::Tweet => "tweet",
      Self::Channel => "channel",
    }
  }
}

impl fmt::Display for TargetKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// A typed reference to a countable target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TargetRef {
  pub kind: TargetKind,
  pub id:   Uuid,
}

impl TargetRef {
  pub fn new(kind: TargetKind, id: Uuid) -> Self { Self { kind, id } }
}

impl fmt::Display for TargetRef {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} {}", self.kind, self.id)
  }
}

// ─── Edges ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MembershipEdge {
  pub edge_id:    Uuid,
  pub actor_id:   Uuid,
  pub target:     TargetRef,
  pub created_at: DateTime<Utc>,
}

// ─── Counter deltas ──────────────────────────────────────────────────────────

/// The only two adjustments a counter ever receives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CounterDelta {
  Increment,
  Decrement,
}

impl CounterDelta {
  pub fn as_i64(self) -> i64 {
    match self {
      Self::Increment => 1,
      Self::Decrement => -1,
    }
  }
}

/// Result of an atomic counter adjustment at the storage layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterAdjustment {
  /// The stored value after the adjustment; never negative.
  pub count:     u64,
  /// `true` if the delta would have taken the counter below zero and the
  /// store clamped it instead.
  pub underflow: bool,
}

// ─── Toggle commits ──────────────────────────────────────────────────────────

/// One edge write plus its counter delta, committed as a unit by
/// [`MembershipStore::commit_toggle`](crate::store::MembershipStore::commit_toggle).
#[derive(Debug, Clone)]
pub enum ToggleWrite {
  /// Insert a new edge and increment the target's counter. Fails with a
  /// conflict if the edge already exists.
  Add { actor_id: Uuid, target: TargetRef },
  /// Delete this edge and decrement the counter. Fails with not-found if the
  /// edge is already gone.
  Remove { edge: MembershipEdge },
}

impl ToggleWrite {
  pub fn target(&self) -> TargetRef {
    match self {
      Self::Add { target, .. } => *target,
      Self::Remove { edge } => edge.target,
    }
  }

  pub fn delta(&self) -> CounterDelta {
    match self {
      Self::Add { .. } => CounterDelta::Increment,
      Self::Remove { .. } => CounterDelta::Decrement,
    }
  }
}

#[derive(Debug, Clone)]
pub struct ToggleCommit {
  /// The edge that was inserted or deleted.
  pub edge:    MembershipEdge,
  pub counter: CounterAdjustment,
}

// ─── Toggle outcome ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleState {
  Added,
  Removed,
}

/// What the toggle endpoints return: `{"state": "added", "count": 3}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToggleOutcome {
  pub state: ToggleState,
  pub count: u64,
}
