//! [`ToggleService`]: one toggle for likes on videos, comments and tweets and
//! for channel subscriptions.
//!
//! Per `(actor, target)` pair there are two states, member and not-member;
//! `toggle` is the only transition. The find-then-commit sequence is not
//! atomic on its own. The storage-level unique index is the race guard: a
//! duplicate create fails with a conflict, and the retry loop treats the
//! racing edge as one to remove.

use std::sync::Arc;

use uuid::Uuid;

use crate::{
  Error, Result,
  counter::CounterMaintainer,
  id::parse_id,
  membership::{
    TargetKind, TargetRef, ToggleCommit, ToggleOutcome, ToggleState,
    ToggleWrite,
  },
  store::{CounterStore, MembershipStore, StoreError, UserStore},
};

/// Upper bound on find/commit rounds before giving up with a retryable
/// error. Each extra round means another request changed the same edge in
/// between our find and our commit.
pub const MAX_TOGGLE_ATTEMPTS: usize = 4;

pub struct ToggleService<S> {
  store:    Arc<S>,
  counters: CounterMaintainer<S>,
}

impl<S> Clone for ToggleService<S> {
  fn clone(&self) -> Self {
    Self {
      store:    Arc::clone(&self.store),
      counters: self.counters.clone(),
    }
  }
}

impl<S> ToggleService<S>
where
  S: MembershipStore + CounterStore + UserStore,
{
  pub fn new(store: Arc<S>) -> Self {
    let counters = CounterMaintainer::new(Arc::clone(&store));
    Self { store, counters }
  }

  /// Toggle membership from raw identifiers as they arrive on the wire.
  pub async fn toggle(
    &self,
    actor_id: &str,
    target_id: &str,
    kind: TargetKind,
  ) -> Result<ToggleOutcome> {
    let actor_id = parse_id(actor_id, "actor")?;
    let target_id = parse_id(target_id, kind.as_str())?;
    self.toggle_ref(actor_id, TargetRef::new(kind, target_id)).await
  }

  /// Toggle membership of `actor_id` on `target`.
  pub async fn toggle_ref(
    &self,
    actor_id: Uuid,
    target: TargetRef,
  ) -> Result<ToggleOutcome> {
    self.check_preconditions(actor_id, target).await?;

    for attempt in 1..=MAX_TOGGLE_ATTEMPTS {
      let existing = self
        .store
        .find_edge(actor_id, target)
        .await
        .map_err(Error::store)?;

      let (state, write) = match existing {
        Some(edge) => (ToggleState::Removed, ToggleWrite::Remove { edge }),
        None => (ToggleState::Added, ToggleWrite::Add { actor_id, target }),
      };
      let delta = write.delta();

      match self.store.commit_toggle(write).await {
        Ok(ToggleCommit { counter, .. }) => {
          let count = self.counters.observe(target, delta, counter);
          tracing::debug!(
            actor_id = %actor_id,
            target   = %target,
            ?state,
            count,
            attempt,
            "membership toggled"
          );
          return Ok(ToggleOutcome { state, count });
        }
        // A concurrent request inserted the same edge first; the next round
        // finds it and removes it.
        Err(e) if e.is_conflict() => {
          tracing::debug!(actor_id = %actor_id, target = %target, attempt, "toggle create raced");
        }
        // The edge we meant to delete was removed by a concurrent request,
        // or the target or actor went away. Recheck both, then start over
        // from the current state.
        Err(e) if e.is_not_found() => {
          tracing::debug!(actor_id = %actor_id, target = %target, attempt, "toggle delete raced");
          self.check_preconditions(actor_id, target).await?;
        }
        Err(e) => return Err(Error::store(e)),
      }
    }

    tracing::warn!(
      actor_id = %actor_id,
      target   = %target,
      "toggle gave up after {MAX_TOGGLE_ATTEMPTS} contended attempts"
    );
    Err(Error::StorageUnavailable(format!(
      "toggle on {target} contended {MAX_TOGGLE_ATTEMPTS} times"
    )))
  }

  /// Whether `actor_id` currently holds an edge on `target`.
  pub async fn is_member(&self, actor_id: Uuid, target: TargetRef) -> Result<bool> {
    Ok(
      self
        .store
        .find_edge(actor_id, target)
        .await
        .map_err(Error::store)?
        .is_some(),
    )
  }

  async fn check_preconditions(&self, actor_id: Uuid, target: TargetRef) -> Result<()> {
    // Existence of the target doubles as a read of its counter.
    self.counters.current(target).await?;

    if target.kind == TargetKind::Channel && target.id == actor_id {
      return Err(Error::invalid("a user cannot subscribe to their own channel"));
    }
    self
      .store
      .get_user(actor_id)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found("user", actor_id))?;
    Ok(())
  }
}
