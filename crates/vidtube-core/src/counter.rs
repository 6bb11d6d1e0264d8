//! [`CounterMaintainer`], the only writer of target counters outside the
//! toggle commit path.

use std::sync::Arc;

use crate::{
  Error, Result,
  membership::{CounterAdjustment, CounterDelta, TargetRef},
  store::CounterStore,
};

/// Keeps each target's counter consistent with its edge count.
///
/// The counter never goes negative. A decrement that would underflow is an
/// invariant violation (an edge was removed without a matching create); it is
/// logged, the counter stays at zero and the caller still succeeds.
pub struct CounterMaintainer<S> {
  store: Arc<S>,
}

impl<S> Clone for CounterMaintainer<S> {
  fn clone(&self) -> Self { Self { store: Arc::clone(&self.store) } }
}

impl<S: CounterStore> CounterMaintainer<S> {
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Apply `delta` atomically and return the new count.
  pub async fn increment(
    &self,
    target: TargetRef,
    delta: CounterDelta,
  ) -> Result<u64> {
    let adjustment = self
      .store
      .adjust_counter(target, delta)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(target.kind.as_str(), target.id))?;
    Ok(self.observe(target, delta, adjustment))
  }

  /// Current value, or [`Error::NotFound`] if the target is absent.
  pub async fn current(&self, target: TargetRef) -> Result<u64> {
    self
      .store
      .read_counter(target)
      .await
      .map_err(Error::store)?
      .ok_or_else(|| Error::not_found(target.kind.as_str(), target.id))
  }

  /// Apply the underflow policy to an adjustment made by the store.
  pub fn observe(
    &self,
    target: TargetRef,
    delta: CounterDelta,
    adjustment: CounterAdjustment,
  ) -> u64 {
    if adjustment.underflow {
      tracing::warn!(
        violation   = "invariant_violation",
        target_kind = %target.kind,
        target_id   = %target.id,
        delta       = delta.as_i64(),
        "counter decrement below zero; clamped to 0"
      );
      return 0;
    }
    adjustment.count
  }
}
