//! Background reconciliation of cached aggregates against the edge set.
//!
//! Counters and `subscribed_to` lists are caches. A request cancelled between
//! writes, or a backend without multi-row transactions, can leave them behind
//! the edges. The sweep recomputes both from the edges, which are the source
//! of truth.

use std::sync::Arc;

use serde::Serialize;

use crate::{
  Error, Result,
  membership::TargetKind,
  store::{CounterStore, MembershipStore},
};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
  /// Targets whose counter disagreed with its edge count.
  pub counters_repaired: u64,
  /// Users whose `subscribed_to` list disagreed with their channel edges.
  pub caches_repaired:   u64,
}

impl SweepReport {
  pub fn is_clean(&self) -> bool {
    self.counters_repaired == 0 && self.caches_repaired == 0
  }
}

pub struct Reconciler<S> {
  store: Arc<S>,
}

impl<S> Reconciler<S>
where
  S: MembershipStore + CounterStore,
{
  pub fn new(store: Arc<S>) -> Self { Self { store } }

  /// Run one full sweep over every target kind.
  pub async fn sweep(&self) -> Result<SweepReport> {
    let mut report = SweepReport::default();

    for kind in TargetKind::ALL {
      let repaired = self
        .store
        .recompute_counters(kind)
        .await
        .map_err(Error::store)?;
      if repaired > 0 {
        tracing::warn!(target_kind = %kind, repaired, "repaired drifted counters");
      }
      report.counters_repaired += repaired;
    }

    report.caches_repaired = self
      .store
      .rebuild_subscription_cache()
      .await
      .map_err(Error::store)?;
    if report.caches_repaired > 0 {
      tracing::warn!(
        repaired = report.caches_repaired,
        "repaired drifted subscription caches"
      );
    }

    if report.is_clean() {
      tracing::debug!("reconciliation sweep found no drift");
    }
    Ok(report)
  }
}
