//! Verdict policies: who decides whether submitted evidence is accepted.
//!
//! There is no real reviewer yet. The default policy flips a fair coin; a fixed
//! policy exists for demos and tests. Anything implementing `VerdictPolicy` can
//! be plugged into a `MapSurface` without touching the state machine.

use std::sync::Arc;

use rand::Rng;
use serde::Deserialize;

use crate::domain::{Evidence, Verdict};

pub trait VerdictPolicy: Send + Sync {
  fn decide(&self, evidence: &Evidence) -> Verdict;
}

/// Accept or reject with equal probability, ignoring the evidence.
#[derive(Debug, Default)]
pub struct CoinFlip;

impl VerdictPolicy for CoinFlip {
  fn decide(&self, _evidence: &Evidence) -> Verdict {
    if rand::thread_rng().gen_bool(0.5) { Verdict::Accepted } else { Verdict::Rejected }
  }
}

/// Always returns the same verdict.
#[derive(Debug)]
pub struct Fixed(pub Verdict);

impl VerdictPolicy for Fixed {
  fn decide(&self, _evidence: &Evidence) -> Verdict { self.0 }
}

/// Policy selector accepted in the `[review]` config table.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PolicyKind {
  #[default]
  CoinFlip,
  AlwaysAccept,
  AlwaysReject,
}

impl PolicyKind {
  pub fn build(self) -> Arc<dyn VerdictPolicy> {
    match self {
      PolicyKind::CoinFlip => Arc::new(CoinFlip),
      PolicyKind::AlwaysAccept => Arc::new(Fixed(Verdict::Accepted)),
      PolicyKind::AlwaysReject => Arc::new(Fixed(Verdict::Rejected)),
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn coin_flip_yields_both_outcomes() {
    let ev = Evidence::default();
    let draws: Vec<Verdict> = (0..200).map(|_| CoinFlip.decide(&ev)).collect();
    assert!(draws.contains(&Verdict::Accepted));
    assert!(draws.contains(&Verdict::Rejected));
  }

  #[test]
  fn policy_kind_builds_fixed_policies() {
    let ev = Evidence::default();
    assert_eq!(PolicyKind::AlwaysAccept.build().decide(&ev), Verdict::Accepted);
    assert_eq!(PolicyKind::AlwaysReject.build().decide(&ev), Verdict::Rejected);
  }
}
