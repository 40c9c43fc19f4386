#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Reward spawner: decides whether a destroyed destructible leaves a
//! power-up behind and which kind it is.

use blastgrid_core::{Command, Event, RewardKind, RewardWeights};
use rand::Rng;
use thiserror::Error;

const WEIGHT_TOLERANCE: f64 = 1e-6;

/// Reasons a reward table is refused.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum RewardTableError {
    /// The table lists no kinds at all.
    #[error("reward table is empty")]
    Empty,
    /// A kind carries a negative or non-finite weight.
    #[error("reward {kind:?} has invalid weight {weight}")]
    InvalidWeight {
        /// Offending kind.
        kind: RewardKind,
        /// Offending weight.
        weight: f64,
    },
    /// The weights do not add up to one.
    #[error("reward weights sum to {sum}, expected 1")]
    Unbalanced {
        /// Actual sum of the weights.
        sum: f64,
    },
}

/// Ordered `(kind, weight)` pairs walked by weighted selection.
#[derive(Clone, Debug, PartialEq)]
pub struct RewardTable {
    entries: Vec<(RewardKind, f64)>,
    fallback: RewardKind,
}

impl RewardTable {
    /// Validates and builds a table. Order of `entries` is preserved.
    pub fn new(
        entries: impl IntoIterator<Item = (RewardKind, f64)>,
    ) -> Result<Self, RewardTableError> {
        let entries: Vec<_> = entries.into_iter().collect();
        let Some(&(fallback, _)) = entries.last() else {
            return Err(RewardTableError::Empty);
        };
        if let Some(&(kind, weight)) = entries
            .iter()
            .find(|(_, weight)| !weight.is_finite() || *weight < 0.0)
        {
            return Err(RewardTableError::InvalidWeight { kind, weight });
        }
        let sum: f64 = entries.iter().map(|(_, weight)| weight).sum();
        if (sum - 1.0).abs() > WEIGHT_TOLERANCE {
            return Err(RewardTableError::Unbalanced { sum });
        }
        Ok(Self { entries, fallback })
    }

    /// Builds the table from configured weights.
    pub fn from_weights(weights: &RewardWeights) -> Result<Self, RewardTableError> {
        Self::new(weights.entries())
    }

    /// Entries in selection order.
    #[must_use]
    pub fn entries(&self) -> &[(RewardKind, f64)] {
        &self.entries
    }

    /// Picks the kind for a uniform draw in `[0, 1)`.
    ///
    /// Each weight is subtracted from the draw in order; the first kind
    /// that drives it negative wins. Rounding leftovers land on the last
    /// kind.
    #[must_use]
    pub fn choose(&self, draw: f64) -> RewardKind {
        let mut remaining = draw;
        for &(kind, weight) in &self.entries {
            remaining -= weight;
            if remaining < 0.0 {
                return kind;
            }
        }
        self.fallback
    }
}

/// Pure system turning completed destructions into reward placements.
#[derive(Debug)]
pub struct RewardSpawner<R> {
    probability: f64,
    table: RewardTable,
    rng: R,
}

impl<R: Rng> RewardSpawner<R> {
    /// Creates a spawner drawing from `rng`.
    pub fn new(probability: f64, table: RewardTable, rng: R) -> Self {
        Self {
            probability,
            table,
            rng,
        }
    }

    /// Reacts to destroyed destructibles.
    ///
    /// Destructibles whose policy suppresses rewards never consume a draw.
    /// Eligible ones draw once for the spawn decision and, when it
    /// succeeds, once more for the kind.
    pub fn handle(&mut self, events: &[Event], out: &mut Vec<Command>) {
        for event in events {
            let Event::DestructibleDestroyed { tile, policy } = event else {
                continue;
            };
            if !policy.reward_eligible {
                continue;
            }
            if self.rng.gen::<f64>() >= self.probability {
                continue;
            }
            let kind = self.table.choose(self.rng.gen::<f64>());
            out.push(Command::SpawnReward { tile: *tile, kind });
        }
    }

    /// Table used for kind selection.
    #[must_use]
    pub fn table(&self) -> &RewardTable {
        &self.table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_table() -> RewardTable {
        RewardTable::from_weights(&RewardWeights::default()).expect("defaults are valid")
    }

    #[test]
    fn draw_walks_cumulative_weights() {
        let table = default_table();
        assert_eq!(table.choose(0.0), RewardKind::ExtraBomb);
        assert_eq!(table.choose(0.49), RewardKind::ExtraBomb);
        assert_eq!(table.choose(0.5), RewardKind::SpeedBoost);
        assert_eq!(table.choose(0.74), RewardKind::SpeedBoost);
        assert_eq!(table.choose(0.75), RewardKind::ExtraRange);
        assert_eq!(table.choose(0.999), RewardKind::ExtraRange);
    }

    #[test]
    fn leftovers_fall_back_to_last_kind() {
        assert_eq!(default_table().choose(1.0), RewardKind::ExtraRange);
    }

    #[test]
    fn zero_weight_kinds_are_never_chosen() {
        let table = RewardTable::new([
            (RewardKind::ExtraBomb, 0.0),
            (RewardKind::SpeedBoost, 1.0),
            (RewardKind::ExtraRange, 0.0),
        ])
        .expect("valid");
        assert_eq!(table.choose(0.0), RewardKind::SpeedBoost);
        assert_eq!(table.choose(0.999), RewardKind::SpeedBoost);
    }

    #[test]
    fn invalid_tables_are_refused() {
        assert_eq!(RewardTable::new([]), Err(RewardTableError::Empty));
        assert_eq!(
            RewardTable::new([(RewardKind::ExtraBomb, -0.5), (RewardKind::SpeedBoost, 1.5)]),
            Err(RewardTableError::InvalidWeight {
                kind: RewardKind::ExtraBomb,
                weight: -0.5
            })
        );
        assert!(matches!(
            RewardTable::new([(RewardKind::ExtraBomb, 0.5), (RewardKind::SpeedBoost, 0.4)]),
            Err(RewardTableError::Unbalanced { .. })
        ));
    }
}
