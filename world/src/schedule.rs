//! One-shot timers driven by the simulation clock.

use std::{collections::BTreeMap, time::Duration};

/// Ordered set of callbacks waiting for a point in simulated time.
///
/// Entries due at the same instant fire in scheduling order, which keeps
/// every peer's timer resolution identical for identical inputs.
#[derive(Debug)]
pub(crate) struct Schedule<T> {
    now: Duration,
    next_sequence: u64,
    entries: BTreeMap<(Duration, u64), T>,
}

impl<T> Schedule<T> {
    pub(crate) fn new() -> Self {
        Self {
            now: Duration::ZERO,
            next_sequence: 0,
            entries: BTreeMap::new(),
        }
    }

    pub(crate) fn now(&self) -> Duration {
        self.now
    }

    /// Schedules `item` to fire once `delay` has elapsed.
    pub(crate) fn after(&mut self, delay: Duration, item: T) {
        let due = self.now.saturating_add(delay);
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);
        let _ = self.entries.insert((due, sequence), item);
    }

    /// Advances the clock and drains every entry that became due.
    pub(crate) fn advance(&mut self, dt: Duration) -> Vec<T> {
        self.now = self.now.saturating_add(dt);
        let mut due = Vec::new();
        while let Some(entry) = self.entries.first_entry() {
            if entry.key().0 > self.now {
                break;
            }
            due.push(entry.remove());
        }
        due
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
