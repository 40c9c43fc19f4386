#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-topic monotonic sequence filtering for an unordered transport.
//!
//! Receivers run every inbound message through a [`SequenceGate`]; senders
//! stamp outbound messages with a [`SequenceCounter`]. Ties and regressions
//! are dropped silently, which discards duplicated and replayed traffic.
//! Lost messages are never recovered: periodic full-state broadcasts make
//! the next accepted message supersede anything that went missing.

use std::collections::HashMap;

/// Receiver-side filter remembering the last accepted sequence per topic.
#[derive(Clone, Debug, Default)]
pub struct SequenceGate {
    last_applied: HashMap<String, u64>,
}

impl SequenceGate {
    /// Creates a gate that has not seen any topic yet.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Decides whether a message should be applied.
    ///
    /// The first message on a topic is always accepted and seeds the
    /// counter. Afterwards only strictly greater sequences are accepted.
    /// The stored counter changes only when the message is accepted.
    pub fn should_accept(&mut self, topic: &str, sequence: u64) -> bool {
        match self.last_applied.get_mut(topic) {
            Some(last) if sequence <= *last => false,
            Some(last) => {
                *last = sequence;
                true
            }
            None => {
                let _ = self.last_applied.insert(topic.to_owned(), sequence);
                true
            }
        }
    }

    /// Last sequence accepted on `topic`.
    #[must_use]
    pub fn last_applied(&self, topic: &str) -> Option<u64> {
        self.last_applied.get(topic).copied()
    }

    /// Forgets every topic.
    pub fn reset(&mut self) {
        self.last_applied.clear();
    }
}

/// Sender-side counters handing out increasing sequences per topic.
#[derive(Clone, Debug, Default)]
pub struct SequenceCounter {
    next: HashMap<String, u64>,
}

impl SequenceCounter {
    /// Creates counters that start every topic at 1.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the next sequence for `topic`, starting at 1.
    pub fn next(&mut self, topic: &str) -> u64 {
        let counter = self.next.entry(topic.to_owned()).or_insert(0);
        *counter = counter.saturating_add(1);
        *counter
    }
}
