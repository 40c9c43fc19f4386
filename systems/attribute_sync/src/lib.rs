#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Attribute synchronizer: periodic broadcast of the local avatar and
//! last-writer-wins mirroring of remote ones.

use std::time::Duration;

use blastgrid_core::{Command, Event, PlayerAttributes, PlayerId};
use blastgrid_protocol::{AttributesMessage, DeathMessage, Topic};
use blastgrid_system_sequence_gate::{SequenceCounter, SequenceGate};

/// Broadcasts the local player's attributes on a fixed interval.
#[derive(Clone, Debug)]
pub struct AttributeSync {
    interval: Duration,
    accumulator: Duration,
    last_sent: Option<PlayerAttributes>,
}

impl AttributeSync {
    /// Creates a synchronizer that samples once per `interval`.
    #[must_use]
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulator: Duration::ZERO,
            last_sent: None,
        }
    }

    /// Consumes world events and emits at most one attribute broadcast.
    ///
    /// `local` is the owning player and its current snapshot, or `None`
    /// once the local avatar is gone. A snapshot equal to the last one
    /// sent is suppressed and does not consume a sequence number.
    pub fn handle(
        &mut self,
        events: &[Event],
        local: Option<(&PlayerId, PlayerAttributes)>,
        counter: &mut SequenceCounter,
        out: &mut Vec<AttributesMessage>,
    ) {
        for event in events {
            if let Event::TimeAdvanced { dt } = event {
                self.accumulator = self.accumulator.saturating_add(*dt);
            }
        }
        if self.accumulator < self.interval {
            return;
        }
        self.accumulator = Duration::ZERO;

        let Some((player, attributes)) = local else {
            return;
        };
        if self.last_sent == Some(attributes) {
            return;
        }

        let topic = Topic::Attributes {
            player: player.clone(),
        };
        let count = counter.next(&topic.to_string());
        out.push(AttributesMessage::new(attributes, count));
        self.last_sent = Some(attributes);
    }

    /// Last snapshot that was broadcast.
    #[must_use]
    pub fn last_sent(&self) -> Option<&PlayerAttributes> {
        self.last_sent.as_ref()
    }
}

/// Runs a remote attribute broadcast through the gate.
///
/// Returns whether the message was accepted; accepted messages become a
/// [`Command::MirrorAttributes`] overwriting the cached mirror.
pub fn merge_remote(
    gate: &mut SequenceGate,
    player: PlayerId,
    message: &AttributesMessage,
    out: &mut Vec<Command>,
) -> bool {
    let topic = Topic::Attributes {
        player: player.clone(),
    };
    if !gate.should_accept(&topic.to_string(), message.count) {
        return false;
    }
    out.push(Command::MirrorAttributes {
        player,
        attributes: message.attributes(),
    });
    true
}

/// Runs a remote death notice through the gate.
///
/// Accepted notices remove the mirrored player for good.
pub fn merge_death(
    gate: &mut SequenceGate,
    player: PlayerId,
    message: &DeathMessage,
    out: &mut Vec<Command>,
) -> bool {
    let topic = Topic::Death {
        player: player.clone(),
    };
    if !gate.should_accept(&topic.to_string(), message.count) {
        return false;
    }
    out.push(Command::RemovePlayer { player });
    true
}

/// Stamps a death notice for the local player.
#[must_use]
pub fn death_notice(player: &PlayerId, counter: &mut SequenceCounter) -> DeathMessage {
    let topic = Topic::Death {
        player: player.clone(),
    };
    DeathMessage {
        count: counter.next(&topic.to_string()),
    }
}
