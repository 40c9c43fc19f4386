#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Lobby orchestrator that forms a match from readiness heartbeats.
//!
//! The lobby tracks every player that pinged within the staleness window.
//! Once at least the quorum is present and everyone is ready it shuffles
//! the start position and color pools, hands one of each to every entry,
//! and becomes [`LobbyPhase::Dispatched`] for good.

use std::{collections::BTreeMap, time::Duration};

use blastgrid_core::PlayerId;
use rand::{seq::SliceRandom, Rng};
use serde::{Deserialize, Serialize};

/// Lobby parameters, read from the `[lobby]` section of a config file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LobbyConfig {
    /// Entries silent for longer than this many seconds are pruned.
    pub staleness_secs: f32,
    /// Minimum number of entries needed to start a match.
    pub quorum: usize,
    /// Maximum number of entries the lobby admits.
    pub max_players: usize,
    /// Pool of start position indices.
    pub positions: Vec<u32>,
    /// Pool of player colors.
    pub colors: Vec<String>,
}

impl Default for LobbyConfig {
    fn default() -> Self {
        Self {
            staleness_secs: 2.0,
            quorum: 2,
            max_players: 4,
            positions: vec![0, 1, 2, 3],
            colors: ["#FF6347", "#FF8C00", "#FFD700", "#32CD32", "#1E90FF"]
                .into_iter()
                .map(str::to_owned)
                .collect(),
        }
    }
}

impl LobbyConfig {
    /// Staleness window as a [`Duration`].
    #[must_use]
    pub fn staleness(&self) -> Duration {
        Duration::try_from_secs_f32(self.staleness_secs).unwrap_or(Duration::ZERO)
    }

    /// Admission limit, bounded by the sizes of both assignment pools.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.max_players
            .min(self.positions.len())
            .min(self.colors.len())
    }
}

/// Lifecycle of a lobby.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LobbyPhase {
    /// Accepting heartbeats.
    Collecting,
    /// Match start assignments were published. Terminal.
    Dispatched,
}

/// Assignment handed to one participant when the match starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MatchStart {
    /// Participant receiving the assignment.
    pub player: PlayerId,
    /// Start position index.
    pub position: u32,
    /// Display color.
    pub color: String,
    /// Number of participants.
    pub number_of_players: u32,
}

#[derive(Clone, Copy, Debug)]
struct Entry {
    ready: bool,
    last_ping: Duration,
}

/// Lobby orchestrator state.
#[derive(Clone, Debug)]
pub struct Lobby {
    config: LobbyConfig,
    entries: BTreeMap<PlayerId, Entry>,
    phase: LobbyPhase,
}

impl Lobby {
    /// Creates an empty, collecting lobby.
    #[must_use]
    pub fn new(config: LobbyConfig) -> Self {
        Self {
            config,
            entries: BTreeMap::new(),
            phase: LobbyPhase::Collecting,
        }
    }

    /// Current lifecycle phase.
    #[must_use]
    pub const fn phase(&self) -> LobbyPhase {
        self.phase
    }

    /// Players currently in the lobby.
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.entries.keys()
    }

    /// Processes one readiness heartbeat received at `now`.
    ///
    /// Pushes one [`MatchStart`] per participant into `out` when the ping
    /// completes a ready quorum. Pings for a full lobby from players it
    /// does not know, and every ping after dispatch, are ignored.
    pub fn handle_ping<R>(
        &mut self,
        player: PlayerId,
        is_ready: bool,
        now: Duration,
        rng: &mut R,
        out: &mut Vec<MatchStart>,
    ) where
        R: Rng + ?Sized,
    {
        if self.phase == LobbyPhase::Dispatched {
            return;
        }

        self.prune(now);
        if !self.entries.contains_key(&player) && self.entries.len() >= self.config.capacity() {
            return;
        }
        let _ = self.entries.insert(
            player,
            Entry {
                ready: is_ready,
                last_ping: now,
            },
        );

        if self.entries.len() < self.config.quorum.max(2) {
            return;
        }
        if !self.entries.values().all(|entry| entry.ready) {
            return;
        }

        self.dispatch(rng, out);
    }

    fn prune(&mut self, now: Duration) {
        let staleness = self.config.staleness();
        self.entries
            .retain(|_, entry| now.saturating_sub(entry.last_ping) <= staleness);
    }

    fn dispatch<R>(&mut self, rng: &mut R, out: &mut Vec<MatchStart>)
    where
        R: Rng + ?Sized,
    {
        let mut positions = self.config.positions.clone();
        let mut colors = self.config.colors.clone();
        positions.shuffle(rng);
        colors.shuffle(rng);

        let number_of_players = u32::try_from(self.entries.len()).unwrap_or(u32::MAX);
        for (player, (position, color)) in self
            .entries
            .keys()
            .zip(positions.into_iter().zip(colors))
        {
            out.push(MatchStart {
                player: player.clone(),
                position,
                color,
                number_of_players,
            });
        }
        self.phase = LobbyPhase::Dispatched;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_is_bounded_by_pools() {
        let config = LobbyConfig {
            positions: vec![0, 1],
            ..LobbyConfig::default()
        };
        assert_eq!(config.capacity(), 2);
        assert_eq!(LobbyConfig::default().capacity(), 4);
    }

    #[test]
    fn partial_toml_keeps_default_pools() {
        let config: LobbyConfig = toml::from_str("max_players = 3\n").expect("toml parses");
        assert_eq!(config.max_players, 3);
        assert_eq!(config.colors.len(), 5);
        assert_eq!(config.staleness(), Duration::from_secs(2));
    }
}
