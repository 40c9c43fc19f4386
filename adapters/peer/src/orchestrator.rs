//! Hub-side lobby bridge.

use std::time::Duration;

use blastgrid_core::PlayerId;
use blastgrid_protocol::{GameStartMessage, Inbound, Outbound, PING_FILTER};
use blastgrid_system_lobby::{Lobby, LobbyConfig, MatchStart};
use rand::Rng;
use tracing::{debug, info, warn};

/// Feeds bus heartbeats to a [`Lobby`] and publishes its assignments.
///
/// A fresh lobby takes over as soon as one dispatches, so a single
/// orchestrator can launch any number of matches back to back.
#[derive(Debug)]
pub struct Orchestrator<R> {
    config: LobbyConfig,
    lobby: Lobby,
    rng: R,
    matches: u32,
}

impl<R: Rng> Orchestrator<R> {
    /// Creates an orchestrator with an empty lobby.
    pub fn new(config: LobbyConfig, rng: R) -> Self {
        Self {
            lobby: Lobby::new(config.clone()),
            config,
            rng,
            matches: 0,
        }
    }

    /// Topic filters the orchestrator must be subscribed to.
    #[must_use]
    pub fn subscriptions() -> [&'static str; 1] {
        [PING_FILTER]
    }

    /// Number of matches dispatched so far.
    #[must_use]
    pub fn matches(&self) -> u32 {
        self.matches
    }

    /// Players waiting in the current lobby.
    pub fn waiting(&self) -> impl Iterator<Item = &PlayerId> {
        self.lobby.players()
    }

    /// Processes one raw bus message received at `now`.
    pub fn handle(&mut self, topic: &str, payload: &[u8], now: Duration, out: &mut Vec<Outbound>) {
        let (player, message) = match Inbound::decode(topic, payload) {
            Ok(Inbound::Ping { player, message }) => (player, message),
            Ok(_) => {
                debug!(topic, "non_ping_ignored");
                return;
            }
            Err(error) => {
                debug!(%error, topic, "malformed_message_dropped");
                return;
            }
        };

        let mut starts = Vec::new();
        self.lobby
            .handle_ping(player, message.is_ready, now, &mut self.rng, &mut starts);
        if starts.is_empty() {
            return;
        }

        self.matches += 1;
        info!(
            players = starts.len(),
            matches = self.matches,
            "match_dispatched"
        );
        for start in starts {
            match Outbound::game_start(&start_message(start)) {
                Ok(message) => out.push(message),
                Err(error) => warn!(%error, "outbound_encoding_failed"),
            }
        }
        self.lobby = Lobby::new(self.config.clone());
    }
}

fn start_message(start: MatchStart) -> GameStartMessage {
    GameStartMessage {
        player_id: start.player,
        position: start.position,
        color: start.color,
        number_of_players: start.number_of_players,
    }
}
