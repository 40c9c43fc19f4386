//! Orchestrator plus peers exchanging messages over a [`LocalBroker`].

use std::time::Duration;

use blastgrid_core::{LevelLayout, PlayerId, Tuning};
use blastgrid_protocol::{ClientId, LocalBroker, Outbound};
use blastgrid_system_lobby::LobbyConfig;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::warn;

use crate::{Orchestrator, Peer, PeerConfig, PeerError};

const MAX_DELIVERY_ROUNDS: usize = 64;

/// In-process match: one orchestrator, `players` peers, one broker.
///
/// Every peer draws rewards from the same seed so worlds that see the
/// same destructions in the same order also agree on rewards.
#[derive(Debug)]
pub struct Simulation {
    broker: LocalBroker,
    hub: ClientId,
    orchestrator: Orchestrator<ChaCha8Rng>,
    peers: Vec<(ClientId, Peer)>,
    elapsed: Duration,
}

impl Simulation {
    /// Connects the orchestrator and `players` ready peers named
    /// `peer-0`, `peer-1`, ...
    ///
    /// The lobby quorum is raised to `players` so every peer lands in the
    /// same match.
    pub fn new(
        players: usize,
        seed: u64,
        tuning: Tuning,
        lobby: LobbyConfig,
        layout: LevelLayout,
    ) -> Result<Self, PeerError> {
        let mut broker = LocalBroker::new();
        let hub = broker.connect();
        for filter in Orchestrator::<ChaCha8Rng>::subscriptions() {
            broker.subscribe(hub, filter);
        }

        let mut peers = Vec::with_capacity(players);
        for index in 0..players {
            let client = broker.connect();
            for filter in Peer::subscriptions() {
                broker.subscribe(client, filter);
            }
            let mut peer = Peer::new(PeerConfig {
                player: PlayerId::new(format!("peer-{index}")),
                tuning: tuning.clone(),
                layout: layout.clone(),
                seed,
            })?;
            peer.set_ready(true);
            peers.push((client, peer));
        }

        Ok(Self {
            broker,
            hub,
            orchestrator: Orchestrator::new(
                LobbyConfig {
                    quorum: players,
                    ..lobby
                },
                ChaCha8Rng::seed_from_u64(seed),
            ),
            peers,
            elapsed: Duration::ZERO,
        })
    }

    /// Simulated time since the simulation started.
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Every peer, in connection order.
    pub fn peers(&self) -> impl Iterator<Item = &Peer> {
        self.peers.iter().map(|(_, peer)| peer)
    }

    /// Ticks every peer by `dt` and delivers the resulting traffic until
    /// the broker is drained.
    pub fn step(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
        let mut out = Vec::new();
        for (_, peer) in &mut self.peers {
            peer.tick(dt, &mut out);
        }
        self.publish(out);
        self.deliver();
    }

    /// Has `player` drop a bomb under its avatar and delivers the
    /// broadcast. Returns whether the drop was attempted.
    pub fn place_bomb(&mut self, player: &PlayerId) -> bool {
        let mut out = Vec::new();
        let placed = self
            .peers
            .iter_mut()
            .find(|(_, peer)| peer.id() == player)
            .is_some_and(|(_, peer)| peer.place_bomb(&mut out));
        self.publish(out);
        self.deliver();
        placed
    }

    fn publish(&mut self, messages: Vec<Outbound>) {
        for message in &messages {
            self.broker.publish(message);
        }
    }

    fn deliver(&mut self) {
        for _ in 0..MAX_DELIVERY_ROUNDS {
            if self.broker.pending() == 0 {
                return;
            }
            let mut out = Vec::new();
            for delivery in self.broker.drain(self.hub) {
                self.orchestrator
                    .handle(&delivery.topic, &delivery.payload, self.elapsed, &mut out);
            }
            for (client, peer) in &mut self.peers {
                for delivery in self.broker.drain(*client) {
                    peer.handle_inbound(&delivery.topic, &delivery.payload, &mut out);
                }
            }
            self.publish(out);
        }
        warn!(pending = self.broker.pending(), "delivery_rounds_exhausted");
    }
}
