//! One participant's view of the lobby and of the match that follows.

use std::{
    collections::BTreeSet,
    time::Duration,
};

use blastgrid_core::{Command, Event, LevelLayout, PlayerId, Position, TileCoord, Tuning};
use blastgrid_protocol::{GameStartMessage, Inbound, Outbound, GAME_PLAYER_FILTER, GAME_START};
use blastgrid_system_attribute_sync::{death_notice, merge_death, merge_remote, AttributeSync};
use blastgrid_system_bomb_lifecycle::{BombLifecycle, DropRequest};
use blastgrid_system_explosion::Explosion;
use blastgrid_system_rewards::{RewardSpawner, RewardTable};
use blastgrid_system_sequence_gate::{SequenceCounter, SequenceGate};
use blastgrid_world::{apply, query, World};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info, trace, warn};

use crate::PeerError;

/// Everything a peer needs before it joins the lobby.
#[derive(Clone, Debug)]
pub struct PeerConfig {
    /// Identity of the local player.
    pub player: PlayerId,
    /// Gameplay constants.
    pub tuning: Tuning,
    /// Level loaded when the match starts.
    pub layout: LevelLayout,
    /// Seed of the reward generator.
    pub seed: u64,
}

/// Coarse lifecycle of a peer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerPhase {
    /// Pinging the orchestrator and collecting start assignments.
    Lobby,
    /// Playing with a live local avatar.
    Playing,
    /// In the match, but the local avatar is gone.
    Eliminated,
}

/// Running totals of what a peer observed during a match.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Explosion segments spawned in the local world.
    pub segments: u64,
    /// Tiles whose destructible finished its destruction.
    pub destroyed: BTreeSet<TileCoord>,
    /// Rewards that appeared on the grid.
    pub rewards_spawned: u32,
    /// Rewards picked up by any player.
    pub rewards_collected: u32,
    /// Bombs that detonated.
    pub detonations: u32,
}

/// Session object of a single participant.
#[derive(Debug)]
pub struct Peer {
    config: PeerConfig,
    table: RewardTable,
    ready: bool,
    phase: Phase,
}

#[derive(Debug)]
enum Phase {
    Lobby(LobbyClient),
    Match(Box<MatchContext>),
}

#[derive(Debug, Default)]
struct LobbyClient {
    since_ping: Option<Duration>,
    /// Assignments of the dispatch currently arriving, in arrival order.
    group: Vec<GameStartMessage>,
}

impl LobbyClient {
    /// Adds `start` to the arriving dispatch and returns the group once it
    /// holds `numberOfPlayers` assignments.
    ///
    /// The orchestrator publishes one dispatch as a run of consecutive
    /// messages, so a change of player count or a reassigned player opens
    /// a new group. Redelivered duplicates are dropped.
    fn collect(&mut self, start: GameStartMessage) -> Option<Vec<GameStartMessage>> {
        if self.group.contains(&start) {
            return None;
        }
        let continues = self.group.first().is_some_and(|first| {
            first.number_of_players == start.number_of_players
                && self
                    .group
                    .iter()
                    .all(|entry| entry.player_id != start.player_id)
        });
        if !continues {
            self.group.clear();
        }
        self.group.push(start);
        let expected = self
            .group
            .first()
            .map_or(0, |first| first.number_of_players as usize);
        (self.group.len() >= expected).then(|| std::mem::take(&mut self.group))
    }
}

#[derive(Debug)]
struct MatchContext {
    local: PlayerId,
    players: usize,
    world: World,
    gate: SequenceGate,
    counter: SequenceCounter,
    attribute_sync: AttributeSync,
    bombs: BombLifecycle,
    explosion: Explosion,
    rewards: RewardSpawner<ChaCha8Rng>,
    known: BTreeSet<PlayerId>,
    stats: MatchStats,
}

impl Peer {
    /// Creates a peer sitting in the lobby, not yet ready.
    pub fn new(config: PeerConfig) -> Result<Self, PeerError> {
        let table = RewardTable::from_weights(&config.tuning.reward_weights)?;
        Ok(Self {
            config,
            table,
            ready: false,
            phase: Phase::Lobby(LobbyClient::default()),
        })
    }

    /// Identity of the local player.
    #[must_use]
    pub fn id(&self) -> &PlayerId {
        &self.config.player
    }

    /// Topic filters the peer must be subscribed to.
    #[must_use]
    pub fn subscriptions() -> [&'static str; 2] {
        [GAME_START, GAME_PLAYER_FILTER]
    }

    /// Current lifecycle phase.
    #[must_use]
    pub fn phase(&self) -> PeerPhase {
        match &self.phase {
            Phase::Lobby(_) => PeerPhase::Lobby,
            Phase::Match(context) if query::player(&context.world, &context.local).is_some() => {
                PeerPhase::Playing
            }
            Phase::Match(_) => PeerPhase::Eliminated,
        }
    }

    /// Authoritative world of the running match.
    #[must_use]
    pub fn world(&self) -> Option<&World> {
        match &self.phase {
            Phase::Lobby(_) => None,
            Phase::Match(context) => Some(&context.world),
        }
    }

    /// Totals gathered since the match started.
    #[must_use]
    pub fn stats(&self) -> Option<&MatchStats> {
        match &self.phase {
            Phase::Lobby(_) => None,
            Phase::Match(context) => Some(&context.stats),
        }
    }

    /// Sets the readiness flag carried by the next lobby ping.
    pub fn set_ready(&mut self, ready: bool) {
        self.ready = ready;
        if let Phase::Lobby(lobby) = &mut self.phase {
            lobby.since_ping = None;
        }
    }

    /// Advances the peer's clock.
    ///
    /// In the lobby this emits a heartbeat once per ping interval. In a
    /// match it advances the world and may emit an attribute broadcast.
    pub fn tick(&mut self, dt: Duration, out: &mut Vec<Outbound>) {
        match &mut self.phase {
            Phase::Lobby(lobby) => {
                let interval = self.config.tuning.ping_interval();
                let due = match lobby.since_ping {
                    None => true,
                    Some(elapsed) => elapsed.saturating_add(dt) >= interval,
                };
                if due {
                    lobby.since_ping = Some(Duration::ZERO);
                    publish(out, Outbound::ping(self.config.player.clone(), self.ready));
                } else {
                    lobby.since_ping = lobby.since_ping.map(|elapsed| elapsed.saturating_add(dt));
                }
            }
            Phase::Match(context) => context.run(vec![Command::Tick { dt }], out),
        }
    }

    /// Drops a bomb under the local avatar.
    ///
    /// Returns whether a placement was attempted; requests over capacity
    /// or onto an occupied tile are refused without touching the world.
    pub fn place_bomb(&mut self, out: &mut Vec<Outbound>) -> bool {
        let Phase::Match(context) = &mut self.phase else {
            return false;
        };
        let Some(snapshot) = query::player(&context.world, &context.local) else {
            return false;
        };
        let Some(tile) = snapshot.tile else {
            return false;
        };
        let request = DropRequest {
            owner: snapshot.id,
            tile,
            force: snapshot.attributes.force,
            current_bombs: snapshot.current_bombs,
            max_bombs: snapshot.max_bombs,
        };
        let mut commands = Vec::new();
        if !context
            .bombs
            .request_drop(request, &query::grid(&context.world), &mut commands)
        {
            debug!(player = %context.local, "bomb_drop_refused");
            return false;
        }
        context.run(commands, out);
        true
    }

    /// Moves the local avatar.
    pub fn move_to(&mut self, position: Position, out: &mut Vec<Outbound>) {
        let Phase::Match(context) = &mut self.phase else {
            return;
        };
        let player = context.local.clone();
        context.run(vec![Command::MovePlayer { player, position }], out);
    }

    /// Processes one raw bus message.
    pub fn handle_inbound(&mut self, topic: &str, payload: &[u8], out: &mut Vec<Outbound>) {
        let inbound = match Inbound::decode(topic, payload) {
            Ok(inbound) => inbound,
            Err(error) => {
                debug!(%error, topic, "malformed_message_dropped");
                return;
            }
        };

        match inbound {
            Inbound::Ping { .. } => {}
            Inbound::GameStart(start) => self.handle_start(start, out),
            Inbound::Attributes { player, .. }
            | Inbound::Bomb { player, .. }
            | Inbound::Death { player, .. }
                if player == self.config.player => {}
            inbound => {
                let Phase::Match(context) = &mut self.phase else {
                    trace!(topic, "match_message_before_start");
                    return;
                };
                context.merge(topic, inbound, out);
            }
        }
    }

    fn handle_start(&mut self, start: GameStartMessage, out: &mut Vec<Outbound>) {
        if start.number_of_players == 0 {
            debug!(player = %start.player_id, "empty_match_ignored");
            return;
        }
        match &mut self.phase {
            Phase::Lobby(lobby) => {
                let Some(group) = lobby.collect(start) else {
                    return;
                };
                if group.iter().all(|entry| entry.player_id != self.config.player) {
                    debug!(players = group.len(), "foreign_match_ignored");
                    return;
                }
                self.enter_match(group, out);
            }
            Phase::Match(context) => {
                if start.number_of_players as usize != context.players
                    || context.known.len() >= context.players
                    || context.known.contains(&start.player_id)
                {
                    trace!(player = %start.player_id, "foreign_start_ignored");
                    return;
                }
                let commands = spawn_command(&self.config, &start).into_iter().collect();
                context.run(commands, out);
            }
        }
    }

    fn enter_match(&mut self, roster: Vec<GameStartMessage>, out: &mut Vec<Outbound>) {
        let tuning = self.config.tuning.clone();
        let mut context = MatchContext {
            local: self.config.player.clone(),
            players: roster.len(),
            world: World::new(tuning.clone()),
            gate: SequenceGate::new(),
            counter: SequenceCounter::new(),
            attribute_sync: AttributeSync::new(tuning.attribute_interval()),
            bombs: BombLifecycle::new(tuning.tile_size),
            explosion: Explosion::new(),
            rewards: RewardSpawner::new(
                tuning.reward_probability,
                self.table.clone(),
                ChaCha8Rng::seed_from_u64(self.config.seed),
            ),
            known: BTreeSet::new(),
            stats: MatchStats::default(),
        };

        let mut commands = vec![Command::LoadLevel {
            layout: self.config.layout.clone(),
        }];
        commands.extend(
            roster
                .iter()
                .filter_map(|start| spawn_command(&self.config, start)),
        );
        info!(
            player = %self.config.player,
            players = roster.len(),
            "match_started"
        );
        context.run(commands, out);
        self.phase = Phase::Match(Box::new(context));
    }
}

impl MatchContext {
    fn merge(&mut self, topic: &str, inbound: Inbound, out: &mut Vec<Outbound>) {
        let mut commands = Vec::new();
        let accepted = match &inbound {
            Inbound::Attributes { player, message } => {
                merge_remote(&mut self.gate, player.clone(), message, &mut commands)
            }
            Inbound::Bomb { player, message } => {
                self.bombs
                    .merge_remote(&mut self.gate, player.clone(), message, &mut commands)
            }
            Inbound::Death { player, message } => {
                merge_death(&mut self.gate, player.clone(), message, &mut commands)
            }
            Inbound::Ping { .. } | Inbound::GameStart(_) => false,
        };
        if !accepted {
            trace!(topic, "stale_message_dropped");
            return;
        }
        self.run(commands, out);
    }

    /// Applies `commands` and feeds the resulting events to every system
    /// until no system asks for more.
    fn run(&mut self, commands: Vec<Command>, out: &mut Vec<Outbound>) {
        let mut log = Vec::new();
        let mut pending = commands;
        while !pending.is_empty() {
            let mut events = Vec::new();
            for command in pending.drain(..) {
                apply(&mut self.world, command, &mut events);
            }

            self.observe(&events, out);

            let mut broadcasts = Vec::new();
            self.bombs
                .handle(&events, &mut self.counter, &mut pending, &mut broadcasts);
            for broadcast in broadcasts {
                publish(out, Outbound::bomb(broadcast.owner, &broadcast.message));
            }
            self.explosion
                .handle(&events, &query::grid(&self.world), &mut pending);
            self.rewards.handle(&events, &mut pending);

            log.extend(events);
        }

        let local = query::attributes(&self.world, &self.local);
        let mut snapshots = Vec::new();
        self.attribute_sync.handle(
            &log,
            local.map(|attributes| (&self.local, attributes)),
            &mut self.counter,
            &mut snapshots,
        );
        for snapshot in snapshots {
            publish(out, Outbound::attributes(self.local.clone(), &snapshot));
        }
    }

    fn observe(&mut self, events: &[Event], out: &mut Vec<Outbound>) {
        for event in events {
            match event {
                Event::PlayerSpawned { player, .. } => {
                    let _ = self.known.insert(player.clone());
                }
                Event::ExplosionSpawned { .. } => self.stats.segments += 1,
                Event::BombDetonated { .. } => self.stats.detonations += 1,
                Event::DestructibleDestroyed { tile, .. } => {
                    let _ = self.stats.destroyed.insert(*tile);
                }
                Event::RewardSpawned { .. } => self.stats.rewards_spawned += 1,
                Event::RewardCollected { player, kind, .. } => {
                    self.stats.rewards_collected += 1;
                    debug!(player = %player, kind = ?kind, "reward_collected");
                }
                Event::PlayerDamaged { player, lives } => {
                    info!(player = %player, lives, "player_damaged");
                }
                Event::PlayerDied { player } if *player == self.local => {
                    info!(player = %player, "local_player_died");
                    let notice = death_notice(player, &mut self.counter);
                    publish(out, Outbound::death(player.clone(), &notice));
                }
                Event::PlayerRemoved { player } => {
                    debug!(player = %player, "player_removed");
                }
                Event::BombPlacementRejected {
                    owner,
                    tile,
                    reason,
                } => {
                    debug!(owner = %owner, ?tile, ?reason, "bomb_placement_rejected");
                }
                Event::UnknownPlayer { player } => {
                    warn!(player = %player, "unknown_player");
                }
                _ => {}
            }
        }
    }
}

fn spawn_command(config: &PeerConfig, start: &GameStartMessage) -> Option<Command> {
    let Some(tile) = config.layout.start_tile(start.position) else {
        warn!(
            player = %start.player_id,
            position = start.position,
            "start_position_outside_level"
        );
        return None;
    };
    Some(Command::SpawnPlayer {
        player: start.player_id.clone(),
        tile,
        color: start.color.clone(),
        local: start.player_id == config.player,
    })
}

fn publish(out: &mut Vec<Outbound>, encoded: Result<Outbound, serde_json::Error>) {
    match encoded {
        Ok(message) => out.push(message),
        Err(error) => warn!(%error, "outbound_encoding_failed"),
    }
}
