#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Bomb lifecycle system: local drop requests, placement relay, remote
//! placement mirroring and detonation hand-off to the explosion engine.

use blastgrid_core::{BombSource, Command, Event, GridIndex, PlayerId, TileCoord};
use blastgrid_protocol::{BombMessage, Topic};
use blastgrid_system_sequence_gate::{SequenceCounter, SequenceGate};

/// Snapshot of the local player wanting to drop a bomb.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DropRequest {
    /// Player dropping the bomb.
    pub owner: PlayerId,
    /// Tile the player stands on.
    pub tile: TileCoord,
    /// Blast force of the player.
    pub force: u32,
    /// Bombs of the player currently on the grid.
    pub current_bombs: u32,
    /// Maximum concurrent bombs of the player.
    pub max_bombs: u32,
}

/// Local placement to publish on the owner's bomb topic.
#[derive(Clone, Debug, PartialEq)]
pub struct BombBroadcast {
    /// Owner of the bomb.
    pub owner: PlayerId,
    /// Stamped placement message.
    pub message: BombMessage,
}

/// Pure system coordinating bomb placement and detonation.
#[derive(Clone, Debug)]
pub struct BombLifecycle {
    tile_size: f32,
}

impl BombLifecycle {
    /// Creates the system for a grid with the given tile size.
    #[must_use]
    pub fn new(tile_size: f32) -> Self {
        Self { tile_size }
    }

    /// Turns a local drop request into a placement command.
    ///
    /// Requests over the player's bomb capacity, or onto a tile already
    /// holding a bomb, are refused silently and produce no command.
    pub fn request_drop(
        &self,
        request: DropRequest,
        grid: &impl GridIndex,
        out: &mut Vec<Command>,
    ) -> bool {
        if request.current_bombs >= request.max_bombs {
            return false;
        }
        if grid.bomb_at(request.tile).is_some() {
            return false;
        }
        out.push(Command::PlaceBomb {
            owner: request.owner,
            tile: request.tile,
            force: request.force,
            source: BombSource::Local,
        });
        true
    }

    /// Reacts to world events.
    ///
    /// Every detonation hands off to the explosion engine with an
    /// omnidirectional segment carrying the bomb's force. Every local
    /// placement is stamped for broadcast.
    pub fn handle(
        &mut self,
        events: &[Event],
        counter: &mut SequenceCounter,
        commands: &mut Vec<Command>,
        broadcasts: &mut Vec<BombBroadcast>,
    ) {
        for event in events {
            match event {
                Event::BombDetonated { tile, force, .. } => {
                    commands.push(Command::SpawnExplosion {
                        tile: *tile,
                        direction: None,
                        force: *force,
                    });
                }
                Event::BombPlaced {
                    owner,
                    tile,
                    force,
                    source: BombSource::Local,
                    ..
                } => {
                    let topic = Topic::Bomb {
                        player: owner.clone(),
                    };
                    let count = counter.next(&topic.to_string());
                    broadcasts.push(BombBroadcast {
                        owner: owner.clone(),
                        message: BombMessage::new(*tile, *force, self.tile_size, count),
                    });
                }
                _ => {}
            }
        }
    }

    /// Mirrors a remote placement once the gate accepts it.
    ///
    /// Messages whose position does not resolve to a tile are dropped
    /// before reaching the gate.
    pub fn merge_remote(
        &self,
        gate: &mut SequenceGate,
        player: PlayerId,
        message: &BombMessage,
        out: &mut Vec<Command>,
    ) -> bool {
        let Some(tile) = message.tile(self.tile_size) else {
            return false;
        };
        let topic = Topic::Bomb {
            player: player.clone(),
        };
        if !gate.should_accept(&topic.to_string(), message.count) {
            return false;
        }
        out.push(Command::PlaceBomb {
            owner: player,
            tile,
            force: message.data.force,
            source: BombSource::Remote,
        });
        true
    }
}
