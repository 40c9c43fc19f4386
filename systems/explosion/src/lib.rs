#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Explosion propagation engine.
//!
//! Propagation is a flood fill expressed as a command cascade: every
//! [`Event::ExplosionSpawned`] is answered with the commands for the next
//! hop, and the session keeps feeding the resulting events back until the
//! blast runs out of force. Directions are evaluated in [`Direction::ALL`]
//! order so every peer issues the same commands for the same detonation.

use blastgrid_core::{Command, DestructionState, Direction, Event, GridIndex, TileCoord};

/// Outcome of probing the tile a blast wants to enter.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reach {
    /// Outside the grid or a wall. Nothing happens.
    Blocked,
    /// A destructible that stops the blast. Destruction may begin, no segment spawns.
    Absorbed,
    /// The blast enters the tile.
    Passes,
}

/// Pure system turning spawned explosion segments into the next hop.
#[derive(Debug, Default)]
pub struct Explosion;

impl Explosion {
    /// Creates the explosion system.
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Consumes world events and emits the commands of the next hop.
    pub fn handle(&mut self, events: &[Event], grid: &impl GridIndex, out: &mut Vec<Command>) {
        for event in events {
            let Event::ExplosionSpawned {
                tile,
                direction,
                force,
                ..
            } = event
            else {
                continue;
            };
            if *force == 0 {
                continue;
            }
            let next_force = force - 1;
            match direction {
                None => {
                    for direction in Direction::ALL {
                        let _ = spread(grid, *tile, direction, next_force, out);
                    }
                }
                Some(direction) => {
                    let _ = spread(grid, *tile, *direction, next_force, out);
                }
            }
        }
    }
}

/// Probes the neighbour of `from` in `direction` and emits the commands for
/// a segment carrying `force` entering it.
///
/// A destructible at the target is told to begin destruction before the
/// propagation decision, unless its destruction is already running. A
/// bomb at the target is detonated; bombs never stop a blast.
pub fn spread(
    grid: &impl GridIndex,
    from: TileCoord,
    direction: Direction,
    force: u32,
    out: &mut Vec<Command>,
) -> Reach {
    let Some(target) = from.neighbor(direction) else {
        return Reach::Blocked;
    };
    if !grid.contains(target) || grid.is_wall(target) {
        return Reach::Blocked;
    }

    if let Some((policy, state)) = grid.destructible_at(target) {
        if state == DestructionState::Intact {
            out.push(Command::BeginDestruction { tile: target });
        }
        if policy.stop_propagation {
            return Reach::Absorbed;
        }
    }

    out.push(Command::SpawnExplosion {
        tile: target,
        direction: Some(direction),
        force,
    });
    if let Some(bomb) = grid.bomb_at(target) {
        out.push(Command::DetonateBomb { bomb });
    }
    Reach::Passes
}
