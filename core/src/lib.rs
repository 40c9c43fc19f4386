#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Blastgrid engine.
//!
//! This crate defines the message surface that connects the peer session,
//! the per-peer world, and pure systems. The session submits [`Command`]
//! values describing desired mutations, the world executes those commands
//! via its `apply` entry point, and then broadcasts [`Event`] values for
//! systems to react to deterministically. Systems consume event streams,
//! query read-only [`GridIndex`] views, and respond exclusively with new
//! command batches.

use std::{fmt, time::Duration};

use serde::{Deserialize, Serialize};

mod level;
mod tuning;

pub use level::{LevelError, LevelLayout, LevelTile, DEFAULT_LEVEL};
pub use tuning::{RewardWeights, Tuning};

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Replaces the world's tile grid with the provided layout.
    LoadLevel {
        /// Parsed layout describing walls, destructibles and floor.
        layout: LevelLayout,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Places a player avatar on the grid.
    SpawnPlayer {
        /// Identity of the player being spawned.
        player: PlayerId,
        /// Tile the avatar starts on.
        tile: TileCoord,
        /// Color assigned by the lobby orchestrator.
        color: String,
        /// Whether the avatar is owned by this peer.
        local: bool,
    },
    /// Moves a player avatar to a new world-space position.
    MovePlayer {
        /// Identity of the player that moved.
        player: PlayerId,
        /// New world-space position of the avatar.
        position: Position,
    },
    /// Requests placement of a bomb on a tile.
    PlaceBomb {
        /// Player that owns the bomb.
        owner: PlayerId,
        /// Tile the bomb is dropped on.
        tile: TileCoord,
        /// Blast force recorded at placement time.
        force: u32,
        /// Whether the placement originates locally or mirrors a peer.
        source: BombSource,
    },
    /// Detonates an armed bomb ahead of its fuse.
    DetonateBomb {
        /// Identifier of the bomb to detonate.
        bomb: BombId,
    },
    /// Spawns an explosion segment on a tile.
    SpawnExplosion {
        /// Tile the segment occupies.
        tile: TileCoord,
        /// Propagation direction, `None` for the omnidirectional origin.
        direction: Option<Direction>,
        /// Remaining force carried by the segment.
        force: u32,
    },
    /// Tells the destructible occupying a tile to begin its destruction.
    BeginDestruction {
        /// Tile holding the destructible.
        tile: TileCoord,
    },
    /// Places a reward on a tile.
    SpawnReward {
        /// Tile the reward appears on.
        tile: TileCoord,
        /// Kind of reward that was drawn.
        kind: RewardKind,
    },
    /// Overwrites the cached mirror of a remote player's attributes.
    MirrorAttributes {
        /// Identity of the mirrored player.
        player: PlayerId,
        /// Snapshot published by the owning peer.
        attributes: PlayerAttributes,
    },
    /// Removes a player avatar from the grid.
    RemovePlayer {
        /// Identity of the player being removed.
        player: PlayerId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a new level layout was installed.
    LevelLoaded {
        /// Number of tile columns in the layout.
        columns: u32,
        /// Number of tile rows in the layout.
        rows: u32,
    },
    /// Confirms that a player avatar entered the grid.
    PlayerSpawned {
        /// Identity of the spawned player.
        player: PlayerId,
        /// Tile the avatar occupies.
        tile: TileCoord,
        /// Whether the avatar is owned by this peer.
        local: bool,
    },
    /// Confirms that a bomb was placed and its fuse started.
    BombPlaced {
        /// Identifier allocated to the bomb.
        bomb: BombId,
        /// Player owning the bomb.
        owner: PlayerId,
        /// Tile holding the bomb.
        tile: TileCoord,
        /// Force recorded at placement.
        force: u32,
        /// Whether the placement originated locally or mirrors a peer.
        source: BombSource,
    },
    /// Reports that a bomb placement request was refused.
    BombPlacementRejected {
        /// Player that requested the placement.
        owner: PlayerId,
        /// Tile named in the request.
        tile: TileCoord,
        /// Specific reason the placement failed.
        reason: BombPlacementError,
    },
    /// Announces that a bomb detonated.
    BombDetonated {
        /// Identifier of the detonated bomb.
        bomb: BombId,
        /// Player that owned the bomb.
        owner: PlayerId,
        /// Tile the bomb occupied.
        tile: TileCoord,
        /// Force recorded at placement.
        force: u32,
    },
    /// Confirms that an explosion segment was spawned.
    ExplosionSpawned {
        /// Identifier allocated to the segment.
        segment: SegmentId,
        /// Tile the segment occupies.
        tile: TileCoord,
        /// Propagation direction, `None` for the omnidirectional origin.
        direction: Option<Direction>,
        /// Remaining force carried by the segment.
        force: u32,
    },
    /// Reports that an explosion segment reached the end of its lifetime.
    ExplosionExpired {
        /// Identifier of the expired segment.
        segment: SegmentId,
        /// Tile the segment occupied.
        tile: TileCoord,
    },
    /// Announces that a destructible started its destruction routine.
    DestructionBegan {
        /// Tile holding the destructible.
        tile: TileCoord,
        /// Policy of the destructible.
        policy: DestructiblePolicy,
    },
    /// Announces that a destructible finished its destruction and left the grid.
    DestructibleDestroyed {
        /// Tile the destructible occupied.
        tile: TileCoord,
        /// Policy of the destroyed destructible.
        policy: DestructiblePolicy,
    },
    /// Confirms that a reward appeared on a tile.
    RewardSpawned {
        /// Tile holding the reward.
        tile: TileCoord,
        /// Kind of reward.
        kind: RewardKind,
    },
    /// Reports that a player walked over a reward and consumed it.
    RewardCollected {
        /// Player that collected the reward.
        player: PlayerId,
        /// Tile the reward occupied.
        tile: TileCoord,
        /// Kind of reward collected.
        kind: RewardKind,
    },
    /// Reports that the local avatar was hit by a blast.
    PlayerDamaged {
        /// Identity of the damaged player.
        player: PlayerId,
        /// Lives remaining after the hit.
        lives: u32,
    },
    /// Reports that a player's post-hit immunity expired.
    ImmunityEnded {
        /// Identity of the player.
        player: PlayerId,
    },
    /// Reports that the local avatar lost its last life.
    PlayerDied {
        /// Identity of the dead player.
        player: PlayerId,
    },
    /// Confirms that a player avatar left the grid.
    PlayerRemoved {
        /// Identity of the removed player.
        player: PlayerId,
    },
    /// Confirms that a remote player's mirror was refreshed.
    AttributesMirrored {
        /// Identity of the mirrored player.
        player: PlayerId,
    },
    /// Reports a command that referenced a player the world does not know.
    UnknownPlayer {
        /// Identity named by the command.
        player: PlayerId,
    },
}

/// Location of a single tile expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TileCoord {
    column: u32,
    row: u32,
}

impl TileCoord {
    /// Creates a new tile coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Returns the adjacent tile in the provided direction.
    ///
    /// Yields `None` when the step would leave the non-negative coordinate
    /// space. Upper bounds are the grid's concern, not the coordinate's.
    #[must_use]
    pub fn neighbor(self, direction: Direction) -> Option<TileCoord> {
        let column = match direction {
            Direction::Left => self.column.checked_sub(1)?,
            Direction::Right => self.column.checked_add(1)?,
            Direction::Up | Direction::Down => self.column,
        };
        let row = match direction {
            Direction::Up => self.row.checked_sub(1)?,
            Direction::Down => self.row.checked_add(1)?,
            Direction::Left | Direction::Right => self.row,
        };
        Some(TileCoord::new(column, row))
    }

    /// Computes the Manhattan distance between two tile coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: TileCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.column, self.row)
    }
}

/// Cardinal propagation directions.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Toward decreasing row indices.
    Up,
    /// Toward increasing row indices.
    Down,
    /// Toward decreasing column indices.
    Left,
    /// Toward increasing column indices.
    Right,
}

impl Direction {
    /// Every direction in the fixed evaluation order shared by all peers.
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];
}

/// Globally unique identity of a player within a session.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    /// Wraps the provided identity string.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identity as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier assigned to a bomb by the local world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BombId(u32);

impl BombId {
    /// Creates a new bomb identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an explosion segment by the local world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SegmentId(u32);

impl SegmentId {
    /// Creates a new segment identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// World-space position of an avatar, measured in the same units as the tile size.
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
}

impl Position {
    /// Creates a new position.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Anchors a position on the center of the provided tile.
    #[must_use]
    pub fn from_tile(tile: TileCoord, tile_size: f32) -> Self {
        Self {
            x: tile.column() as f32 * tile_size,
            y: tile.row() as f32 * tile_size,
        }
    }

    /// Snaps the position to the nearest tile.
    ///
    /// Returns `None` for negative, non-finite or degenerate inputs.
    #[must_use]
    pub fn to_tile(self, tile_size: f32) -> Option<TileCoord> {
        if !tile_size.is_finite() || tile_size <= 0.0 || !self.x.is_finite() || !self.y.is_finite() {
            return None;
        }
        let column = (self.x / tile_size).round();
        let row = (self.y / tile_size).round();
        if column < 0.0 || row < 0.0 || column > u32::MAX as f32 || row > u32::MAX as f32 {
            return None;
        }
        Some(TileCoord::new(column as u32, row as u32))
    }
}

/// Attribute snapshot a peer publishes for the avatar it owns.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlayerAttributes {
    /// Whether the avatar currently ignores blast damage.
    pub immune: bool,
    /// Remaining lives.
    pub lives: u32,
    /// Base movement speed.
    pub speed: f32,
    /// Effective movement speed, derated while immune.
    pub cur_speed: f32,
    /// Blast force of bombs the player places.
    pub force: u32,
    /// World-space position of the avatar.
    pub position: Position,
}

/// Origin of a bomb placement.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BombSource {
    /// Placed by the avatar this peer owns.
    Local,
    /// Mirrored from a peer's placement message.
    Remote,
}

/// Reasons a bomb placement request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum BombPlacementError {
    /// The owner is not present in the world.
    UnknownPlayer,
    /// The requested tile lies outside the grid.
    OutOfBounds,
    /// The requested tile holds a wall or destructible.
    Blocked,
    /// The requested tile already holds a bomb.
    TileOccupied,
    /// The owner already has the maximum number of live bombs.
    CapacityReached,
}

/// Closed set of power-ups a destroyed destructible may leave behind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RewardKind {
    /// Raises the maximum number of concurrent bombs.
    ExtraBomb,
    /// Raises the base movement speed.
    SpeedBoost,
    /// Raises the blast force of future bombs.
    ExtraRange,
}

impl RewardKind {
    /// Every reward kind in the fixed order used by weighted selection.
    pub const ALL: [RewardKind; 3] = [
        RewardKind::ExtraBomb,
        RewardKind::SpeedBoost,
        RewardKind::ExtraRange,
    ];

    /// Returns the attribute delta applied to the collecting player.
    #[must_use]
    pub fn delta(self, tuning: &Tuning) -> AttributeDelta {
        match self {
            Self::ExtraBomb => AttributeDelta {
                bombs: tuning.bomb_increase,
                ..AttributeDelta::default()
            },
            Self::SpeedBoost => AttributeDelta {
                speed: tuning.speed_increase,
                ..AttributeDelta::default()
            },
            Self::ExtraRange => AttributeDelta {
                force: tuning.range_increase,
                ..AttributeDelta::default()
            },
        }
    }
}

/// Stat change applied when a reward is collected.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct AttributeDelta {
    /// Added to the maximum concurrent bomb count.
    pub bombs: u32,
    /// Added to the base movement speed.
    pub speed: f32,
    /// Added to the blast force.
    pub force: u32,
}

/// Behaviour of a destructible object when a blast reaches it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DestructiblePolicy {
    /// Whether the object blocks the blast past its tile while it is being destroyed.
    pub stop_propagation: bool,
    /// Whether destruction plays an animation before the object leaves the grid.
    pub animated: bool,
    /// Whether destruction may leave a reward behind.
    pub reward_eligible: bool,
}

impl DestructiblePolicy {
    /// Wooden crate: opaque to blasts, animated, may drop a reward.
    pub const CRATE: Self = Self {
        stop_propagation: true,
        animated: true,
        reward_eligible: true,
    };

    /// Dry brush: blasts pass through, burns instantly, never drops a reward.
    pub const BRUSH: Self = Self {
        stop_propagation: false,
        animated: false,
        reward_eligible: false,
    };
}

/// Destruction progress of a destructible object.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DestructionState {
    /// Untouched by any blast.
    Intact,
    /// Destruction animation in progress.
    Destroying,
}

/// Visual shape of an explosion segment.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SegmentShape {
    /// Omnidirectional segment on the detonated bomb's tile.
    Center,
    /// Segment that continues the chain.
    Beam,
    /// Terminal segment with no force left.
    Point,
}

impl SegmentShape {
    /// Derives the shape from a segment's direction and remaining force.
    #[must_use]
    pub const fn of(direction: Option<Direction>, force: u32) -> Self {
        if force == 0 {
            Self::Point
        } else if direction.is_none() {
            Self::Center
        } else {
            Self::Beam
        }
    }
}

/// Entity occupying a tile, as reported by a [`GridIndex`].
#[derive(Clone, Debug, PartialEq)]
pub enum Occupant {
    /// Indestructible wall.
    Wall,
    /// Destructible object and its progress.
    Destructible {
        /// Behaviour when reached by a blast.
        policy: DestructiblePolicy,
        /// Current destruction progress.
        state: DestructionState,
    },
    /// Armed bomb.
    Bomb(BombId),
    /// Live explosion segment.
    Explosion(SegmentId),
    /// Uncollected reward.
    Reward(RewardKind),
    /// Player avatar.
    Player(PlayerId),
}

/// Read-only capability answering "what occupies tile T".
pub trait GridIndex {
    /// Reports whether the tile lies inside the grid.
    fn contains(&self, tile: TileCoord) -> bool;

    /// Lists the entities occupying the tile in a deterministic order.
    fn occupants(&self, tile: TileCoord) -> Vec<Occupant>;

    /// Reports whether the tile holds an indestructible wall.
    fn is_wall(&self, tile: TileCoord) -> bool {
        self.occupants(tile)
            .iter()
            .any(|occupant| matches!(occupant, Occupant::Wall))
    }

    /// Returns the destructible occupying the tile, if any.
    fn destructible_at(&self, tile: TileCoord) -> Option<(DestructiblePolicy, DestructionState)> {
        self.occupants(tile)
            .into_iter()
            .find_map(|occupant| match occupant {
                Occupant::Destructible { policy, state } => Some((policy, state)),
                _ => None,
            })
    }

    /// Returns the armed bomb occupying the tile, if any.
    fn bomb_at(&self, tile: TileCoord) -> Option<BombId> {
        self.occupants(tile)
            .into_iter()
            .find_map(|occupant| match occupant {
                Occupant::Bomb(bomb) => Some(bomb),
                _ => None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn neighbor_steps_one_tile() {
        let origin = TileCoord::new(5, 5);
        assert_eq!(origin.neighbor(Direction::Up), Some(TileCoord::new(5, 4)));
        assert_eq!(origin.neighbor(Direction::Down), Some(TileCoord::new(5, 6)));
        assert_eq!(origin.neighbor(Direction::Left), Some(TileCoord::new(4, 5)));
        assert_eq!(origin.neighbor(Direction::Right), Some(TileCoord::new(6, 5)));
    }

    #[test]
    fn neighbor_refuses_negative_coordinates() {
        let corner = TileCoord::new(0, 0);
        assert_eq!(corner.neighbor(Direction::Up), None);
        assert_eq!(corner.neighbor(Direction::Left), None);
    }

    #[test]
    fn direction_order_is_up_down_left_right() {
        assert_eq!(
            Direction::ALL,
            [
                Direction::Up,
                Direction::Down,
                Direction::Left,
                Direction::Right
            ]
        );
    }

    #[test]
    fn position_snaps_to_nearest_tile() {
        let tile = TileCoord::new(3, 2);
        let anchored = Position::from_tile(tile, 64.0);
        assert_eq!(anchored.to_tile(64.0), Some(tile));

        let nudged = Position::new(anchored.x + 20.0, anchored.y - 31.0);
        assert_eq!(nudged.to_tile(64.0), Some(tile));
    }

    #[test]
    fn position_rejects_negative_coordinates() {
        assert_eq!(Position::new(-64.0, 0.0).to_tile(64.0), None);
        assert_eq!(Position::new(0.0, 0.0).to_tile(0.0), None);
    }

    #[test]
    fn zero_force_is_always_a_point() {
        assert_eq!(SegmentShape::of(None, 0), SegmentShape::Point);
        assert_eq!(SegmentShape::of(Some(Direction::Left), 0), SegmentShape::Point);
        assert_eq!(SegmentShape::of(None, 2), SegmentShape::Center);
        assert_eq!(SegmentShape::of(Some(Direction::Up), 1), SegmentShape::Beam);
    }

    #[test]
    fn reward_deltas_touch_a_single_stat() {
        let tuning = Tuning::default();
        assert_eq!(RewardKind::ExtraBomb.delta(&tuning).bombs, 1);
        assert_eq!(RewardKind::ExtraRange.delta(&tuning).force, 1);
        let speed = RewardKind::SpeedBoost.delta(&tuning);
        assert_eq!(speed.bombs, 0);
        assert_eq!(speed.force, 0);
        assert!((speed.speed - 0.1).abs() < f32::EPSILON);
    }
}
