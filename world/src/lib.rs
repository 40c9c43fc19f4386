#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative per-peer grid state for Blastgrid.
//!
//! The world owns every entity a peer knows about: the static level, the
//! destructibles still standing, live bombs and explosion segments,
//! uncollected rewards and player avatars. It is mutated exclusively via
//! [`apply`] and observed via the [`query`] module.

use std::{collections::BTreeMap, time::Duration};

use blastgrid_core::{
    BombId, BombPlacementError, BombSource, Command, Direction, Event, LevelLayout, LevelTile,
    PlayerId, Position, RewardKind, SegmentId, TileCoord, Tuning,
};

mod bombs;
mod destructibles;
mod players;
mod schedule;

use bombs::{Bomb, BombInput};
use destructibles::{Destructible, Destruction};
use players::Player;
use schedule::Schedule;

/// Work the world performs once simulated time reaches a deadline.
#[derive(Clone, Debug, PartialEq, Eq)]
enum Timer {
    BombFuse(BombId),
    DestructionComplete(TileCoord),
    SegmentExpires(SegmentId),
    ImmunityEnds(PlayerId),
}

#[derive(Clone, Copy, Debug)]
struct Segment {
    tile: TileCoord,
    direction: Option<Direction>,
    force: u32,
    born: Duration,
}

/// Represents the authoritative Blastgrid world state of a single peer.
#[derive(Debug)]
pub struct World {
    tuning: Tuning,
    layout: LevelLayout,
    destructibles: BTreeMap<TileCoord, Destructible>,
    rewards: BTreeMap<TileCoord, RewardKind>,
    bombs: BTreeMap<BombId, Bomb>,
    segments: BTreeMap<SegmentId, Segment>,
    players: BTreeMap<PlayerId, Player>,
    local_player: Option<PlayerId>,
    schedule: Schedule<Timer>,
    next_bomb: u32,
    next_segment: u32,
}

impl World {
    /// Creates an empty world governed by the provided tuning.
    ///
    /// The grid starts as a single floor tile; submit
    /// [`Command::LoadLevel`] to install a real layout.
    #[must_use]
    pub fn new(tuning: Tuning) -> Self {
        Self {
            tuning,
            layout: LevelLayout::open(1, 1),
            destructibles: BTreeMap::new(),
            rewards: BTreeMap::new(),
            bombs: BTreeMap::new(),
            segments: BTreeMap::new(),
            players: BTreeMap::new(),
            local_player: None,
            schedule: Schedule::new(),
            next_bomb: 0,
            next_segment: 0,
        }
    }

    fn load(&mut self, layout: LevelLayout) {
        self.destructibles = layout
            .iter()
            .filter_map(|(tile, content)| match content {
                LevelTile::Destructible(policy) => Some((tile, Destructible::new(policy))),
                LevelTile::Floor | LevelTile::Wall => None,
            })
            .collect();
        self.layout = layout;
        self.rewards.clear();
        self.bombs.clear();
        self.segments.clear();
        self.players.clear();
        self.local_player = None;
        self.schedule.clear();
        self.next_bomb = 0;
        self.next_segment = 0;
    }

    fn tile_of(&self, player: &Player) -> Option<TileCoord> {
        player.position.to_tile(self.tuning.tile_size)
    }

    fn is_solid(&self, tile: TileCoord) -> bool {
        matches!(self.layout.tile(tile), Some(LevelTile::Wall))
            || self.destructibles.contains_key(&tile)
    }

    fn bomb_on(&self, tile: TileCoord) -> bool {
        self.bombs.values().any(|bomb| bomb.tile == tile)
    }

    fn lethal_segment_on(&self, tile: TileCoord) -> bool {
        let now = self.schedule.now();
        let window = self.tuning.explosion_lethal();
        self.segments
            .values()
            .any(|segment| segment.tile == tile && now.saturating_sub(segment.born) < window)
    }

    fn place_bomb(
        &mut self,
        owner: PlayerId,
        tile: TileCoord,
        force: u32,
        source: BombSource,
        out_events: &mut Vec<Event>,
    ) {
        let rejection = match self.players.get(&owner) {
            None => Some(BombPlacementError::UnknownPlayer),
            Some(_) if self.layout.tile(tile).is_none() => Some(BombPlacementError::OutOfBounds),
            Some(_) if self.is_solid(tile) => Some(BombPlacementError::Blocked),
            Some(_) if self.bomb_on(tile) => Some(BombPlacementError::TileOccupied),
            Some(player)
                if source == BombSource::Local && player.current_bombs >= player.max_bombs =>
            {
                Some(BombPlacementError::CapacityReached)
            }
            Some(_) => None,
        };
        if let Some(reason) = rejection {
            out_events.push(Event::BombPlacementRejected {
                owner,
                tile,
                reason,
            });
            return;
        }

        let id = BombId::new(self.next_bomb);
        self.next_bomb = self.next_bomb.wrapping_add(1);

        let mut bomb = Bomb::place(owner.clone(), tile, force);
        if bomb.fire(BombInput::Arm) {
            self.schedule.after(self.tuning.bomb_fuse(), Timer::BombFuse(id));
        }
        let _ = self.bombs.insert(id, bomb);
        if let Some(player) = self.players.get_mut(&owner) {
            player.current_bombs = player.current_bombs.saturating_add(1);
        }

        out_events.push(Event::BombPlaced {
            bomb: id,
            owner,
            tile,
            force,
            source,
        });
    }

    fn detonate(&mut self, id: BombId, out_events: &mut Vec<Event>) {
        let Some(mut bomb) = self.bombs.remove(&id) else {
            return;
        };
        if !bomb.fire(BombInput::Detonate) {
            let _ = self.bombs.insert(id, bomb);
            return;
        }
        if let Some(owner) = self.players.get_mut(&bomb.owner) {
            owner.current_bombs = owner.current_bombs.saturating_sub(1);
        }
        out_events.push(Event::BombDetonated {
            bomb: id,
            owner: bomb.owner,
            tile: bomb.tile,
            force: bomb.force,
        });
    }

    fn spawn_segment(
        &mut self,
        tile: TileCoord,
        direction: Option<Direction>,
        force: u32,
        out_events: &mut Vec<Event>,
    ) {
        if matches!(self.layout.tile(tile), None | Some(LevelTile::Wall)) {
            return;
        }

        let id = SegmentId::new(self.next_segment);
        self.next_segment = self.next_segment.wrapping_add(1);
        let _ = self.segments.insert(
            id,
            Segment {
                tile,
                direction,
                force,
                born: self.schedule.now(),
            },
        );
        self.schedule
            .after(self.tuning.explosion_lifetime(), Timer::SegmentExpires(id));
        out_events.push(Event::ExplosionSpawned {
            segment: id,
            tile,
            direction,
            force,
        });

        self.damage_local_on(tile, out_events);
    }

    fn damage_local_on(&mut self, tile: TileCoord, out_events: &mut Vec<Event>) {
        let Some(id) = self.local_player.clone() else {
            return;
        };
        let until = self.schedule.now().saturating_add(self.tuning.immunity());
        let on_tile = self
            .players
            .get(&id)
            .is_some_and(|player| !player.immune && self.tile_of(player) == Some(tile));
        if !on_tile {
            return;
        }

        let Some(player) = self.players.get_mut(&id) else {
            return;
        };
        let lives = player.hit(&self.tuning, until);
        out_events.push(Event::PlayerDamaged {
            player: id.clone(),
            lives,
        });

        if lives == 0 {
            out_events.push(Event::PlayerDied { player: id.clone() });
            self.remove_player(id, out_events);
        } else {
            self.schedule
                .after(self.tuning.immunity(), Timer::ImmunityEnds(id));
        }
    }

    fn begin_destruction(&mut self, tile: TileCoord, out_events: &mut Vec<Event>) {
        let Some(destructible) = self.destructibles.get_mut(&tile) else {
            return;
        };
        let policy = destructible.policy;
        match destructible.begin() {
            Destruction::Ignored => {}
            Destruction::Animating => {
                out_events.push(Event::DestructionBegan { tile, policy });
                self.schedule
                    .after(self.tuning.destruction(), Timer::DestructionComplete(tile));
            }
            Destruction::Immediate => {
                let _ = self.destructibles.remove(&tile);
                out_events.push(Event::DestructionBegan { tile, policy });
                out_events.push(Event::DestructibleDestroyed { tile, policy });
            }
        }
    }

    fn collect_reward(&mut self, id: &PlayerId, out_events: &mut Vec<Event>) {
        let Some(player) = self.players.get(id) else {
            return;
        };
        let Some(tile) = self.tile_of(player) else {
            return;
        };
        let Some(kind) = self.rewards.remove(&tile) else {
            return;
        };
        let delta = kind.delta(&self.tuning);
        if let Some(player) = self.players.get_mut(id) {
            if player.local {
                player.collect(delta);
            }
        }
        out_events.push(Event::RewardCollected {
            player: id.clone(),
            tile,
            kind,
        });
    }

    fn remove_player(&mut self, id: PlayerId, out_events: &mut Vec<Event>) {
        if self.players.remove(&id).is_none() {
            out_events.push(Event::UnknownPlayer { player: id });
            return;
        }
        if self.local_player.as_ref() == Some(&id) {
            self.local_player = None;
        }
        out_events.push(Event::PlayerRemoved { player: id });
    }

    fn fire_timer(&mut self, timer: Timer, out_events: &mut Vec<Event>) {
        match timer {
            Timer::BombFuse(bomb) => self.detonate(bomb, out_events),
            Timer::DestructionComplete(tile) => {
                if let Some(destructible) = self.destructibles.remove(&tile) {
                    out_events.push(Event::DestructibleDestroyed {
                        tile,
                        policy: destructible.policy,
                    });
                }
            }
            Timer::SegmentExpires(segment) => {
                if let Some(expired) = self.segments.remove(&segment) {
                    out_events.push(Event::ExplosionExpired {
                        segment,
                        tile: expired.tile,
                    });
                }
            }
            Timer::ImmunityEnds(player) => {
                let now = self.schedule.now();
                let ended = self
                    .players
                    .get_mut(&player)
                    .is_some_and(|avatar| avatar.expire_immunity(now));
                if ended {
                    out_events.push(Event::ImmunityEnded { player });
                }
            }
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(Tuning::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::LoadLevel { layout } => {
            let (columns, rows) = (layout.columns(), layout.rows());
            world.load(layout);
            out_events.push(Event::LevelLoaded { columns, rows });
        }
        Command::Tick { dt } => {
            out_events.push(Event::TimeAdvanced { dt });
            for timer in world.schedule.advance(dt) {
                world.fire_timer(timer, out_events);
            }
        }
        Command::SpawnPlayer {
            player,
            tile,
            color,
            local,
        } => {
            let position = Position::from_tile(tile, world.tuning.tile_size);
            let until = world.schedule.now().saturating_add(world.tuning.immunity());
            let avatar = Player::spawn(&world.tuning, color, local, position, until);
            let _ = world.players.insert(player.clone(), avatar);
            if local {
                world.local_player = Some(player.clone());
                world
                    .schedule
                    .after(world.tuning.immunity(), Timer::ImmunityEnds(player.clone()));
            }
            out_events.push(Event::PlayerSpawned {
                player,
                tile,
                local,
            });
        }
        Command::MovePlayer { player, position } => {
            let Some(avatar) = world.players.get_mut(&player) else {
                out_events.push(Event::UnknownPlayer { player });
                return;
            };
            avatar.position = position;
            let local = avatar.local;
            world.collect_reward(&player, out_events);
            if local {
                if let Some(tile) = position.to_tile(world.tuning.tile_size) {
                    if world.lethal_segment_on(tile) {
                        world.damage_local_on(tile, out_events);
                    }
                }
            }
        }
        Command::PlaceBomb {
            owner,
            tile,
            force,
            source,
        } => world.place_bomb(owner, tile, force, source, out_events),
        Command::DetonateBomb { bomb } => world.detonate(bomb, out_events),
        Command::SpawnExplosion {
            tile,
            direction,
            force,
        } => world.spawn_segment(tile, direction, force, out_events),
        Command::BeginDestruction { tile } => world.begin_destruction(tile, out_events),
        Command::SpawnReward { tile, kind } => {
            let free = world.layout.tile(tile).is_some() && !world.is_solid(tile);
            if free && !world.rewards.contains_key(&tile) {
                let _ = world.rewards.insert(tile, kind);
                out_events.push(Event::RewardSpawned { tile, kind });
            }
        }
        Command::MirrorAttributes { player, attributes } => {
            let Some(avatar) = world.players.get_mut(&player) else {
                out_events.push(Event::UnknownPlayer { player });
                return;
            };
            if avatar.local {
                return;
            }
            avatar.mirror(&attributes);
            world.collect_reward(&player, out_events);
            out_events.push(Event::AttributesMirrored { player });
        }
        Command::RemovePlayer { player } => world.remove_player(player, out_events),
    }
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use std::time::Duration;

    use blastgrid_core::{
        BombId, DestructiblePolicy, DestructionState, Direction, GridIndex, LevelTile, Occupant,
        PlayerAttributes, PlayerId, RewardKind, SegmentId, SegmentShape, TileCoord, Tuning,
    };

    use super::{bombs::BombPhase, World};

    /// Tuning the world was created with.
    #[must_use]
    pub fn tuning(world: &World) -> &Tuning {
        &world.tuning
    }

    /// Columns and rows of the installed layout.
    #[must_use]
    pub fn dimensions(world: &World) -> (u32, u32) {
        (world.layout.columns(), world.layout.rows())
    }

    /// Simulated time elapsed since the world was created.
    #[must_use]
    pub fn elapsed(world: &World) -> Duration {
        world.schedule.now()
    }

    /// Exposes the world as a read-only [`GridIndex`].
    #[must_use]
    pub fn grid(world: &World) -> GridView<'_> {
        GridView { world }
    }

    /// Identity of the avatar owned by this peer, if it is alive.
    #[must_use]
    pub fn local_player(world: &World) -> Option<&PlayerId> {
        world.local_player.as_ref()
    }

    /// Captures a snapshot of one player.
    #[must_use]
    pub fn player(world: &World, id: &PlayerId) -> Option<PlayerSnapshot> {
        world.players.get(id).map(|player| PlayerSnapshot {
            id: id.clone(),
            color: player.color.clone(),
            local: player.local,
            tile: world.tile_of(player),
            attributes: player.attributes(),
            max_bombs: player.max_bombs,
            current_bombs: player.current_bombs,
        })
    }

    /// Captures snapshots of every player ordered by identity.
    #[must_use]
    pub fn players(world: &World) -> Vec<PlayerSnapshot> {
        world
            .players
            .keys()
            .filter_map(|id| player(world, id))
            .collect()
    }

    /// Attribute snapshot of one player.
    #[must_use]
    pub fn attributes(world: &World, id: &PlayerId) -> Option<PlayerAttributes> {
        world.players.get(id).map(|player| player.attributes())
    }

    /// Live bombs ordered by identifier.
    #[must_use]
    pub fn bombs(world: &World) -> Vec<BombSnapshot> {
        world
            .bombs
            .iter()
            .map(|(id, bomb)| BombSnapshot {
                id: *id,
                owner: bomb.owner.clone(),
                tile: bomb.tile,
                force: bomb.force,
                armed: bomb.phase == BombPhase::Armed,
            })
            .collect()
    }

    /// Live explosion segments ordered by identifier.
    #[must_use]
    pub fn segments(world: &World) -> Vec<SegmentSnapshot> {
        let now = world.schedule.now();
        let window = world.tuning.explosion_lethal();
        world
            .segments
            .iter()
            .map(|(id, segment)| SegmentSnapshot {
                id: *id,
                tile: segment.tile,
                direction: segment.direction,
                force: segment.force,
                shape: SegmentShape::of(segment.direction, segment.force),
                lethal: now.saturating_sub(segment.born) < window,
            })
            .collect()
    }

    /// Destructibles still on the grid, ordered by column and then by row.
    #[must_use]
    pub fn destructibles(world: &World) -> Vec<(TileCoord, DestructiblePolicy, DestructionState)> {
        world
            .destructibles
            .iter()
            .map(|(tile, destructible)| (*tile, destructible.policy, destructible.state))
            .collect()
    }

    /// Uncollected rewards in tile order.
    #[must_use]
    pub fn rewards(world: &World) -> Vec<(TileCoord, RewardKind)> {
        world
            .rewards
            .iter()
            .map(|(tile, kind)| (*tile, *kind))
            .collect()
    }

    /// Read-only snapshot of a player avatar.
    #[derive(Clone, Debug, PartialEq)]
    pub struct PlayerSnapshot {
        /// Identity of the player.
        pub id: PlayerId,
        /// Color assigned by the lobby.
        pub color: String,
        /// Whether the avatar is owned by this peer.
        pub local: bool,
        /// Tile the avatar's position snaps to, if any.
        pub tile: Option<TileCoord>,
        /// Mirrored or simulated attributes.
        pub attributes: PlayerAttributes,
        /// Maximum concurrent bombs.
        pub max_bombs: u32,
        /// Bombs currently on the grid.
        pub current_bombs: u32,
    }

    /// Read-only snapshot of a live bomb.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct BombSnapshot {
        /// Identifier of the bomb.
        pub id: BombId,
        /// Player owning the bomb.
        pub owner: PlayerId,
        /// Tile holding the bomb.
        pub tile: TileCoord,
        /// Force recorded at placement.
        pub force: u32,
        /// Whether the fuse is running.
        pub armed: bool,
    }

    /// Read-only snapshot of an explosion segment.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct SegmentSnapshot {
        /// Identifier of the segment.
        pub id: SegmentId,
        /// Tile the segment occupies.
        pub tile: TileCoord,
        /// Propagation direction, `None` for the origin.
        pub direction: Option<Direction>,
        /// Remaining force.
        pub force: u32,
        /// Visual shape derived from direction and force.
        pub shape: SegmentShape,
        /// Whether the segment still hurts players.
        pub lethal: bool,
    }

    /// Grid Index view over a world.
    #[derive(Clone, Copy, Debug)]
    pub struct GridView<'a> {
        world: &'a World,
    }

    impl GridIndex for GridView<'_> {
        fn contains(&self, tile: TileCoord) -> bool {
            self.world.layout.tile(tile).is_some()
        }

        fn occupants(&self, tile: TileCoord) -> Vec<Occupant> {
            let world = self.world;
            let mut occupants = Vec::new();
            if matches!(world.layout.tile(tile), Some(LevelTile::Wall)) {
                occupants.push(Occupant::Wall);
            }
            if let Some(destructible) = world.destructibles.get(&tile) {
                occupants.push(Occupant::Destructible {
                    policy: destructible.policy,
                    state: destructible.state,
                });
            }
            occupants.extend(
                world
                    .bombs
                    .iter()
                    .filter(|(_, bomb)| bomb.tile == tile)
                    .map(|(id, _)| Occupant::Bomb(*id)),
            );
            occupants.extend(
                world
                    .segments
                    .iter()
                    .filter(|(_, segment)| segment.tile == tile)
                    .map(|(id, _)| Occupant::Explosion(*id)),
            );
            if let Some(kind) = world.rewards.get(&tile) {
                occupants.push(Occupant::Reward(*kind));
            }
            occupants.extend(
                world
                    .players
                    .iter()
                    .filter(|(_, player)| world.tile_of(player) == Some(tile))
                    .map(|(id, _)| Occupant::Player(id.clone())),
            );
            occupants
        }
    }
}
