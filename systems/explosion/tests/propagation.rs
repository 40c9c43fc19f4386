use std::{
    collections::{hash_map::DefaultHasher, BTreeSet},
    hash::{Hash, Hasher},
    time::Duration,
};

use blastgrid_core::{
    BombSource, Command, DestructiblePolicy, Direction, Event, LevelLayout, PlayerId,
    SegmentShape, TileCoord,
};
use blastgrid_system_explosion::Explosion;
use blastgrid_world::{apply, query, World};

/// Each direction carries `force - 1` onward from the origin, so force 2
/// reaches two tiles per arm: 8 arm segments plus the origin.
#[test]
fn force_two_on_open_grid_fills_a_cross() {
    let mut world = open_world(11, 11);
    let origin = TileCoord::new(5, 5);
    let events = detonate_at(&mut world, origin, 2);

    let segments = spawned_segments(&events);
    assert_eq!(segments.len(), 9, "origin plus two tiles in each of four directions");
    assert!(segments.contains(&(origin, None, 2)));
    for direction in Direction::ALL {
        let near = step(origin, direction, 1);
        let far = step(origin, direction, 2);
        assert!(segments.contains(&(near, Some(direction), 1)), "{direction:?} near");
        assert!(segments.contains(&(far, Some(direction), 0)), "{direction:?} far");
        assert!(!segments.iter().any(|(tile, _, _)| *tile == step(origin, direction, 3)));
    }

    let terminal: Vec<_> = query::segments(&world)
        .into_iter()
        .filter(|segment| segment.shape == SegmentShape::Point)
        .collect();
    assert_eq!(terminal.len(), 4, "one terminal point per direction");
}

#[test]
fn single_direction_chain_counts_down_to_zero() {
    let mut world = open_world(9, 3);
    let mut explosion = Explosion::new();
    let start = TileCoord::new(1, 1);
    let events = cascade(
        &mut world,
        &mut explosion,
        vec![Command::SpawnExplosion {
            tile: start,
            direction: Some(Direction::Right),
            force: 3,
        }],
    );

    let forces: Vec<u32> = spawned_segments(&events)
        .into_iter()
        .map(|(_, _, force)| force)
        .collect();
    assert_eq!(forces, vec![3, 2, 1, 0], "F + 1 segments along the chain");
}

#[test]
fn wall_truncates_the_chain() {
    let mut world = world_from(&[
        "       ",
        "   =   ",
        "       ",
        "       ",
        "       ",
    ]);
    let origin = TileCoord::new(3, 3);
    let events = detonate_at(&mut world, origin, 3);
    let tiles: BTreeSet<TileCoord> = spawned_segments(&events)
        .into_iter()
        .map(|(tile, _, _)| tile)
        .collect();

    assert!(tiles.contains(&TileCoord::new(3, 2)));
    assert!(!tiles.contains(&TileCoord::new(3, 1)), "wall stops the blast");
    assert!(!tiles.contains(&TileCoord::new(3, 0)), "nothing behind the wall");
    assert!(tiles.contains(&TileCoord::new(6, 3)), "other directions keep full range");
}

#[test]
fn crate_truncates_the_chain_and_is_destroyed_once() {
    let mut world = world_from(&[
        "       ",
        "       ",
        "       ",
        "  +    ",
        "       ",
        "       ",
        "       ",
    ]);
    let crate_tile = TileCoord::new(2, 3);
    let events = detonate_at(&mut world, TileCoord::new(4, 3), 3);

    let tiles: BTreeSet<TileCoord> = spawned_segments(&events)
        .into_iter()
        .map(|(tile, _, _)| tile)
        .collect();
    assert!(tiles.contains(&TileCoord::new(3, 3)));
    assert!(!tiles.contains(&crate_tile), "crate absorbs the blast");
    assert!(!tiles.contains(&TileCoord::new(1, 3)));
    assert_eq!(began(&events, crate_tile), 1);

    let second = detonate_at(&mut world, TileCoord::new(2, 5), 3);
    assert_eq!(began(&second, crate_tile), 0, "destroying crates begin only once");
    assert!(!spawned_segments(&second)
        .iter()
        .any(|(tile, _, _)| *tile == TileCoord::new(2, 2)),
        "destroying crate still blocks");

    let mut explosion = Explosion::new();
    let done = cascade(
        &mut world,
        &mut explosion,
        vec![Command::Tick {
            dt: Duration::from_secs(1),
        }],
    );
    assert!(done.contains(&Event::DestructibleDestroyed {
        tile: crate_tile,
        policy: DestructiblePolicy::CRATE
    }));
}

#[test]
fn brush_burns_and_the_blast_continues() {
    let mut world = world_from(&["       ", "  ~    ", "       "]);
    let events = detonate_at(&mut world, TileCoord::new(4, 1), 3);
    let tiles: BTreeSet<TileCoord> = spawned_segments(&events)
        .into_iter()
        .map(|(tile, _, _)| tile)
        .collect();

    assert!(tiles.contains(&TileCoord::new(2, 1)));
    assert!(tiles.contains(&TileCoord::new(1, 1)), "blast passes through brush");
    assert!(events.contains(&Event::DestructibleDestroyed {
        tile: TileCoord::new(2, 1),
        policy: DestructiblePolicy::BRUSH
    }));
}

#[test]
fn grid_edges_block_like_walls() {
    let mut world = open_world(3, 3);
    let events = detonate_at(&mut world, TileCoord::new(0, 0), 2);
    let tiles: BTreeSet<TileCoord> = spawned_segments(&events)
        .into_iter()
        .map(|(tile, _, _)| tile)
        .collect();
    let expected: BTreeSet<TileCoord> = [
        TileCoord::new(0, 0),
        TileCoord::new(1, 0),
        TileCoord::new(2, 0),
        TileCoord::new(0, 1),
        TileCoord::new(0, 2),
    ]
    .into_iter()
    .collect();
    assert_eq!(tiles, expected);
}

#[test]
fn blast_detonates_bombs_in_its_path() {
    let mut world = open_world(9, 3);
    let owner = PlayerId::new("remote");
    let mut explosion = Explosion::new();
    let _ = cascade(
        &mut world,
        &mut explosion,
        vec![
            spawn_remote(&owner, TileCoord::new(0, 0)),
            place(&owner, TileCoord::new(2, 1), 2),
            place(&owner, TileCoord::new(4, 1), 2),
        ],
    );
    let first = query::bombs(&world)[0].id;

    let events = cascade(&mut world, &mut explosion, vec![Command::DetonateBomb { bomb: first }]);
    let detonations = events
        .iter()
        .filter(|event| matches!(event, Event::BombDetonated { .. }))
        .count();
    assert_eq!(detonations, 2, "second bomb chains");
    assert!(query::bombs(&world).is_empty());
    assert!(spawned_segments(&events).contains(&(TileCoord::new(6, 1), Some(Direction::Right), 0)));
}

#[test]
fn deterministic_replay_matches_between_runs() {
    let first = replay();
    let second = replay();
    assert_eq!(first, second, "replay diverged between runs");
}

fn replay() -> u64 {
    let mut world = world_from(&[
        "===========",
        "=   + ~   =",
        "= = = = = =",
        "=  ++ ~+  =",
        "===========",
    ]);
    let owner = PlayerId::new("remote");
    let mut explosion = Explosion::new();
    let mut log = cascade(
        &mut world,
        &mut explosion,
        vec![
            spawn_remote(&owner, TileCoord::new(1, 1)),
            place(&owner, TileCoord::new(3, 1), 2),
            place(&owner, TileCoord::new(2, 3), 3),
            place(&owner, TileCoord::new(8, 3), 2),
        ],
    );
    for _ in 0..10 {
        log.extend(cascade(
            &mut world,
            &mut explosion,
            vec![Command::Tick {
                dt: Duration::from_millis(250),
            }],
        ));
    }

    let mut hasher = DefaultHasher::new();
    for event in &log {
        format!("{event:?}").hash(&mut hasher);
    }
    format!("{:?}", query::destructibles(&world)).hash(&mut hasher);
    hasher.finish()
}

fn detonate_at(world: &mut World, tile: TileCoord, force: u32) -> Vec<Event> {
    let mut explosion = Explosion::new();
    cascade(
        world,
        &mut explosion,
        vec![Command::SpawnExplosion {
            tile,
            direction: None,
            force,
        }],
    )
}

fn cascade(world: &mut World, explosion: &mut Explosion, commands: Vec<Command>) -> Vec<Event> {
    let mut log = Vec::new();
    let mut pending = commands;
    while !pending.is_empty() {
        let mut events = Vec::new();
        for command in pending.drain(..) {
            apply(world, command, &mut events);
        }
        explosion.handle(&events, &query::grid(world), &mut pending);
        for event in &events {
            if let Event::BombDetonated { tile, force, .. } = event {
                pending.push(Command::SpawnExplosion {
                    tile: *tile,
                    direction: None,
                    force: *force,
                });
            }
        }
        log.extend(events);
    }
    log
}

fn spawned_segments(events: &[Event]) -> Vec<(TileCoord, Option<Direction>, u32)> {
    events
        .iter()
        .filter_map(|event| match event {
            Event::ExplosionSpawned {
                tile,
                direction,
                force,
                ..
            } => Some((*tile, *direction, *force)),
            _ => None,
        })
        .collect()
}

fn began(events: &[Event], tile: TileCoord) -> usize {
    events
        .iter()
        .filter(|event| matches!(event, Event::DestructionBegan { tile: began, .. } if *began == tile))
        .count()
}

fn step(origin: TileCoord, direction: Direction, distance: u32) -> TileCoord {
    (0..distance).fold(origin, |tile, _| tile.neighbor(direction).expect("inside grid"))
}

fn spawn_remote(player: &PlayerId, tile: TileCoord) -> Command {
    Command::SpawnPlayer {
        player: player.clone(),
        tile,
        color: "#FFD700".to_owned(),
        local: false,
    }
}

fn place(owner: &PlayerId, tile: TileCoord, force: u32) -> Command {
    Command::PlaceBomb {
        owner: owner.clone(),
        tile,
        force,
        source: BombSource::Remote,
    }
}

fn open_world(columns: u32, rows: u32) -> World {
    let mut world = World::default();
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::LoadLevel {
            layout: LevelLayout::open(columns, rows),
        },
        &mut events,
    );
    world
}

fn world_from(lines: &[&str]) -> World {
    let layout = LevelLayout::parse(lines).expect("layout parses");
    let mut world = World::default();
    let mut events = Vec::new();
    apply(&mut world, Command::LoadLevel { layout }, &mut events);
    world
}
