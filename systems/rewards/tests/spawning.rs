use std::{collections::BTreeMap, time::Duration};

use blastgrid_core::{
    Command, DestructiblePolicy, Event, LevelLayout, LevelTile, RewardKind, RewardWeights,
    TileCoord,
};
use blastgrid_system_rewards::{RewardSpawner, RewardTable};
use blastgrid_world::{apply, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

#[test]
fn kind_selection_converges_to_configured_weights() {
    let table = default_table();
    let mut rng = ChaCha8Rng::seed_from_u64(0xb0b);
    let trials = 100_000;
    let mut counts: BTreeMap<RewardKind, u32> = BTreeMap::new();
    for _ in 0..trials {
        *counts.entry(table.choose(rng.gen())).or_default() += 1;
    }

    let sum: f64 = table.entries().iter().map(|(_, weight)| weight).sum();
    assert!((sum - 1.0).abs() < 1e-9);
    for &(kind, weight) in table.entries() {
        let observed = f64::from(counts.get(&kind).copied().unwrap_or(0)) / f64::from(trials);
        assert!(
            (observed - weight).abs() < 0.01,
            "{kind:?}: observed {observed}, configured {weight}"
        );
    }
}

#[test]
fn spawn_probability_is_respected() {
    let mut spawner = RewardSpawner::new(0.5, default_table(), ChaCha8Rng::seed_from_u64(11));
    let events: Vec<Event> = (0..10_000)
        .map(|index| Event::DestructibleDestroyed {
            tile: TileCoord::new(index % 100, index / 100),
            policy: DestructiblePolicy::CRATE,
        })
        .collect();
    let mut out = Vec::new();
    spawner.handle(&events, &mut out);

    let ratio = out.len() as f64 / events.len() as f64;
    assert!((ratio - 0.5).abs() < 0.03, "spawn ratio {ratio}");
}

#[test]
fn suppressed_destructibles_never_spawn() {
    let mut spawner = RewardSpawner::new(1.0, default_table(), ChaCha8Rng::seed_from_u64(5));
    let mut out = Vec::new();
    spawner.handle(
        &[Event::DestructibleDestroyed {
            tile: TileCoord::new(2, 2),
            policy: DestructiblePolicy::BRUSH,
        }],
        &mut out,
    );
    assert!(out.is_empty());
}

#[test]
fn destroyed_crate_leaves_a_reward_on_its_tile() {
    let mut world = World::default();
    let crate_tile = TileCoord::new(2, 1);
    let layout = LevelLayout::open(5, 3)
        .with_tile(crate_tile, LevelTile::Destructible(DestructiblePolicy::CRATE));
    let mut spawner = RewardSpawner::new(1.0, default_table(), ChaCha8Rng::seed_from_u64(9));

    let mut events = Vec::new();
    apply(&mut world, Command::LoadLevel { layout }, &mut events);
    apply(
        &mut world,
        Command::BeginDestruction { tile: crate_tile },
        &mut events,
    );
    let mut commands = Vec::new();
    spawner.handle(&events, &mut commands);
    assert!(commands.is_empty(), "crate is still animating");

    let mut events = Vec::new();
    apply(
        &mut world,
        Command::Tick {
            dt: Duration::from_secs(1),
        },
        &mut events,
    );
    spawner.handle(&events, &mut commands);
    assert_eq!(commands.len(), 1);

    let mut events = Vec::new();
    for command in commands {
        apply(&mut world, command, &mut events);
    }
    let rewards = query::rewards(&world);
    assert_eq!(rewards.len(), 1);
    assert_eq!(rewards[0].0, crate_tile);
    assert_eq!(
        events,
        vec![Event::RewardSpawned {
            tile: crate_tile,
            kind: rewards[0].1
        }]
    );
}

#[test]
fn seeded_spawners_agree() {
    let events: Vec<Event> = (0..64)
        .map(|column| Event::DestructibleDestroyed {
            tile: TileCoord::new(column, 0),
            policy: DestructiblePolicy::CRATE,
        })
        .collect();
    let run = |seed: u64| {
        let mut spawner = RewardSpawner::new(0.5, default_table(), ChaCha8Rng::seed_from_u64(seed));
        let mut out = Vec::new();
        spawner.handle(&events, &mut out);
        out
    };
    assert_eq!(run(21), run(21));
}

fn default_table() -> RewardTable {
    RewardTable::from_weights(&RewardWeights::default()).expect("defaults are valid")
}
