use std::time::Duration;

use blastgrid_core::{BombSource, Command, Event, LevelLayout, PlayerId, TileCoord};
use blastgrid_protocol::BombMessage;
use blastgrid_system_bomb_lifecycle::{BombBroadcast, BombLifecycle, DropRequest};
use blastgrid_system_sequence_gate::{SequenceCounter, SequenceGate};
use blastgrid_world::{apply, query, World};

#[test]
fn local_drop_is_broadcast_and_detonation_hands_off() {
    let me = PlayerId::new("me");
    let mut world = world_with(&me, true);
    let mut system = BombLifecycle::new(query::tuning(&world).tile_size);
    let mut counter = SequenceCounter::new();

    let mut commands = Vec::new();
    assert!(system.request_drop(drop_request(&world, &me), &query::grid(&world), &mut commands));
    let events = apply_all(&mut world, commands);

    let mut commands = Vec::new();
    let mut broadcasts = Vec::new();
    system.handle(&events, &mut counter, &mut commands, &mut broadcasts);
    assert!(commands.is_empty());
    assert_eq!(
        broadcasts,
        vec![BombBroadcast {
            owner: me.clone(),
            message: BombMessage::new(TileCoord::new(1, 1), 1, 64.0, 1),
        }]
    );

    let mut refused = Vec::new();
    assert!(
        !system.request_drop(drop_request(&world, &me), &query::grid(&world), &mut refused),
        "capacity of one is already used"
    );
    assert!(refused.is_empty());

    let events = apply_all(
        &mut world,
        vec![Command::Tick {
            dt: Duration::from_secs(2),
        }],
    );
    let mut commands = Vec::new();
    let mut broadcasts = Vec::new();
    system.handle(&events, &mut counter, &mut commands, &mut broadcasts);
    assert_eq!(
        commands,
        vec![Command::SpawnExplosion {
            tile: TileCoord::new(1, 1),
            direction: None,
            force: 1,
        }]
    );
    assert!(broadcasts.is_empty());
    assert_eq!(drop_request(&world, &me).current_bombs, 0);
}

#[test]
fn remote_placement_is_mirrored_once() {
    let them = PlayerId::new("them");
    let mut world = world_with(&them, false);
    let system = BombLifecycle::new(64.0);
    let mut gate = SequenceGate::new();
    let message = BombMessage::new(TileCoord::new(3, 2), 2, 64.0, 1);

    let mut commands = Vec::new();
    assert!(system.merge_remote(&mut gate, them.clone(), &message, &mut commands));
    assert!(!system.merge_remote(&mut gate, them.clone(), &message, &mut commands));
    assert_eq!(commands.len(), 1, "duplicate delivery is dropped");

    let events = apply_all(&mut world, commands);
    assert!(matches!(
        events.as_slice(),
        [Event::BombPlaced { source: BombSource::Remote, force: 2, .. }]
    ));
    assert_eq!(query::bombs(&world)[0].tile, TileCoord::new(3, 2));
}

#[test]
fn malformed_remote_position_does_not_consume_a_sequence() {
    let them = PlayerId::new("them");
    let system = BombLifecycle::new(64.0);
    let mut gate = SequenceGate::new();
    let mut broken = BombMessage::new(TileCoord::new(1, 1), 1, 64.0, 9);
    broken.position.x = -500.0;

    let mut commands = Vec::new();
    assert!(!system.merge_remote(&mut gate, them.clone(), &broken, &mut commands));
    assert!(commands.is_empty());

    let valid = BombMessage::new(TileCoord::new(1, 1), 1, 64.0, 2);
    assert!(system.merge_remote(&mut gate, them, &valid, &mut commands));
}

fn world_with(player: &PlayerId, local: bool) -> World {
    let mut world = World::default();
    let _ = apply_all(
        &mut world,
        vec![
            Command::LoadLevel {
                layout: LevelLayout::open(6, 6),
            },
            Command::SpawnPlayer {
                player: player.clone(),
                tile: TileCoord::new(1, 1),
                color: "#FF8C00".to_owned(),
                local,
            },
        ],
    );
    world
}

fn drop_request(world: &World, player: &PlayerId) -> DropRequest {
    let snapshot = query::player(world, player).expect("player exists");
    DropRequest {
        owner: snapshot.id,
        tile: snapshot.tile.expect("player stands on a tile"),
        force: snapshot.attributes.force,
        current_bombs: snapshot.current_bombs,
        max_bombs: snapshot.max_bombs,
    }
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        apply(world, command, &mut events);
    }
    events
}
