use blastgrid_core::{Command, Event, LevelLayout, PlayerAttributes, PlayerId, Position, TileCoord};
use blastgrid_protocol::AttributesMessage;
use blastgrid_system_attribute_sync::merge_remote;
use blastgrid_system_sequence_gate::SequenceGate;
use blastgrid_world::{apply, query, World};

#[test]
fn stale_attribute_message_does_not_overwrite_newer_mirror() {
    let mut world = world_with_remote("bob");
    let bob = PlayerId::new("bob");
    let mut gate = SequenceGate::new();

    let newer = AttributesMessage::new(attributes(2, 3), 7);
    let older = AttributesMessage::new(attributes(3, 1), 5);

    let mut commands = Vec::new();
    assert!(merge_remote(&mut gate, bob.clone(), &newer, &mut commands));
    assert!(!merge_remote(&mut gate, bob.clone(), &older, &mut commands));
    assert_eq!(commands.len(), 1, "count=5 after count=7 is rejected");

    let events = apply_all(&mut world, commands);
    assert!(events.contains(&Event::AttributesMirrored {
        player: bob.clone()
    }));

    let mirrored = query::attributes(&world, &bob).expect("bob is mirrored");
    assert_eq!(mirrored, attributes(2, 3));
}

#[test]
fn topics_are_gated_independently_per_player() {
    let mut gate = SequenceGate::new();
    let mut commands = Vec::new();
    let message = AttributesMessage::new(attributes(3, 1), 1);

    assert!(merge_remote(&mut gate, PlayerId::new("a"), &message, &mut commands));
    assert!(merge_remote(&mut gate, PlayerId::new("b"), &message, &mut commands));
    assert!(!merge_remote(&mut gate, PlayerId::new("a"), &message, &mut commands));
    assert_eq!(commands.len(), 2);
}

#[test]
fn mirrors_for_unknown_players_are_reported() {
    let mut world = world_with_remote("bob");
    let mut gate = SequenceGate::new();
    let mut commands = Vec::new();
    let message = AttributesMessage::new(attributes(3, 1), 1);
    assert!(merge_remote(&mut gate, PlayerId::new("carol"), &message, &mut commands));

    let events = apply_all(&mut world, commands);
    assert_eq!(
        events,
        vec![Event::UnknownPlayer {
            player: PlayerId::new("carol")
        }]
    );
}

fn world_with_remote(id: &str) -> World {
    let mut world = World::default();
    let _ = apply_all(
        &mut world,
        vec![
            Command::LoadLevel {
                layout: LevelLayout::open(6, 6),
            },
            Command::SpawnPlayer {
                player: PlayerId::new(id),
                tile: TileCoord::new(1, 1),
                color: "#32CD32".to_owned(),
                local: false,
            },
        ],
    );
    world
}

fn attributes(lives: u32, column: u32) -> PlayerAttributes {
    PlayerAttributes {
        immune: false,
        lives,
        speed: 2.6,
        cur_speed: 2.6,
        force: 2,
        position: Position::from_tile(TileCoord::new(column, 1), 64.0),
    }
}

fn apply_all(world: &mut World, commands: Vec<Command>) -> Vec<Event> {
    let mut events = Vec::new();
    for command in commands {
        apply(world, command, &mut events);
    }
    events
}
