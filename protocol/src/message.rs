//! JSON payloads carried on each topic.

use blastgrid_core::{PlayerAttributes, PlayerId, Position, TileCoord};
use serde::{Deserialize, Serialize};

/// Lobby readiness heartbeat published on `hub/player/{id}/ping`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PingMessage {
    /// Whether the player wants the match to start.
    pub is_ready: bool,
}

/// Assignment published on `game/start` for one participant.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameStartMessage {
    /// Participant the assignment belongs to.
    pub player_id: PlayerId,
    /// Start position index, resolved to a level corner by the peer.
    pub position: u32,
    /// Display color.
    pub color: String,
    /// Number of participants in the match.
    pub number_of_players: u32,
}

/// Full attribute broadcast published on `game/player/{id}/attributes`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttributesMessage {
    /// Whether the avatar ignores blast damage.
    #[serde(rename = "imune")]
    pub immune: bool,
    /// Remaining lives.
    pub lives: u32,
    /// Base movement speed.
    pub speed: f32,
    /// Effective movement speed.
    pub cur_speed: f32,
    /// Blast force.
    pub force: u32,
    /// World-space position.
    pub position: Position,
    /// Per-topic sequence number.
    pub count: u64,
}

impl AttributesMessage {
    /// Stamps an attribute snapshot with its sequence number.
    #[must_use]
    pub fn new(attributes: PlayerAttributes, count: u64) -> Self {
        Self {
            immune: attributes.immune,
            lives: attributes.lives,
            speed: attributes.speed,
            cur_speed: attributes.cur_speed,
            force: attributes.force,
            position: attributes.position,
            count,
        }
    }

    /// Attribute snapshot carried by the message.
    #[must_use]
    pub fn attributes(&self) -> PlayerAttributes {
        PlayerAttributes {
            immune: self.immune,
            lives: self.lives,
            speed: self.speed,
            cur_speed: self.cur_speed,
            force: self.force,
            position: self.position,
        }
    }
}

/// Bomb placement published on `game/player/{id}/bomb`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BombMessage {
    /// World-space position of the bomb's tile.
    pub position: Position,
    /// Bomb parameters.
    pub data: BombData,
    /// Per-topic sequence number.
    pub count: u64,
}

/// Parameters of a placed bomb.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BombData {
    /// Blast force recorded at placement.
    pub force: u32,
}

impl BombMessage {
    /// Describes a placement on `tile`.
    #[must_use]
    pub fn new(tile: TileCoord, force: u32, tile_size: f32, count: u64) -> Self {
        Self {
            position: Position::from_tile(tile, tile_size),
            data: BombData { force },
            count,
        }
    }

    /// Tile the bomb was placed on.
    #[must_use]
    pub fn tile(&self, tile_size: f32) -> Option<TileCoord> {
        self.position.to_tile(tile_size)
    }
}

/// Terminal removal notice published on `game/player/{id}/death`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeathMessage {
    /// Per-topic sequence number.
    pub count: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_fields_use_wire_names() {
        let message = AttributesMessage {
            immune: true,
            lives: 2,
            speed: 2.5,
            cur_speed: 1.25,
            force: 3,
            position: Position::new(64.0, 128.0),
            count: 7,
        };
        let value = serde_json::to_value(message).expect("serialises");
        assert_eq!(value["imune"], true);
        assert_eq!(value["curSpeed"], 1.25);
        assert_eq!(value["position"]["y"], 128.0);
        assert_eq!(value["count"], 7);
    }

    #[test]
    fn game_start_decodes_from_orchestrator_json() {
        let json = r##"{"playerId":"p1","position":2,"color":"#FFD700","numberOfPlayers":3}"##;
        let message: GameStartMessage = serde_json::from_str(json).expect("decodes");
        assert_eq!(message.player_id, PlayerId::new("p1"));
        assert_eq!(message.position, 2);
        assert_eq!(message.number_of_players, 3);
    }

    #[test]
    fn bomb_position_snaps_back_to_its_tile() {
        let message = BombMessage::new(TileCoord::new(4, 3), 2, 64.0, 1);
        let json = serde_json::to_string(&message).expect("serialises");
        assert!(json.contains(r#""data":{"force":2}"#), "{json}");
        let decoded: BombMessage = serde_json::from_str(&json).expect("decodes");
        assert_eq!(decoded.tile(64.0), Some(TileCoord::new(4, 3)));
    }
}
