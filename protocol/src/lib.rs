#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Wire contract of the Blastgrid message bus.
//!
//! Topics are plain strings with a player segment, payloads are JSON. The
//! crate decodes raw bus traffic into typed [`Inbound`] values, encodes
//! [`Outbound`] messages, and ships an in-process [`LocalBroker`] with
//! wildcard subscriptions for simulations and tests.

mod broker;
mod message;
mod topic;

use serde::{de::DeserializeOwned, Serialize};
use thiserror::Error;

use blastgrid_core::PlayerId;

pub use broker::{ClientId, Delivery, LocalBroker};
pub use message::{
    AttributesMessage, BombData, BombMessage, DeathMessage, GameStartMessage, PingMessage,
};
pub use topic::{topic_matches, Topic, TopicError, GAME_PLAYER_FILTER, GAME_START, PING_FILTER};

/// Errors raised while decoding bus traffic.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The topic string is not part of the contract.
    #[error(transparent)]
    Topic(#[from] TopicError),
    /// The payload does not match the topic's schema.
    #[error("malformed payload on `{topic}`: {source}")]
    Payload {
        /// Topic the payload arrived on.
        topic: String,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Decoded message received from the bus.
#[derive(Clone, Debug, PartialEq)]
pub enum Inbound {
    /// Lobby readiness heartbeat.
    Ping {
        /// Player sending the heartbeat.
        player: PlayerId,
        /// Heartbeat payload.
        message: PingMessage,
    },
    /// Match start assignment.
    GameStart(GameStartMessage),
    /// Attribute broadcast of a remote player.
    Attributes {
        /// Owner of the snapshot.
        player: PlayerId,
        /// Snapshot payload.
        message: AttributesMessage,
    },
    /// Bomb placement of a remote player.
    Bomb {
        /// Player that placed the bomb.
        player: PlayerId,
        /// Placement payload.
        message: BombMessage,
    },
    /// Death notice of a remote player.
    Death {
        /// Player that died.
        player: PlayerId,
        /// Notice payload.
        message: DeathMessage,
    },
}

impl Inbound {
    /// Decodes a raw bus message.
    pub fn decode(topic: &str, payload: &[u8]) -> Result<Self, DecodeError> {
        let parsed: Topic = topic.parse()?;
        Ok(match parsed {
            Topic::Ping { player } => Self::Ping {
                player,
                message: payload_of(topic, payload)?,
            },
            Topic::GameStart => Self::GameStart(payload_of(topic, payload)?),
            Topic::Attributes { player } => Self::Attributes {
                player,
                message: payload_of(topic, payload)?,
            },
            Topic::Bomb { player } => Self::Bomb {
                player,
                message: payload_of(topic, payload)?,
            },
            Topic::Death { player } => Self::Death {
                player,
                message: payload_of(topic, payload)?,
            },
        })
    }
}

fn payload_of<T: DeserializeOwned>(topic: &str, payload: &[u8]) -> Result<T, DecodeError> {
    serde_json::from_slice(payload).map_err(|source| DecodeError::Payload {
        topic: topic.to_owned(),
        source,
    })
}

/// Message ready to be published.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Outbound {
    /// Destination topic.
    pub topic: Topic,
    /// JSON-encoded payload.
    pub payload: Vec<u8>,
}

impl Outbound {
    /// Encodes `message` for `topic`.
    pub fn encode<T: Serialize>(topic: Topic, message: &T) -> Result<Self, serde_json::Error> {
        Ok(Self {
            topic,
            payload: serde_json::to_vec(message)?,
        })
    }

    /// Lobby heartbeat for `player`.
    pub fn ping(player: PlayerId, is_ready: bool) -> Result<Self, serde_json::Error> {
        Self::encode(Topic::Ping { player }, &PingMessage { is_ready })
    }

    /// Match start assignment.
    pub fn game_start(message: &GameStartMessage) -> Result<Self, serde_json::Error> {
        Self::encode(Topic::GameStart, message)
    }

    /// Attribute broadcast for `player`.
    pub fn attributes(
        player: PlayerId,
        message: &AttributesMessage,
    ) -> Result<Self, serde_json::Error> {
        Self::encode(Topic::Attributes { player }, message)
    }

    /// Bomb placement for `player`.
    pub fn bomb(player: PlayerId, message: &BombMessage) -> Result<Self, serde_json::Error> {
        Self::encode(Topic::Bomb { player }, message)
    }

    /// Death notice for `player`.
    pub fn death(player: PlayerId, message: &DeathMessage) -> Result<Self, serde_json::Error> {
        Self::encode(Topic::Death { player }, message)
    }
}
