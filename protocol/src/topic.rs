//! Message-bus topic names.

use std::{fmt, str::FromStr};

use blastgrid_core::PlayerId;
use thiserror::Error;

/// Filter matching every lobby readiness ping.
pub const PING_FILTER: &str = "hub/player/+/ping";
/// Topic carrying match start assignments.
pub const GAME_START: &str = "game/start";
/// Filter matching every in-match player topic.
pub const GAME_PLAYER_FILTER: &str = "game/player/#";

const SINGLE_LEVEL: &str = "+";
const MULTI_LEVEL: &str = "#";

/// Every topic the bus carries.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Topic {
    /// `hub/player/{id}/ping`
    Ping {
        /// Player sending the heartbeat.
        player: PlayerId,
    },
    /// `game/start`
    GameStart,
    /// `game/player/{id}/attributes`
    Attributes {
        /// Owner of the attribute snapshot.
        player: PlayerId,
    },
    /// `game/player/{id}/bomb`
    Bomb {
        /// Player that placed the bomb.
        player: PlayerId,
    },
    /// `game/player/{id}/death`
    Death {
        /// Player that died.
        player: PlayerId,
    },
}

impl Topic {
    /// Player segment of the topic, if it has one.
    #[must_use]
    pub fn player(&self) -> Option<&PlayerId> {
        match self {
            Self::Ping { player }
            | Self::Attributes { player }
            | Self::Bomb { player }
            | Self::Death { player } => Some(player),
            Self::GameStart => None,
        }
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ping { player } => write!(f, "hub/player/{player}/ping"),
            Self::GameStart => f.write_str(GAME_START),
            Self::Attributes { player } => write!(f, "game/player/{player}/attributes"),
            Self::Bomb { player } => write!(f, "game/player/{player}/bomb"),
            Self::Death { player } => write!(f, "game/player/{player}/death"),
        }
    }
}

/// Errors raised while parsing a topic string.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TopicError {
    /// The topic does not follow any known shape.
    #[error("unrecognised topic `{0}`")]
    Unknown(String),
    /// The player segment is empty or a wildcard.
    #[error("topic `{0}` has an invalid player segment")]
    InvalidPlayer(String),
}

impl FromStr for Topic {
    type Err = TopicError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = value.split('/').collect();
        match segments.as_slice() {
            ["game", "start"] => Ok(Self::GameStart),
            ["hub", "player", id, "ping"] => Ok(Self::Ping {
                player: player_segment(value, id)?,
            }),
            ["game", "player", id, "attributes"] => Ok(Self::Attributes {
                player: player_segment(value, id)?,
            }),
            ["game", "player", id, "bomb"] => Ok(Self::Bomb {
                player: player_segment(value, id)?,
            }),
            ["game", "player", id, "death"] => Ok(Self::Death {
                player: player_segment(value, id)?,
            }),
            _ => Err(TopicError::Unknown(value.to_owned())),
        }
    }
}

fn player_segment(topic: &str, id: &str) -> Result<PlayerId, TopicError> {
    if id.is_empty() || id == SINGLE_LEVEL || id == MULTI_LEVEL {
        return Err(TopicError::InvalidPlayer(topic.to_owned()));
    }
    Ok(PlayerId::new(id))
}

/// Reports whether a subscription filter matches a concrete topic.
///
/// `+` matches exactly one segment and a trailing `#` matches any
/// remaining segments, including none.
#[must_use]
pub fn topic_matches(filter: &str, topic: &str) -> bool {
    let mut filter_segments = filter.split('/');
    let mut topic_segments = topic.split('/');
    loop {
        match (filter_segments.next(), topic_segments.next()) {
            (Some(MULTI_LEVEL), _) => return filter_segments.next().is_none(),
            (Some(SINGLE_LEVEL), Some(_)) => {}
            (Some(expected), Some(actual)) if expected == actual => {}
            (None, None) => return true,
            _ => return false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn topics_round_trip_through_display() {
        let alice = PlayerId::new("alice");
        for topic in [
            Topic::Ping {
                player: alice.clone(),
            },
            Topic::GameStart,
            Topic::Attributes {
                player: alice.clone(),
            },
            Topic::Bomb {
                player: alice.clone(),
            },
            Topic::Death { player: alice },
        ] {
            let parsed: Topic = topic.to_string().parse().expect("topic parses");
            assert_eq!(parsed, topic);
        }
    }

    #[test]
    fn malformed_topics_are_rejected() {
        assert_eq!(
            "game/player/a/move".parse::<Topic>(),
            Err(TopicError::Unknown("game/player/a/move".to_owned()))
        );
        assert_eq!(
            "game/player/+/bomb".parse::<Topic>(),
            Err(TopicError::InvalidPlayer("game/player/+/bomb".to_owned()))
        );
        assert!("hub/player//ping".parse::<Topic>().is_err());
    }

    #[test]
    fn wildcards_match_per_segment() {
        assert!(topic_matches(PING_FILTER, "hub/player/7/ping"));
        assert!(!topic_matches(PING_FILTER, "hub/player/7/pong"));
        assert!(!topic_matches(PING_FILTER, "hub/player/ping"));
        assert!(topic_matches(GAME_PLAYER_FILTER, "game/player/7/death"));
        assert!(topic_matches("game/#", "game"));
        assert!(!topic_matches(GAME_PLAYER_FILTER, GAME_START));
        assert!(topic_matches(GAME_START, GAME_START));
    }
}
