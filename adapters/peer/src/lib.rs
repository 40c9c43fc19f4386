#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Peer session adapter.
//!
//! A [`Peer`] owns everything one participant needs for a match: the
//! authoritative world, the sequence gate and sender counters, and every
//! gameplay system. It translates bus traffic into world commands and
//! world events into bus traffic. The [`Orchestrator`] wraps the lobby
//! for the hub side of the bus, and [`Simulation`] wires both over the
//! in-process broker.

mod orchestrator;
mod session;
mod simulation;

use blastgrid_core::LevelError;
use blastgrid_system_rewards::RewardTableError;
use thiserror::Error;

pub use orchestrator::Orchestrator;
pub use session::{MatchStats, Peer, PeerConfig, PeerPhase};
pub use simulation::Simulation;

/// Errors raised while setting up a peer or a simulation.
#[derive(Debug, Error)]
pub enum PeerError {
    /// The configured reward weights are unusable.
    #[error("invalid reward table: {0}")]
    RewardTable(#[from] RewardTableError),
    /// The level layout could not be parsed.
    #[error("invalid level: {0}")]
    Level(#[from] LevelError),
}
