#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter for Blastgrid: the lobby orchestrator, a headless
//! peer on the MQTT bus and an in-process match simulator.

mod bus;
mod config;
mod orchestrate;
mod play;
mod simulate;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

/// Command-line arguments accepted by the `blastgrid` binary.
#[derive(Debug, Parser)]
#[command(name = "blastgrid", version, about = "Blastgrid lobby and match tooling")]
struct Cli {
    /// TOML file with `[tuning]`, `[lobby]` and `[bus]` sections.
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Mode,
}

#[derive(Debug, Subcommand)]
enum Mode {
    /// Runs the lobby orchestrator on the MQTT bus.
    Orchestrate {
        /// Seed for position and color shuffles. Random when omitted.
        #[arg(long)]
        seed: Option<u64>,
        /// Reads `{"topic","payload"}` JSON lines on stdin and writes match
        /// start assignments as JSON lines on stdout instead.
        #[arg(long)]
        stdio: bool,
    },
    /// Joins the lobby on the MQTT bus as a headless, always-ready peer.
    Play {
        /// Player identity used in topics.
        #[arg(long)]
        player: String,
        /// Reward seed shared by every peer of the match.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Drops a bomb every this many seconds while alive.
        #[arg(long, value_name = "SECONDS")]
        drop_every: Option<f32>,
    },
    /// Runs an orchestrator and several peers over an in-process broker.
    Simulate {
        /// Number of peers joining the match.
        #[arg(long, default_value_t = 2)]
        players: usize,
        /// Seed shared by the orchestrator and every peer.
        #[arg(long, default_value_t = 0)]
        seed: u64,
        /// Simulated seconds to run.
        #[arg(long, default_value_t = 5.0)]
        seconds: f32,
    },
}

/// Entry point for the Blastgrid command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref())?;
    info!(config = ?cli.config, "blastgrid_started");

    match cli.command {
        Mode::Orchestrate { seed, stdio } => orchestrate::run(&config, seed, stdio),
        Mode::Play {
            player,
            seed,
            drop_every,
        } => play::run(&config, player, seed, drop_every),
        Mode::Simulate {
            players,
            seed,
            seconds,
        } => simulate::run(&config, players, seed, seconds),
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}
