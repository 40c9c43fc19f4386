//! In-process multi-peer match.

use std::{collections::BTreeSet, time::Duration};

use anyhow::{ensure, Context, Result};
use blastgrid_core::PlayerId;
use blastgrid_peer::{PeerPhase, Simulation};
use tracing::{info, warn};

use crate::config::Config;

const STEP: Duration = Duration::from_millis(50);

pub(crate) fn run(config: &Config, players: usize, seed: u64, seconds: f32) -> Result<()> {
    ensure!(players >= 2, "a match needs at least two players");
    ensure!(
        players <= config.lobby.capacity(),
        "the lobby admits at most {} players",
        config.lobby.capacity()
    );
    let total = Duration::try_from_secs_f32(seconds)
        .with_context(|| format!("invalid --seconds value {seconds}"))?;

    let layout = config.layout()?;
    let mut sim = Simulation::new(
        players,
        seed,
        config.tuning.clone(),
        config.lobby.clone(),
        layout,
    )
    .context("failed to set up the simulation")?;

    let mut bombs_dropped = false;
    while sim.elapsed() < total {
        sim.step(STEP);
        if bombs_dropped || !sim.peers().all(|peer| peer.phase() == PeerPhase::Playing) {
            continue;
        }
        let ids: Vec<PlayerId> = sim.peers().map(|peer| peer.id().clone()).collect();
        for id in &ids {
            if !sim.place_bomb(id) {
                warn!(player = %id, "bomb_drop_refused");
            }
        }
        bombs_dropped = true;
        info!(elapsed = ?sim.elapsed(), "bombs_dropped");
    }
    if !bombs_dropped {
        warn!("match_never_started");
    }

    print_summary(&sim);
    Ok(())
}

fn print_summary(sim: &Simulation) {
    let mut destroyed_sets = BTreeSet::new();
    for peer in sim.peers() {
        let Some(stats) = peer.stats() else {
            println!("{}: still in lobby", peer.id());
            continue;
        };
        println!(
            "{}: phase={:?} detonations={} segments={} destroyed={} rewards_spawned={} rewards_collected={}",
            peer.id(),
            peer.phase(),
            stats.detonations,
            stats.segments,
            stats.destroyed.len(),
            stats.rewards_spawned,
            stats.rewards_collected,
        );
        let _ = destroyed_sets.insert(stats.destroyed.clone());
    }
    let agree = destroyed_sets.len() <= 1;
    println!("destroyed crates agree: {}", if agree { "yes" } else { "no" });
}
