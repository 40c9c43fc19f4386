//! Headless peer on the MQTT bus.

use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use blastgrid_core::PlayerId;
use blastgrid_peer::{Peer, PeerConfig, PeerPhase};
use tracing::info;

use crate::{bus::Bus, config::Config};

const TICK: Duration = Duration::from_millis(50);

pub(crate) fn run(
    config: &Config,
    player: String,
    seed: u64,
    drop_every: Option<f32>,
) -> Result<()> {
    let drop_every = drop_every
        .map(Duration::try_from_secs_f32)
        .transpose()
        .context("invalid --drop-every value")?;
    let mut peer = Peer::new(PeerConfig {
        player: PlayerId::new(player),
        tuning: config.tuning.clone(),
        layout: config.layout()?,
        seed,
    })
    .context("failed to set up the peer")?;
    peer.set_ready(true);

    let client_id = format!("blastgrid-peer-{}", peer.id());
    let mut bus = Bus::connect(&config.bus, &client_id, &Peer::subscriptions());
    let mut out = Vec::new();
    let mut last_tick = Instant::now();
    let mut since_drop = Duration::ZERO;

    loop {
        let elapsed = last_tick.elapsed();
        if let Some(delivery) = bus.poll(TICK.saturating_sub(elapsed)) {
            peer.handle_inbound(&delivery.topic, &delivery.payload, &mut out);
        }

        let dt = last_tick.elapsed();
        if dt >= TICK {
            last_tick = Instant::now();
            peer.tick(dt, &mut out);
            if let Some(interval) = drop_every {
                if peer.phase() == PeerPhase::Playing {
                    since_drop += dt;
                    if since_drop >= interval {
                        since_drop = Duration::ZERO;
                        let _ = peer.place_bomb(&mut out);
                    }
                }
            }
        }

        for outbound in out.drain(..) {
            bus.publish(&outbound);
        }

        if peer.phase() == PeerPhase::Eliminated {
            if let Some(stats) = peer.stats() {
                info!(
                    player = %peer.id(),
                    detonations = stats.detonations,
                    destroyed = stats.destroyed.len(),
                    "eliminated"
                );
            }
            return Ok(());
        }
    }
}
