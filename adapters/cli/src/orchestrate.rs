//! Lobby orchestrator behind either the MQTT bus or a stdio bridge.

use std::{
    io::{self, BufRead, Write},
    time::{Duration, Instant},
};

use anyhow::{Context, Result};
use blastgrid_peer::Orchestrator;
use blastgrid_protocol::Outbound;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::{bus::Bus, config::Config};

const POLL: Duration = Duration::from_millis(100);

/// One bus message as it travels over stdio.
#[derive(Debug, Deserialize)]
struct Line {
    topic: String,
    payload: Value,
}

pub(crate) fn run(config: &Config, seed: Option<u64>, stdio: bool) -> Result<()> {
    let rng = match seed {
        Some(seed) => ChaCha8Rng::seed_from_u64(seed),
        None => ChaCha8Rng::from_entropy(),
    };
    let mut orchestrator = Orchestrator::new(config.lobby.clone(), rng);
    let started = Instant::now();
    if !stdio {
        serve(config, &mut orchestrator, started);
    }
    bridge(
        io::stdin().lock(),
        io::stdout().lock(),
        &mut orchestrator,
        || started.elapsed(),
    )?;
    info!(matches = orchestrator.matches(), "stdin_closed");
    Ok(())
}

/// Serves the lobby over the bus until the process is stopped.
fn serve(config: &Config, orchestrator: &mut Orchestrator<ChaCha8Rng>, started: Instant) -> ! {
    let mut bus = Bus::connect(
        &config.bus,
        "blastgrid-orchestrator",
        &Orchestrator::<ChaCha8Rng>::subscriptions(),
    );
    let mut out = Vec::new();
    loop {
        let Some(delivery) = bus.poll(POLL) else {
            continue;
        };
        orchestrator.handle(&delivery.topic, &delivery.payload, started.elapsed(), &mut out);
        for outbound in out.drain(..) {
            bus.publish(&outbound);
        }
    }
}

fn bridge<R, W, G, C>(
    input: R,
    mut output: W,
    orchestrator: &mut Orchestrator<G>,
    mut clock: C,
) -> Result<()>
where
    R: BufRead,
    W: Write,
    G: Rng,
    C: FnMut() -> Duration,
{
    for line in input.lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        let message: Line = match serde_json::from_str(&line) {
            Ok(message) => message,
            Err(error) => {
                warn!(%error, "malformed_line_skipped");
                continue;
            }
        };
        let payload = serde_json::to_vec(&message.payload)?;

        let mut out = Vec::new();
        orchestrator.handle(&message.topic, &payload, clock(), &mut out);
        for outbound in &out {
            write_line(&mut output, outbound)?;
        }
    }
    Ok(())
}

fn write_line(output: &mut impl Write, message: &Outbound) -> Result<()> {
    let payload: Value = serde_json::from_slice(&message.payload)?;
    let line = json!({
        "topic": message.topic.to_string(),
        "payload": payload,
    });
    writeln!(output, "{line}").context("failed to write stdout")?;
    output.flush().context("failed to flush stdout")
}

#[cfg(test)]
mod tests {
    use super::*;
    use blastgrid_system_lobby::LobbyConfig;

    fn bridge_str(input: &str, times_ms: &[u64]) -> Vec<Value> {
        let mut orchestrator =
            Orchestrator::new(LobbyConfig::default(), ChaCha8Rng::seed_from_u64(9));
        let mut times = times_ms.iter().copied();
        let mut output = Vec::new();
        bridge(input.as_bytes(), &mut output, &mut orchestrator, || {
            Duration::from_millis(times.next().unwrap_or(0))
        })
        .expect("bridge runs");
        String::from_utf8(output)
            .expect("utf-8 output")
            .lines()
            .map(|line| serde_json::from_str(line).expect("json line"))
            .collect()
    }

    #[test]
    fn ready_pings_produce_start_lines() {
        let input = concat!(
            r#"{"topic":"hub/player/a/ping","payload":{"isReady":true}}"#,
            "\n",
            r#"{"topic":"hub/player/b/ping","payload":{"isReady":true}}"#,
            "\n",
        );
        let lines = bridge_str(input, &[0, 100]);
        assert_eq!(lines.len(), 2);
        for line in &lines {
            assert_eq!(line["topic"], "game/start");
            assert_eq!(line["payload"]["numberOfPlayers"], 2);
        }
        assert_ne!(lines[0]["payload"]["position"], lines[1]["payload"]["position"]);
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let input = concat!(
            "not json\n",
            "\n",
            r#"{"topic":"hub/player/a/ping","payload":{"isReady":true}}"#,
            "\n",
            r#"{"topic":"hub/player/b/ping","payload":{"ready":1}}"#,
            "\n",
        );
        assert!(bridge_str(input, &[0, 0]).is_empty());
    }

    #[test]
    fn stale_players_miss_the_match() {
        let input = concat!(
            r#"{"topic":"hub/player/a/ping","payload":{"isReady":false}}"#,
            "\n",
            r#"{"topic":"hub/player/b/ping","payload":{"isReady":true}}"#,
            "\n",
            r#"{"topic":"hub/player/c/ping","payload":{"isReady":true}}"#,
            "\n",
        );
        let lines = bridge_str(input, &[0, 2500, 2600]);
        let players: Vec<_> = lines
            .iter()
            .map(|line| line["payload"]["playerId"].clone())
            .collect();
        assert_eq!(players, vec![json!("b"), json!("c")]);
    }
}
