//! Optional TOML configuration shared by every subcommand.

use std::{fs, path::Path};

use anyhow::{Context, Result};
use blastgrid_core::{LevelLayout, Tuning};
use blastgrid_system_lobby::LobbyConfig;
use serde::Deserialize;

use crate::bus::BusConfig;

/// Parsed configuration file. Every section falls back to defaults.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct Config {
    pub(crate) tuning: Tuning,
    pub(crate) lobby: LobbyConfig,
    pub(crate) bus: BusConfig,
    /// Level rows, top to bottom. The built-in arena when absent.
    pub(crate) level: Option<Vec<String>>,
}

impl Config {
    /// Reads `path`, or returns the defaults when no file was given.
    pub(crate) fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("invalid config file {}", path.display()))
    }

    pub(crate) fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Level every peer loads when its match starts.
    pub(crate) fn layout(&self) -> Result<LevelLayout> {
        match &self.level {
            Some(rows) => LevelLayout::parse(rows).context("invalid `level` rows"),
            None => LevelLayout::arena().context("built-in arena does not parse"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sections_override_defaults_independently() {
        let config = Config::parse(
            r##"
            [tuning]
            bomb_fuse_secs = 1.5
            initial_force = 2

            [lobby]
            quorum = 3
            colors = ["#FF6347", "#1E90FF", "#32CD32"]
            "##,
        )
        .expect("config parses");

        assert_eq!(config.tuning.initial_force, 2);
        assert_eq!(config.tuning.lives, Tuning::default().lives);
        assert_eq!(config.lobby.quorum, 3);
        assert_eq!(config.lobby.capacity(), 3);
        assert_eq!(config.lobby.positions, LobbyConfig::default().positions);
    }

    #[test]
    fn custom_level_rows_are_parsed() {
        let config = Config::parse(
            r#"
            level = [
                "=====",
                "= + =",
                "=====",
            ]
            "#,
        )
        .expect("config parses");
        let layout = config.layout().expect("level parses");
        assert_eq!((layout.columns(), layout.rows()), (5, 3));
    }

    #[test]
    fn ragged_level_is_reported() {
        let config = Config::parse("level = [\"===\", \"==\"]").expect("config parses");
        assert!(config.layout().is_err());
    }

    #[test]
    fn bus_section_points_at_the_broker() {
        let config = Config::parse("[bus]\nhost = \"10.0.0.7\"\nretry_ms = 250")
            .expect("config parses");
        assert_eq!(config.bus.host, "10.0.0.7");
        assert_eq!(config.bus.port, 1883);
        assert_eq!(config.bus.retry_ms, 250);
    }

    #[test]
    fn unknown_sections_are_rejected() {
        assert!(Config::parse("[graphics]\nvsync = true").is_err());
    }

    #[test]
    fn missing_file_names_the_path() {
        let error = Config::load(Some(Path::new("/nonexistent/blastgrid.toml")))
            .expect_err("file is missing");
        assert!(format!("{error:#}").contains("/nonexistent/blastgrid.toml"));
    }
}
