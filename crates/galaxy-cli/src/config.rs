//! Runtime settings read from the environment.

use anyhow::Context;
use galaxy_core::GameConfig;
use std::path::PathBuf;

pub const DEFAULT_SAVE_PATH: &str = "galactic_business.json";

#[derive(Debug, Clone)]
pub struct Settings {
    /// Where the game is autosaved (`GALAXY_SAVE_PATH`)
    pub save_path: PathBuf,
    /// Rules for a new game, optionally from a JSON file (`GALAXY_CONFIG`)
    pub game: GameConfig,
    /// Fixed seed for dice, draws, and board layout (`GALAXY_SEED`)
    pub seed: Option<u64>,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from any variable source
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let save_path = lookup("GALAXY_SAVE_PATH")
            .unwrap_or_else(|| DEFAULT_SAVE_PATH.into())
            .into();

        let game = match lookup("GALAXY_CONFIG") {
            Some(path) => {
                let json = std::fs::read_to_string(&path)
                    .with_context(|| format!("reading game config {path}"))?;
                serde_json::from_str(&json).with_context(|| format!("parsing game config {path}"))?
            }
            None => GameConfig::default(),
        };

        let seed = lookup("GALAXY_SEED")
            .map(|s| s.parse::<u64>())
            .transpose()
            .context("GALAXY_SEED must be an unsigned integer")?;

        Ok(Self {
            save_path,
            game,
            seed,
        })
    }
}
