//! Configuration management.

use std::path::{Path, PathBuf};

use anyhow::{ensure, Result};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Looked up in the working directory when no `--config` is given.
pub const LOCAL_CONFIG_FILE: &str = "snake.toml";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Edge of one board cell, in pixels
    pub cell_size: u32,
    /// Upper bound for the board edge, in pixels
    pub max_board_size: u32,
    /// Space kept free around the board when sizing it to the display
    pub board_margin: u32,
    /// Tick interval of a fresh game
    pub initial_speed_ms: u64,
    /// Fastest tick interval the speed ramp may reach
    pub min_speed_ms: u64,
    /// Points per food item
    pub food_reward: u32,
    pub high_score_file: PathBuf,
    pub log_dir: PathBuf,
    /// If not set, uses RUST_LOG or defaults to "info"
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            cell_size: 20,
            max_board_size: 400,
            board_margin: 40,
            initial_speed_ms: 150,
            min_speed_ms: 50,
            food_reward: 10,
            high_score_file: PathBuf::from(".snake_high_score.json"),
            log_dir: PathBuf::from("."),
            log_level: None,
        }
    }
}

/// Values given on the command line; they win over everything else.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub high_score_file: Option<PathBuf>,
    pub log_dir: Option<PathBuf>,
}

impl Config {
    /// Layers: defaults < config file < SNAKE_* env vars < command line.
    pub fn load(config_path: Option<&Path>, overrides: &Overrides) -> Result<Self> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));

        match config_path {
            Some(path) => {
                ensure!(path.exists(), "config file {} not found", path.display());
                figment = figment.merge(Toml::file(path));
            }
            None => {
                let local = Path::new(LOCAL_CONFIG_FILE);
                if local.exists() {
                    figment = figment.merge(Toml::file(local));
                }
            }
        }

        figment = figment.merge(Env::prefixed("SNAKE_"));
        Self::finish(figment, overrides)
    }

    fn finish(mut figment: Figment, overrides: &Overrides) -> Result<Self> {
        if let Some(ref path) = overrides.high_score_file {
            figment = figment.merge(Serialized::default("high_score_file", path));
        }
        if let Some(ref dir) = overrides.log_dir {
            figment = figment.merge(Serialized::default("log_dir", dir));
        }

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ensure!(self.cell_size > 0, "cell_size must be positive");
        ensure!(self.max_board_size >= self.cell_size, "max_board_size must hold at least one cell");
        ensure!(self.food_reward > 0, "food_reward must be positive");
        ensure!(self.min_speed_ms > 0, "min_speed_ms must be positive");
        ensure!(
            self.min_speed_ms <= self.initial_speed_ms,
            "min_speed_ms ({}) exceeds initial_speed_ms ({})",
            self.min_speed_ms,
            self.initial_speed_ms
        );
        Ok(())
    }
}
