mod config;
mod food;
mod game;
mod grid;
mod input;
mod rules;
mod snake;
mod state;
mod storage;
mod term;
mod timer;

use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::{Config, Overrides};
use crate::storage::FileStore;

pub type TermInt = u16;
pub type Coords = (u16, u16);

const LOG_FILE: &str = "snake.log";

/// Snake in the terminal
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML config file (defaults to ./snake.toml if present)
    #[arg(long, env = "SNAKE_CONFIG")]
    config: Option<PathBuf>,

    /// Where the high score is kept
    #[arg(long)]
    high_score_file: Option<PathBuf>,

    /// Directory for snake.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

fn main() -> Result<()> {
    let args = Args::parse();
    let overrides = Overrides { high_score_file: args.high_score_file, log_dir: args.log_dir };
    let config = Config::load(args.config.as_deref(), &overrides)?;

    // The terminal is taken over by the game, so logs go to a file
    let _guard = init_logging(&config)?;
    let store = FileStore::new(&config.high_score_file);
    info!("Starting snake, high score file {}", store.path().display());

    let mut game = game::SnakeGame::new(&config, store)?;
    game.run()
}

fn init_logging(config: &Config) -> Result<WorkerGuard> {
    fs::create_dir_all(&config.log_dir)?;
    let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(&config.log_dir, LOG_FILE));

    let filter = match config.log_level {
        Some(ref level) => EnvFilter::try_new(level)?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .with_target(false)
        .init();

    Ok(guard)
}
