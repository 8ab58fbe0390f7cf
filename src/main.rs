mod board;
mod game;
mod keyboard;
mod snake;
mod term;

use std::fs::File;
use std::io;
use std::path::PathBuf;
use std::sync::mpsc::sync_channel;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use log::{info, LevelFilter};
use rand::{rngs::StdRng, SeedableRng};
use simplelog::{Config, WriteLogger};

use crate::game::{Outcome, SnakeGame, TickTiming};
use crate::snake::Snake;
use crate::term::TermManager;

#[derive(Parser)]
#[command(name = "snake")]
#[command(version, about = "Snake in the terminal: arrow keys to move, Esc to quit")]
struct Cli {
    /// Board width in cells
    #[arg(long, default_value = "15")]
    width: usize,

    /// Board height in cells
    #[arg(long, default_value = "15")]
    height: usize,

    /// Tick interval at score zero, in milliseconds
    #[arg(long, default_value = "150")]
    frame_ms: u64,

    /// How much faster each point makes the tick, in milliseconds
    #[arg(long, default_value = "1")]
    speedup_ms: u64,

    /// Shortest tick interval, in milliseconds
    #[arg(long, default_value = "30")]
    min_frame_ms: u64,

    /// Seed for food placement
    #[arg(long)]
    seed: Option<u64>,

    /// Write a log to this file
    #[arg(long)]
    log_file: Option<PathBuf>,

    #[arg(long, default_value = "info")]
    log_level: LevelFilter,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Some(path) = &cli.log_file {
        let file = File::create(path)
            .with_context(|| format!("Error creating log file {}", path.display()))?;
        WriteLogger::init(cli.log_level, Config::default(), file).context("Error initializing logger")?;
    }

    let snake = match cli.seed {
        Some(seed) => Snake::seeded(cli.width, cli.height, seed),
        None => Snake::new(cli.width, cli.height, StdRng::from_entropy()),
    }
    .context("Error creating the board")?;
    let timing = TickTiming {
        frame: Duration::from_millis(cli.frame_ms),
        speed_up: Duration::from_millis(cli.speedup_ms),
        min_frame: Duration::from_millis(cli.min_frame_ms),
    };

    info!("starting {}x{} game, food at {:?}, {:?}", cli.width, cli.height, snake.food(), timing);

    let (tx, rx) = sync_channel(1);
    let mut term = TermManager::new();
    term.setup()?;

    // The reader thread is never joined: it dies with the process.
    keyboard::spawn_reader(io::stdin(), tx).context("Error starting keyboard reader")?;

    let mut game = SnakeGame::new(snake, term, rx, timing);
    let result = game.play();

    // Dropping the game hands the terminal back before anything is printed.
    let (score, length) = (game.snake().score(), game.snake().body().len());
    drop(game);

    match result? {
        Outcome::Quit => info!("quit, score {}, length {}", score, length),
        Outcome::Finished(outcome) => info!("finished: {}, score {}, length {}", outcome, score, length),
    }

    Ok(())
}
