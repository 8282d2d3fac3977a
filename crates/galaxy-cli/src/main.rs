//! Galactic Business Simulator console game.

use galaxy_core::GameState;
use std::io;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod command;
mod config;
mod console;
mod render;
mod save;

use config::Settings;
use save::SaveError;

fn main() -> anyhow::Result<()> {
    // Initialize tracing; stdout belongs to the console
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let settings = Settings::from_env()?;
    info!(save_path = %settings.save_path.display(), "Starting Galactic Business Simulator...");

    let stdin = io::stdin();
    let mut input = stdin.lock();
    let mut out = io::stdout();

    let mut game = match save::load_game(&settings.save_path, settings.seed) {
        Ok(game) => game,
        Err(SaveError::NotFound(_)) => new_game(&mut input, &mut out, &settings)?,
        Err(e) => {
            warn!(error = %e, "could not resume saved game, starting a new one");
            new_game(&mut input, &mut out, &settings)?
        }
    };

    console::run(&mut game, &mut input, &mut out, &settings.save_path)
}

fn new_game(
    input: &mut impl io::BufRead,
    out: &mut impl io::Write,
    settings: &Settings,
) -> anyhow::Result<GameState> {
    console::setup(input, out, settings.game.clone(), settings.seed)
}
