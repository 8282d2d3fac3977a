//! Interactive console: new-game setup and the command loop.

use crate::command::Command;
use crate::render;
use crate::save;
use galaxy_core::game::MAX_PLAYERS;
use galaxy_core::{GameConfig, GameState};
use std::io::{BufRead, Write};
use std::path::Path;
use tracing::warn;

fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, text: &str) -> anyhow::Result<Option<String>> {
    write!(out, "{text}")?;
    out.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Ok(None);
    }
    Ok(Some(line.trim().to_string()))
}

/// Ask for players and start a new game
pub fn setup<R: BufRead, W: Write>(
    input: &mut R,
    out: &mut W,
    config: GameConfig,
    seed: Option<u64>,
) -> anyhow::Result<GameState> {
    writeln!(out, "Welcome to Galactic Business Simulator!")?;

    let count = loop {
        let answer = prompt(input, out, &format!("Number of players (1-{MAX_PLAYERS}): "))?
            .ok_or_else(|| anyhow::anyhow!("input closed during setup"))?;
        match answer.parse::<usize>() {
            Ok(n) if (1..=MAX_PLAYERS).contains(&n) => break n,
            _ => writeln!(out, "Please enter a number from 1 to {MAX_PLAYERS}.")?,
        }
    };

    let mut names = Vec::with_capacity(count);
    for i in 1..=count {
        let name = prompt(input, out, &format!("Name of player {i}: "))?.unwrap_or_default();
        names.push(name);
    }

    let game = match seed {
        Some(seed) => GameState::with_seed(names, config, seed)?,
        None => GameState::new(names, config)?,
    };
    Ok(game)
}

fn autosave<W: Write>(out: &mut W, path: &Path, game: &GameState) -> anyhow::Result<()> {
    if let Err(e) = save::save_game(path, game) {
        warn!(error = %e, "autosave failed");
        writeln!(out, "Warning: the game could not be saved ({e}).")?;
    }
    Ok(())
}

/// Read commands until the game is quit or input ends
pub fn run<R: BufRead, W: Write>(
    game: &mut GameState,
    input: &mut R,
    out: &mut W,
    save_path: &Path,
) -> anyhow::Result<()> {
    writeln!(out, "Type 'help' for a list of commands.")?;

    while !game.is_finished() {
        write!(out, "{}", render::status(game))?;
        let Some(line) = prompt(input, out, "> ")? else {
            autosave(out, save_path, game)?;
            break;
        };
        if line.is_empty() {
            continue;
        }

        let command = match line.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        let action = match command.to_action(game) {
            Ok(Some(action)) => action,
            Ok(None) => {
                let text = match command {
                    Command::Map => render::map(game),
                    Command::Actions => render::actions(game),
                    _ => render::HELP.to_string(),
                };
                writeln!(out, "{text}")?;
                continue;
            }
            Err(e) => {
                writeln!(out, "{e}")?;
                continue;
            }
        };

        match game.apply_action(game.current_player, action) {
            Ok(events) => {
                for event in &events {
                    writeln!(out, "{}", event.message(&game.players))?;
                }
                autosave(out, save_path, game)?;
            }
            Err(e) => writeln!(out, "Error: {e}")?,
        }
    }

    Ok(())
}
