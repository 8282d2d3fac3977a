//! Save files: the engine snapshot as pretty-printed JSON.

use galaxy_core::{GameError, GameSnapshot, GameState};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SaveError {
    #[error("No saved game at {0}")]
    NotFound(PathBuf),

    #[error("Could not access save file: {0}")]
    Io(#[from] io::Error),

    #[error("Save file is not valid JSON: {0}")]
    Format(#[from] serde_json::Error),

    #[error("Save file describes an impossible game: {0}")]
    Rejected(#[from] GameError),
}

/// Write the game to `path`, replacing any previous save
pub fn save_game(path: &Path, game: &GameState) -> Result<(), SaveError> {
    let json = serde_json::to_string_pretty(&game.snapshot())?;

    // Stage beside the target, then swap it in
    let staging = path.with_extension("json.tmp");
    fs::write(&staging, json)?;
    fs::rename(&staging, path)?;

    debug!(path = %path.display(), turn = game.turn_number, "game saved");
    Ok(())
}

/// Read the snapshot stored at `path`
pub fn load_snapshot(path: &Path) -> Result<GameSnapshot, SaveError> {
    let json = match fs::read_to_string(path) {
        Ok(json) => json,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            return Err(SaveError::NotFound(path.to_path_buf()))
        }
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&json)?)
}

/// Load and restore the game stored at `path`
pub fn load_game(path: &Path, seed: Option<u64>) -> Result<GameState, SaveError> {
    let snapshot = load_snapshot(path)?;
    let game = match seed {
        Some(seed) => GameState::from_snapshot(snapshot, seed)?,
        None => GameState::restore(snapshot)?,
    };
    info!(path = %path.display(), turn = game.turn_number, "saved game loaded");
    Ok(game)
}
