//! Plain-data snapshot of a game for persistence.
//!
//! A snapshot holds only containment: players, the board with its systems,
//! planets and structures, and the turn counters. Derived links are never
//! encoded. Restoring recomputes system and planet ids from their place on
//! the board, re-derives each player's owned set from the planet `owner`
//! fields, and refuses the snapshot if the result breaks an invariant.
//!
//! Collections that are missing or `null` in the encoded form decode as
//! empty.

use crate::economy::Economy;
use crate::galaxy::Galaxy;
use crate::game::{GameError, MAX_PLAYERS};
use crate::invariants::check_holdings;
use crate::player::{Player, PlayerId};
use serde::{Deserialize, Deserializer, Serialize};

/// Everything needed to resume a game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSnapshot {
    #[serde(default, deserialize_with = "null_as_default")]
    pub players: Vec<Player>,
    pub galaxy: Galaxy,
    #[serde(default)]
    pub economy: Economy,
    pub current_turn: u32,
    pub current_player: PlayerId,
    /// Turn on which income was last paid
    #[serde(default)]
    pub last_income_turn: Option<u32>,
}

impl GameSnapshot {
    /// Recompute derived links and check the result is playable
    pub(crate) fn rebuild_links(&mut self) -> Result<(), GameError> {
        if self.players.is_empty() || self.players.len() > MAX_PLAYERS {
            return Err(GameError::InvalidSnapshot(format!(
                "expected 1-{MAX_PLAYERS} players, found {}",
                self.players.len()
            )));
        }
        if usize::from(self.current_player) >= self.players.len() {
            return Err(GameError::InvalidSnapshot(format!(
                "current player {} is not seated",
                self.current_player
            )));
        }
        if self.current_turn == 0 {
            return Err(GameError::InvalidSnapshot(
                "turn counter must start at 1".to_string(),
            ));
        }

        self.galaxy
            .validate()
            .and_then(|()| self.galaxy.relink())
            .map_err(|e| GameError::InvalidSnapshot(e.to_string()))?;

        for player in &mut self.players {
            player.clear_owned_planets();
        }
        for planet in self.galaxy.planets() {
            let Some(owner) = planet.owner() else {
                continue;
            };
            let player = self
                .players
                .iter_mut()
                .find(|p| p.id == owner)
                .ok_or_else(|| {
                    GameError::InvalidSnapshot(format!(
                        "planet {} is owned by unknown player {owner}",
                        planet.name
                    ))
                })?;
            player.claim_planet(planet.id());
        }

        let violations = check_holdings(&self.players, &self.galaxy);
        if let Some(first) = violations.first() {
            return Err(GameError::InvalidSnapshot(first.message.clone()));
        }

        Ok(())
    }
}

/// Decode `null` as the type's default, for collections that older or
/// hand-written saves leave empty
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}
