//! Player state: credits, position, held cards, and turn penalties.
//!
//! The set of owned planets mirrors the `owner` field of each planet. It is
//! never encoded; restoring a game rebuilds it from the board, and only
//! [`Galaxy::build_spaceport`](crate::galaxy::Galaxy::build_spaceport) adds
//! to it during play.

use crate::events::CardKind;
use crate::galaxy::{Galaxy, PlanetId, SolarSystem};
use crate::game::GameError;
use crate::snapshot::null_as_default;
use crate::structure::StructureType;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Stable player identifier, assigned at creation (seat index)
pub type PlayerId = u8;

/// Voluntary skips allowed in a row
pub const MAX_CONSECUTIVE_SKIPS: u8 = 2;

/// A player and everything they carry between turns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    pub credits: u32,
    /// Position on the track, always below the track length
    #[serde(default)]
    pub position: usize,
    /// Planets owned, in board order
    #[serde(skip)]
    owned_planets: BTreeSet<PlanetId>,
    /// Held cards in the order they were drawn
    #[serde(default, deserialize_with = "null_as_default")]
    pub cards: Vec<CardKind>,
    /// Voluntary skips taken in a row
    #[serde(default)]
    pub skipped_turns: u8,
    #[serde(default)]
    pub is_skipping_turn: bool,
    /// Turns still to be forfeited because of penalties
    #[serde(default)]
    pub lost_turns: u32,
}

impl Player {
    /// Create a new player at the start of the track
    pub fn new(id: PlayerId, name: String, credits: u32) -> Self {
        Self {
            id,
            name,
            credits,
            position: 0,
            owned_planets: BTreeSet::new(),
            cards: Vec::new(),
            skipped_turns: 0,
            is_skipping_turn: false,
            lost_turns: 0,
        }
    }

    pub fn can_skip_turn(&self) -> bool {
        self.skipped_turns < MAX_CONSECUTIVE_SKIPS
    }

    /// Skip voluntarily; at most two in a row
    pub fn skip_turn(&mut self) -> Result<(), GameError> {
        if !self.can_skip_turn() {
            return Err(GameError::TurnLimitExceeded);
        }
        self.is_skipping_turn = true;
        self.skipped_turns += 1;
        Ok(())
    }

    /// Called when the player takes a real turn
    pub fn take_turn(&mut self) {
        self.is_skipping_turn = false;
        self.skipped_turns = 0;
    }

    pub fn has_card(&self, card: CardKind) -> bool {
        self.cards.contains(&card)
    }

    /// Spend the oldest held card of this kind
    pub fn use_card(&mut self, card: CardKind) -> Result<(), GameError> {
        let index = self
            .cards
            .iter()
            .position(|c| *c == card)
            .ok_or_else(|| GameError::InvalidCard(format!("{} does not hold {card}", self.name)))?;
        self.cards.remove(index);
        Ok(())
    }

    pub fn owns_planet(&self, planet: PlanetId) -> bool {
        self.owned_planets.contains(&planet)
    }

    /// Owned planets in board order
    pub fn owned_planets(&self) -> impl Iterator<Item = PlanetId> + '_ {
        self.owned_planets.iter().copied()
    }

    pub fn owned_planet_count(&self) -> usize {
        self.owned_planets.len()
    }

    pub fn owns_all_planets_in_system(&self, system: &SolarSystem) -> bool {
        system.planets().iter().all(|p| self.owns_planet(p.id()))
    }

    /// Structures of `kind` across every owned planet
    pub fn count_owned_structures(&self, kind: StructureType, galaxy: &Galaxy) -> usize {
        self.owned_planets()
            .filter_map(|id| galaxy.planet(id))
            .flat_map(|p| p.structures())
            .filter(|s| s.kind() == kind)
            .count()
    }

    pub fn count_galactic_shipyards(&self, galaxy: &Galaxy) -> usize {
        self.count_owned_structures(StructureType::GalacticShipyard, galaxy)
    }

    pub(crate) fn claim_planet(&mut self, planet: PlanetId) {
        self.owned_planets.insert(planet);
    }

    pub(crate) fn clear_owned_planets(&mut self) {
        self.owned_planets.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_player() {
        let player = Player::new(2, "Ada".to_string(), 5000);
        assert_eq!(player.id, 2);
        assert_eq!(player.credits, 5000);
        assert_eq!(player.position, 0);
        assert_eq!(player.owned_planet_count(), 0);
        assert!(player.cards.is_empty());
        assert_eq!(player.lost_turns, 0);
    }

    #[test]
    fn test_skip_limit() {
        let mut player = Player::new(0, "Ada".to_string(), 0);

        player.skip_turn().unwrap();
        assert!(player.is_skipping_turn);
        player.skip_turn().unwrap();
        assert!(!player.can_skip_turn());
        assert_eq!(player.skip_turn(), Err(GameError::TurnLimitExceeded));
        assert_eq!(player.skipped_turns, 2);

        // A real turn resets the counter
        player.take_turn();
        assert!(player.can_skip_turn());
        assert!(!player.is_skipping_turn);
        assert_eq!(player.skipped_turns, 0);
    }

    #[test]
    fn test_use_card_fifo() {
        let mut player = Player::new(0, "Ada".to_string(), 0);
        player.cards = vec![
            CardKind::GalacticTicket,
            CardKind::PirateDefense,
            CardKind::GalacticTicket,
        ];

        player.use_card(CardKind::GalacticTicket).unwrap();
        assert_eq!(
            player.cards,
            vec![CardKind::PirateDefense, CardKind::GalacticTicket]
        );

        player.use_card(CardKind::PirateDefense).unwrap();
        assert!(!player.has_card(CardKind::PirateDefense));
        assert!(matches!(
            player.use_card(CardKind::PirateDefense),
            Err(GameError::InvalidCard(_))
        ));
    }

    #[test]
    fn test_owns_all_planets_in_system() {
        let mut galaxy = Galaxy::builder(10)
            .system(1, "Sol", &["Terra", "Mars"])
            .build()
            .unwrap();
        let mut player = Player::new(0, "Ada".to_string(), 5000);
        let system = galaxy.system(0).unwrap().clone();
        assert!(!player.owns_all_planets_in_system(&system));

        galaxy.build_spaceport(PlanetId::new(0, 0), &mut player).unwrap();
        assert!(!player.owns_all_planets_in_system(&system));

        galaxy.build_spaceport(PlanetId::new(0, 1), &mut player).unwrap();
        assert!(player.owns_all_planets_in_system(&system));
    }
}
