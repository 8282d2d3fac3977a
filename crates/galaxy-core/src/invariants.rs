//! Game invariants - sanity checks that detect bugs.
//!
//! Every engine command should leave these intact. Restoring a snapshot runs
//! the same checks, so a hand-edited or corrupt save is refused instead of
//! being played.

use crate::galaxy::Galaxy;
use crate::game::GameState;
use crate::player::Player;
use crate::structure::StructureType;
use std::collections::HashSet;

/// Invariant violation error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub message: String,
}

impl InvariantViolation {
    fn new(message: String) -> Self {
        Self { message }
    }
}

impl std::fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Invariant violation: {}", self.message)
    }
}

impl std::error::Error for InvariantViolation {}

/// Check all game invariants.
///
/// Returns a list of violations found, or empty if all invariants hold.
#[must_use]
pub fn check_invariants(state: &GameState) -> Vec<InvariantViolation> {
    let mut violations = check_holdings(&state.players, &state.galaxy);

    if state.get_player(state.current_player).is_none() {
        violations.push(InvariantViolation::new(format!(
            "Current player {} does not exist",
            state.current_player
        )));
    }
    if state.turn_number == 0 {
        violations.push(InvariantViolation::new(
            "Turn counter is 0; it starts at 1".to_string(),
        ));
    }

    violations
}

/// Checks that only involve players and the board
#[must_use]
pub fn check_holdings(players: &[Player], galaxy: &Galaxy) -> Vec<InvariantViolation> {
    let mut violations = Vec::new();
    let total = galaxy.total_positions();

    for (index, player) in players.iter().enumerate() {
        if usize::from(player.id) != index {
            violations.push(InvariantViolation::new(format!(
                "Player in seat {index} has id {}",
                player.id
            )));
        }
        if player.position >= total {
            violations.push(InvariantViolation::new(format!(
                "Player {} at position {} on a track of {total}",
                player.id, player.position
            )));
        }
        for planet in player.owned_planets() {
            match galaxy.planet(planet) {
                Some(p) if p.owner() == Some(player.id) => {}
                Some(p) => violations.push(InvariantViolation::new(format!(
                    "Player {} lists planet {planet} but it is owned by {:?}",
                    player.id,
                    p.owner()
                ))),
                None => violations.push(InvariantViolation::new(format!(
                    "Player {} lists missing planet {planet}",
                    player.id
                ))),
            }
        }
    }

    let mut structure_ids = HashSet::new();

    for system in galaxy.systems() {
        let shipyards = system
            .planets()
            .iter()
            .filter(|p| p.has_structure(StructureType::GalacticShipyard))
            .count();
        if shipyards > 1 {
            violations.push(InvariantViolation::new(format!(
                "System {} has {shipyards} galactic shipyards",
                system.name
            )));
        }

        for planet in system.planets() {
            if planet.has_spaceport() != planet.owner().is_some() {
                violations.push(InvariantViolation::new(format!(
                    "Planet {} has spaceport {} but owner {:?}",
                    planet.id(),
                    planet.has_spaceport(),
                    planet.owner()
                )));
            }

            if let Some(owner) = planet.owner() {
                let listed = players
                    .get(usize::from(owner))
                    .is_some_and(|p| p.owns_planet(planet.id()));
                if !listed {
                    violations.push(InvariantViolation::new(format!(
                        "Planet {} is owned by player {owner} who does not list it",
                        planet.id()
                    )));
                }
            }

            if !planet.has_spaceport() && !planet.structures().is_empty() {
                violations.push(InvariantViolation::new(format!(
                    "Planet {} has structures but no spaceport",
                    planet.id()
                )));
            }

            for structure in planet.structures() {
                if !structure_ids.insert(structure.id()) {
                    violations.push(InvariantViolation::new(format!(
                        "Structure id {} is used more than once",
                        structure.id()
                    )));
                }
                let max = structure.kind().max_level();
                if !(1..=max).contains(&structure.level()) {
                    violations.push(InvariantViolation::new(format!(
                        "{} {} at level {} (allowed 1-{max})",
                        structure.kind(),
                        structure.id(),
                        structure.level()
                    )));
                }
            }
        }
    }

    violations
}

/// Assert all game invariants hold, panicking if any are violated.
///
/// # Panics
///
/// Panics with detailed message if any invariant is violated.
pub fn assert_invariants(state: &GameState) {
    let violations = check_invariants(state);
    if !violations.is_empty() {
        let messages: Vec<_> = violations.iter().map(|v| v.message.as_str()).collect();
        panic!("Game invariant violations:\n  - {}", messages.join("\n  - "));
    }
}
