//! Board representation: the cyclic track, solar systems, and planets.
//!
//! This module contains:
//! - Tile classification for every track position
//! - Solar systems and their planets
//! - Ownership and construction rules for planets
//! - Topology validation and a builder for hand-made boards
//!
//! The galaxy owns every planet and every structure. Reverse links (a
//! planet's parent system, a structure's planet) are derived from that
//! containment and rebuilt by [`Galaxy::relink`] after a board is restored.

use crate::game::GameError;
use crate::generation::BoardGenerator;
use crate::player::{Player, PlayerId};
use crate::snapshot::null_as_default;
use crate::structure::{Structure, StructureId, StructureType};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use thiserror::Error;

/// Index of a solar system within the galaxy
pub type SystemId = usize;

/// Most planets a single system may hold
pub const MAX_PLANETS_PER_SYSTEM: usize = 4;

/// Stable address of a planet: its system and its slot in that system
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct PlanetId {
    pub system: SystemId,
    pub index: usize,
}

impl PlanetId {
    pub fn new(system: SystemId, index: usize) -> Self {
        Self { system, index }
    }
}

impl fmt::Display for PlanetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.system, self.index)
    }
}

/// What occupies a position on the track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    /// Empty space, nothing happens
    Empty,
    /// A solar system with planets to claim
    System(SystemId),
    /// Draw an event card
    Anomaly,
    /// Pirates attack immediately
    Pirate,
    /// Travel tickets may be redeemed here
    Station,
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Tile::Empty => f.write_str("empty space"),
            Tile::System(_) => f.write_str("solar system"),
            Tile::Anomaly => f.write_str("anomaly"),
            Tile::Pirate => f.write_str("pirate territory"),
            Tile::Station => f.write_str("galactic railway station"),
        }
    }
}

/// Problems found while validating a generated or restored board
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum TopologyError {
    #[error("Track must have at least one position")]
    EmptyTrack,

    #[error("Position {position} is outside a track of length {total}")]
    PositionOutOfRange { position: usize, total: usize },

    #[error("Position {position} carries more than one tag")]
    OverlappingTags { position: usize },

    #[error("System {system} has {count} planets (expected 1-4)")]
    PlanetCount { system: String, count: usize },

    #[error("Generator produced a track of length {actual}, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("Structure id {id} leaves no room for new structures")]
    StructureIdExhausted { id: StructureId },
}

/// A planet inside a solar system
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Planet {
    /// Rebuilt from the containment tree, never encoded
    #[serde(skip)]
    id: PlanetId,
    pub name: String,
    /// Owning player; present exactly when a spaceport stands here
    #[serde(default)]
    owner: Option<PlayerId>,
    #[serde(default, deserialize_with = "null_as_default")]
    structures: Vec<Structure>,
    #[serde(default)]
    has_spaceport: bool,
}

impl Planet {
    fn new(id: PlanetId, name: String) -> Self {
        Self {
            id,
            name,
            owner: None,
            structures: Vec::new(),
            has_spaceport: false,
        }
    }

    pub fn id(&self) -> PlanetId {
        self.id
    }

    /// The system this planet belongs to
    pub fn parent_system(&self) -> SystemId {
        self.id.system
    }

    pub fn owner(&self) -> Option<PlayerId> {
        self.owner
    }

    pub fn has_spaceport(&self) -> bool {
        self.has_spaceport
    }

    pub fn structures(&self) -> &[Structure] {
        &self.structures
    }

    pub fn structure(&self, id: StructureId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id() == id)
    }

    pub fn has_structure(&self, kind: StructureType) -> bool {
        self.structures.iter().any(|s| s.kind() == kind)
    }
}

/// A solar system sitting on one track position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolarSystem {
    #[serde(skip)]
    id: SystemId,
    pub name: String,
    pub position: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    planets: Vec<Planet>,
}

impl SolarSystem {
    pub fn id(&self) -> SystemId {
        self.id
    }

    pub fn planets(&self) -> &[Planet] {
        &self.planets
    }

    pub fn has_galactic_shipyard(&self) -> bool {
        self.planets
            .iter()
            .any(|p| p.has_structure(StructureType::GalacticShipyard))
    }
}

/// The complete board
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Galaxy {
    total_positions: usize,
    #[serde(default, deserialize_with = "null_as_default")]
    systems: Vec<SolarSystem>,
    #[serde(default, deserialize_with = "null_as_default")]
    anomalies: Vec<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    pirates: Vec<usize>,
    #[serde(default, deserialize_with = "null_as_default")]
    stations: Vec<usize>,
    /// Next structure id to hand out
    #[serde(skip)]
    next_structure_id: StructureId,
}

impl Galaxy {
    /// Create a board with no tagged positions
    pub fn new(total_positions: usize) -> Self {
        Self {
            total_positions,
            systems: Vec::new(),
            anomalies: Vec::new(),
            pirates: Vec::new(),
            stations: Vec::new(),
            next_structure_id: 0,
        }
    }

    /// Start a hand-made board
    pub fn builder(total_positions: usize) -> GalaxyBuilder {
        GalaxyBuilder {
            galaxy: Self::new(total_positions),
        }
    }

    /// Generate a board and check its topology before handing it out
    pub fn initialize<G: BoardGenerator + ?Sized>(
        total_positions: usize,
        generator: &mut G,
        rng: &mut dyn RngCore,
    ) -> Result<Self, TopologyError> {
        let mut galaxy = generator.generate(total_positions, rng);
        if galaxy.total_positions != total_positions {
            return Err(TopologyError::LengthMismatch {
                expected: total_positions,
                actual: galaxy.total_positions,
            });
        }
        galaxy.validate()?;
        galaxy.relink()?;
        Ok(galaxy)
    }

    pub fn total_positions(&self) -> usize {
        self.total_positions
    }

    pub fn systems(&self) -> &[SolarSystem] {
        &self.systems
    }

    pub fn system(&self, id: SystemId) -> Option<&SolarSystem> {
        self.systems.get(id)
    }

    /// Station positions in board order
    pub fn stations(&self) -> &[usize] {
        &self.stations
    }

    pub fn anomalies(&self) -> &[usize] {
        &self.anomalies
    }

    pub fn pirates(&self) -> &[usize] {
        &self.pirates
    }

    /// Every planet, system by system
    pub fn planets(&self) -> impl Iterator<Item = &Planet> {
        self.systems.iter().flat_map(|s| s.planets.iter())
    }

    pub fn planet(&self, id: PlanetId) -> Option<&Planet> {
        self.systems.get(id.system)?.planets.get(id.index)
    }

    fn planet_mut(&mut self, id: PlanetId) -> Option<&mut Planet> {
        self.systems.get_mut(id.system)?.planets.get_mut(id.index)
    }

    /// The planet a structure stands on
    pub fn structure_location(&self, id: StructureId) -> Option<PlanetId> {
        self.planets()
            .find(|p| p.structure(id).is_some())
            .map(Planet::id)
    }

    // ==================== Tile Lookups ====================

    pub fn is_system_at(&self, position: usize) -> bool {
        self.systems.iter().any(|s| s.position == position)
    }

    pub fn is_anomaly_at(&self, position: usize) -> bool {
        self.anomalies.contains(&position)
    }

    pub fn is_pirate_at(&self, position: usize) -> bool {
        self.pirates.contains(&position)
    }

    pub fn is_station_at(&self, position: usize) -> bool {
        self.stations.contains(&position)
    }

    pub fn system_at(&self, position: usize) -> Option<&SolarSystem> {
        self.systems.iter().find(|s| s.position == position)
    }

    /// Classify a track position
    pub fn tile_at(&self, position: usize) -> Tile {
        if let Some(system) = self.system_at(position) {
            Tile::System(system.id)
        } else if self.is_anomaly_at(position) {
            Tile::Anomaly
        } else if self.is_pirate_at(position) {
            Tile::Pirate
        } else if self.is_station_at(position) {
            Tile::Station
        } else {
            Tile::Empty
        }
    }

    // ==================== Construction Rules ====================

    /// Whether `player` may put a new structure of `kind` on `planet`
    pub fn can_build(&self, planet: PlanetId, kind: StructureType, player: &Player) -> bool {
        let Some(target) = self.planet(planet) else {
            return false;
        };

        if target.owner != Some(player.id) {
            return false;
        }

        if !target.has_spaceport && kind != StructureType::Spaceport {
            return false;
        }

        // The single spaceport of a planet is raised by claiming it
        if kind == StructureType::Spaceport {
            return false;
        }

        if !kind.is_upgradeable() && target.has_structure(kind) {
            return false;
        }

        let Some(system) = self.system(planet.system) else {
            return false;
        };

        match kind {
            StructureType::GalacticShipyard => {
                player.owns_all_planets_in_system(system) && !system.has_galactic_shipyard()
            }
            StructureType::PlanetaryHotelNetwork => {
                player.owns_all_planets_in_system(system)
                    && target.has_structure(StructureType::GalacticHotel)
            }
            _ => true,
        }
    }

    /// Claim an unowned planet for `player` by raising its spaceport.
    ///
    /// This is the only operation that establishes ownership; it updates the
    /// planet and the player's owned set together.
    pub fn build_spaceport(&mut self, planet: PlanetId, player: &mut Player) -> Result<(), GameError> {
        let target = self
            .planet_mut(planet)
            .ok_or(GameError::UnknownPlanet(planet))?;

        if target.owner.is_some() {
            return Err(GameError::InvalidState(format!(
                "{} is already claimed",
                target.name
            )));
        }

        target.owner = Some(player.id);
        target.has_spaceport = true;
        player.claim_planet(planet);
        Ok(())
    }

    /// Add a new structure, returning its id
    pub fn build_structure(
        &mut self,
        planet: PlanetId,
        kind: StructureType,
        player: &Player,
    ) -> Result<StructureId, GameError> {
        if self.planet(planet).is_none() {
            return Err(GameError::UnknownPlanet(planet));
        }
        if !self.can_build(planet, kind, player) {
            return Err(GameError::InvalidState(format!(
                "cannot build {kind} on planet {planet}"
            )));
        }

        let id = self.next_structure_id;
        self.next_structure_id = id
            .checked_add(1)
            .ok_or(GameError::Topology(TopologyError::StructureIdExhausted { id }))?;
        let target = self
            .planet_mut(planet)
            .ok_or(GameError::UnknownPlanet(planet))?;
        target.structures.push(Structure::new(id, kind));
        Ok(id)
    }

    /// Raise an existing structure by one level
    pub fn upgrade_structure(
        &mut self,
        planet: PlanetId,
        structure: StructureId,
        player: &Player,
    ) -> Result<&Structure, GameError> {
        let target = self
            .planet_mut(planet)
            .ok_or(GameError::UnknownPlanet(planet))?;

        if target.owner != Some(player.id) {
            return Err(GameError::InvalidState(format!(
                "{} does not own {}",
                player.name, target.name
            )));
        }

        let entry = target
            .structures
            .iter_mut()
            .find(|s| s.id() == structure)
            .ok_or(GameError::UnknownStructure(structure))?;
        entry.upgrade()?;
        Ok(entry)
    }

    /// Remove a structure from a planet, returning it
    pub(crate) fn remove_structure(
        &mut self,
        planet: PlanetId,
        structure: StructureId,
    ) -> Option<Structure> {
        let target = self.planet_mut(planet)?;
        let index = target.structures.iter().position(|s| s.id() == structure)?;
        Some(target.structures.remove(index))
    }

    // ==================== Validation ====================

    /// Check that every tagged position is in range and carries one tag,
    /// and that every system has 1-4 planets
    pub fn validate(&self) -> Result<(), TopologyError> {
        if self.total_positions == 0 {
            return Err(TopologyError::EmptyTrack);
        }

        let mut seen = HashSet::new();
        let tagged = self
            .systems
            .iter()
            .map(|s| s.position)
            .chain(self.anomalies.iter().copied())
            .chain(self.pirates.iter().copied())
            .chain(self.stations.iter().copied());

        for position in tagged {
            if position >= self.total_positions {
                return Err(TopologyError::PositionOutOfRange {
                    position,
                    total: self.total_positions,
                });
            }
            if !seen.insert(position) {
                return Err(TopologyError::OverlappingTags { position });
            }
        }

        for system in &self.systems {
            let count = system.planets.len();
            if !(1..=MAX_PLANETS_PER_SYSTEM).contains(&count) {
                return Err(TopologyError::PlanetCount {
                    system: system.name.clone(),
                    count,
                });
            }
        }

        Ok(())
    }

    /// Rebuild derived links: system and planet ids from containment, and
    /// the structure id counter from the highest id in use
    pub(crate) fn relink(&mut self) -> Result<(), TopologyError> {
        let mut next_id: StructureId = 0;
        for (system_id, system) in self.systems.iter_mut().enumerate() {
            system.id = system_id;
            for (index, planet) in system.planets.iter_mut().enumerate() {
                planet.id = PlanetId::new(system_id, index);
                for structure in &planet.structures {
                    let id = structure.id();
                    let after = id
                        .checked_add(1)
                        .ok_or(TopologyError::StructureIdExhausted { id })?;
                    next_id = next_id.max(after);
                }
            }
        }
        self.next_structure_id = next_id;
        Ok(())
    }
}

// The id counter is derived from the structures on the board
impl PartialEq for Galaxy {
    fn eq(&self, other: &Self) -> bool {
        self.total_positions == other.total_positions
            && self.systems == other.systems
            && self.anomalies == other.anomalies
            && self.pirates == other.pirates
            && self.stations == other.stations
    }
}

impl Eq for Galaxy {}

/// Assembles a board by hand, then validates it
#[derive(Debug, Clone)]
pub struct GalaxyBuilder {
    galaxy: Galaxy,
}

impl GalaxyBuilder {
    /// Add a system at `position` with the given planet names
    pub fn system(mut self, position: usize, name: &str, planets: &[&str]) -> Self {
        let system_id = self.galaxy.systems.len();
        let planets = planets
            .iter()
            .enumerate()
            .map(|(index, planet)| Planet::new(PlanetId::new(system_id, index), planet.to_string()))
            .collect();
        self.galaxy.systems.push(SolarSystem {
            id: system_id,
            name: name.to_string(),
            position,
            planets,
        });
        self
    }

    pub fn anomaly(mut self, position: usize) -> Self {
        self.galaxy.anomalies.push(position);
        self
    }

    pub fn pirate(mut self, position: usize) -> Self {
        self.galaxy.pirates.push(position);
        self
    }

    pub fn station(mut self, position: usize) -> Self {
        self.galaxy.stations.push(position);
        self
    }

    /// Validate and return the board
    pub fn build(self) -> Result<Galaxy, TopologyError> {
        let mut galaxy = self.galaxy;
        galaxy.validate()?;
        galaxy.relink()?;
        Ok(galaxy)
    }

    /// Return the board as assembled; the caller validates it
    pub(crate) fn into_unchecked(self) -> Galaxy {
        self.galaxy
    }
}
