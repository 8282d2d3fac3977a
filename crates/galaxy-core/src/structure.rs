//! Buildable structures and their pricing curves.
//!
//! A structure's value and income are never stored: they are derived from
//! its type and level every time they are read, so a restored structure can
//! never disagree with the table below.

use crate::game::GameError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable identifier for a structure, unique across the whole galaxy
pub type StructureId = u32;

/// Every kind of structure that can stand on a planet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum StructureType {
    /// Landing facility; claiming a planet builds one
    Spaceport,
    /// Entry of the settlement line, upgradeable to level 4
    Outpost,
    Habitat,
    Colony,
    GalacticHotel,
    /// Requires the whole system and a Galactic Hotel on the planet
    PlanetaryHotelNetwork,
    Mine,
    FoodFarm,
    /// At most one per system, requires the whole system
    GalacticShipyard,
    AsteroidMine,
}

impl StructureType {
    /// All structure types, in catalog order
    pub const ALL: [StructureType; 10] = [
        StructureType::Spaceport,
        StructureType::Outpost,
        StructureType::Habitat,
        StructureType::Colony,
        StructureType::GalacticHotel,
        StructureType::PlanetaryHotelNetwork,
        StructureType::Mine,
        StructureType::FoodFarm,
        StructureType::GalacticShipyard,
        StructureType::AsteroidMine,
    ];

    /// Highest level this type can reach
    pub fn max_level(&self) -> u8 {
        match self {
            StructureType::Outpost => 4,
            StructureType::Mine => 3,
            StructureType::FoodFarm => 6,
            StructureType::AsteroidMine => 5,
            _ => 1,
        }
    }

    /// Whether more than level 1 exists for this type
    pub fn is_upgradeable(&self) -> bool {
        self.max_level() > 1
    }

    /// Value of a structure of this type at `level`
    pub fn value_at(&self, level: u8) -> u32 {
        let level = u32::from(level);
        match self {
            StructureType::Spaceport => 1000,
            StructureType::Outpost => 800 * level,
            StructureType::Habitat => 1500,
            StructureType::Colony => 3000,
            StructureType::GalacticHotel => 5000,
            StructureType::PlanetaryHotelNetwork => 10000,
            StructureType::Mine => 1200 * level,
            StructureType::FoodFarm => 800 * level,
            StructureType::GalacticShipyard => 8000,
            StructureType::AsteroidMine => 1500 * level,
        }
    }

    /// Per-cycle income of a structure of this type at `level`
    pub fn income_at(&self, level: u8) -> u32 {
        let level = u32::from(level);
        match self {
            StructureType::Spaceport => 50,
            StructureType::Outpost => 30 * level,
            StructureType::Habitat => 100,
            StructureType::Colony => 200,
            StructureType::GalacticHotel => 400,
            StructureType::PlanetaryHotelNetwork => 1000,
            StructureType::Mine => 80 * level,
            StructureType::FoodFarm => 60 * level,
            StructureType::GalacticShipyard => 800,
            StructureType::AsteroidMine => 120 * level,
        }
    }

    /// Human-readable name
    pub fn display_name(&self) -> &'static str {
        match self {
            StructureType::Spaceport => "Spaceport",
            StructureType::Outpost => "Outpost",
            StructureType::Habitat => "Habitat",
            StructureType::Colony => "Colony",
            StructureType::GalacticHotel => "Galactic Hotel",
            StructureType::PlanetaryHotelNetwork => "Planetary Hotel Network",
            StructureType::Mine => "Mine",
            StructureType::FoodFarm => "Food Farm",
            StructureType::GalacticShipyard => "Galactic Shipyard",
            StructureType::AsteroidMine => "Asteroid Mine",
        }
    }
}

impl fmt::Display for StructureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// A structure standing on a planet.
///
/// The owning planet is not stored here; `Galaxy::structure_location`
/// resolves it from the containment tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Structure {
    id: StructureId,
    #[serde(rename = "type")]
    kind: StructureType,
    level: u8,
}

impl Structure {
    /// Create a level 1 structure
    pub fn new(id: StructureId, kind: StructureType) -> Self {
        Self { id, kind, level: 1 }
    }

    pub fn id(&self) -> StructureId {
        self.id
    }

    pub fn kind(&self) -> StructureType {
        self.kind
    }

    pub fn level(&self) -> u8 {
        self.level
    }

    /// Current value, used for property tax
    pub fn value(&self) -> u32 {
        self.kind.value_at(self.level)
    }

    /// Current income per payment cycle
    pub fn income_per_turn(&self) -> u32 {
        self.kind.income_at(self.level)
    }

    pub fn can_upgrade(&self) -> bool {
        self.level < self.kind.max_level()
    }

    /// Raise the level by one
    pub fn upgrade(&mut self) -> Result<(), GameError> {
        if !self.can_upgrade() {
            return Err(GameError::InvalidState(format!(
                "cannot upgrade {} beyond level {}",
                self.kind, self.level
            )));
        }
        self.level += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_structure_is_level_one() {
        let mine = Structure::new(7, StructureType::Mine);
        assert_eq!(mine.id(), 7);
        assert_eq!(mine.level(), 1);
        assert_eq!(mine.value(), 1200);
        assert_eq!(mine.income_per_turn(), 80);
    }

    #[test]
    fn test_outpost_upgrades_to_level_four() {
        let mut outpost = Structure::new(1, StructureType::Outpost);
        for _ in 0..3 {
            outpost.upgrade().unwrap();
        }

        assert_eq!(outpost.level(), 4);
        assert!(!outpost.can_upgrade());
        assert_eq!(outpost.value(), 3200);
        assert_eq!(outpost.income_per_turn(), 120);
        assert!(matches!(outpost.upgrade(), Err(GameError::InvalidState(_))));
        assert_eq!(outpost.level(), 4);
    }

    #[test]
    fn test_fixed_types_not_upgradeable() {
        for kind in [
            StructureType::Spaceport,
            StructureType::Habitat,
            StructureType::Colony,
            StructureType::GalacticHotel,
            StructureType::PlanetaryHotelNetwork,
            StructureType::GalacticShipyard,
        ] {
            let mut structure = Structure::new(0, kind);
            assert!(!structure.can_upgrade(), "{kind} should be flat");
            assert!(structure.upgrade().is_err());
        }
    }

    #[test]
    fn test_max_levels() {
        assert_eq!(StructureType::Mine.max_level(), 3);
        assert_eq!(StructureType::FoodFarm.max_level(), 6);
        assert_eq!(StructureType::AsteroidMine.max_level(), 5);
        assert_eq!(StructureType::GalacticShipyard.max_level(), 1);
    }

    #[test]
    fn test_scaling_types_multiply_by_level() {
        let mut farm = Structure::new(0, StructureType::FoodFarm);
        farm.upgrade().unwrap();
        farm.upgrade().unwrap();
        assert_eq!(farm.value(), 2400);
        assert_eq!(farm.income_per_turn(), 180);

        assert_eq!(StructureType::AsteroidMine.income_at(5), 600);
        assert_eq!(StructureType::Colony.value_at(3), 3000);
    }
}
