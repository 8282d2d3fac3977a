//! Prices, payouts, and the only sanctioned way to take credits away.

use crate::galaxy::Galaxy;
use crate::game::GameError;
use crate::player::Player;
use crate::structure::StructureType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Economic rule table shared by every player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Economy {
    /// Paid to every player each income cycle, before structure income
    pub base_income: u32,
    /// Income is paid on turns that are a multiple of this
    pub turns_between_payments: u32,
    /// Property tax as a percentage of total holdings value
    pub property_tax_percent: u32,
    pub pirate_ransom: u32,
    pub towing_cost: u32,
    pub shipyard_repair_cost: u32,
    pub lottery_prize: u32,
    /// Price of a new structure; types without an entry cannot be bought
    pub building_costs: HashMap<StructureType, u32>,
    /// Price of one level of upgrade
    pub upgrade_costs: HashMap<StructureType, u32>,
}

impl Default for Economy {
    fn default() -> Self {
        let building_costs = HashMap::from([
            (StructureType::Spaceport, 1000),
            (StructureType::Outpost, 800),
            (StructureType::Habitat, 1500),
            (StructureType::Colony, 3000),
            (StructureType::GalacticHotel, 5000),
            (StructureType::PlanetaryHotelNetwork, 10000),
            (StructureType::Mine, 1200),
            (StructureType::FoodFarm, 800),
            (StructureType::GalacticShipyard, 8000),
            (StructureType::AsteroidMine, 1500),
        ]);

        let upgrade_costs = HashMap::from([
            (StructureType::Outpost, 1000),
            (StructureType::Habitat, 2000),
            (StructureType::Colony, 3000),
            (StructureType::GalacticHotel, 5000),
            (StructureType::Mine, 1500),
            (StructureType::FoodFarm, 1000),
            (StructureType::AsteroidMine, 2000),
        ]);

        Self {
            base_income: 200,
            turns_between_payments: 5,
            property_tax_percent: 10,
            pirate_ransom: 500,
            towing_cost: 300,
            shipyard_repair_cost: 2000,
            lottery_prize: 1000,
            building_costs,
            upgrade_costs,
        }
    }
}

impl Economy {
    pub fn build_cost(&self, kind: StructureType) -> Option<u32> {
        self.building_costs.get(&kind).copied()
    }

    pub fn upgrade_cost(&self, kind: StructureType) -> Option<u32> {
        self.upgrade_costs.get(&kind).copied()
    }

    /// Whether `turn` closes an income cycle
    pub fn is_payment_turn(&self, turn: u32) -> bool {
        self.turns_between_payments > 0 && turn % self.turns_between_payments == 0
    }

    /// Base income plus the income of every structure on every owned planet
    pub fn calculate_income(&self, player: &Player, galaxy: &Galaxy) -> u32 {
        player
            .owned_planets()
            .filter_map(|id| galaxy.planet(id))
            .flat_map(|p| p.structures())
            .fold(self.base_income, |total, s| total.saturating_add(s.income_per_turn()))
    }

    /// Tax over structure values plus one spaceport price per spaceport planet
    pub fn calculate_property_tax(&self, player: &Player, galaxy: &Galaxy) -> u32 {
        let spaceport_value = self.build_cost(StructureType::Spaceport).unwrap_or(0);

        let total_value: u64 = player
            .owned_planets()
            .filter_map(|id| galaxy.planet(id))
            .map(|planet| {
                let structures: u64 = planet.structures().iter().map(|s| u64::from(s.value())).sum();
                let spaceport = if planet.has_spaceport() {
                    u64::from(spaceport_value)
                } else {
                    0
                };
                structures + spaceport
            })
            .sum();

        let tax = total_value * u64::from(self.property_tax_percent) / 100;
        u32::try_from(tax).unwrap_or(u32::MAX)
    }

    pub fn can_afford(&self, player: &Player, cost: u32) -> bool {
        player.credits >= cost
    }

    /// Debit `amount`, refusing if it would leave the player negative
    pub fn charge_fee(&self, player: &mut Player, amount: u32) -> Result<(), GameError> {
        if !self.can_afford(player, amount) {
            return Err(GameError::InsufficientFunds {
                needed: amount,
                available: player.credits,
            });
        }
        player.credits -= amount;
        Ok(())
    }

    pub fn add_credits(&self, player: &mut Player, amount: u32) {
        player.credits = player.credits.saturating_add(amount);
    }
}
