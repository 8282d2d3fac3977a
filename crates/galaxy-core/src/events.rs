//! Event cards: the deck, the draw policy, and how each card resolves.
//!
//! Defense and travel-ticket cards go to the player's hand; every other card
//! resolves the moment it is drawn. Mandatory charges that the player cannot
//! cover do not abort the turn. They come back as a shortfall so the caller
//! can decide which assets to liquidate.

use crate::economy::Economy;
use crate::galaxy::{Galaxy, PlanetId};
use crate::player::Player;
use crate::structure::StructureType;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Turns lost to a pirate attack the player cannot buy off
pub const PIRATE_LOST_TURNS: u32 = 2;

/// Turns lost to an engine failure
pub const ENGINE_FAILURE_LOST_TURNS: u32 = 1;

/// Event card kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CardKind {
    /// Pay the ransom or lose two turns
    PirateAttack,
    /// Held; cancels the next pirate attack
    PirateDefense,
    /// Held; redeem at a station to travel to any station
    GalacticTicket,
    /// One-time property tax
    ImperialTax,
    /// Win the lottery prize
    GalacticLottery,
    /// Lose a turn and pay for towing
    EngineFailure,
    /// Only drawn by shipyard owners: pay for repairs or lose a shipyard
    ShipyardMalfunction,
}

impl CardKind {
    /// Whether the card stays in the player's hand instead of resolving
    pub fn is_held(&self) -> bool {
        matches!(self, CardKind::PirateDefense | CardKind::GalacticTicket)
    }

    pub fn description(&self) -> &'static str {
        match self {
            CardKind::PirateAttack => {
                "You have been attacked by pirates! Lose 2 turns or pay a ransom."
            }
            CardKind::PirateDefense => "This card protects you from pirate attacks.",
            CardKind::GalacticTicket => {
                "This ticket allows you to travel to any galactic railway station."
            }
            CardKind::ImperialTax => "The Emperor has imposed a one-time property tax!",
            CardKind::GalacticLottery => "You won galactic credits in the lottery!",
            CardKind::EngineFailure => "Engine failure! Lose a turn and pay for towing.",
            CardKind::ShipyardMalfunction => {
                "Malfunction at your galactic shipyard! Pay for repairs or lose the shipyard."
            }
        }
    }
}

impl fmt::Display for CardKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CardKind::PirateAttack => "Pirate Attack",
            CardKind::PirateDefense => "Pirate Defense",
            CardKind::GalacticTicket => "Galactic Ticket",
            CardKind::ImperialTax => "Imperial Tax",
            CardKind::GalacticLottery => "Galactic Lottery",
            CardKind::EngineFailure => "Engine Failure",
            CardKind::ShipyardMalfunction => "Shipyard Malfunction",
        };
        f.write_str(name)
    }
}

/// The anomaly deck. Cards are never used up; each draw picks uniformly
/// among the cards the drawing player is eligible for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDeck {
    standard: Vec<CardKind>,
    shipyard: Vec<CardKind>,
}

impl EventDeck {
    /// Six standard cards plus the shipyard malfunction card
    pub fn standard() -> Self {
        Self {
            standard: vec![
                CardKind::PirateAttack,
                CardKind::PirateDefense,
                CardKind::GalacticTicket,
                CardKind::ImperialTax,
                CardKind::GalacticLottery,
                CardKind::EngineFailure,
            ],
            shipyard: vec![CardKind::ShipyardMalfunction],
        }
    }

    /// Cards `player` may draw right now
    pub fn eligible(&self, player: &Player, galaxy: &Galaxy) -> Vec<CardKind> {
        let mut cards = self.standard.clone();
        if player.count_galactic_shipyards(galaxy) > 0 {
            cards.extend(self.shipyard.iter().copied());
        }
        cards
    }

    /// Draw one card uniformly from the eligible set
    pub fn draw<R: Rng + ?Sized>(&self, player: &Player, galaxy: &Galaxy, rng: &mut R) -> CardKind {
        let cards = self.eligible(player, galaxy);
        let card = cards[rng.gen_range(0..cards.len())];
        debug!(player = player.id, %card, eligible = cards.len(), "card drawn");
        card
    }
}

impl Default for EventDeck {
    fn default() -> Self {
        Self::standard()
    }
}

/// Result of a mandatory charge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChargeOutcome {
    Paid { amount: u32 },
    /// The player could not pay; nothing was charged and assets must be
    /// liquidated to cover `amount`
    Shortfall { amount: u32, credits: u32 },
}

impl ChargeOutcome {
    fn settle(economy: &Economy, player: &mut Player, amount: u32) -> Self {
        if economy.charge_fee(player, amount).is_ok() {
            ChargeOutcome::Paid { amount }
        } else {
            warn!(
                player = player.id,
                amount,
                credits = player.credits,
                "charge not covered, liquidation required"
            );
            ChargeOutcome::Shortfall {
                amount,
                credits: player.credits,
            }
        }
    }
}

/// What resolving a card (or a pirate tile) did to the player
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CardOutcome {
    /// A held defense card was spent and the attack neutralized
    AttackRepelled,
    RansomPaid { amount: u32 },
    /// Could not pay the ransom
    TurnsLost { turns: u32 },
    TaxAssessed { charge: ChargeOutcome },
    LotteryWon { amount: u32 },
    EngineFailure { turns_lost: u32, towing: ChargeOutcome },
    ShipyardRepaired { cost: u32 },
    /// Could not pay for repairs; the shipyard on `planet` was removed
    ShipyardLost { planet: PlanetId, planet_name: String },
    /// The player owns no shipyard, so nothing happened
    NoShipyard,
    /// The card went to the player's hand
    CardKept { card: CardKind },
}

impl CardOutcome {
    /// Amount the player could not cover, if liquidation is required
    pub fn liquidation_required(&self) -> Option<u32> {
        match self {
            CardOutcome::TaxAssessed {
                charge: ChargeOutcome::Shortfall { amount, .. },
            }
            | CardOutcome::EngineFailure {
                towing: ChargeOutcome::Shortfall { amount, .. },
                ..
            } => Some(*amount),
            _ => None,
        }
    }
}

impl fmt::Display for CardOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardOutcome::AttackRepelled => {
                write!(f, "You used a Pirate Defense card to protect yourself!")
            }
            CardOutcome::RansomPaid { amount } => {
                write!(f, "You paid {amount} credits as ransom to the pirates.")
            }
            CardOutcome::TurnsLost { turns } => {
                write!(f, "You lost {turns} turns to the pirate attack!")
            }
            CardOutcome::TaxAssessed {
                charge: ChargeOutcome::Paid { amount },
            } => write!(f, "You paid {amount} credits of imperial property tax."),
            CardOutcome::TaxAssessed {
                charge: ChargeOutcome::Shortfall { amount, .. },
            } => write!(
                f,
                "You cannot afford the {amount} credit tax! You must sell some of your properties."
            ),
            CardOutcome::LotteryWon { amount } => write!(
                f,
                "Congratulations! You won {amount} credits in the Galactic Lottery!"
            ),
            CardOutcome::EngineFailure { turns_lost, towing } => {
                write!(f, "Your ship's engine has failed. You lose {turns_lost} turn")?;
                match towing {
                    ChargeOutcome::Paid { amount } => {
                        write!(f, " and paid {amount} credits for towing.")
                    }
                    ChargeOutcome::Shortfall { amount, .. } => write!(
                        f,
                        " and cannot afford the {amount} credit tow. You must sell some of your properties."
                    ),
                }
            }
            CardOutcome::ShipyardRepaired { cost } => {
                write!(f, "You paid {cost} credits to repair your shipyard.")
            }
            CardOutcome::ShipyardLost { planet_name, .. } => write!(
                f,
                "You cannot afford the repair costs. You lost the shipyard on {planet_name}."
            ),
            CardOutcome::NoShipyard => write!(f, "You own no shipyard, so there is nothing to repair."),
            CardOutcome::CardKept { card } => write!(f, "You received a {card} card!"),
        }
    }
}

/// Apply a freshly drawn card to `player`
pub fn resolve_card(
    card: CardKind,
    player: &mut Player,
    economy: &Economy,
    galaxy: &mut Galaxy,
) -> CardOutcome {
    if card.is_held() {
        player.cards.push(card);
        return CardOutcome::CardKept { card };
    }

    match card {
        CardKind::PirateAttack => resolve_pirate_attack(player, economy),
        CardKind::PirateDefense | CardKind::GalacticTicket => CardOutcome::CardKept { card },
        CardKind::ImperialTax => {
            let tax = economy.calculate_property_tax(player, galaxy);
            CardOutcome::TaxAssessed {
                charge: ChargeOutcome::settle(economy, player, tax),
            }
        }
        CardKind::GalacticLottery => {
            economy.add_credits(player, economy.lottery_prize);
            CardOutcome::LotteryWon {
                amount: economy.lottery_prize,
            }
        }
        CardKind::EngineFailure => {
            player.lost_turns += ENGINE_FAILURE_LOST_TURNS;
            CardOutcome::EngineFailure {
                turns_lost: ENGINE_FAILURE_LOST_TURNS,
                towing: ChargeOutcome::settle(economy, player, economy.towing_cost),
            }
        }
        CardKind::ShipyardMalfunction => resolve_shipyard_malfunction(player, economy, galaxy),
    }
}

/// Pirates attack: a held defense card wins, else ransom, else lost turns
pub fn resolve_pirate_attack(player: &mut Player, economy: &Economy) -> CardOutcome {
    if player.use_card(CardKind::PirateDefense).is_ok() {
        return CardOutcome::AttackRepelled;
    }

    let ransom = economy.pirate_ransom;
    if economy.charge_fee(player, ransom).is_ok() {
        CardOutcome::RansomPaid { amount: ransom }
    } else {
        player.lost_turns += PIRATE_LOST_TURNS;
        CardOutcome::TurnsLost {
            turns: PIRATE_LOST_TURNS,
        }
    }
}

fn resolve_shipyard_malfunction(
    player: &mut Player,
    economy: &Economy,
    galaxy: &mut Galaxy,
) -> CardOutcome {
    // First owned planet in board order that has a shipyard
    let target = player.owned_planets().find_map(|id| {
        let planet = galaxy.planet(id)?;
        let shipyard = planet
            .structures()
            .iter()
            .find(|s| s.kind() == StructureType::GalacticShipyard)?;
        Some((id, shipyard.id(), planet.name.clone()))
    });
    let Some((planet, shipyard, planet_name)) = target else {
        return CardOutcome::NoShipyard;
    };

    let cost = economy.shipyard_repair_cost;
    if economy.charge_fee(player, cost).is_ok() {
        return CardOutcome::ShipyardRepaired { cost };
    }

    galaxy.remove_structure(planet, shipyard);
    warn!(player = player.id, %planet, "shipyard lost to malfunction");
    CardOutcome::ShipyardLost { planet, planet_name }
}
