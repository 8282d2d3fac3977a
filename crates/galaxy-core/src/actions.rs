//! Commands players can issue and the events they produce.
//!
//! Every engine call returns the events it caused, in order. Each event
//! renders as the message a presentation layer would show the players.

use crate::events::{CardKind, CardOutcome};
use crate::galaxy::{PlanetId, Tile};
use crate::player::{Player, PlayerId};
use crate::structure::{StructureId, StructureType};
use serde::{Deserialize, Serialize};
use std::fmt;

/// All possible actions a player can take on their turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameAction {
    /// Roll the die, fly, and resolve the tile landed on
    Move,
    /// Pass voluntarily (at most twice in a row)
    SkipTurn,
    /// Buy a structure on a planet of the current system. Building a
    /// `Spaceport` on an unowned planet claims it.
    Build {
        planet: PlanetId,
        structure: StructureType,
    },
    /// Raise one of your structures by one level
    Upgrade {
        planet: PlanetId,
        structure: StructureId,
    },
    /// Spend a held card. A Galactic Ticket needs the destination station.
    UseCard {
        card: CardKind,
        destination: Option<usize>,
    },
    /// End the session
    Quit,
}

/// Why a discretionary build or upgrade did not happen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rejection {
    /// Building needs the player to be at the planet's system
    NotInSystem,
    /// Another player owns the planet
    OwnedByOther,
    /// The planet rules forbid this structure here
    NotPermitted,
    /// The structure type has no price in the economy table
    NotForSale,
    /// The structure is already at its top level
    MaxLevel,
    CannotAfford { cost: u32, credits: u32 },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::NotInSystem => {
                f.write_str("you must be in that solar system to build or upgrade")
            }
            Rejection::OwnedByOther => f.write_str("another player owns that planet"),
            Rejection::NotPermitted => f.write_str("that structure cannot be built there"),
            Rejection::NotForSale => f.write_str("that structure cannot be bought"),
            Rejection::MaxLevel => f.write_str("that structure is already at its maximum level"),
            Rejection::CannotAfford { cost, credits } => {
                write!(f, "it costs {cost} credits and you have {credits}")
            }
        }
    }
}

/// Events that occur as a result of actions
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    DiceRolled {
        player: PlayerId,
        roll: u8,
    },

    Moved {
        player: PlayerId,
        from: usize,
        to: usize,
        tile: Tile,
    },

    CardDrawn {
        player: PlayerId,
        card: CardKind,
    },

    /// A drawn card or a pirate tile was resolved
    CardResolved {
        player: PlayerId,
        outcome: CardOutcome,
    },

    /// A mandatory charge could not be covered; the player must sell assets
    LiquidationRequired {
        player: PlayerId,
        amount: u32,
    },

    TurnSkipped {
        player: PlayerId,
        skips_in_a_row: u8,
    },

    /// A penalty turn was served
    TurnForfeited {
        player: PlayerId,
        remaining: u32,
    },

    PlanetClaimed {
        player: PlayerId,
        planet: PlanetId,
        cost: u32,
    },

    StructureBuilt {
        player: PlayerId,
        planet: PlanetId,
        structure: StructureId,
        kind: StructureType,
        cost: u32,
    },

    StructureUpgraded {
        player: PlayerId,
        planet: PlanetId,
        structure: StructureId,
        kind: StructureType,
        level: u8,
        cost: u32,
    },

    /// A build or upgrade was declined; the turn is not used up
    ActionRejected {
        player: PlayerId,
        reason: Rejection,
    },

    TicketUsed {
        player: PlayerId,
        from: usize,
        to: usize,
    },

    IncomePaid {
        turn: u32,
        payments: Vec<(PlayerId, u32)>,
    },

    TurnEnded {
        player: PlayerId,
        next_player: PlayerId,
        turn_number: u32,
    },

    GameQuit,
}

impl GameEvent {
    /// Render the event with player names taken from `players`.
    ///
    /// Seats without a matching player are shown as "Player N", counting
    /// from 1.
    pub fn message<'a>(&'a self, players: &'a [Player]) -> EventMessage<'a> {
        EventMessage {
            event: self,
            players,
        }
    }
}

impl fmt::Display for GameEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.message(&[]), f)
    }
}

/// A [`GameEvent`] paired with the players it refers to
#[derive(Debug, Clone, Copy)]
pub struct EventMessage<'a> {
    event: &'a GameEvent,
    players: &'a [Player],
}

struct Who<'a> {
    id: PlayerId,
    players: &'a [Player],
}

impl fmt::Display for Who<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.players.iter().find(|p| p.id == self.id) {
            Some(player) => f.write_str(&player.name),
            None => write!(f, "Player {}", u16::from(self.id) + 1),
        }
    }
}

impl EventMessage<'_> {
    fn who(&self, id: PlayerId) -> Who<'_> {
        Who {
            id,
            players: self.players,
        }
    }
}

impl fmt::Display for EventMessage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.event {
            GameEvent::DiceRolled { player, roll } => {
                write!(f, "{} rolled a {roll}.", self.who(*player))
            }
            GameEvent::Moved { player, to, tile, .. } => {
                write!(f, "{} moved to position {to} ({tile}).", self.who(*player))
            }
            GameEvent::CardDrawn { player, card } => write!(
                f,
                "{} fell into an anomaly and drew {card}: {}",
                self.who(*player),
                card.description()
            ),
            GameEvent::CardResolved { outcome, .. } => write!(f, "{outcome}"),
            GameEvent::LiquidationRequired { player, amount } => write!(
                f,
                "{} must sell properties to cover {amount} credits.",
                self.who(*player)
            ),
            GameEvent::TurnSkipped {
                player,
                skips_in_a_row,
            } => write!(
                f,
                "{} skipped a turn ({skips_in_a_row} in a row).",
                self.who(*player)
            ),
            GameEvent::TurnForfeited { player, remaining } => write!(
                f,
                "{} loses this turn ({remaining} lost turns remaining).",
                self.who(*player)
            ),
            GameEvent::PlanetClaimed {
                player,
                planet,
                cost,
            } => write!(
                f,
                "{} built a spaceport on planet {planet} for {cost} credits and took control!",
                self.who(*player)
            ),
            GameEvent::StructureBuilt {
                player,
                planet,
                kind,
                cost,
                ..
            } => write!(
                f,
                "{} built a {kind} on planet {planet} for {cost} credits.",
                self.who(*player)
            ),
            GameEvent::StructureUpgraded {
                player,
                planet,
                kind,
                level,
                cost,
                ..
            } => write!(
                f,
                "{} upgraded a {kind} on planet {planet} to level {level} for {cost} credits.",
                self.who(*player)
            ),
            GameEvent::ActionRejected { player, reason } => {
                write!(f, "{} cannot do that: {reason}.", self.who(*player))
            }
            GameEvent::TicketUsed { player, from, to } => write!(
                f,
                "{} travelled by galactic railway from {from} to {to}.",
                self.who(*player)
            ),
            GameEvent::IncomePaid { turn, payments } => {
                write!(f, "Income paid on turn {turn}:")?;
                for (player, amount) in payments {
                    write!(f, " {} +{amount}", self.who(*player))?;
                }
                Ok(())
            }
            GameEvent::TurnEnded {
                next_player,
                turn_number,
                ..
            } => write!(f, "Turn {turn_number}: {} is up.", self.who(*next_player)),
            GameEvent::GameQuit => f.write_str("The game has been saved and closed."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::ChargeOutcome;

    #[test]
    fn test_event_messages() {
        let event = GameEvent::CardResolved {
            player: 0,
            outcome: CardOutcome::RansomPaid { amount: 500 },
        };
        assert_eq!(
            event.to_string(),
            "You paid 500 credits as ransom to the pirates."
        );

        let event = GameEvent::ActionRejected {
            player: 1,
            reason: Rejection::CannotAfford {
                cost: 1000,
                credits: 200,
            },
        };
        assert_eq!(
            event.to_string(),
            "Player 2 cannot do that: it costs 1000 credits and you have 200."
        );

        let event = GameEvent::CardResolved {
            player: 0,
            outcome: CardOutcome::EngineFailure {
                turns_lost: 1,
                towing: ChargeOutcome::Paid { amount: 300 },
            },
        };
        assert_eq!(
            event.to_string(),
            "Your ship's engine has failed. You lose 1 turn and paid 300 credits for towing."
        );
    }

    #[test]
    fn test_event_messages_use_player_names() {
        let players = vec![
            Player::new(0, "Ada".into(), 0),
            Player::new(1, "Bo".into(), 0),
        ];

        let event = GameEvent::DiceRolled { player: 1, roll: 4 };
        assert_eq!(event.message(&players).to_string(), "Bo rolled a 4.");
        assert_eq!(event.to_string(), "Player 2 rolled a 4.");

        let event = GameEvent::IncomePaid {
            turn: 3,
            payments: vec![(0, 200), (1, 250)],
        };
        assert_eq!(
            event.message(&players).to_string(),
            "Income paid on turn 3: Ada +200 Bo +250"
        );

        let event = GameEvent::TurnEnded {
            player: 0,
            next_player: 1,
            turn_number: 2,
        };
        assert_eq!(event.message(&players).to_string(), "Turn 2: Bo is up.");
    }

    #[test]
    fn test_action_serialization() {
        let action = GameAction::Build {
            planet: PlanetId::new(2, 1),
            structure: StructureType::Mine,
        };
        let json = serde_json::to_string(&action).unwrap();
        let back: GameAction = serde_json::from_str(&json).unwrap();
        assert_eq!(back, action);
    }
}
