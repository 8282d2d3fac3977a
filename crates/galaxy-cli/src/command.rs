//! Console commands and their translation into engine actions.

use galaxy_core::{CardKind, GameAction, GameState, PlanetId, StructureType};
use std::str::FromStr;
use thiserror::Error;

/// A line typed at the console
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Move,
    Skip,
    /// Planet number is 1-based within the current system
    Build { planet: usize, structure: StructureType },
    /// Planet and structure numbers are 1-based, as listed in the status
    Upgrade { planet: usize, structure: usize },
    Ticket { station: usize },
    Map,
    Actions,
    Help,
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    #[error("Unknown command '{0}'. Type 'help' for a list of commands.")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("'{0}' is not a number")]
    NotANumber(String),

    #[error("Unknown structure '{0}'")]
    UnknownStructure(String),

    #[error("You are not in a solar system.")]
    NotInSystem,

    #[error("There is no planet {0} here.")]
    NoSuchPlanet(usize),

    #[error("Planet {planet} has no structure {structure}.")]
    NoSuchStructure { planet: usize, structure: usize },
}

const BUILD_USAGE: &str = "build <planet#> <structure>";
const UPGRADE_USAGE: &str = "upgrade <planet#> <structure#>";
const TICKET_USAGE: &str = "ticket <station-position>";

fn parse_number(word: Option<&str>, usage: &'static str) -> Result<usize, CommandError> {
    let word = word.ok_or(CommandError::Usage(usage))?;
    word.parse()
        .map_err(|_| CommandError::NotANumber(word.to_string()))
}

/// Match a structure name ignoring case, spaces, and underscores
pub fn parse_structure(name: &str) -> Result<StructureType, CommandError> {
    let normalize = |s: &str| -> String {
        s.chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect()
    };
    let wanted = normalize(name);

    StructureType::ALL
        .into_iter()
        .find(|kind| normalize(kind.display_name()) == wanted)
        .ok_or_else(|| CommandError::UnknownStructure(name.to_string()))
}

impl FromStr for Command {
    type Err = CommandError;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err(CommandError::Unknown(String::new()));
        };

        match verb.to_ascii_lowercase().as_str() {
            "move" | "m" => Ok(Command::Move),
            "skip" | "s" => Ok(Command::Skip),
            "build" | "b" => {
                let planet = parse_number(words.next(), BUILD_USAGE)?;
                let name = words.collect::<Vec<_>>().join(" ");
                if name.is_empty() {
                    return Err(CommandError::Usage(BUILD_USAGE));
                }
                Ok(Command::Build {
                    planet,
                    structure: parse_structure(&name)?,
                })
            }
            "upgrade" | "u" => Ok(Command::Upgrade {
                planet: parse_number(words.next(), UPGRADE_USAGE)?,
                structure: parse_number(words.next(), UPGRADE_USAGE)?,
            }),
            "ticket" | "t" => Ok(Command::Ticket {
                station: parse_number(words.next(), TICKET_USAGE)?,
            }),
            "map" => Ok(Command::Map),
            "actions" | "a" => Ok(Command::Actions),
            "help" | "h" | "?" => Ok(Command::Help),
            "quit" | "q" | "exit" => Ok(Command::Quit),
            other => Err(CommandError::Unknown(other.to_string())),
        }
    }
}

impl Command {
    /// Resolve console numbering against the current player's location.
    ///
    /// Returns `None` for commands that only display information.
    pub fn to_action(&self, game: &GameState) -> Result<Option<GameAction>, CommandError> {
        let action = match *self {
            Command::Move => GameAction::Move,
            Command::Skip => GameAction::SkipTurn,
            Command::Quit => GameAction::Quit,
            Command::Build { planet, structure } => GameAction::Build {
                planet: locate_planet(game, planet)?,
                structure,
            },
            Command::Upgrade { planet, structure } => {
                let id = locate_planet(game, planet)?;
                let target = game
                    .galaxy
                    .planet(id)
                    .ok_or(CommandError::NoSuchPlanet(planet))?;
                let existing = structure
                    .checked_sub(1)
                    .and_then(|i| target.structures().get(i))
                    .ok_or(CommandError::NoSuchStructure { planet, structure })?;
                GameAction::Upgrade {
                    planet: id,
                    structure: existing.id(),
                }
            }
            Command::Ticket { station } => GameAction::UseCard {
                card: CardKind::GalacticTicket,
                destination: Some(station),
            },
            Command::Map | Command::Actions | Command::Help => return Ok(None),
        };
        Ok(Some(action))
    }
}

fn locate_planet(game: &GameState, number: usize) -> Result<PlanetId, CommandError> {
    let system = game
        .galaxy
        .system_at(game.current().position)
        .ok_or(CommandError::NotInSystem)?;
    number
        .checked_sub(1)
        .and_then(|i| system.planets().get(i))
        .map(|p| p.id())
        .ok_or(CommandError::NoSuchPlanet(number))
}
