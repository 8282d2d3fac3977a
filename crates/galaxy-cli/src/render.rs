//! Text rendering of the game for the console.

use galaxy_core::{GameAction, GameState, Planet, PlayerId, Tile};
use std::fmt::Write;

pub const HELP: &str = "\
Commands:
  move                            roll the die and fly
  skip                            pass this turn (at most twice in a row)
  build <planet#> <structure>     build on a planet of this system
                                  ('build 1 spaceport' claims planet 1)
  upgrade <planet#> <structure#>  upgrade one of your structures
  ticket <station-position>       use a Galactic Ticket at a station
  map                             show the whole track
  actions                         list what you can do right now
  help                            show this help
  quit                            save and exit";

fn owner_name(game: &GameState, owner: Option<PlayerId>) -> &str {
    owner
        .and_then(|id| game.get_player(id))
        .map_or("nobody", |p| p.name.as_str())
}

fn planet_line(game: &GameState, number: usize, planet: &Planet) -> String {
    let mut line = format!(
        "  {number}. {} (owner: {})",
        planet.name,
        owner_name(game, planet.owner())
    );
    if planet.has_spaceport() {
        line.push_str(", spaceport");
    }
    for (i, s) in planet.structures().iter().enumerate() {
        let _ = write!(line, "\n       [{}] {} level {}", i + 1, s.kind(), s.level());
    }
    line
}

/// The current player's situation and surroundings
pub fn status(game: &GameState) -> String {
    let player = game.current();
    let cards = if player.cards.is_empty() {
        "none".to_string()
    } else {
        player
            .cards
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join(", ")
    };

    let mut out = format!(
        "\n=== Turn {} | {}'s turn ===\nCredits: {} | Position: {}/{} | Planets: {} | Cards: {}\n",
        game.turn_number,
        player.name,
        player.credits,
        player.position,
        game.galaxy.total_positions(),
        player.owned_planet_count(),
        cards
    );

    match game.galaxy.tile_at(player.position) {
        Tile::System(_) => {
            if let Some(system) = game.galaxy.system_at(player.position) {
                let _ = writeln!(out, "You are in the {} system:", system.name);
                for (i, planet) in system.planets().iter().enumerate() {
                    let _ = writeln!(out, "{}", planet_line(game, i + 1, planet));
                }
            }
        }
        tile => {
            let _ = writeln!(out, "You are in {tile}.");
        }
    }
    out
}

/// One line per track position
pub fn map(game: &GameState) -> String {
    let mut out = String::new();
    for position in 0..game.galaxy.total_positions() {
        let tile = match game.galaxy.system_at(position) {
            Some(system) => format!("{} ({} planets)", system.name, system.planets().len()),
            None => game.galaxy.tile_at(position).to_string(),
        };
        let here: Vec<&str> = game
            .players
            .iter()
            .filter(|p| p.position == position)
            .map(|p| p.name.as_str())
            .collect();

        let _ = write!(out, "{position:>3}  {tile}");
        if !here.is_empty() {
            let _ = write!(out, "  <- {}", here.join(", "));
        }
        out.push('\n');
    }
    out
}

/// A valid action written the way it would be typed
pub fn action_command(game: &GameState, action: &GameAction) -> String {
    let planet_number = |id: galaxy_core::PlanetId| id.index + 1;
    match action {
        GameAction::Move => "move".to_string(),
        GameAction::SkipTurn => "skip".to_string(),
        GameAction::Quit => "quit".to_string(),
        GameAction::Build { planet, structure } => {
            format!("build {} {}", planet_number(*planet), structure.display_name().to_lowercase())
        }
        GameAction::Upgrade { planet, structure } => {
            let number = game
                .galaxy
                .planet(*planet)
                .and_then(|p| p.structures().iter().position(|s| s.id() == *structure))
                .map_or(0, |i| i + 1);
            format!("upgrade {} {}", planet_number(*planet), number)
        }
        GameAction::UseCard { destination, .. } => match destination {
            Some(station) => format!("ticket {station}"),
            None => "ticket".to_string(),
        },
    }
}

/// Everything the current player may do now
pub fn actions(game: &GameState) -> String {
    game.valid_actions(game.current_player)
        .iter()
        .map(|a| format!("  {}", action_command(game, a)))
        .collect::<Vec<_>>()
        .join("\n")
}
