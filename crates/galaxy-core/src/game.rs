//! Core turn engine.
//!
//! This module contains the main `GameState` struct: whose turn it is, which
//! actions are legal, how a move resolves against the board, and when income
//! is paid. Each call to [`GameState::apply_action`] runs one command to
//! completion and returns the events it produced.

use crate::actions::{GameAction, GameEvent, Rejection};
use crate::economy::Economy;
use crate::events::{self, CardKind, CardOutcome, EventDeck};
use crate::galaxy::{Galaxy, PlanetId, Tile, TopologyError};
use crate::generation::{BoardGenerator, RandomLayout};
use crate::player::{Player, PlayerId};
use crate::snapshot::GameSnapshot;
use crate::structure::{StructureId, StructureType};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

/// Fewest players a game can start with
pub const MIN_PLAYERS: usize = 1;

/// Most players a game can start with
pub const MAX_PLAYERS: usize = 4;

/// Faces on the movement die
const DIE_SIDES: u8 = 6;

/// Engine state between commands
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the current player's command. Resolution happens inside
    /// a single `apply_action` call, so no other state is observable.
    AwaitingAction,
    /// The session was closed; no further commands are accepted
    Quit,
}

/// Errors that can occur when applying actions
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum GameError {
    #[error("Not your turn")]
    NotYourTurn,

    #[error("Game is over")]
    GameOver,

    #[error("Invalid action: {0}")]
    InvalidState(String),

    #[error("Cannot afford this: need {needed} credits, have {available}")]
    InsufficientFunds { needed: u32, available: u32 },

    #[error("Invalid card: {0}")]
    InvalidCard(String),

    #[error("Cannot skip more than 2 turns in a row")]
    TurnLimitExceeded,

    #[error("Invalid board: {0}")]
    Topology(#[from] TopologyError),

    #[error("No planet {0}")]
    UnknownPlanet(PlanetId),

    #[error("No structure with id {0}")]
    UnknownStructure(StructureId),

    #[error("Invalid setup: {0}")]
    InvalidSetup(String),

    #[error("Invalid snapshot: {0}")]
    InvalidSnapshot(String),
}

/// Settings for a new game
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Number of positions on the track
    pub board_size: usize,
    pub starting_credits: u32,
    pub economy: Economy,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            board_size: 40,
            starting_credits: 5000,
            economy: Economy::default(),
        }
    }
}

/// An upgrade a player could buy right now, with its price
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeOption {
    pub structure: StructureId,
    pub kind: StructureType,
    pub level: u8,
    pub cost: u32,
}

/// The complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// The game board
    pub galaxy: Galaxy,
    /// Price and payout table
    pub economy: Economy,
    /// All players, in turn order
    pub players: Vec<Player>,
    /// Current player index
    pub current_player: PlayerId,
    /// Turn number (starts at 1, increments when play wraps to player 0)
    pub turn_number: u32,
    pub phase: GamePhase,
    /// Turn on which income was last paid, so a cycle pays once
    last_income_turn: Option<u32>,
    deck: EventDeck,
    /// Dice, card draws, and board generation all come from here
    rng: StdRng,
}

impl GameState {
    /// Create a new game on a randomly generated board
    pub fn new(player_names: Vec<String>, config: GameConfig) -> Result<Self, GameError> {
        let seed = rand::thread_rng().gen();
        Self::with_seed(player_names, config, seed)
    }

    /// Create a new game whose board, dice, and draws follow `seed`
    pub fn with_seed(
        player_names: Vec<String>,
        config: GameConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        Self::with_generator(player_names, config, &mut RandomLayout, seed)
    }

    /// Create a new game on a board from `generator`
    pub fn with_generator<G: BoardGenerator + ?Sized>(
        player_names: Vec<String>,
        config: GameConfig,
        generator: &mut G,
        seed: u64,
    ) -> Result<Self, GameError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_names.len()) {
            return Err(GameError::InvalidSetup(format!(
                "need {MIN_PLAYERS}-{MAX_PLAYERS} players, got {}",
                player_names.len()
            )));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let galaxy = Galaxy::initialize(config.board_size, generator, &mut rng)?;

        let players = player_names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let name = if name.trim().is_empty() {
                    format!("Player {}", i + 1)
                } else {
                    name
                };
                Player::new(i as PlayerId, name, config.starting_credits)
            })
            .collect();

        info!(seed, board_size = config.board_size, "new game created");

        Ok(Self {
            galaxy,
            economy: config.economy,
            players,
            current_player: 0,
            turn_number: 1,
            phase: GamePhase::AwaitingAction,
            last_income_turn: None,
            deck: EventDeck::standard(),
            rng,
        })
    }

    /// Resume a saved game with fresh dice
    pub fn restore(snapshot: GameSnapshot) -> Result<Self, GameError> {
        let seed = rand::thread_rng().gen();
        Self::from_snapshot(snapshot, seed)
    }

    /// Resume a saved game; dice and draws continue from `seed`
    pub fn from_snapshot(mut snapshot: GameSnapshot, seed: u64) -> Result<Self, GameError> {
        snapshot.rebuild_links()?;

        let mut state = Self {
            galaxy: snapshot.galaxy,
            economy: snapshot.economy,
            players: snapshot.players,
            current_player: snapshot.current_player,
            turn_number: snapshot.current_turn,
            phase: GamePhase::AwaitingAction,
            last_income_turn: snapshot.last_income_turn,
            deck: EventDeck::standard(),
            rng: StdRng::seed_from_u64(seed),
        };

        let mut events = Vec::new();
        state.forfeit_lost_turns(&mut events);
        info!(
            turn = state.turn_number,
            player = state.current_player,
            forfeited = events.len(),
            "game restored"
        );
        Ok(state)
    }

    /// Plain copy of everything a save file needs
    pub fn snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            players: self.players.clone(),
            galaxy: self.galaxy.clone(),
            economy: self.economy.clone(),
            current_turn: self.turn_number,
            current_player: self.current_player,
            last_income_turn: self.last_income_turn,
        }
    }

    /// Get the number of players
    pub fn player_count(&self) -> usize {
        self.players.len()
    }

    /// Get a player by ID
    pub fn get_player(&self, id: PlayerId) -> Option<&Player> {
        self.players.get(id as usize)
    }

    /// The player whose command is awaited
    pub fn current(&self) -> &Player {
        &self.players[self.current_player as usize]
    }

    pub fn is_finished(&self) -> bool {
        self.phase == GamePhase::Quit
    }

    // ==================== Action Discovery ====================

    /// Planets in the player's current system they may build on
    pub fn buildable_planets(&self, player: PlayerId) -> Vec<PlanetId> {
        let Some(p) = self.get_player(player) else {
            return Vec::new();
        };
        let Some(system) = self.galaxy.system_at(p.position) else {
            return Vec::new();
        };

        system
            .planets()
            .iter()
            .filter(|planet| planet.owner().map_or(true, |owner| owner == player))
            .map(|planet| planet.id())
            .collect()
    }

    /// Structures the player may put on `planet`, with prices
    pub fn available_structures(&self, player: PlayerId, planet: PlanetId) -> Vec<(StructureType, u32)> {
        let (Some(p), Some(target)) = (self.get_player(player), self.galaxy.planet(planet)) else {
            return Vec::new();
        };

        match target.owner() {
            None => self
                .economy
                .build_cost(StructureType::Spaceport)
                .map(|cost| vec![(StructureType::Spaceport, cost)])
                .unwrap_or_default(),
            Some(owner) if owner == player => StructureType::ALL
                .iter()
                .filter(|kind| self.galaxy.can_build(planet, **kind, p))
                .filter_map(|kind| self.economy.build_cost(*kind).map(|cost| (*kind, cost)))
                .collect(),
            Some(_) => Vec::new(),
        }
    }

    /// Structures on `planet` the player may upgrade, with prices
    pub fn upgradable_structures(&self, player: PlayerId, planet: PlanetId) -> Vec<UpgradeOption> {
        let Some(target) = self.galaxy.planet(planet) else {
            return Vec::new();
        };
        if target.owner() != Some(player) {
            return Vec::new();
        }

        target
            .structures()
            .iter()
            .filter(|s| s.can_upgrade())
            .filter_map(|s| {
                self.economy.upgrade_cost(s.kind()).map(|cost| UpgradeOption {
                    structure: s.id(),
                    kind: s.kind(),
                    level: s.level(),
                    cost,
                })
            })
            .collect()
    }

    /// Get all currently valid actions for a player
    pub fn valid_actions(&self, player: PlayerId) -> Vec<GameAction> {
        let mut actions = Vec::new();
        if self.phase == GamePhase::Quit || player != self.current_player {
            return actions;
        }
        let Some(p) = self.get_player(player) else {
            return actions;
        };

        actions.push(GameAction::Move);
        if p.can_skip_turn() {
            actions.push(GameAction::SkipTurn);
        }

        for planet in self.buildable_planets(player) {
            for (structure, cost) in self.available_structures(player, planet) {
                if self.economy.can_afford(p, cost) {
                    actions.push(GameAction::Build { planet, structure });
                }
            }
            for option in self.upgradable_structures(player, planet) {
                if self.economy.can_afford(p, option.cost) {
                    actions.push(GameAction::Upgrade {
                        planet,
                        structure: option.structure,
                    });
                }
            }
        }

        if p.has_card(CardKind::GalacticTicket) && self.galaxy.is_station_at(p.position) {
            for &station in self.galaxy.stations() {
                actions.push(GameAction::UseCard {
                    card: CardKind::GalacticTicket,
                    destination: Some(station),
                });
            }
        }

        actions.push(GameAction::Quit);
        actions
    }

    // ==================== Command Handling ====================

    /// Apply an action to the game state
    pub fn apply_action(
        &mut self,
        player: PlayerId,
        action: GameAction,
    ) -> Result<Vec<GameEvent>, GameError> {
        if self.phase == GamePhase::Quit {
            return Err(GameError::GameOver);
        }
        if player != self.current_player {
            return Err(GameError::NotYourTurn);
        }

        let mut events = Vec::new();

        match action {
            GameAction::Move => {
                let roll = self.rng.gen_range(1..=DIE_SIDES);
                self.move_by(player, roll, &mut events);
                self.players[player as usize].take_turn();
                self.pay_income_if_due(&mut events);
                self.advance_turn(&mut events);
            }

            GameAction::SkipTurn => {
                let p = &mut self.players[player as usize];
                p.skip_turn()?;
                events.push(GameEvent::TurnSkipped {
                    player,
                    skips_in_a_row: p.skipped_turns,
                });
                self.pay_income_if_due(&mut events);
                self.advance_turn(&mut events);
            }

            GameAction::Build { planet, structure } => {
                let event = self.build(player, planet, structure)?;
                self.finish_discretionary(player, event, &mut events);
            }

            GameAction::Upgrade { planet, structure } => {
                let event = self.upgrade(player, planet, structure)?;
                self.finish_discretionary(player, event, &mut events);
            }

            GameAction::UseCard { card, destination } => {
                events.push(self.use_card(player, card, destination)?);
                self.players[player as usize].take_turn();
                self.advance_turn(&mut events);
            }

            GameAction::Quit => {
                self.phase = GamePhase::Quit;
                info!(turn = self.turn_number, "game quit");
                events.push(GameEvent::GameQuit);
            }
        }

        Ok(events)
    }

    /// A rejected build keeps the turn; a completed one ends it
    fn finish_discretionary(&mut self, player: PlayerId, event: GameEvent, events: &mut Vec<GameEvent>) {
        let rejected = matches!(event, GameEvent::ActionRejected { .. });
        events.push(event);
        if !rejected {
            self.players[player as usize].take_turn();
            self.advance_turn(events);
        }
    }

    fn move_by(&mut self, player: PlayerId, roll: u8, events: &mut Vec<GameEvent>) {
        let total = self.galaxy.total_positions();
        let p = &mut self.players[player as usize];
        let from = p.position;
        let to = (from + usize::from(roll)) % total;
        p.position = to;

        let tile = self.galaxy.tile_at(to);
        debug!(player, roll, from, to, %tile, "player moved");
        events.push(GameEvent::DiceRolled { player, roll });
        events.push(GameEvent::Moved {
            player,
            from,
            to,
            tile,
        });

        match tile {
            Tile::Anomaly => {
                let card = self
                    .deck
                    .draw(&self.players[player as usize], &self.galaxy, &mut self.rng);
                events.push(GameEvent::CardDrawn { player, card });
                self.resolve_drawn_card(player, card, events);
            }
            Tile::Pirate => {
                let outcome =
                    events::resolve_pirate_attack(&mut self.players[player as usize], &self.economy);
                Self::push_outcome(player, outcome, events);
            }
            Tile::System(_) | Tile::Station | Tile::Empty => {}
        }
    }

    fn resolve_drawn_card(&mut self, player: PlayerId, card: CardKind, events: &mut Vec<GameEvent>) {
        let outcome = events::resolve_card(
            card,
            &mut self.players[player as usize],
            &self.economy,
            &mut self.galaxy,
        );
        Self::push_outcome(player, outcome, events);
    }

    fn push_outcome(player: PlayerId, outcome: CardOutcome, events: &mut Vec<GameEvent>) {
        let shortfall = outcome.liquidation_required();
        events.push(GameEvent::CardResolved { player, outcome });
        if let Some(amount) = shortfall {
            events.push(GameEvent::LiquidationRequired { player, amount });
        }
    }

    fn build(
        &mut self,
        player: PlayerId,
        planet: PlanetId,
        kind: StructureType,
    ) -> Result<GameEvent, GameError> {
        let target = self
            .galaxy
            .planet(planet)
            .ok_or(GameError::UnknownPlanet(planet))?;
        let owner = target.owner();
        let idx = player as usize;
        let rejected = |reason| Ok(GameEvent::ActionRejected { player, reason });

        if !self.in_system_of(player, planet) {
            return rejected(Rejection::NotInSystem);
        }

        match owner {
            Some(other) if other != player => rejected(Rejection::OwnedByOther),

            None => {
                if kind != StructureType::Spaceport {
                    return rejected(Rejection::NotPermitted);
                }
                let Some(cost) = self.economy.build_cost(kind) else {
                    return rejected(Rejection::NotForSale);
                };
                if let Some(reason) = self.unaffordable(player, cost) {
                    return rejected(reason);
                }

                self.galaxy.build_spaceport(planet, &mut self.players[idx])?;
                self.economy.charge_fee(&mut self.players[idx], cost)?;
                Ok(GameEvent::PlanetClaimed {
                    player,
                    planet,
                    cost,
                })
            }

            Some(_) => {
                if !self.galaxy.can_build(planet, kind, &self.players[idx]) {
                    return rejected(Rejection::NotPermitted);
                }
                let Some(cost) = self.economy.build_cost(kind) else {
                    return rejected(Rejection::NotForSale);
                };
                if let Some(reason) = self.unaffordable(player, cost) {
                    return rejected(reason);
                }

                let structure = self.galaxy.build_structure(planet, kind, &self.players[idx])?;
                self.economy.charge_fee(&mut self.players[idx], cost)?;
                Ok(GameEvent::StructureBuilt {
                    player,
                    planet,
                    structure,
                    kind,
                    cost,
                })
            }
        }
    }

    fn upgrade(
        &mut self,
        player: PlayerId,
        planet: PlanetId,
        structure: StructureId,
    ) -> Result<GameEvent, GameError> {
        let target = self
            .galaxy
            .planet(planet)
            .ok_or(GameError::UnknownPlanet(planet))?;
        let idx = player as usize;
        let rejected = |reason| Ok(GameEvent::ActionRejected { player, reason });

        if !self.in_system_of(player, planet) {
            return rejected(Rejection::NotInSystem);
        }
        match target.owner() {
            Some(owner) if owner == player => {}
            Some(_) => return rejected(Rejection::OwnedByOther),
            None => return rejected(Rejection::NotPermitted),
        }

        let existing = target
            .structure(structure)
            .ok_or(GameError::UnknownStructure(structure))?;
        if !existing.can_upgrade() {
            return rejected(Rejection::MaxLevel);
        }
        let kind = existing.kind();
        let Some(cost) = self.economy.upgrade_cost(kind) else {
            return rejected(Rejection::NotForSale);
        };
        if let Some(reason) = self.unaffordable(player, cost) {
            return rejected(reason);
        }

        let level = self
            .galaxy
            .upgrade_structure(planet, structure, &self.players[idx])?
            .level();
        self.economy.charge_fee(&mut self.players[idx], cost)?;
        Ok(GameEvent::StructureUpgraded {
            player,
            planet,
            structure,
            kind,
            level,
            cost,
        })
    }

    fn use_card(
        &mut self,
        player: PlayerId,
        card: CardKind,
        destination: Option<usize>,
    ) -> Result<GameEvent, GameError> {
        let p = &self.players[player as usize];
        if !p.has_card(card) {
            return Err(GameError::InvalidCard(format!("{} does not hold {card}", p.name)));
        }

        match card {
            CardKind::GalacticTicket => {
                if !self.galaxy.is_station_at(p.position) {
                    return Err(GameError::InvalidCard(
                        "a Galactic Ticket can only be used at a station".to_string(),
                    ));
                }
                let to = destination.ok_or_else(|| {
                    GameError::InvalidCard("choose a destination station".to_string())
                })?;
                if !self.galaxy.is_station_at(to) {
                    return Err(GameError::InvalidCard(format!(
                        "position {to} is not a station"
                    )));
                }

                let p = &mut self.players[player as usize];
                p.use_card(card)?;
                let from = p.position;
                p.position = to;
                Ok(GameEvent::TicketUsed { player, from, to })
            }
            _ => Err(GameError::InvalidCard(format!(
                "{card} cannot be played directly"
            ))),
        }
    }

    fn in_system_of(&self, player: PlayerId, planet: PlanetId) -> bool {
        self.get_player(player)
            .and_then(|p| self.galaxy.system_at(p.position))
            .is_some_and(|system| system.id() == planet.system)
    }

    fn unaffordable(&self, player: PlayerId, cost: u32) -> Option<Rejection> {
        let p = &self.players[player as usize];
        if self.economy.can_afford(p, cost) {
            None
        } else {
            Some(Rejection::CannotAfford {
                cost,
                credits: p.credits,
            })
        }
    }

    // ==================== Turn Order ====================

    /// Pay every player once per income cycle
    fn pay_income_if_due(&mut self, events: &mut Vec<GameEvent>) {
        let turn = self.turn_number;
        if !self.economy.is_payment_turn(turn) || self.last_income_turn == Some(turn) {
            return;
        }

        let payments: Vec<(PlayerId, u32)> = self
            .players
            .iter()
            .map(|p| (p.id, self.economy.calculate_income(p, &self.galaxy)))
            .collect();
        for &(id, amount) in &payments {
            self.economy.add_credits(&mut self.players[id as usize], amount);
        }
        self.last_income_turn = Some(turn);

        info!(turn, players = payments.len(), "income paid");
        events.push(GameEvent::IncomePaid { turn, payments });
    }

    fn step_to_next_player(&mut self) {
        self.current_player = (self.current_player + 1) % self.player_count() as PlayerId;
        if self.current_player == 0 {
            self.turn_number += 1;
        }
    }

    /// Serve penalty turns until someone is free to act
    fn forfeit_lost_turns(&mut self, events: &mut Vec<GameEvent>) {
        loop {
            let p = &mut self.players[self.current_player as usize];
            if p.lost_turns == 0 {
                break;
            }
            p.lost_turns -= 1;
            debug!(player = p.id, remaining = p.lost_turns, "turn forfeited");
            events.push(GameEvent::TurnForfeited {
                player: p.id,
                remaining: p.lost_turns,
            });
            self.step_to_next_player();
        }
    }

    fn advance_turn(&mut self, events: &mut Vec<GameEvent>) {
        let finished = self.current_player;
        self.step_to_next_player();
        self.forfeit_lost_turns(events);
        events.push(GameEvent::TurnEnded {
            player: finished,
            next_player: self.current_player,
            turn_number: self.turn_number,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generation::FixedLayout;
    use crate::invariants::check_invariants;
    use pretty_assertions::assert_eq;

    const SOL: usize = 2;
    const ANOMALY: usize = 4;
    const PIRATES: usize = 6;
    const STATION_A: usize = 8;
    const STATION_B: usize = 12;
    const VEGA: usize = 14;

    fn test_board() -> Galaxy {
        Galaxy::builder(20)
            .system(SOL, "Sol", &["Terra", "Mars"])
            .anomaly(ANOMALY)
            .pirate(PIRATES)
            .station(STATION_A)
            .station(STATION_B)
            .system(VEGA, "Vega", &["Vega I"])
            .build()
            .unwrap()
    }

    fn test_game(names: &[&str]) -> GameState {
        let config = GameConfig {
            board_size: 20,
            ..GameConfig::default()
        };
        GameState::with_generator(
            names.iter().map(|n| n.to_string()).collect(),
            config,
            &mut FixedLayout::new(test_board()),
            42,
        )
        .unwrap()
    }

    const TERRA: PlanetId = PlanetId { system: 0, index: 0 };
    const MARS: PlanetId = PlanetId { system: 0, index: 1 };

    #[test]
    fn test_new_game() {
        let game = test_game(&["Ada", ""]);
        assert_eq!(game.turn_number, 1);
        assert_eq!(game.current_player, 0);
        assert_eq!(game.phase, GamePhase::AwaitingAction);
        assert_eq!(game.players[1].name, "Player 2");
        assert!(game.players.iter().all(|p| p.credits == 5000 && p.position == 0));
    }

    #[test]
    fn test_player_count_limits() {
        let none = GameState::with_seed(vec![], GameConfig::default(), 1);
        assert!(matches!(none, Err(GameError::InvalidSetup(_))));

        let names = (0..5).map(|i| format!("P{i}")).collect();
        let five = GameState::with_seed(names, GameConfig::default(), 1);
        assert!(matches!(five, Err(GameError::InvalidSetup(_))));
    }

    #[test]
    fn test_not_your_turn() {
        let mut game = test_game(&["Ada", "Bo"]);
        assert_eq!(
            game.apply_action(1, GameAction::Move),
            Err(GameError::NotYourTurn)
        );
    }

    #[test]
    fn test_move_advances_turn_order() {
        let mut game = test_game(&["Ada", "Bo"]);
        // Nothing within one roll of here charges or delays the player
        game.players[0].position = STATION_A;

        let events = game.apply_action(0, GameAction::Move).unwrap();
        let roll = match events[0] {
            GameEvent::DiceRolled { roll, .. } => roll,
            ref other => panic!("expected a roll, got {other:?}"),
        };
        assert!((1..=6).contains(&roll));
        assert_eq!(game.players[0].position, STATION_A + usize::from(roll));
        assert_eq!(game.current_player, 1);
        assert_eq!(game.turn_number, 1);

        game.apply_action(1, GameAction::SkipTurn).unwrap();
        assert_eq!(game.current_player, 0);
        assert_eq!(game.turn_number, 2);
    }

    #[test]
    fn test_move_wraps_around_track() {
        let mut game = test_game(&["Ada"]);
        game.players[0].position = 18;
        let mut events = Vec::new();
        game.move_by(0, 5, &mut events);
        assert_eq!(game.players[0].position, 3);
    }

    #[test]
    fn test_claim_planet_with_spaceport() {
        let mut game = test_game(&["Ada", "Bo"]);
        game.players[0].position = SOL;

        let events = game
            .apply_action(
                0,
                GameAction::Build {
                    planet: TERRA,
                    structure: StructureType::Spaceport,
                },
            )
            .unwrap();

        assert_eq!(
            events[0],
            GameEvent::PlanetClaimed {
                player: 0,
                planet: TERRA,
                cost: 1000
            }
        );
        assert_eq!(game.players[0].credits, 4000);
        let terra = game.galaxy.planet(TERRA).unwrap();
        assert_eq!(terra.owner(), Some(0));
        assert!(terra.has_spaceport());
        assert!(game.players[0].owns_planet(TERRA));
        assert_eq!(game.current_player, 1);
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_rejected_build_keeps_turn() {
        let mut game = test_game(&["Ada", "Bo"]);

        // Not at the system
        let events = game
            .apply_action(
                0,
                GameAction::Build {
                    planet: TERRA,
                    structure: StructureType::Spaceport,
                },
            )
            .unwrap();
        assert_eq!(
            events,
            vec![GameEvent::ActionRejected {
                player: 0,
                reason: Rejection::NotInSystem
            }]
        );
        assert_eq!(game.current_player, 0);

        // Too poor
        game.players[0].position = SOL;
        game.players[0].credits = 999;
        let events = game
            .apply_action(
                0,
                GameAction::Build {
                    planet: TERRA,
                    structure: StructureType::Spaceport,
                },
            )
            .unwrap();
        assert_eq!(
            events,
            vec![GameEvent::ActionRejected {
                player: 0,
                reason: Rejection::CannotAfford {
                    cost: 1000,
                    credits: 999
                }
            }]
        );
        assert_eq!(game.players[0].credits, 999);
        assert_eq!(game.galaxy.planet(TERRA).unwrap().owner(), None);
        assert_eq!(game.current_player, 0);
    }

    #[test]
    fn test_cannot_build_on_rival_planet() {
        let mut game = test_game(&["Ada", "Bo"]);
        game.players[0].position = SOL;
        game.players[1].position = SOL;
        game.galaxy
            .build_spaceport(TERRA, &mut game.players[0])
            .unwrap();
        game.current_player = 1;

        let events = game
            .apply_action(
                1,
                GameAction::Build {
                    planet: TERRA,
                    structure: StructureType::Mine,
                },
            )
            .unwrap();
        assert_eq!(
            events,
            vec![GameEvent::ActionRejected {
                player: 1,
                reason: Rejection::OwnedByOther
            }]
        );
        assert!(game.buildable_planets(1).contains(&MARS));
        assert!(!game.buildable_planets(1).contains(&TERRA));
    }

    #[test]
    fn test_build_and_upgrade_structure() {
        let mut game = test_game(&["Ada"]);
        game.players[0].position = SOL;
        game.players[0].credits = 20_000;
        game.galaxy
            .build_spaceport(TERRA, &mut game.players[0])
            .unwrap();

        let events = game
            .apply_action(
                0,
                GameAction::Build {
                    planet: TERRA,
                    structure: StructureType::Mine,
                },
            )
            .unwrap();
        let structure = match events[0] {
            GameEvent::StructureBuilt { structure, cost, .. } => {
                assert_eq!(cost, 1200);
                structure
            }
            ref other => panic!("expected a build, got {other:?}"),
        };
        assert_eq!(game.players[0].credits, 18_800);

        for expected_level in [2, 3] {
            let events = game
                .apply_action(0, GameAction::Upgrade { planet: TERRA, structure })
                .unwrap();
            assert!(matches!(
                events[0],
                GameEvent::StructureUpgraded { level, cost: 1500, .. } if level == expected_level
            ));
        }
        assert_eq!(game.players[0].credits, 15_800);

        let events = game
            .apply_action(0, GameAction::Upgrade { planet: TERRA, structure })
            .unwrap();
        assert_eq!(
            events,
            vec![GameEvent::ActionRejected {
                player: 0,
                reason: Rejection::MaxLevel
            }]
        );
        assert_eq!(
            game.apply_action(0, GameAction::Upgrade { planet: TERRA, structure: 77 }),
            Err(GameError::UnknownStructure(77))
        );
    }

    #[test]
    fn test_pirate_tile_without_means() {
        let mut game = test_game(&["Ada", "Bo"]);
        game.players[0].credits = 400;

        let mut events = Vec::new();
        game.move_by(0, PIRATES as u8, &mut events);

        assert_eq!(game.players[0].lost_turns, 2);
        assert_eq!(game.players[0].credits, 400);
        assert!(events.contains(&GameEvent::CardResolved {
            player: 0,
            outcome: CardOutcome::TurnsLost { turns: 2 }
        }));
    }

    #[test]
    fn test_pirate_tile_pays_ransom() {
        let mut game = test_game(&["Ada"]);
        let mut events = Vec::new();
        game.move_by(0, PIRATES as u8, &mut events);
        assert_eq!(game.players[0].credits, 4500);
        assert_eq!(game.players[0].lost_turns, 0);
    }

    #[test]
    fn test_anomaly_draws_a_card() {
        let mut game = test_game(&["Ada"]);
        let mut events = Vec::new();
        game.move_by(0, ANOMALY as u8, &mut events);

        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CardDrawn { player: 0, .. })));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::CardResolved { player: 0, .. })));
    }

    #[test]
    fn test_shipyard_malfunction_without_credits() {
        let mut game = test_game(&["Ada"]);
        for planet in [TERRA, MARS] {
            game.galaxy
                .build_spaceport(planet, &mut game.players[0])
                .unwrap();
        }
        game.galaxy
            .build_structure(MARS, StructureType::GalacticShipyard, &game.players[0])
            .unwrap();
        game.galaxy
            .build_structure(TERRA, StructureType::Mine, &game.players[0])
            .unwrap();
        game.players[0].credits = 0;

        assert!(game
            .deck
            .eligible(&game.players[0], &game.galaxy)
            .contains(&CardKind::ShipyardMalfunction));

        let mut events = Vec::new();
        game.resolve_drawn_card(0, CardKind::ShipyardMalfunction, &mut events);

        assert_eq!(game.players[0].count_galactic_shipyards(&game.galaxy), 0);
        assert!(game
            .galaxy
            .planet(TERRA)
            .unwrap()
            .has_structure(StructureType::Mine));
        assert!(check_invariants(&game).is_empty());
    }

    #[test]
    fn test_tax_shortfall_surfaces_liquidation() {
        let mut game = test_game(&["Ada"]);
        game.galaxy
            .build_spaceport(TERRA, &mut game.players[0])
            .unwrap();
        game.players[0].credits = 50;

        let mut events = Vec::new();
        game.resolve_drawn_card(0, CardKind::ImperialTax, &mut events);

        assert_eq!(
            events.last(),
            Some(&GameEvent::LiquidationRequired {
                player: 0,
                amount: 100
            })
        );
        assert_eq!(game.players[0].credits, 50);
    }

    #[test]
    fn test_lost_turns_are_forfeited() {
        let mut game = test_game(&["Ada", "Bo"]);
        game.players[1].lost_turns = 1;

        let events = game.apply_action(0, GameAction::SkipTurn).unwrap();

        assert!(events.contains(&GameEvent::TurnForfeited {
            player: 1,
            remaining: 0
        }));
        assert_eq!(game.current_player, 0);
        assert_eq!(game.turn_number, 2);
        assert_eq!(game.players[1].lost_turns, 0);
    }

    #[test]
    fn test_single_player_serves_all_lost_turns() {
        let mut game = test_game(&["Ada"]);
        game.players[0].lost_turns = 2;

        game.apply_action(0, GameAction::SkipTurn).unwrap();

        // Own turn, then two forfeits, each wrapping the turn counter
        assert_eq!(game.turn_number, 4);
        assert_eq!(game.players[0].lost_turns, 0);
        assert_eq!(game.current_player, 0);
    }

    #[test]
    fn test_skip_limit() {
        let mut game = test_game(&["Ada"]);

        game.apply_action(0, GameAction::SkipTurn).unwrap();
        game.apply_action(0, GameAction::SkipTurn).unwrap();
        assert_eq!(
            game.apply_action(0, GameAction::SkipTurn),
            Err(GameError::TurnLimitExceeded)
        );
        assert_eq!(game.turn_number, 3);

        game.apply_action(0, GameAction::Move).unwrap();
        assert_eq!(game.players[0].skipped_turns, 0);
        assert!(game.apply_action(0, GameAction::SkipTurn).is_ok());
    }

    #[test]
    fn test_income_paid_once_per_cycle() {
        let mut game = test_game(&["Ada", "Bo"]);
        game.galaxy
            .build_spaceport(TERRA, &mut game.players[0])
            .unwrap();
        game.galaxy
            .build_structure(TERRA, StructureType::Mine, &game.players[0])
            .unwrap();
        game.turn_number = 5;

        let events = game.apply_action(0, GameAction::SkipTurn).unwrap();
        assert!(events.contains(&GameEvent::IncomePaid {
            turn: 5,
            payments: vec![(0, 280), (1, 200)]
        }));
        assert_eq!(game.players[0].credits, 5280);
        assert_eq!(game.players[1].credits, 5200);

        // Second player acting in the same turn does not trigger another payout
        let events = game.apply_action(1, GameAction::SkipTurn).unwrap();
        assert!(!events
            .iter()
            .any(|e| matches!(e, GameEvent::IncomePaid { .. })));
        assert_eq!(game.players[1].credits, 5200);
        assert_eq!(game.turn_number, 6);
    }

    #[test]
    fn test_no_income_off_cycle() {
        let mut game = test_game(&["Ada"]);
        game.turn_number = 4;
        game.apply_action(0, GameAction::SkipTurn).unwrap();
        assert_eq!(game.players[0].credits, 5000);
    }

    #[test]
    fn test_travel_ticket() {
        let mut game = test_game(&["Ada"]);
        game.players[0].cards.push(CardKind::GalacticTicket);

        // Only usable at a station
        let use_ticket = |destination| GameAction::UseCard {
            card: CardKind::GalacticTicket,
            destination,
        };
        assert!(matches!(
            game.apply_action(0, use_ticket(Some(STATION_B))),
            Err(GameError::InvalidCard(_))
        ));

        game.players[0].position = STATION_A;
        assert!(matches!(
            game.apply_action(0, use_ticket(None)),
            Err(GameError::InvalidCard(_))
        ));
        assert!(matches!(
            game.apply_action(0, use_ticket(Some(SOL))),
            Err(GameError::InvalidCard(_))
        ));

        let events = game.apply_action(0, use_ticket(Some(STATION_B))).unwrap();
        assert_eq!(
            events[0],
            GameEvent::TicketUsed {
                player: 0,
                from: STATION_A,
                to: STATION_B
            }
        );
        assert_eq!(game.players[0].position, STATION_B);
        assert!(game.players[0].cards.is_empty());

        // The card is gone
        assert!(matches!(
            game.apply_action(0, use_ticket(Some(STATION_A))),
            Err(GameError::InvalidCard(_))
        ));
    }

    #[test]
    fn test_defense_card_not_playable_directly() {
        let mut game = test_game(&["Ada"]);
        game.players[0].cards.push(CardKind::PirateDefense);
        assert!(matches!(
            game.apply_action(
                0,
                GameAction::UseCard {
                    card: CardKind::PirateDefense,
                    destination: None
                }
            ),
            Err(GameError::InvalidCard(_))
        ));
        assert_eq!(game.players[0].cards, vec![CardKind::PirateDefense]);
    }

    #[test]
    fn test_quit_is_terminal() {
        let mut game = test_game(&["Ada", "Bo"]);
        let events = game.apply_action(0, GameAction::Quit).unwrap();
        assert_eq!(events, vec![GameEvent::GameQuit]);
        assert!(game.is_finished());
        assert_eq!(game.apply_action(0, GameAction::Move), Err(GameError::GameOver));
        assert!(game.valid_actions(0).is_empty());
    }

    #[test]
    fn test_valid_actions_in_system() {
        let mut game = test_game(&["Ada", "Bo"]);
        game.players[0].position = SOL;

        let actions = game.valid_actions(0);
        assert!(actions.contains(&GameAction::Move));
        assert!(actions.contains(&GameAction::SkipTurn));
        assert!(actions.contains(&GameAction::Quit));
        assert!(actions.contains(&GameAction::Build {
            planet: MARS,
            structure: StructureType::Spaceport
        }));
        assert!(game.valid_actions(1).is_empty());

        game.galaxy
            .build_spaceport(TERRA, &mut game.players[0])
            .unwrap();
        let options = game.available_structures(0, TERRA);
        assert!(options.contains(&(StructureType::Outpost, 800)));
        assert!(!options
            .iter()
            .any(|(kind, _)| *kind == StructureType::GalacticShipyard));
    }

    #[test]
    fn test_same_seed_same_game() {
        let mut a = test_game(&["Ada", "Bo"]);
        let mut b = test_game(&["Ada", "Bo"]);

        for _ in 0..30 {
            let player = a.current_player;
            let ea = a.apply_action(player, GameAction::Move).unwrap();
            let eb = b.apply_action(player, GameAction::Move).unwrap();
            assert_eq!(ea, eb);
        }
        assert_eq!(a.players, b.players);
    }
}
