//! Galactic Business Simulator - rules and turn engine
//!
//! This crate provides the core game logic, including:
//! - A cyclic track of solar systems, anomalies, pirate tiles, and stations
//! - Planets, spaceports, and upgradeable structures
//! - The economy: build prices, income cycles, taxes, and fees
//! - The anomaly event deck and its resolution rules
//! - A turn engine that validates commands and reports what happened
//!
//! # Architecture
//!
//! The engine is presentation-agnostic. Callers submit a [`GameAction`] for
//! the current player and receive a list of [`GameEvent`]s, each of which
//! renders as a human-readable message. Saving and restoring goes through
//! [`GameSnapshot`], a plain-data tree without back-references.
//!
//! # Modules
//!
//! - [`structure`]: Structure types, levels, values, and income
//! - [`galaxy`]: The board, its planets, and construction rules
//! - [`generation`]: Board generation policies
//! - [`player`]: Player state
//! - [`economy`]: Prices and payouts
//! - [`events`]: Event cards and their effects
//! - [`actions`]: Commands and outcome events
//! - [`game`]: The turn engine
//! - [`snapshot`]: Persistence form of a game
//! - [`invariants`]: Consistency checks

pub mod actions;
pub mod economy;
pub mod events;
pub mod galaxy;
pub mod game;
pub mod generation;
pub mod invariants;
pub mod player;
pub mod snapshot;
pub mod structure;

// Re-export commonly used types
pub use actions::{EventMessage, GameAction, GameEvent, Rejection};
pub use economy::Economy;
pub use events::{CardKind, CardOutcome, ChargeOutcome, EventDeck};
pub use galaxy::{
    Galaxy, GalaxyBuilder, Planet, PlanetId, SolarSystem, SystemId, Tile, TopologyError,
};
pub use game::{GameConfig, GameError, GamePhase, GameState, UpgradeOption};
pub use generation::{BoardGenerator, FixedLayout, RandomLayout};
pub use invariants::{assert_invariants, check_invariants, InvariantViolation};
pub use player::{Player, PlayerId};
pub use snapshot::GameSnapshot;
pub use structure::{Structure, StructureId, StructureType};
