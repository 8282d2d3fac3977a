//! Board generation policies.
//!
//! The engine only needs a populated board; how it gets populated is a
//! collaborator behind [`BoardGenerator`]. [`Galaxy::initialize`] validates
//! whatever a generator returns before the game may use it.

use crate::galaxy::{Galaxy, GalaxyBuilder, MAX_PLANETS_PER_SYSTEM};
use rand::seq::SliceRandom;
use rand::{Rng, RngCore};

/// Produces a board for a track of a given length
pub trait BoardGenerator {
    fn generate(&mut self, total_positions: usize, rng: &mut dyn RngCore) -> Galaxy;
}

/// Random placement of systems, anomalies, pirates, and stations.
///
/// Densities: one system per 10 positions, one anomaly and one pirate tile
/// per 20, one station per 12. Every tag lands on a distinct position.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomLayout;

impl RandomLayout {
    fn counts(total_positions: usize) -> [usize; 4] {
        [
            total_positions / 10,
            total_positions / 20,
            total_positions / 20,
            total_positions / 12,
        ]
    }
}

impl BoardGenerator for RandomLayout {
    fn generate(&mut self, total_positions: usize, rng: &mut dyn RngCore) -> Galaxy {
        let mut free: Vec<usize> = (0..total_positions).collect();
        free.shuffle(rng);
        let mut free = free.into_iter();

        let [systems, anomalies, pirates, stations] = Self::counts(total_positions);
        let mut builder: GalaxyBuilder = Galaxy::builder(total_positions);

        for i in 1..=systems {
            let Some(position) = free.next() else { break };
            let planet_count = rng.gen_range(1..=MAX_PLANETS_PER_SYSTEM);
            let names: Vec<String> = (1..=planet_count)
                .map(|j| format!("Planet-{i}-{j}"))
                .collect();
            let names: Vec<&str> = names.iter().map(String::as_str).collect();
            builder = builder.system(position, &format!("System-{i}"), &names);
        }

        for _ in 0..anomalies {
            let Some(position) = free.next() else { break };
            builder = builder.anomaly(position);
        }
        for _ in 0..pirates {
            let Some(position) = free.next() else { break };
            builder = builder.pirate(position);
        }
        for _ in 0..stations {
            let Some(position) = free.next() else { break };
            builder = builder.station(position);
        }

        builder.into_unchecked()
    }
}

/// Hands out a prepared board, for scripted games and tests
#[derive(Debug, Clone)]
pub struct FixedLayout {
    galaxy: Galaxy,
}

impl FixedLayout {
    pub fn new(galaxy: Galaxy) -> Self {
        Self { galaxy }
    }
}

impl BoardGenerator for FixedLayout {
    fn generate(&mut self, _total_positions: usize, _rng: &mut dyn RngCore) -> Galaxy {
        self.galaxy.clone()
    }
}
