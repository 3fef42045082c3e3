//! Ant colony path construction.
//!
//! Each ant builds a full topological order of the topic set, choosing
//! among the prerequisite-feasible topics with probability proportional
//! to `τ^alpha · η^beta`. Trails live in a [`PheromoneField`] that is read
//! during construction and written once per iteration.
//!
//! # References
//!
//! - Dorigo & Stützle (2004), *Ant Colony Optimization*
//! - Stützle & Hoos (2000), "MAX-MIN Ant System"

mod construct;
mod pheromone;

pub use construct::{construct_path, feasible_candidates, roulette_choice};
pub use pheromone::{AntTrail, PheromoneField};
