//! mabalgs: multi-armed bandit and ranked bandit algorithms.
//!
//! This library provides UCB1, UCB-Tuned and Thompson Sampling selectors over
//! integer arm indices, the RBA / RBAM ranked allocators that compose one
//! selector per rank position, and a Monte Carlo harness that evaluates both
//! against synthetic Bernoulli environments.
//!
//! # Quick Start
//!
//! ```
//! use mabalgs::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut rng = rand::rngs::StdRng::seed_from_u64(42);
//! let mut selector = Ucb1::new(3).unwrap();
//!
//! // Cold start: every arm once, in index order
//! assert_eq!(selector.select(&mut rng).arm(), 0);
//! assert_eq!(selector.select(&mut rng).arm(), 1);
//!
//! // Report a reward for the arm that paid out
//! selector.reward(1).unwrap();
//!
//! let selection = selector.select(&mut rng);
//! assert_eq!(selection.arm(), selection.ranking()[0]);
//! ```
//!
//! Randomness is always injected: selectors and allocators take a
//! `&mut dyn rand::RngCore`, and simulators derive every episode's generator
//! from the configured seed.

mod error;
mod policy;
pub mod ranked;
pub mod simple;
pub mod simulation;

// Re-export main types
pub use error::{BanditError, Result};
pub use policy::{ArmSelector, Selection, SelectorFactory};
pub use ranked::{Rba, Rbam, RankedAllocator};
pub use simulation::config::{
    AbortHandle, Algorithm, RankedAlgorithm, SimulationConfig, SimulationConfigBuilder,
};
pub use simulation::monte_carlo::{MonteCarloSimulator, SimulationReport};
pub use simulation::ranked::{RankedMonteCarloSimulator, RankedSimulationReport};
pub use simulation::reward::BernoulliRewardSource;
pub use simulation::schedule::{RankedSchedule, RewardSchedule};

/// Prelude module for convenient imports.
///
/// # Examples
///
/// ```
/// use mabalgs::prelude::*;
/// ```
pub mod prelude {
    pub use crate::ranked::{
        ConflictResolver, NextBestResolver, RankedAllocator, Rba, Rbam, UniformResolver,
    };
    pub use crate::simple::{ThompsonSampling, Ucb1, UcbTuned};
    pub use crate::simulation::config::{Algorithm, RankedAlgorithm, SimulationConfig};
    pub use crate::simulation::monte_carlo::MonteCarloSimulator;
    pub use crate::simulation::ranked::RankedMonteCarloSimulator;
    pub use crate::simulation::schedule::{RankedSchedule, RewardSchedule};
    pub use crate::{ArmSelector, BanditError, Result, Selection, SelectorFactory};
}
