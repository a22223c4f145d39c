//! Simulation configuration and algorithm selection by name.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::error::{BanditError, Result};
use crate::policy::{ArmSelector, SelectorFactory};
use crate::simple::{ThompsonSampling, Ucb1, UcbTuned};

/// Single-position selection algorithms known by name.
///
/// Parses from `"ucb1"`, `"tuned"` (or `"ucb-tuned"`) and `"ths"`
/// (or `"thompson"`).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Algorithm {
    Ucb1,
    UcbTuned,
    ThompsonSampling,
}

impl Algorithm {
    pub const ALL: [Algorithm; 3] = [
        Algorithm::Ucb1,
        Algorithm::UcbTuned,
        Algorithm::ThompsonSampling,
    ];

    /// Canonical short name.
    pub fn name(&self) -> &'static str {
        match self {
            Algorithm::Ucb1 => "ucb1",
            Algorithm::UcbTuned => "tuned",
            Algorithm::ThompsonSampling => "ths",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Algorithm {
    type Err = BanditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "ucb1" | "ucb" => Ok(Algorithm::Ucb1),
            "tuned" | "ucb-tuned" | "ucb_tuned" | "ucbtuned" => Ok(Algorithm::UcbTuned),
            "ths" | "thompson" | "thompson-sampling" | "thompson_sampling" => {
                Ok(Algorithm::ThompsonSampling)
            }
            _ => Err(BanditError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

impl SelectorFactory for Algorithm {
    type Selector = Box<dyn ArmSelector + Send>;

    fn build(&self, n_arms: usize) -> Result<Self::Selector> {
        Ok(match self {
            Algorithm::Ucb1 => Box::new(Ucb1::new(n_arms)?),
            Algorithm::UcbTuned => Box::new(UcbTuned::new(n_arms)?),
            Algorithm::ThompsonSampling => Box::new(ThompsonSampling::new(n_arms)?),
        })
    }
}

/// Ranked allocators known by name: `"rba"` and `"rbam"`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RankedAlgorithm {
    Rba,
    Rbam,
}

impl RankedAlgorithm {
    pub fn name(&self) -> &'static str {
        match self {
            RankedAlgorithm::Rba => "rba",
            RankedAlgorithm::Rbam => "rbam",
        }
    }
}

impl fmt::Display for RankedAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RankedAlgorithm {
    type Err = BanditError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "rba" => Ok(RankedAlgorithm::Rba),
            "rbam" => Ok(RankedAlgorithm::Rbam),
            _ => Err(BanditError::UnknownAlgorithm {
                name: s.to_string(),
            }),
        }
    }
}

/// How many episodes of how many rounds a simulator runs, and how.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationConfig {
    /// Independent episodes `S`
    pub episodes: usize,
    /// Rounds per episode `T`; round 0 is bookkeeping only
    pub rounds: usize,
    /// Base seed; each episode derives its own generator from `(seed, episode)`
    pub seed: u64,
    /// Spread episodes over the rayon thread pool
    pub parallel: bool,
}

impl SimulationConfig {
    /// Create a new builder for a simulation configuration
    pub fn builder() -> SimulationConfigBuilder {
        SimulationConfigBuilder::default()
    }

    /// Checks the invariants `build()` enforces, for hand-assembled configs.
    pub fn validate(&self) -> Result<()> {
        if self.episodes == 0 {
            return Err(BanditError::config("episodes must be positive"));
        }
        if self.rounds == 0 {
            return Err(BanditError::config("rounds must be positive"));
        }
        Ok(())
    }
}

/// Builder for [`SimulationConfig`] with a fluent API
#[derive(Clone, Debug, Default)]
pub struct SimulationConfigBuilder {
    episodes: Option<usize>,
    rounds: Option<usize>,
    seed: u64,
    parallel: bool,
}

impl SimulationConfigBuilder {
    /// Set the number of episodes
    pub fn episodes(mut self, episodes: usize) -> Self {
        self.episodes = Some(episodes);
        self
    }

    /// Set the number of rounds per episode
    pub fn rounds(mut self, rounds: usize) -> Self {
        self.rounds = Some(rounds);
        self
    }

    /// Set the base seed (defaults to 0)
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Run episodes in parallel (defaults to sequential)
    pub fn parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<SimulationConfig> {
        let episodes = self
            .episodes
            .ok_or_else(|| BanditError::config("episodes not specified"))?;
        let rounds = self
            .rounds
            .ok_or_else(|| BanditError::config("rounds not specified"))?;

        let config = SimulationConfig {
            episodes,
            rounds,
            seed: self.seed,
            parallel: self.parallel,
        };
        config.validate()?;
        Ok(config)
    }
}

/// Cancels a running simulation from another thread.
///
/// Checked before every episode; a cancelled run returns
/// [`BanditError::Aborted`].
#[derive(Clone, Debug, Default)]
pub struct AbortHandle(Arc<AtomicBool>);

impl AbortHandle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
