//! Monte Carlo evaluation of selectors and ranked allocators.
//!
//! A simulator runs `episodes` independent episodes of `rounds` rounds each
//! against a synthetic Bernoulli environment. Every episode owns a fresh
//! selector (or allocator), fresh reward sources and its own generator derived
//! from `(seed, episode)`, so results are reproducible and do not depend on
//! whether episodes ran in parallel.
//!
//! Episodes only produce integer tallies, which are summed after the fact and
//! divided by the episode count when the report is assembled.

pub mod config;
pub mod monte_carlo;
pub mod ranked;
pub mod reward;
pub mod schedule;

use rand::{RngCore, SeedableRng};
use rand_xoshiro::{SplitMix64, Xoshiro256PlusPlus};
use rayon::prelude::*;

use crate::error::{BanditError, Result};
use config::{AbortHandle, SimulationConfig};

/// Integer counters accumulated across episodes.
pub(crate) trait Tally: Send + Sized {
    fn merge(self, other: Self) -> Self;
}

/// Generator for one episode.
///
/// The run seed is scrambled before the episode index is folded in, so
/// neighbouring run seeds do not share episode streams.
pub(crate) fn episode_rng(seed: u64, episode: usize) -> Xoshiro256PlusPlus {
    let base = SplitMix64::seed_from_u64(seed).next_u64();
    Xoshiro256PlusPlus::seed_from_u64(base ^ episode as u64)
}

/// Runs every episode into a tally, sequentially or on the rayon pool.
pub(crate) fn run_episodes<T, Z, E>(
    config: &SimulationConfig,
    abort: &AbortHandle,
    empty: Z,
    episode: E,
) -> Result<T>
where
    T: Tally,
    Z: Fn() -> T + Sync + Send,
    E: Fn(usize, &mut T) -> Result<()> + Sync + Send,
{
    let step = |mut tally: T, index: usize| -> Result<T> {
        if abort.is_aborted() {
            return Err(BanditError::Aborted);
        }
        episode(index, &mut tally)?;
        Ok(tally)
    };

    let tally = if config.parallel {
        (0..config.episodes)
            .into_par_iter()
            .try_fold(&empty, step)
            .try_reduce(&empty, |a, b| Ok(a.merge(b)))
    } else {
        (0..config.episodes).try_fold(empty(), step)
    };

    if let Err(BanditError::Aborted) = &tally {
        tracing::warn!(episodes = config.episodes, "simulation aborted");
    }
    tally
}

/// Divides integer counts by the episode count.
pub(crate) fn frequencies(counts: &[u64], episodes: usize) -> Vec<f64> {
    let episodes = episodes as f64;
    counts.iter().map(|&c| c as f64 / episodes).collect()
}
