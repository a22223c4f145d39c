//! Single-position Monte Carlo simulator.

use crate::error::{BanditError, Result};
use crate::policy::{ArmSelector, SelectorFactory};
use crate::simulation::config::{AbortHandle, Algorithm, SimulationConfig};
use crate::simulation::schedule::RewardSchedule;
use crate::simulation::{Tally, episode_rng, frequencies, run_episodes};

/// Aggregated output of a [`MonteCarloSimulator`] run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SimulationReport {
    pub episodes: usize,
    pub rounds: usize,
    /// `arm_probability[t][arm]`: share of episodes that chose `arm` at round `t`
    pub arm_probability: Vec<Vec<f64>>,
    /// `cumulative_total[t]`: cumulative reward up to round `t`, averaged over episodes
    pub cumulative_total: Vec<f64>,
}

impl SimulationReport {
    pub fn n_arms(&self) -> usize {
        self.arm_probability.first().map_or(0, Vec::len)
    }

    /// Most frequently chosen arm at round `t`, lower index on ties.
    pub fn best_arm_at(&self, t: usize) -> Option<usize> {
        let row = self.arm_probability.get(t)?;
        row.iter()
            .enumerate()
            .fold(None, |best: Option<(usize, f64)>, (arm, &p)| match best {
                Some((_, top)) if top >= p => best,
                _ => Some((arm, p)),
            })
            .map(|(arm, _)| arm)
    }

    /// Average cumulative reward at the last round.
    pub fn final_reward(&self) -> f64 {
        self.cumulative_total.last().copied().unwrap_or(0.0)
    }
}

struct SelectionTally {
    n_arms: usize,
    /// Flattened `rounds × n_arms` selection counts
    selections: Vec<u64>,
    /// Per-round cumulative reward summed over episodes
    cumulative: Vec<u64>,
}

impl SelectionTally {
    fn new(rounds: usize, n_arms: usize) -> Self {
        Self {
            n_arms,
            selections: vec![0; rounds * n_arms],
            cumulative: vec![0; rounds],
        }
    }
}

impl Tally for SelectionTally {
    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.selections.iter_mut().zip(other.selections) {
            *a += b;
        }
        for (a, b) in self.cumulative.iter_mut().zip(other.cumulative) {
            *a += b;
        }
        self
    }
}

/// Monte Carlo simulator for single-position selectors.
///
/// # Examples
///
/// ```
/// use mabalgs::prelude::*;
///
/// let config = SimulationConfig::builder()
///     .episodes(20)
///     .rounds(100)
///     .seed(42)
///     .build()
///     .unwrap();
/// let schedule = RewardSchedule::new(vec![0.1, 0.9]).unwrap();
///
/// let report = MonteCarloSimulator::new(config)
///     .run(Algorithm::Ucb1, &schedule)
///     .unwrap();
/// assert_eq!(report.arm_probability.len(), 100);
/// ```
#[derive(Clone, Debug)]
pub struct MonteCarloSimulator {
    config: SimulationConfig,
    abort: AbortHandle,
}

impl MonteCarloSimulator {
    pub fn new(config: SimulationConfig) -> Self {
        Self {
            config,
            abort: AbortHandle::new(),
        }
    }

    /// Share `abort` with the caller so the run can be cancelled.
    pub fn with_abort_handle(mut self, abort: AbortHandle) -> Self {
        self.abort = abort;
        self
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.abort.clone()
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    /// Runs the algorithm named `name` (see [`Algorithm`]).
    pub fn run_named(&self, name: &str, schedule: &RewardSchedule) -> Result<SimulationReport> {
        self.run(name.parse()?, schedule)
    }

    pub fn run(&self, algorithm: Algorithm, schedule: &RewardSchedule) -> Result<SimulationReport> {
        tracing::info!(
            algorithm = %algorithm,
            episodes = self.config.episodes,
            rounds = self.config.rounds,
            n_arms = schedule.n_arms(),
            "starting simulation"
        );
        let report = self.run_with(&algorithm, schedule)?;
        tracing::info!(
            algorithm = %algorithm,
            final_reward = report.final_reward(),
            "simulation finished"
        );
        Ok(report)
    }

    /// Runs selectors built by any factory.
    pub fn run_with<F>(&self, factory: &F, schedule: &RewardSchedule) -> Result<SimulationReport>
    where
        F: SelectorFactory + Sync,
    {
        self.config.validate()?;
        let SimulationConfig {
            episodes,
            rounds,
            seed,
            ..
        } = self.config;
        let n_arms = schedule.n_arms();

        let tally = run_episodes(
            &self.config,
            &self.abort,
            || SelectionTally::new(rounds, n_arms),
            |episode, tally| {
                let mut rng = episode_rng(seed, episode);
                let mut selector = factory.build(n_arms)?;
                if selector.n_arms() != n_arms {
                    return Err(BanditError::config(format!(
                        "factory built a selector over {} arms, schedule has {n_arms}",
                        selector.n_arms()
                    )));
                }

                let mut sources = schedule.initial();
                let mut earned = 0u64;
                for t in 1..rounds {
                    if let Some(next) = schedule.change_at(t) {
                        tracing::debug!(episode, round = t, "reward schedule switched");
                        sources = next;
                    }

                    let arm = selector.select(&mut rng).arm();
                    tally.selections[t * tally.n_arms + arm] += 1;

                    if sources[arm].draw(&mut rng) {
                        earned += 1;
                        selector.reward(arm)?;
                    }
                    tally.cumulative[t] += earned;
                }

                tracing::debug!(episode, earned, "episode finished");
                Ok(())
            },
        )?;

        let arm_probability = frequencies(&tally.selections, episodes)
            .chunks(n_arms)
            .map(<[f64]>::to_vec)
            .collect();

        Ok(SimulationReport {
            episodes,
            rounds,
            arm_probability,
            cumulative_total: frequencies(&tally.cumulative, episodes),
        })
    }
}
