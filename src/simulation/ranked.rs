//! Monte Carlo simulator for ranked allocators.
//!
//! Each round the allocator fills every rank with a distinct arm. A rank pays
//! out only when its arm is relevant *and* the position is seen; when several
//! ranks pay out at once, a single one chosen uniformly at random gets the
//! credit, and a round where none pays out sends no feedback at all.

use rand::Rng;

use crate::error::{BanditError, Result};
use crate::policy::SelectorFactory;
use crate::ranked::{ConflictResolver, NextBestResolver, RankedAllocator, UniformResolver};
use crate::simulation::config::{AbortHandle, Algorithm, RankedAlgorithm, SimulationConfig};
use crate::simulation::schedule::RankedSchedule;
use crate::simulation::{Tally, episode_rng, frequencies, run_episodes};

/// Aggregated output of a [`RankedMonteCarloSimulator`] run.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedSimulationReport {
    pub episodes: usize,
    pub rounds: usize,
    /// `arm_probability[t][rank][arm]`: share of episodes that placed `arm` at `rank` in round `t`
    pub arm_probability: Vec<Vec<Vec<f64>>>,
    /// `cumulative_total[t]`: credited clicks up to round `t`, averaged over episodes
    pub cumulative_total: Vec<f64>,
}

impl RankedSimulationReport {
    pub fn n_ranks(&self) -> usize {
        self.arm_probability.first().map_or(0, Vec::len)
    }

    pub fn n_arms(&self) -> usize {
        self.arm_probability
            .first()
            .and_then(|ranks| ranks.first())
            .map_or(0, Vec::len)
    }

    /// Most frequently placed arm at `rank` in round `t`, lower index on ties.
    pub fn best_arm_at(&self, t: usize, rank: usize) -> Option<usize> {
        let row = self.arm_probability.get(t)?.get(rank)?;
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

struct PlacementTally {
    n_ranks: usize,
    n_arms: usize,
    /// Flattened `rounds × n_ranks × n_arms` placement counts
    placements: Vec<u64>,
    cumulative: Vec<u64>,
}

impl PlacementTally {
    fn new(rounds: usize, n_ranks: usize, n_arms: usize) -> Self {
        Self {
            n_ranks,
            n_arms,
            placements: vec![0; rounds * n_ranks * n_arms],
            cumulative: vec![0; rounds],
        }
    }

    fn place(&mut self, t: usize, rank: usize, arm: usize) {
        self.placements[(t * self.n_ranks + rank) * self.n_arms + arm] += 1;
    }
}

impl Tally for PlacementTally {
    fn merge(mut self, other: Self) -> Self {
        for (a, b) in self.placements.iter_mut().zip(other.placements) {
            *a += b;
        }
        for (a, b) in self.cumulative.iter_mut().zip(other.cumulative) {
            *a += b;
        }
        self
    }
}

/// Monte Carlo simulator for RBA / RBAM allocators.
#[derive(Clone, Debug)]
pub struct RankedMonteCarloSimulator {
    config: SimulationConfig,
    abort: AbortHandle,
}

impl RankedMonteCarloSimulator {
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

    /// Runs allocator and selector given by name, e.g. `("rbam", "ths")`.
    pub fn run_named(
        &self,
        allocator: &str,
        algorithm: &str,
        schedule: &RankedSchedule,
    ) -> Result<RankedSimulationReport> {
        self.run(allocator.parse()?, algorithm.parse()?, schedule)
    }

    pub fn run(
        &self,
        allocator: RankedAlgorithm,
        algorithm: Algorithm,
        schedule: &RankedSchedule,
    ) -> Result<RankedSimulationReport> {
        tracing::info!(
            allocator = %allocator,
            algorithm = %algorithm,
            episodes = self.config.episodes,
            rounds = self.config.rounds,
            n_arms = schedule.n_arms(),
            n_ranks = schedule.n_ranks(),
            "starting ranked simulation"
        );
        let report = match allocator {
            RankedAlgorithm::Rba => self.run_with(&algorithm, UniformResolver, schedule),
            RankedAlgorithm::Rbam => self.run_with(&algorithm, NextBestResolver, schedule),
        }?;
        tracing::info!(
            allocator = %allocator,
            algorithm = %algorithm,
            final_reward = report.final_reward(),
            "ranked simulation finished"
        );
        Ok(report)
    }

    /// Runs allocators built from any selector factory and conflict resolver.
    pub fn run_with<F, R>(
        &self,
        factory: &F,
        resolver: R,
        schedule: &RankedSchedule,
    ) -> Result<RankedSimulationReport>
    where
        F: SelectorFactory + Sync,
        R: ConflictResolver + Clone + Sync + Send,
    {
        self.config.validate()?;
        let SimulationConfig {
            episodes,
            rounds,
            seed,
            ..
        } = self.config;
        let n_arms = schedule.n_arms();
        let n_ranks = schedule.n_ranks();
        let initial = schedule
            .initial()
            .ok_or_else(|| BanditError::config("schedule has no entry for round 0"))?;

        let tally = run_episodes(
            &self.config,
            &self.abort,
            || PlacementTally::new(rounds, n_ranks, n_arms),
            |episode, tally| {
                let mut rng = episode_rng(seed, episode);
                let selectors = (0..n_ranks)
                    .map(|_| factory.build(n_arms))
                    .collect::<Result<Vec<_>>>()?;
                let mut allocator =
                    RankedAllocator::from_selectors(n_arms, selectors, resolver.clone())?;

                let mut row = initial;
                let mut earned = 0u64;
                let mut clicked = Vec::with_capacity(n_ranks);
                for t in 1..rounds {
                    if let Some(next) = schedule.change_at(t) {
                        tracing::debug!(episode, round = t, "ranked schedule switched");
                        row = next;
                    }

                    let placed = allocator.select(&mut rng)?;
                    clicked.clear();
                    for (rank, &arm) in placed.iter().enumerate() {
                        tally.place(t, rank, arm);
                        let relevant = row.relevance(rank, arm).draw(&mut rng);
                        let seen = row.visibility(rank).draw(&mut rng);
                        if relevant && seen {
                            clicked.push(rank);
                        }
                    }

                    if !clicked.is_empty() {
                        let rank = clicked[rng.random_range(0..clicked.len())];
                        allocator.reward(&placed, placed[rank])?;
                        earned += 1;
                    }
                    tally.cumulative[t] += earned;
                }

                tracing::debug!(episode, earned, "ranked episode finished");
                Ok(())
            },
        )?;

        let arm_probability = frequencies(&tally.placements, episodes)
            .chunks(n_ranks * n_arms)
            .map(|round| round.chunks(n_arms).map(<[f64]>::to_vec).collect())
            .collect();

        Ok(RankedSimulationReport {
            episodes,
            rounds,
            arm_probability,
            cumulative_total: frequencies(&tally.cumulative, episodes),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{ArmSelector, Selection};
    use crate::simple::Ucb1;
    use approx::assert_abs_diff_eq;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

    fn config(episodes: usize, rounds: usize, parallel: bool) -> SimulationConfig {
        SimulationConfig::builder()
            .episodes(episodes)
            .rounds(rounds)
            .seed(7)
            .parallel(parallel)
            .build()
            .unwrap()
    }

    fn three_by_two() -> RankedSchedule {
        RankedSchedule::new(vec![
            vec![0.9, 0.2, 0.1],
            vec![0.1, 0.2, 0.8],
            vec![1.0, 1.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_report_shape_and_distinct_ranks() {
        let report = RankedMonteCarloSimulator::new(config(10, 40, false))
            .run(RankedAlgorithm::Rba, Algorithm::Ucb1, &three_by_two())
            .unwrap();

        assert_eq!(report.n_ranks(), 2);
        assert_eq!(report.n_arms(), 3);
        assert_eq!(report.arm_probability.len(), 40);
        for round in &report.arm_probability[1..] {
            for rank in round {
                assert_abs_diff_eq!(rank.iter().sum::<f64>(), 1.0, epsilon = 1e-9);
            }
            // Each arm sits at most at one rank per episode
            for arm in 0..3 {
                let share: f64 = round.iter().map(|rank| rank[arm]).sum();
                assert!(share <= 1.0 + 1e-9);
            }
        }
    }

    #[test]
    fn test_invisible_positions_never_pay() {
        let schedule = RankedSchedule::new(vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![0.0, 0.0]])
            .unwrap();
        let report = RankedMonteCarloSimulator::new(config(5, 20, false))
            .run(RankedAlgorithm::Rbam, Algorithm::ThompsonSampling, &schedule)
            .unwrap();

        assert_eq!(report.final_reward(), 0.0);
    }

    #[test]
    fn test_one_credit_per_round() {
        // Every rank always clicks, but only one credit per round counts
        let schedule = RankedSchedule::new(vec![vec![1.0, 1.0], vec![1.0, 1.0], vec![1.0, 1.0]])
            .unwrap();
        let report = RankedMonteCarloSimulator::new(config(3, 10, false))
            .run(RankedAlgorithm::Rba, Algorithm::UcbTuned, &schedule)
            .unwrap();

        for (t, &total) in report.cumulative_total.iter().enumerate() {
            assert_abs_diff_eq!(total, t as f64);
        }
    }

    #[test]
    fn test_rbam_learns_per_rank_favourites() {
        let report = RankedMonteCarloSimulator::new(config(30, 600, false))
            .run(RankedAlgorithm::Rbam, Algorithm::ThompsonSampling, &three_by_two())
            .unwrap();

        assert_eq!(report.best_arm_at(599, 0), Some(0));
        assert_eq!(report.best_arm_at(599, 1), Some(2));
        assert!(report.final_reward() > 0.0);
    }

    /// UCB1 that counts every credit its rank receives.
    struct CreditCounter {
        inner: Ucb1,
        rank: usize,
        credits: Arc<Vec<AtomicU64>>,
    }

    impl ArmSelector for CreditCounter {
        fn n_arms(&self) -> usize {
            self.inner.n_arms()
        }

        fn select(&mut self, rng: &mut dyn rand::RngCore) -> Selection {
            self.inner.select(rng)
        }

        fn reward(&mut self, arm: usize) -> Result<()> {
            self.credits[self.rank].fetch_add(1, Ordering::Relaxed);
            self.inner.reward(arm)
        }

        fn expectations(&self) -> Vec<f64> {
            self.inner.expectations()
        }

        fn reset(&mut self) {
            self.inner.reset()
        }
    }

    #[test]
    fn test_simultaneous_clicks_credit_a_uniform_rank() {
        let schedule = RankedSchedule::new(vec![
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
            vec![1.0, 1.0, 1.0],
        ])
        .unwrap();
        let credits: Arc<Vec<AtomicU64>> = Arc::new((0..3).map(|_| AtomicU64::new(0)).collect());
        // Sequential episodes build their ranks in order, top rank first
        let built = AtomicUsize::new(0);
        let factory = |n_arms: usize| -> Result<CreditCounter> {
            Ok(CreditCounter {
                inner: Ucb1::new(n_arms)?,
                rank: built.fetch_add(1, Ordering::Relaxed) % 3,
                credits: Arc::clone(&credits),
            })
        };

        let report = RankedMonteCarloSimulator::new(config(10, 301, false))
            .run_with(&factory, UniformResolver, &schedule)
            .unwrap();
        assert_abs_diff_eq!(report.final_reward(), 300.0);

        let per_rank: Vec<u64> = credits.iter().map(|c| c.load(Ordering::Relaxed)).collect();
        assert_eq!(per_rank.iter().sum::<u64>(), 3000);
        for (rank, &count) in per_rank.iter().enumerate() {
            assert!(count > 800, "rank {rank} got {count} of 3000 credits: {per_rank:?}");
        }
    }

    #[test]
    fn test_schedule_switch_moves_placements() {
        // Rank 0 favours arm 0 and rank 1 favours arm 2, then they swap at round 300
        let schedule = RankedSchedule::new(vec![
            vec![1.0, 0.0, 0.0],
            vec![0.0, 0.0, 1.0],
            vec![1.0, 1.0],
        ])
        .unwrap()
        .with_change(
            300,
            vec![vec![0.0, 0.0, 1.0], vec![1.0, 0.0, 0.0], vec![1.0, 1.0]],
        )
        .unwrap();
        assert_eq!(schedule.change_rounds().collect::<Vec<_>>(), vec![0, 300]);

        let report = RankedMonteCarloSimulator::new(config(20, 1500, false))
            .run(RankedAlgorithm::Rbam, Algorithm::Ucb1, &schedule)
            .unwrap();

        assert_eq!(report.best_arm_at(299, 0), Some(0));
        assert_eq!(report.best_arm_at(299, 1), Some(2));
        assert_eq!(report.best_arm_at(1499, 0), Some(2));
        assert_eq!(report.best_arm_at(1499, 1), Some(0));
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = RankedMonteCarloSimulator::new(config(12, 50, false))
            .run_named("rba", "ths", &three_by_two())
            .unwrap();
        let parallel = RankedMonteCarloSimulator::new(config(12, 50, true))
            .run_named("rba", "ths", &three_by_two())
            .unwrap();

        assert_eq!(sequential, parallel);
    }

    #[test]
    fn test_unknown_names() {
        let simulator = RankedMonteCarloSimulator::new(config(1, 5, false));
        assert!(matches!(
            simulator.run_named("rbx", "ths", &three_by_two()),
            Err(BanditError::UnknownAlgorithm { .. })
        ));
        assert!(matches!(
            simulator.run_named("rbam", "softmax", &three_by_two()),
            Err(BanditError::UnknownAlgorithm { .. })
        ));
    }

    #[test]
    fn test_abort() {
        let abort = AbortHandle::new();
        let simulator =
            RankedMonteCarloSimulator::new(config(4, 10, false)).with_abort_handle(abort.clone());
        abort.abort();

        assert_eq!(
            simulator.run(RankedAlgorithm::Rba, Algorithm::Ucb1, &three_by_two()),
            Err(BanditError::Aborted)
        );
    }
}
