//! Sparse, possibly non-stationary reward schedules.
//!
//! A schedule maps round indices to the reward probabilities in force from
//! that round on. Round 0 is mandatory and fixes the arm layout; every later
//! entry must keep that layout.

use std::collections::BTreeMap;

use crate::error::{BanditError, Result};
use crate::simulation::reward::BernoulliRewardSource;

fn sources(row: &[f64]) -> Result<Vec<BernoulliRewardSource>> {
    row.iter().copied().map(BernoulliRewardSource::new).collect()
}

fn layout_mismatch(round: usize, what: &str, expected: usize, got: usize) -> BanditError {
    BanditError::InvalidScheduleIndex {
        message: format!("round {round}: expected {expected} {what}, got {got}"),
    }
}

/// Per-arm success probabilities for the single-position simulator.
///
/// # Examples
///
/// ```
/// use mabalgs::RewardSchedule;
///
/// // Arm 1 is best until round 500, then arm 0 takes over
/// let schedule = RewardSchedule::new(vec![0.2, 0.6])
///     .unwrap()
///     .with_change(500, vec![0.7, 0.1])
///     .unwrap();
/// assert_eq!(schedule.n_arms(), 2);
/// ```
#[derive(Clone, Debug)]
pub struct RewardSchedule {
    changes: BTreeMap<usize, Vec<BernoulliRewardSource>>,
    n_arms: usize,
}

impl RewardSchedule {
    /// Creates a stationary schedule from round 0's probabilities.
    pub fn new(initial: Vec<f64>) -> Result<Self> {
        if initial.is_empty() {
            return Err(BanditError::config("round 0 must define at least one arm"));
        }
        let n_arms = initial.len();
        let mut changes = BTreeMap::new();
        changes.insert(0, sources(&initial)?);
        Ok(Self { changes, n_arms })
    }

    /// Builds a schedule from `(round, probabilities)` entries; round 0 must be present.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, Vec<f64>)>,
    {
        let mut entries: BTreeMap<usize, Vec<f64>> = entries.into_iter().collect();
        let initial = entries
            .remove(&0)
            .ok_or_else(|| BanditError::config("schedule has no entry for round 0"))?;

        entries
            .into_iter()
            .try_fold(Self::new(initial)?, |schedule, (round, row)| {
                schedule.with_change(round, row)
            })
    }

    /// Replaces every arm's probability from `round` on.
    pub fn with_change(mut self, round: usize, probabilities: Vec<f64>) -> Result<Self> {
        if probabilities.len() != self.n_arms {
            return Err(layout_mismatch(
                round,
                "arms",
                self.n_arms,
                probabilities.len(),
            ));
        }
        self.changes.insert(round, sources(&probabilities)?);
        Ok(self)
    }

    pub fn n_arms(&self) -> usize {
        self.n_arms
    }

    /// Sources in force at round 0.
    pub fn initial(&self) -> &[BernoulliRewardSource] {
        self.change_at(0).unwrap_or(&[])
    }

    /// Sources that take over exactly at `round`, if the schedule switches there.
    pub fn change_at(&self, round: usize) -> Option<&[BernoulliRewardSource]> {
        self.changes.get(&round).map(Vec::as_slice)
    }

    /// Rounds at which the schedule switches, round 0 included.
    pub fn change_rounds(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.keys().copied()
    }
}

/// Reward sources for one stretch of a ranked schedule.
#[derive(Clone, Debug)]
pub struct RankedRow {
    relevance: Vec<Vec<BernoulliRewardSource>>,
    visibility: Vec<BernoulliRewardSource>,
}

impl RankedRow {
    /// Source for `arm` shown at `rank`.
    pub fn relevance(&self, rank: usize, arm: usize) -> &BernoulliRewardSource {
        &self.relevance[rank][arm]
    }

    /// Source deciding whether `rank` is seen at all.
    pub fn visibility(&self, rank: usize) -> &BernoulliRewardSource {
        &self.visibility[rank]
    }
}

/// Probabilities for the ranked simulator.
///
/// Each entry holds `n_ranks + 1` rows: rows `0..n_ranks` give each rank's
/// per-arm relevance probabilities, and the final row gives the probability
/// that each rank position is seen.
#[derive(Clone, Debug)]
pub struct RankedSchedule {
    changes: BTreeMap<usize, RankedRow>,
    n_arms: usize,
    n_ranks: usize,
}

impl RankedSchedule {
    /// Creates a stationary ranked schedule from round 0's rows.
    pub fn new(initial: Vec<Vec<f64>>) -> Result<Self> {
        if initial.len() < 2 {
            return Err(BanditError::config(
                "round 0 needs at least one rank row and a visibility row",
            ));
        }
        let n_ranks = initial.len() - 1;
        let n_arms = initial[0].len();
        if n_arms == 0 {
            return Err(BanditError::config("round 0 must define at least one arm"));
        }
        if n_ranks > n_arms {
            return Err(BanditError::config(format!(
                "schedule has {n_ranks} ranks but only {n_arms} arms"
            )));
        }

        let mut schedule = Self {
            changes: BTreeMap::new(),
            n_arms,
            n_ranks,
        };
        let row = schedule.row(0, &initial).map_err(|err| match err {
            BanditError::InvalidScheduleIndex { message } => {
                BanditError::InvalidConfiguration { message }
            }
            other => other,
        })?;
        schedule.changes.insert(0, row);
        Ok(schedule)
    }

    /// Builds a ranked schedule from `(round, rows)` entries; round 0 must be present.
    pub fn from_entries<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (usize, Vec<Vec<f64>>)>,
    {
        let mut entries: BTreeMap<usize, Vec<Vec<f64>>> = entries.into_iter().collect();
        let initial = entries
            .remove(&0)
            .ok_or_else(|| BanditError::config("schedule has no entry for round 0"))?;

        entries
            .into_iter()
            .try_fold(Self::new(initial)?, |schedule, (round, rows)| {
                schedule.with_change(round, rows)
            })
    }

    /// Replaces all relevance and visibility probabilities from `round` on.
    pub fn with_change(mut self, round: usize, rows: Vec<Vec<f64>>) -> Result<Self> {
        let row = self.row(round, &rows)?;
        self.changes.insert(round, row);
        Ok(self)
    }

    fn row(&self, round: usize, rows: &[Vec<f64>]) -> Result<RankedRow> {
        if rows.len() != self.n_ranks + 1 {
            return Err(layout_mismatch(
                round,
                "rows",
                self.n_ranks + 1,
                rows.len(),
            ));
        }
        let (ranks, visibility) = rows.split_at(self.n_ranks);

        let relevance = ranks
            .iter()
            .map(|probabilities| {
                if probabilities.len() != self.n_arms {
                    return Err(layout_mismatch(
                        round,
                        "arms",
                        self.n_arms,
                        probabilities.len(),
                    ));
                }
                sources(probabilities)
            })
            .collect::<Result<Vec<_>>>()?;

        let visibility = &visibility[0];
        if visibility.len() != self.n_ranks {
            return Err(layout_mismatch(
                round,
                "visibility slots",
                self.n_ranks,
                visibility.len(),
            ));
        }

        Ok(RankedRow {
            relevance,
            visibility: sources(visibility)?,
        })
    }

    pub fn n_arms(&self) -> usize {
        self.n_arms
    }

    pub fn n_ranks(&self) -> usize {
        self.n_ranks
    }

    /// Row in force at round 0.
    pub fn initial(&self) -> Option<&RankedRow> {
        self.change_at(0)
    }

    /// Row that takes over exactly at `round`, if the schedule switches there.
    pub fn change_at(&self, round: usize) -> Option<&RankedRow> {
        self.changes.get(&round)
    }

    /// Rounds at which the schedule switches, round 0 included.
    pub fn change_rounds(&self) -> impl Iterator<Item = usize> + '_ {
        self.changes.keys().copied()
    }
}
