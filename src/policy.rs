//! Selector trait definition for multi-armed bandit algorithms

use std::cmp::Ordering;

use crate::error::{BanditError, Result};

/// Outcome of one `select()` round.
///
/// `ranking` is a permutation of every arm index ordered by the selector's
/// current preference; the chosen arm is always `ranking[0]`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Selection {
    ranking: Vec<usize>,
}

impl Selection {
    /// Wraps a caller-built ranking, which must be a permutation of `[0, n)`
    /// for some `n > 0`.
    ///
    /// This is the constructor for [`ArmSelector`] implementations outside
    /// this crate.
    pub fn from_ranking(ranking: Vec<usize>) -> Result<Self> {
        if ranking.is_empty() {
            return Err(BanditError::config("a ranking needs at least one arm"));
        }
        let mut seen = vec![false; ranking.len()];
        for &arm in &ranking {
            match seen.get_mut(arm) {
                Some(slot) if !*slot => *slot = true,
                Some(_) => {
                    return Err(BanditError::InvalidArmIndex {
                        message: format!("arm {arm} appears twice in the ranking"),
                    });
                }
                None => return Err(BanditError::arm_out_of_range(arm, ranking.len())),
            }
        }
        Ok(Self { ranking })
    }

    /// Builds a selection from per-arm scores, highest score first.
    ///
    /// Ties keep the lower arm index in front. NaN scores sort last.
    /// `scores` must not be empty.
    pub(crate) fn from_scores(scores: &[f64]) -> Self {
        let mut ranking: Vec<usize> = (0..scores.len()).collect();
        // sort_by is stable, so equal scores stay in index order
        ranking.sort_by(|&a, &b| descending(scores[a], scores[b]));
        Self { ranking }
    }

    /// Places `arm` first and the remaining arms in ascending index order.
    /// `arm` must be below `n_arms`.
    pub(crate) fn with_leader(arm: usize, n_arms: usize) -> Self {
        let mut ranking = Vec::with_capacity(n_arms);
        ranking.push(arm);
        ranking.extend((0..n_arms).filter(|&a| a != arm));
        Self { ranking }
    }

    /// The chosen arm.
    pub fn arm(&self) -> usize {
        self.ranking[0]
    }

    /// All arms in descending preference.
    pub fn ranking(&self) -> &[usize] {
        &self.ranking
    }

    /// Consumes the selection, returning the ranking.
    pub fn into_ranking(self) -> Vec<usize> {
        self.ranking
    }
}

fn descending(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}

/// Stateful per-round decision policy over a fixed set of arms `[0, n_arms)`.
///
/// Rounds are strictly sequential: `select` then at most one `reward` for the
/// arm that paid out. A round without a `reward` call counts as a zero-valued
/// pull.
///
/// Note: This trait uses `dyn rand::RngCore` instead of a generic parameter
/// to stay object-safe, so `Box<dyn ArmSelector>` can be built from an
/// [`crate::Algorithm`] name at runtime.
pub trait ArmSelector {
    /// Number of arms this selector chooses among.
    fn n_arms(&self) -> usize;

    /// Choose an arm for this round and commit the pull.
    ///
    /// # Arguments
    /// - `rng`: Random number generator for stochastic policies
    fn select(&mut self, rng: &mut dyn rand::RngCore) -> Selection;

    /// Record a unit reward for `arm`.
    fn reward(&mut self, arm: usize) -> Result<()>;

    /// Current estimated reward for each arm, index-aligned.
    fn expectations(&self) -> Vec<f64>;

    /// Forget everything learned so far.
    fn reset(&mut self);
}

impl<S: ArmSelector + ?Sized> ArmSelector for Box<S> {
    fn n_arms(&self) -> usize {
        (**self).n_arms()
    }

    fn select(&mut self, rng: &mut dyn rand::RngCore) -> Selection {
        (**self).select(rng)
    }

    fn reward(&mut self, arm: usize) -> Result<()> {
        (**self).reward(arm)
    }

    fn expectations(&self) -> Vec<f64> {
        (**self).expectations()
    }

    fn reset(&mut self) {
        (**self).reset()
    }
}

/// Produces a fresh selector over `n_arms` arms.
///
/// Implemented for [`crate::Algorithm`] and for any
/// `Fn(usize) -> Result<S>`, so constructors such as `Ucb1::new` can be
/// passed directly.
pub trait SelectorFactory {
    type Selector: ArmSelector;

    fn build(&self, n_arms: usize) -> Result<Self::Selector>;
}

impl<F, S> SelectorFactory for F
where
    F: Fn(usize) -> Result<S>,
    S: ArmSelector,
{
    type Selector = S;

    fn build(&self, n_arms: usize) -> Result<S> {
        self(n_arms)
    }
}

pub(crate) fn check_arm_count(n_arms: usize) -> Result<()> {
    if n_arms == 0 {
        return Err(BanditError::config("n_arms must be positive"));
    }
    Ok(())
}

pub(crate) fn check_arm(arm: usize, n_arms: usize) -> Result<()> {
    if arm >= n_arms {
        return Err(BanditError::arm_out_of_range(arm, n_arms));
    }
    Ok(())
}
