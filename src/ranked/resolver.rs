//! Conflict resolution between rank positions.

use rand::Rng;

/// Picks a replacement arm when a rank's top candidate was already placed
/// at an earlier rank this round.
pub trait ConflictResolver {
    /// Returns an arm in `[0, n_arms)` not contained in `already_chosen`,
    /// or `None` when every arm is taken.
    ///
    /// # Arguments
    /// - `already_chosen`: Arms placed at earlier ranks this round
    /// - `ranking`: The querying rank's own preference order over all arms
    /// - `n_arms`: Size of the arm-index space
    /// - `rng`: Random number generator for stochastic resolvers
    fn resolve(
        &self,
        already_chosen: &[usize],
        ranking: &[usize],
        n_arms: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Option<usize>;
}

/// RBA resolution: a uniformly random arm among those not yet placed.
///
/// Ignores the querying rank's ranking entirely.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UniformResolver;

impl ConflictResolver for UniformResolver {
    fn resolve(
        &self,
        already_chosen: &[usize],
        _ranking: &[usize],
        n_arms: usize,
        rng: &mut dyn rand::RngCore,
    ) -> Option<usize> {
        let available: Vec<usize> = (0..n_arms)
            .filter(|arm| !already_chosen.contains(arm))
            .collect();
        if available.is_empty() {
            return None;
        }
        Some(available[rng.random_range(0..available.len())])
    }
}

/// RBAM resolution: the querying rank's best-ranked arm not yet placed.
///
/// Near-tied top candidates across ranks keep their quality order instead of
/// being replaced by a random pick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NextBestResolver;

impl ConflictResolver for NextBestResolver {
    fn resolve(
        &self,
        already_chosen: &[usize],
        ranking: &[usize],
        _n_arms: usize,
        _rng: &mut dyn rand::RngCore,
    ) -> Option<usize> {
        ranking
            .iter()
            .copied()
            .find(|arm| !already_chosen.contains(arm))
    }
}
