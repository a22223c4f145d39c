//! Ranked bandit allocators.
//!
//! A [`RankedAllocator`] runs one independent [`ArmSelector`] per rank
//! position and fills the positions top-down. When a rank's selector picks an
//! arm already placed at an earlier rank, the allocator's
//! [`ConflictResolver`] picks a replacement, so every round yields `n_ranks`
//! distinct arms.
//!
//! Two resolvers ship with the crate:
//!
//! - [`UniformResolver`] gives RBA: a uniformly random unplaced arm.
//! - [`NextBestResolver`] gives RBAM: the next unplaced arm in the querying
//!   rank's own ranking.
//!
//! # Examples
//!
//! ```
//! use mabalgs::prelude::*;
//! use rand::SeedableRng;
//!
//! let mut allocator = Rbam::rbam(5, 3, Ucb1::new).unwrap();
//! let mut rng = rand::rngs::StdRng::seed_from_u64(7);
//!
//! let placed = allocator.select(&mut rng).unwrap();
//! assert_eq!(placed.len(), 3);
//!
//! // The user clicked the arm shown at rank 1
//! allocator.reward(&placed, placed[1]).unwrap();
//! ```

mod resolver;

pub use resolver::{ConflictResolver, NextBestResolver, UniformResolver};

use crate::error::{BanditError, Result};
use crate::policy::{ArmSelector, SelectorFactory, check_arm};

fn check_layout(n_arms: usize, n_ranks: usize) -> Result<()> {
    if n_arms == 0 {
        return Err(BanditError::config("n_arms must be positive"));
    }
    if n_ranks == 0 {
        return Err(BanditError::config("n_ranks must be positive"));
    }
    if n_ranks > n_arms {
        return Err(BanditError::config(format!(
            "n_ranks ({n_ranks}) exceeds n_arms ({n_arms})"
        )));
    }
    Ok(())
}

/// One selector per rank position over a shared arm-index space.
#[derive(Clone, Debug)]
pub struct RankedAllocator<S, R> {
    n_arms: usize,
    selectors: Vec<S>,
    resolver: R,
}

/// Ranked Bandit Allocator with random conflict resolution.
pub type Rba<S> = RankedAllocator<S, UniformResolver>;

/// Ranked Bandit Allocator that falls through each rank's own ranking on conflict.
pub type Rbam<S> = RankedAllocator<S, NextBestResolver>;

impl<S, R> RankedAllocator<S, R>
where
    S: ArmSelector,
    R: ConflictResolver,
{
    /// Creates an allocator with `n_ranks` fresh selectors from `factory`.
    ///
    /// Fails when `n_arms` or `n_ranks` is zero, or when `n_ranks > n_arms`
    /// since no conflict-free assignment would exist.
    pub fn new<F>(n_arms: usize, n_ranks: usize, factory: F, resolver: R) -> Result<Self>
    where
        F: SelectorFactory<Selector = S>,
    {
        check_layout(n_arms, n_ranks)?;
        let selectors = (0..n_ranks)
            .map(|_| factory.build(n_arms))
            .collect::<Result<Vec<_>>>()?;
        Self::from_selectors(n_arms, selectors, resolver)
    }

    /// Creates an allocator from one prebuilt selector per rank, top rank first.
    ///
    /// Every selector must cover exactly `n_arms` arms.
    pub fn from_selectors(n_arms: usize, selectors: Vec<S>, resolver: R) -> Result<Self> {
        check_layout(n_arms, selectors.len())?;
        if let Some(bad) = selectors.iter().find(|s| s.n_arms() != n_arms) {
            return Err(BanditError::config(format!(
                "rank selector covers {} arms, expected {n_arms}",
                bad.n_arms()
            )));
        }

        Ok(Self {
            n_arms,
            selectors,
            resolver,
        })
    }

    /// Selects `n_ranks` distinct arms, index-aligned to rank position.
    ///
    /// Every rank's selector commits a pull for its own candidate, even when
    /// the candidate loses a conflict and the rank shows a different arm.
    pub fn select(&mut self, rng: &mut dyn rand::RngCore) -> Result<Vec<usize>> {
        let mut placed = Vec::with_capacity(self.selectors.len());

        for selector in &mut self.selectors {
            let selection = selector.select(rng);
            let candidate = selection.arm();

            if placed.contains(&candidate) {
                let resolved = self
                    .resolver
                    .resolve(&placed, selection.ranking(), self.n_arms, rng)
                    .ok_or_else(|| {
                        BanditError::config("no unplaced arm left to resolve a conflict")
                    })?;
                placed.push(resolved);
            } else {
                placed.push(candidate);
            }
        }

        Ok(placed)
    }

    /// Credits `winning_arm` to the rank that showed it in `selected_arms`.
    ///
    /// Only that one rank's selector is rewarded.
    pub fn reward(&mut self, selected_arms: &[usize], winning_arm: usize) -> Result<()> {
        check_arm(winning_arm, self.n_arms)?;
        let rank = selected_arms
            .iter()
            .position(|&arm| arm == winning_arm)
            .ok_or_else(|| BanditError::InvalidArmIndex {
                message: format!("arm {winning_arm} is not among the selected arms"),
            })?;
        let n_ranks = self.n_ranks();
        let selector = self
            .selectors
            .get_mut(rank)
            .ok_or_else(|| BanditError::InvalidArmIndex {
                message: format!(
                    "arm {winning_arm} sits at rank {rank}, beyond the {n_ranks} ranks"
                ),
            })?;
        selector.reward(winning_arm)
    }

    /// Resets every rank's selector.
    pub fn reset(&mut self) {
        for selector in &mut self.selectors {
            selector.reset();
        }
    }
}

impl<S, R> RankedAllocator<S, R> {
    /// Number of arms shared by all ranks.
    pub fn n_arms(&self) -> usize {
        self.n_arms
    }

    /// Number of rank positions.
    pub fn n_ranks(&self) -> usize {
        self.selectors.len()
    }

    /// The per-rank selectors, top rank first.
    pub fn selectors(&self) -> &[S] {
        &self.selectors
    }

    /// The conflict resolver shared by all ranks.
    pub fn resolver(&self) -> &R {
        &self.resolver
    }
}

impl<S: ArmSelector> Rba<S> {
    /// Create an RBA allocator
    pub fn rba<F>(n_arms: usize, n_ranks: usize, factory: F) -> Result<Self>
    where
        F: SelectorFactory<Selector = S>,
    {
        Self::new(n_arms, n_ranks, factory, UniformResolver)
    }
}

impl<S: ArmSelector> Rbam<S> {
    /// Create an RBAM allocator
    pub fn rbam<F>(n_arms: usize, n_ranks: usize, factory: F) -> Result<Self>
    where
        F: SelectorFactory<Selector = S>,
    {
        Self::new(n_arms, n_ranks, factory, NextBestResolver)
    }
}
