use rand::Rng;
use rand_distr::{Beta, Distribution};

use crate::error::Result;
use crate::policy::{ArmSelector, Selection, check_arm, check_arm_count};

/// Thompson Sampling policy using Beta distribution
///
/// Each arm starts from a uniform Beta(1, 1) prior expressed as one
/// pseudo-impression and one pseudo-success. `select` samples every arm's
/// posterior and ranks arms by the draws; the chosen arm's impression count
/// grows on every selection, so a round without `reward` is a failure.
#[derive(Clone)]
pub struct ThompsonSampling {
    /// Statistics for each arm
    arm_stats: Vec<ArmStats>,
}

impl std::fmt::Debug for ThompsonSampling {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThompsonSampling")
            .field("arm_stats", &self.arm_stats)
            .finish()
    }
}

#[derive(Clone, Debug)]
struct ArmStats {
    /// Times the arm was selected, plus the prior pseudo-count
    impressions: f64,
    /// Times the arm paid out, plus the prior pseudo-count
    successes: f64,
}

impl Default for ArmStats {
    fn default() -> Self {
        Self {
            impressions: 1.0,
            successes: 1.0,
        }
    }
}

impl ArmStats {
    /// Failures floored at one so the Beta parameters stay valid.
    fn failures(&self) -> f64 {
        (self.impressions - self.successes).max(1.0)
    }

    /// Sample from the Beta distribution for this arm
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let alpha = self.successes;
        let beta = self.failures();

        match Beta::new(alpha, beta) {
            Ok(dist) => dist.sample(rng),
            Err(_) => {
                // If Beta distribution creation fails, use mean
                alpha / (alpha + beta)
            }
        }
    }

    /// Get the expected value (mean) of the Beta distribution
    fn expected_value(&self) -> f64 {
        let alpha = self.successes;
        alpha / (alpha + self.failures())
    }
}

impl ThompsonSampling {
    /// Creates a new Thompson Sampling policy with uniform priors over `n_arms` arms
    pub fn new(n_arms: usize) -> Result<Self> {
        check_arm_count(n_arms)?;
        Ok(Self {
            arm_stats: vec![ArmStats::default(); n_arms],
        })
    }

    /// Gets `(impressions, successes, posterior mean)` for an arm, pseudo-counts included.
    pub fn arm_stats(&self, arm: usize) -> Option<(f64, f64, f64)> {
        self.arm_stats
            .get(arm)
            .map(|s| (s.impressions, s.successes, s.expected_value()))
    }
}

impl ArmSelector for ThompsonSampling {
    fn n_arms(&self) -> usize {
        self.arm_stats.len()
    }

    fn select(&mut self, rng: &mut dyn rand::RngCore) -> Selection {
        let theta: Vec<f64> = self.arm_stats.iter().map(|s| s.sample(&mut *rng)).collect();
        let selection = Selection::from_scores(&theta);

        self.arm_stats[selection.arm()].impressions += 1.0;
        selection
    }

    fn reward(&mut self, arm: usize) -> Result<()> {
        check_arm(arm, self.arm_stats.len())?;
        self.arm_stats[arm].successes += 1.0;
        Ok(())
    }

    fn expectations(&self) -> Vec<f64> {
        self.arm_stats.iter().map(ArmStats::expected_value).collect()
    }

    fn reset(&mut self) {
        for stats in &mut self.arm_stats {
            *stats = ArmStats::default();
        }
    }
}
