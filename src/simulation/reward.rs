//! Synthetic Bernoulli rewards for the simulators.

use rand::Rng;

use crate::error::{BanditError, Result};

/// Pays 1 with probability `p` and 0 otherwise.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BernoulliRewardSource {
    p: f64,
}

impl BernoulliRewardSource {
    /// Creates a source with success probability `p`, which must lie in `[0, 1]`.
    pub fn new(p: f64) -> Result<Self> {
        if !(0.0..=1.0).contains(&p) {
            return Err(BanditError::config(format!(
                "success probability {p} is outside [0, 1]"
            )));
        }
        Ok(Self { p })
    }

    pub fn probability(&self) -> f64 {
        self.p
    }

    /// Draws one reward.
    pub fn draw(&self, rng: &mut dyn rand::RngCore) -> bool {
        rng.random::<f64>() < self.p
    }
}
