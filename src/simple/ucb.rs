use crate::error::Result;
use crate::policy::{ArmSelector, Selection, check_arm, check_arm_count};

/// Scoring rule that turns an arm's running statistics into an upper confidence bound.
///
/// `Ucb` owns the cold-start and pull bookkeeping; implementors only decide
/// how wide the confidence interval around the empirical mean is.
pub trait ConfidenceBound: Clone + std::fmt::Debug + Default {
    /// Upper bound for an arm with mean `average` over `pulls` pulls, after
    /// `total_pulls` pulls across all arms. Only called with `pulls > 0`.
    fn score(&self, average: f64, pulls: f64, total_pulls: f64) -> f64;
}

/// The UCB1 bound: `avg + sqrt(2 ln N / n)`.
#[derive(Clone, Copy, Debug, Default)]
pub struct Ucb1Bound;

impl ConfidenceBound for Ucb1Bound {
    fn score(&self, average: f64, pulls: f64, total_pulls: f64) -> f64 {
        average + (2.0 * total_pulls.ln() / pulls).sqrt()
    }
}

/// The UCB-Tuned bound, which shrinks the exploration term by a Bernoulli
/// variance estimate capped at 1/4.
#[derive(Clone, Copy, Debug, Default)]
pub struct TunedBound;

/// Largest variance a Bernoulli reward can have.
const MAX_BERNOULLI_VARIANCE: f64 = 0.25;

impl ConfidenceBound for TunedBound {
    fn score(&self, average: f64, pulls: f64, total_pulls: f64) -> f64 {
        let log_total = total_pulls.ln();
        let variance = average - average * average;
        let tuned = variance + (2.0 * log_total / pulls).sqrt();
        let capped = tuned.min(MAX_BERNOULLI_VARIANCE);
        average + ((log_total / pulls) * capped).sqrt()
    }
}

/// Upper Confidence Bound policy over arms `[0, n_arms)`.
///
/// Every arm is pulled once in ascending index order before any score is
/// computed. After that the arm with the highest bound wins, ties going to
/// the lower index. The pull is counted inside `select`, so a round that
/// never calls `reward` is recorded as a zero reward.
#[derive(Clone)]
pub struct Ucb<B> {
    bound: B,
    /// Statistics for each arm
    arm_stats: Vec<ArmStats>,
}

/// UCB1 selector.
pub type Ucb1 = Ucb<Ucb1Bound>;

/// UCB-Tuned selector.
pub type UcbTuned = Ucb<TunedBound>;

impl<B: ConfidenceBound> std::fmt::Debug for Ucb<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ucb")
            .field("bound", &self.bound)
            .field("total_pulls", &self.total_pulls())
            .field("arm_stats", &self.arm_stats)
            .finish()
    }
}

#[derive(Clone, Debug, Default)]
struct ArmStats {
    pulls: u64,
    total_reward: f64,
}

impl ArmStats {
    fn average_reward(&self) -> f64 {
        if self.pulls == 0 {
            0.0
        } else {
            self.total_reward / self.pulls as f64
        }
    }
}

impl<B: ConfidenceBound> Ucb<B> {
    /// Creates a selector over `n_arms` arms with the default bound.
    pub fn new(n_arms: usize) -> Result<Self> {
        Self::with_bound(n_arms, B::default())
    }

    /// Creates a selector over `n_arms` arms using `bound` for scoring.
    pub fn with_bound(n_arms: usize, bound: B) -> Result<Self> {
        check_arm_count(n_arms)?;
        Ok(Self {
            bound,
            arm_stats: vec![ArmStats::default(); n_arms],
        })
    }

    /// Gets `(pulls, average reward, upper bound)` for an arm.
    ///
    /// The bound is infinite for an arm that has never been pulled.
    pub fn arm_stats(&self, arm: usize) -> Option<(u64, f64, f64)> {
        self.arm_stats
            .get(arm)
            .map(|s| (s.pulls, s.average_reward(), self.score(s)))
    }

    /// Gets the total number of pulls across all arms
    pub fn total_pulls(&self) -> u64 {
        self.arm_stats.iter().map(|s| s.pulls).sum()
    }

    fn score(&self, stats: &ArmStats) -> f64 {
        if stats.pulls == 0 {
            f64::INFINITY
        } else {
            self.bound.score(
                stats.average_reward(),
                stats.pulls as f64,
                self.total_pulls() as f64,
            )
        }
    }
}

impl<B: ConfidenceBound> ArmSelector for Ucb<B> {
    fn n_arms(&self) -> usize {
        self.arm_stats.len()
    }

    fn select(&mut self, _rng: &mut dyn rand::RngCore) -> Selection {
        let n_arms = self.arm_stats.len();
        let selection = match self.arm_stats.iter().position(|s| s.pulls == 0) {
            Some(cold) => Selection::with_leader(cold, n_arms),
            None => {
                let total = self.total_pulls() as f64;
                let scores: Vec<f64> = self
                    .arm_stats
                    .iter()
                    .map(|s| {
                        self.bound
                            .score(s.average_reward(), s.pulls as f64, total)
                    })
                    .collect();
                Selection::from_scores(&scores)
            }
        };

        self.arm_stats[selection.arm()].pulls += 1;
        selection
    }

    fn reward(&mut self, arm: usize) -> Result<()> {
        check_arm(arm, self.arm_stats.len())?;
        self.arm_stats[arm].total_reward += 1.0;
        Ok(())
    }

    fn expectations(&self) -> Vec<f64> {
        self.arm_stats.iter().map(ArmStats::average_reward).collect()
    }

    fn reset(&mut self) {
        for stats in &mut self.arm_stats {
            *stats = ArmStats::default();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BanditError;
    use approx::assert_abs_diff_eq;
    use rand::SeedableRng;

    fn rng() -> rand::rngs::StdRng {
        rand::rngs::StdRng::seed_from_u64(42)
    }

    #[test]
    fn test_ucb_explores_unpulled_arms_in_index_order() {
        let mut policy = Ucb1::new(4).unwrap();
        let mut rng = rng();

        let firsts: Vec<usize> = (0..4).map(|_| policy.select(&mut rng).arm()).collect();
        assert_eq!(firsts, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cold_start_ranking_leads_with_chosen_arm() {
        let mut policy = Ucb1::new(3).unwrap();
        let mut rng = rng();

        policy.select(&mut rng);
        let selection = policy.select(&mut rng);
        assert_eq!(selection.ranking(), &[1, 0, 2]);
    }

    #[test]
    fn test_two_arms_without_rewards() {
        let mut policy = Ucb1::new(2).unwrap();
        let mut rng = rng();

        assert_eq!(policy.select(&mut rng).arm(), 0);
        assert_eq!(policy.select(&mut rng).arm(), 1);
        // Equal scores, lower index wins
        assert_eq!(policy.select(&mut rng).arm(), 0);
    }

    #[test]
    fn test_higher_average_breaks_tie() {
        let mut policy = Ucb1::new(2).unwrap();
        let mut rng = rng();

        policy.select(&mut rng);
        policy.select(&mut rng);
        policy.reward(1).unwrap();
        assert_eq!(policy.select(&mut rng).arm(), 1);

        let mut policy = Ucb1::new(2).unwrap();
        policy.select(&mut rng);
        policy.select(&mut rng);
        policy.reward(0).unwrap();
        assert_eq!(policy.select(&mut rng).arm(), 0);
    }

    #[test]
    fn test_less_pulled_arm_gets_exploration_bonus() {
        let mut policy = Ucb1::new(2).unwrap();
        let mut rng = rng();

        // Both arms reward on every pull: equal means, so pull counts decide
        assert_eq!(policy.select(&mut rng).arm(), 0);
        policy.reward(0).unwrap();
        assert_eq!(policy.select(&mut rng).arm(), 1);
        policy.reward(1).unwrap();
        assert_eq!(policy.select(&mut rng).arm(), 0);
        policy.reward(0).unwrap();
        assert_eq!(policy.select(&mut rng).arm(), 1);
    }

    #[test]
    fn test_pull_committed_at_selection() {
        let mut policy = Ucb1::new(3).unwrap();
        let mut rng = rng();

        for round in 1..=10 {
            policy.select(&mut rng);
            assert_eq!(policy.total_pulls(), round);
        }
        policy.reward(0).unwrap();
        assert_eq!(policy.total_pulls(), 10);
    }

    #[test]
    fn test_ucb1_score_formula() {
        let mut policy = Ucb1::new(2).unwrap();
        let mut rng = rng();

        policy.select(&mut rng);
        policy.reward(0).unwrap();
        policy.select(&mut rng);
        policy.select(&mut rng);

        // arm 0: pulls 2, reward 1; total pulls 3
        let (pulls, average, score) = policy.arm_stats(0).unwrap();
        assert_eq!(pulls, 2);
        assert_abs_diff_eq!(average, 0.5);
        assert_abs_diff_eq!(score, 0.5 + (2.0 * 3f64.ln() / 2.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_tuned_score_formula() {
        let bound = TunedBound;
        let (avg, pulls, total) = (0.5, 4.0, 10.0);
        let log_total = f64::ln(total);
        let tuned = (avg - avg * avg) + (2.0 * log_total / pulls).sqrt();
        let expected = avg + ((log_total / pulls) * tuned.min(0.25)).sqrt();
        assert_abs_diff_eq!(bound.score(avg, pulls, total), expected, epsilon = 1e-12);

        // Cap applies: the bonus never exceeds the Bernoulli variance bound
        assert_abs_diff_eq!(
            bound.score(avg, pulls, total),
            avg + (log_total / pulls * 0.25).sqrt(),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_tuned_explores_less_than_ucb1() {
        let ucb1 = Ucb1Bound.score(0.3, 5.0, 50.0);
        let tuned = TunedBound.score(0.3, 5.0, 50.0);
        assert!(tuned < ucb1);
        assert!(tuned > 0.3);
    }

    #[test]
    fn test_unpulled_arm_stats() {
        let policy = UcbTuned::new(2).unwrap();
        let (pulls, average, score) = policy.arm_stats(1).unwrap();
        assert_eq!(pulls, 0);
        assert_eq!(average, 0.0);
        assert!(score.is_infinite());
        assert!(policy.arm_stats(2).is_none());
    }

    #[test]
    fn test_ucb_converges_to_paying_arm() {
        let mut policy = Ucb1::new(2).unwrap();
        let mut rng = rng();

        for _ in 0..1000 {
            let arm = policy.select(&mut rng).arm();
            if arm == 0 {
                policy.reward(0).unwrap();
            }
        }

        let (pulls, average, _) = policy.arm_stats(0).unwrap();
        assert_eq!(average, 1.0);
        assert!(pulls as f64 / 1000.0 > 0.95);
    }

    #[test]
    fn test_debug_reports_pulls() {
        let mut policy = Ucb1::new(2).unwrap();
        let mut rng = rng();
        policy.select(&mut rng);

        let debug = format!("{:?}", policy);
        assert!(debug.starts_with("Ucb"));
        assert!(debug.contains("total_pulls: 1"));
    }

    #[test]
    fn test_reward_rejects_unknown_arm() {
        let mut policy = Ucb1::new(2).unwrap();
        assert!(matches!(
            policy.reward(2),
            Err(BanditError::InvalidArmIndex { .. })
        ));
    }

    #[test]
    fn test_zero_arms_rejected() {
        assert!(matches!(
            Ucb1::new(0),
            Err(BanditError::InvalidConfiguration { .. })
        ));
        assert!(UcbTuned::new(0).is_err());
    }

    #[test]
    fn test_ucb_reset() {
        let mut policy = UcbTuned::new(2).unwrap();
        let mut rng = rng();

        policy.select(&mut rng);
        policy.reward(0).unwrap();
        policy.select(&mut rng);
        assert_eq!(policy.expectations(), vec![1.0, 0.0]);

        policy.reset();
        assert_eq!(policy.total_pulls(), 0);
        assert_eq!(policy.expectations(), vec![0.0, 0.0]);
        assert_eq!(policy.select(&mut rng).arm(), 0);
    }
}
