//! Property tests for selector and allocator invariants.

use mabalgs::prelude::*;
use proptest::prelude::*;
use rand::SeedableRng;

fn algorithm() -> impl Strategy<Value = Algorithm> {
    prop_oneof![
        Just(Algorithm::Ucb1),
        Just(Algorithm::UcbTuned),
        Just(Algorithm::ThompsonSampling),
    ]
}

proptest! {
    /// The chosen arm heads a ranking that is a permutation of all arms.
    #[test]
    fn selection_is_consistent(
        algorithm in algorithm(),
        n_arms in 1usize..8,
        rewards in prop::collection::vec(any::<bool>(), 0..60),
        seed in any::<u64>(),
    ) {
        let mut selector = algorithm.build(n_arms).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);

        for paid in rewards {
            let selection = selector.select(&mut rng);
            prop_assert_eq!(selection.arm(), selection.ranking()[0]);

            let mut sorted = selection.ranking().to_vec();
            sorted.sort_unstable();
            prop_assert_eq!(sorted, (0..n_arms).collect::<Vec<_>>());

            if paid {
                selector.reward(selection.arm()).unwrap();
            }
        }
    }

    /// UCB pulls always equal the number of select() calls.
    #[test]
    fn ucb_pulls_track_selects(
        n_arms in 1usize..8,
        rewards in prop::collection::vec(any::<bool>(), 0..80),
    ) {
        let mut ucb = UcbTuned::new(n_arms).unwrap();
        let mut rng = rand::rngs::StdRng::seed_from_u64(0);

        for (calls, paid) in rewards.into_iter().enumerate() {
            let arm = ucb.select(&mut rng).arm();
            if paid {
                ucb.reward(arm).unwrap();
            }
            prop_assert_eq!(ucb.total_pulls(), calls as u64 + 1);
        }
    }

    /// Ranked allocators never place the same arm twice in a round.
    #[test]
    fn ranked_selection_is_distinct(
        algorithm in algorithm(),
        n_arms in 1usize..8,
        rank_share in 0.0f64..1.0,
        modified in any::<bool>(),
        rounds in 1usize..40,
        seed in any::<u64>(),
    ) {
        let n_ranks = 1 + ((n_arms - 1) as f64 * rank_share) as usize;
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let factory = |n: usize| algorithm.build(n);

        let check = |placed: &[usize]| {
            let mut unique = placed.to_vec();
            unique.sort_unstable();
            unique.dedup();
            assert_eq!(unique.len(), n_ranks);
            assert!(placed.iter().all(|&arm| arm < n_arms));
        };

        if modified {
            let mut rbam = Rbam::rbam(n_arms, n_ranks, factory).unwrap();
            for round in 0..rounds {
                let placed = rbam.select(&mut rng).unwrap();
                check(&placed);
                rbam.reward(&placed, placed[round % n_ranks]).unwrap();
            }
        } else {
            let mut rba = Rba::rba(n_arms, n_ranks, factory).unwrap();
            for round in 0..rounds {
                let placed = rba.select(&mut rng).unwrap();
                check(&placed);
                rba.reward(&placed, placed[round % n_ranks]).unwrap();
            }
        }
    }

    /// RBAM's fallback is the querying rank's best unplaced arm.
    #[test]
    fn next_best_resolution_is_highest_available(
        ranking in Just((0usize..8).collect::<Vec<_>>()).prop_shuffle(),
        taken in prop::collection::vec(0usize..8, 0..7),
        seed in any::<u64>(),
    ) {
        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let resolved = NextBestResolver.resolve(&taken, &ranking, 8, &mut rng);

        let expected = ranking.iter().copied().find(|arm| !taken.contains(arm));
        prop_assert_eq!(resolved, expected);
        if let Some(arm) = resolved {
            prop_assert!(!taken.contains(&arm));
        }
    }
}
