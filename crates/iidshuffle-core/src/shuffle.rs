//! In-place Fisher–Yates shuffling over any sample representation.

use rand::Rng;

use crate::samples::Samples;

/// Uniformly permute `samples` in place.
///
/// Walks from the last index down, swapping each position with one drawn
/// uniformly from `[0, i]`. The generator is never reseeded here: successive
/// calls continue the same stream, so repeated shuffles of one subset build on
/// each other's arrangement.
pub fn shuffle<S, R>(samples: &mut S, rng: &mut R)
where
    S: Samples + ?Sized,
    R: Rng,
{
    for i in (1..samples.len()).rev() {
        let j = rng.random_range(0..=i);
        samples.swap(i, j);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::samples::BitSequence;
    use proptest::prelude::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use statrs::distribution::{ChiSquared, ContinuousCDF};
    use std::collections::HashMap;

    #[test]
    fn same_seed_same_permutation() {
        let mut a: Vec<i64> = (0..100).collect();
        let mut b = a.clone();
        shuffle(&mut a, &mut StdRng::seed_from_u64(7));
        shuffle(&mut b, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_ne!(a, (0..100).collect::<Vec<i64>>());
    }

    #[test]
    fn stream_continues_across_calls() {
        let mut rng = StdRng::seed_from_u64(11);
        let original: Vec<i64> = (0..50).collect();
        let mut first = original.clone();
        shuffle(&mut first, &mut rng);
        let mut second = original.clone();
        shuffle(&mut second, &mut rng);
        assert_ne!(first, second);
    }

    #[test]
    fn tiny_inputs_are_untouched() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut empty: Vec<i64> = Vec::new();
        shuffle(&mut empty, &mut rng);
        assert!(empty.is_empty());
        let mut one: Vec<i64> = vec![42];
        shuffle(&mut one, &mut rng);
        assert_eq!(one, vec![42]);
    }

    #[test]
    fn bit_shuffle_preserves_weight() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut bits = BitSequence::from_bytes(&[0xF0, 0x0F, 0xAA, 0x01]);
        let ones = bits.count_ones();
        for _ in 0..20 {
            shuffle(&mut bits, &mut rng);
            assert_eq!(bits.count_ones(), ones);
            assert_eq!(bits.len(), 32);
        }
    }

    #[test]
    fn permutations_of_three_are_uniform() {
        let mut rng = StdRng::seed_from_u64(0x5EED);
        let trials = 60_000;
        let mut counts: HashMap<Vec<i64>, u64> = HashMap::new();
        for _ in 0..trials {
            let mut data: Vec<i64> = vec![0, 1, 2];
            shuffle(&mut data, &mut rng);
            *counts.entry(data).or_insert(0) += 1;
        }
        assert_eq!(counts.len(), 6);
        let expected = trials as f64 / 6.0;
        let chi2: f64 = counts
            .values()
            .map(|&c| (c as f64 - expected).powi(2) / expected)
            .sum();
        let p = ChiSquared::new(5.0).unwrap().sf(chi2);
        assert!(p > 1e-4, "chi2={chi2:.2}, p={p:.6}");
    }

    proptest! {
        #[test]
        fn shuffle_preserves_multiset(
            data in prop::collection::vec(0i64..32, 0..200),
            seed in any::<u64>(),
        ) {
            let mut shuffled = data.clone();
            shuffle(&mut shuffled, &mut StdRng::seed_from_u64(seed));
            let mut a = data.clone();
            let mut b = shuffled.clone();
            a.sort_unstable();
            b.sort_unstable();
            prop_assert_eq!(a, b);
        }
    }
}
