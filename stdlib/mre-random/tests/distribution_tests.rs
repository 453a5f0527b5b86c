//! Cross-module tests for generators, deviates and distributions

use mre_random::distributions::*;
use mre_random::{deviates, reseed_thread_rng, with_thread_rng, MersenneTwister64, Seed};
use proptest::prelude::*;

const SCENARIO_SEED: Seed = Seed::new([
    0x1234_5678_9ABC_DEF0,
    0x1324_5768_9BAC_DFE0,
    0x10FE_DCBA_9876_5432,
    0x7654_3210_FEDC_BA98,
]);

fn relative_close(a: f64, b: f64, tol: f64) -> bool {
    (a - b).abs() <= tol * b.abs().max(1e-12)
}

// ============================================================
// Reproducibility
// ============================================================

mod reproducibility_tests {
    use super::*;

    #[test]
    fn test_first_inclusive_draw_is_bit_identical() {
        let first = MersenneTwister64::new(SCENARIO_SEED, 1).uniform_inclusive();
        for _ in 0..3 {
            let again = MersenneTwister64::new(SCENARIO_SEED, 1).uniform_inclusive();
            assert_eq!(again.to_bits(), first.to_bits());
        }
        assert!((0.0..=1.0).contains(&first));
    }

    #[test]
    fn test_thread_stream_matches_direct_generator() {
        reseed_thread_rng(SCENARIO_SEED, 1);
        let via_thread = with_thread_rng(|rng| rng.uniform_inclusive());
        let direct = MersenneTwister64::new(SCENARIO_SEED, 1).uniform_inclusive();
        assert_eq!(via_thread.to_bits(), direct.to_bits());
    }

    #[test]
    fn test_deviate_sequences_reproduce() {
        let draw = || {
            let mut rng = MersenneTwister64::new(SCENARIO_SEED, 2);
            (0..32)
                .map(|_| deviates::gamma_deviate(&mut rng, 2.5, 1.0).unwrap())
                .collect::<Vec<_>>()
        };
        assert_eq!(draw(), draw());
    }
}

// ============================================================
// Quantile / CDF inversion
// ============================================================

mod inversion_tests {
    use super::*;

    proptest! {
        #[test]
        fn normal_quantile_inverts_cdf(p in 1e-12f64..(1.0 - 1e-12), mean in -50.0f64..50.0, sigma in 0.01f64..20.0) {
            let x = normal_quantile(p, mean, sigma).unwrap();
            let back = normal_cdf(x, mean, sigma).unwrap();
            prop_assert!(relative_close(back, p, 1e-9), "p = {}, back = {}", p, back);
        }

        #[test]
        fn gamma_quantile_inverts_cdf(p in 1e-9f64..(1.0 - 1e-9), k in 0.1f64..200.0, theta in 0.1f64..10.0) {
            let x = gamma_quantile(p, k, theta).unwrap();
            let back = gamma_cdf(x, k, theta).unwrap();
            prop_assert!(relative_close(back, p, 1e-9), "p = {}, k = {}, back = {}", p, k, back);
        }

        #[test]
        fn chi_squared_quantile_inverts_cdf(p in 1e-6f64..(1.0 - 1e-6), k in 1.0f64..60.0) {
            let x = chi_squared_quantile(p, k).unwrap();
            prop_assert!(relative_close(chi_squared_cdf(x, k).unwrap(), p, 1e-9));
        }

        #[test]
        fn exponential_quantile_inverts_cdf(p in 1e-9f64..(1.0 - 1e-9), lambda in 0.01f64..100.0) {
            let x = exponential_quantile(p, lambda).unwrap();
            prop_assert!(relative_close(exponential_cdf(x, lambda).unwrap(), p, 1e-9));
        }

        #[test]
        fn poisson_quantile_is_minimal(p in 0.0f64..1.0, lambda in 0.1f64..500.0) {
            let k = poisson_quantile(p, lambda).unwrap();
            prop_assert!(poisson_cdf(k, lambda).unwrap() >= p);
            if k > 0.0 {
                prop_assert!(poisson_cdf(k - 1.0, lambda).unwrap() < p);
            }
        }

        #[test]
        fn binomial_quantile_is_minimal(p in 0.0f64..1.0, n in 0u32..300, prob in 0.0f64..=1.0) {
            let n = f64::from(n);
            let k = binomial_quantile(p, n, prob).unwrap();
            prop_assert!((0.0..=n).contains(&k));
            prop_assert!(binomial_cdf(k, n, prob).unwrap() >= p);
            if k > 0.0 {
                prop_assert!(binomial_cdf(k - 1.0, n, prob).unwrap() < p);
            }
        }

        #[test]
        fn cdfs_are_monotone(a in -10.0f64..10.0, b in -10.0f64..10.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(normal_cdf(lo, 0.0, 1.0).unwrap() <= normal_cdf(hi, 0.0, 1.0).unwrap());
            prop_assert!(cauchy_cdf(lo, 0.0, 1.0).unwrap() <= cauchy_cdf(hi, 0.0, 1.0).unwrap());
            prop_assert!(gamma_cdf(lo, 2.0, 1.0).unwrap() <= gamma_cdf(hi, 2.0, 1.0).unwrap());
            prop_assert!(poisson_cdf(lo, 3.0).unwrap() <= poisson_cdf(hi, 3.0).unwrap());
        }
    }
}

// ============================================================
// Deviates against their distributions
// ============================================================

mod goodness_of_fit_tests {
    use super::*;

    /// Kolmogorov-Smirnov statistic of `samples` against `cdf`.
    fn ks_statistic(mut samples: Vec<f64>, cdf: impl Fn(f64) -> f64) -> f64 {
        samples.sort_by(f64::total_cmp);
        let n = samples.len() as f64;
        samples
            .iter()
            .enumerate()
            .map(|(i, &x)| {
                let f = cdf(x);
                (f - i as f64 / n).abs().max((f - (i as f64 + 1.0) / n).abs())
            })
            .fold(0.0, f64::max)
    }

    // Critical value at alpha = 0.001 is about 1.95 / sqrt(n).
    const N: usize = 20_000;
    const CRITICAL: f64 = 1.95 / 141.42;

    #[test]
    fn test_continuous_deviates_match_cdfs() {
        let mut rng = MersenneTwister64::new(Seed::new([3, 1, 4, 1]), 5);

        let xs = (0..N).map(|_| deviates::normal_deviate(&mut rng, 1.0, 2.0).unwrap()).collect();
        assert!(ks_statistic(xs, |x| normal_cdf(x, 1.0, 2.0).unwrap()) < CRITICAL);

        let xs = (0..N).map(|_| deviates::gamma_deviate(&mut rng, 0.7, 3.0).unwrap()).collect();
        assert!(ks_statistic(xs, |x| gamma_cdf(x, 0.7, 3.0).unwrap()) < CRITICAL);

        let xs = (0..N)
            .map(|_| deviates::weibull_deviate(&mut rng, 1.8, 2.0, -1.0).unwrap())
            .collect();
        assert!(ks_statistic(xs, |x| weibull_cdf(x, 1.8, 2.0, -1.0).unwrap()) < CRITICAL);

        let xs = (0..N).map(|_| deviates::cauchy_deviate(&mut rng, 0.0, 0.5).unwrap()).collect();
        assert!(ks_statistic(xs, |x| cauchy_cdf(x, 0.0, 0.5).unwrap()) < CRITICAL);

        let xs = (0..N).map(|_| deviates::chi_squared_deviate(&mut rng, 4.0).unwrap()).collect();
        assert!(ks_statistic(xs, |x| chi_squared_cdf(x, 4.0).unwrap()) < CRITICAL);
    }
}
