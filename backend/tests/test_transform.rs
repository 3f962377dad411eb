//! Distribution Transform Tests
//!
//! Statistical checks on the samplers, run against a fixed passphrase so the
//! outcome is reproducible.

use parking_lot::Mutex;
use proptest::prelude::*;
use pso_engine_core::rng::{BlockSource, Xorshift128Plus};
use pso_engine_core::transform::{hypersphere_sample, normal, uniform_integer, uniform_real};
use pso_engine_core::vector::distance;

/// Counts the blocks drawn from the wrapped source
struct Counting<R> {
    inner: R,
    drawn: usize,
}

impl<R: BlockSource> BlockSource for Counting<R> {
    fn next_block(&mut self) -> u64 {
        self.drawn += 1;
        self.inner.next_block()
    }
}

#[test]
fn test_uniform_integer_chi_square() {
    let mut rng = Xorshift128Plus::from_passphrase("chi square");
    let bins = 6;
    let draws = 60_000;
    let mut counts = vec![0usize; bins];

    for _ in 0..draws {
        counts[uniform_integer(&mut rng, 1, 6) as usize - 1] += 1;
    }

    let expected = draws as f64 / bins as f64;
    let chi_square: f64 = counts
        .iter()
        .map(|&c| {
            let diff = c as f64 - expected;
            diff * diff / expected
        })
        .sum();

    // 5 degrees of freedom; p = 0.0001 critical value is about 25.7.
    assert!(chi_square < 25.7, "chi-square {} for {:?}", chi_square, counts);
}

#[test]
fn test_empty_range_consumes_nothing() {
    let mut rng = Counting {
        inner: Xorshift128Plus::from_passphrase("idle"),
        drawn: 0,
    };

    assert_eq!(uniform_integer(&mut rng, 7, 7), 7);
    assert_eq!(uniform_integer(&mut rng, 9, 3), 9);
    assert_eq!(rng.drawn, 0);

    uniform_integer(&mut rng, 0, 1);
    assert!(rng.drawn >= 1);
}

#[test]
fn test_narrow_range_uses_one_block_per_draw_at_most() {
    // diff = 1 fits 64 candidates into each block; the first always succeeds.
    let mut rng = Counting {
        inner: Xorshift128Plus::from_passphrase("coin"),
        drawn: 0,
    };
    for _ in 0..100 {
        uniform_integer(&mut rng, 0, 1);
    }
    assert_eq!(rng.drawn, 100);
}

#[test]
fn test_uniform_real_mean_and_range() {
    let mut rng = Xorshift128Plus::from_passphrase("mean");
    let draws = 100_000;
    let mut sum = 0.0;

    for _ in 0..draws {
        let x = uniform_real(&mut rng, -2.0, 3.0);
        assert!((-2.0..3.0).contains(&x));
        sum += x;
    }

    let mean = sum / draws as f64;
    assert!((mean - 0.5).abs() < 0.03, "mean {}", mean);
}

#[test]
fn test_normal_moments() {
    let mut rng = Xorshift128Plus::from_passphrase("bell");
    let draws = 100_000;
    let (mu, sigma) = (4.0, 2.5);

    let samples: Vec<f64> = (0..draws).map(|_| normal(&mut rng, mu, sigma)).collect();
    let mean = samples.iter().sum::<f64>() / draws as f64;
    let var = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (draws - 1) as f64;

    assert!((mean - mu).abs() < 0.05, "mean {}", mean);
    assert!((var.sqrt() - sigma).abs() < 0.05, "std dev {}", var.sqrt());
}

#[test]
fn test_hypersphere_stays_within_radius() {
    let rng = Mutex::new(Xorshift128Plus::from_passphrase("ball"));
    let origin = [0.5, -1.0, 2.0, 0.0, 3.0];

    for _ in 0..2_000 {
        let mut point = origin;
        hypersphere_sample(&rng, 0.75, &mut point);
        assert!(distance(&point, &origin) <= 0.75 + 1e-12);
    }
}

#[test]
fn test_hypersphere_fills_the_disk_uniformly() {
    // In 2-D a quarter of the area lies within half the radius.
    let rng = Mutex::new(Xorshift128Plus::from_passphrase("disk"));
    let draws = 20_000;
    let mut inner = 0;

    for _ in 0..draws {
        let mut point = [0.0, 0.0];
        hypersphere_sample(&rng, 1.0, &mut point);
        if distance(&point, &[0.0, 0.0]) < 0.5 {
            inner += 1;
        }
    }

    let fraction = inner as f64 / draws as f64;
    assert!((fraction - 0.25).abs() < 0.02, "inner fraction {}", fraction);
}

#[test]
fn test_hypersphere_shared_across_threads() {
    let rng = Mutex::new(Xorshift128Plus::from_passphrase("threads"));

    std::thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..500 {
                    let mut point = [0.0; 3];
                    hypersphere_sample(&rng, 2.0, &mut point);
                    assert!(distance(&point, &[0.0; 3]) <= 2.0 + 1e-12);
                }
            });
        }
    });
}

proptest! {
    #[test]
    fn prop_uniform_integer_within_bounds(lo in any::<u64>(), span in any::<u64>(), phrase in "[a-z]{1,12}") {
        let hi = lo.saturating_add(span);
        let mut rng = Xorshift128Plus::from_passphrase(&phrase);
        for _ in 0..16 {
            let value = uniform_integer(&mut rng, lo, hi);
            prop_assert!(lo <= value && value <= hi);
        }
    }

    #[test]
    fn prop_uniform_real_within_bounds(lo in -1e6f64..1e6, width in 1e-6f64..1e6, phrase in "[a-z]{1,12}") {
        let mut rng = Xorshift128Plus::from_passphrase(&phrase);
        for _ in 0..16 {
            let value = uniform_real(&mut rng, lo, lo + width);
            prop_assert!(value >= lo && value <= lo + width);
        }
    }
}
