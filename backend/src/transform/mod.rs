//! Distribution transforms
//!
//! Turns raw 64-bit blocks from a [`BlockSource`] into the distributions the
//! swarm needs: uniform integers, uniform reals, normal variates and uniform
//! points inside a hypersphere.
//!
//! # Rejection sampling
//!
//! The integer and normal samplers reject out-of-range candidates. Both give
//! up after [`MAX_TRIES`] attempts and return a fixed value (the midpoint or
//! the mean). That bound never triggers on working entropy; it only keeps a
//! broken source from hanging the process. A fallback is logged, not
//! reported as an error.

use crate::limits::{MAX_DIMENSIONS, MAX_TRIES};
use crate::rng::BlockSource;
use parking_lot::Mutex;

/// 2^53, the number of distinct reals produced by [`uniform_real`]
const REAL_DENOMINATOR: f64 = (1u64 << 53) as f64;

/// Draw an integer uniformly from `[lo, hi]`
///
/// Returns `lo` without touching the source when `hi <= lo`.
///
/// Each block is sliced into as many candidates of the range's bit width as
/// fit, so narrow ranges consume very little entropy.
///
/// # Example
/// ```
/// use pso_engine_core::rng::Xorshift128Plus;
/// use pso_engine_core::transform::uniform_integer;
///
/// let mut rng = Xorshift128Plus::from_passphrase("dice");
/// let roll = uniform_integer(&mut rng, 1, 6);
/// assert!((1..=6).contains(&roll));
/// ```
pub fn uniform_integer<R: BlockSource + ?Sized>(rng: &mut R, lo: u64, hi: u64) -> u64 {
    if hi <= lo {
        return lo;
    }

    let diff = hi - lo;

    // Smallest width such that 2^width > diff.
    let width = u64::BITS - diff.leading_zeros();
    let mask = if width == u64::BITS {
        u64::MAX
    } else {
        (1u64 << width) - 1
    };
    let slices = u64::BITS / width;
    let leftover = u64::BITS % width;

    for _ in 0..MAX_TRIES {
        let mut candidate = rng.next_block() >> leftover;

        for _ in 0..slices {
            let value = candidate & mask;
            if value <= diff {
                return lo + value;
            }
            // Shifting by 64 is only reached when the loop is about to end.
            candidate = candidate.checked_shr(width).unwrap_or(0);
        }
    }

    tracing::warn!(lo, hi, "uniform_integer exhausted its retries, using midpoint");
    lo + diff / 2
}

/// Draw a real approximately uniformly from `[lo, hi)`
///
/// Uses the 53 high-order bits of one block.
pub fn uniform_real<R: BlockSource + ?Sized>(rng: &mut R, lo: f64, hi: f64) -> f64 {
    let raw = (rng.next_block() >> (u64::BITS - 53)) as f64;
    (hi - lo).mul_add(raw / REAL_DENOMINATOR, lo)
}

/// Draw from a normal distribution with mean `mu` and standard deviation `sigma`
///
/// Marsaglia polar method; falls back to `mu` if every attempt is rejected.
pub fn normal<R: BlockSource + ?Sized>(rng: &mut R, mu: f64, sigma: f64) -> f64 {
    for _ in 0..MAX_TRIES {
        let u = uniform_real(rng, -1.0, 1.0);
        let v = uniform_real(rng, -1.0, 1.0);

        let s = u * u + v * v;

        if s > 0.0 && s < 1.0 {
            return (u * (-2.0 * s.ln() / s).sqrt()).mul_add(sigma, mu);
        }
    }

    tracing::warn!(mu, sigma, "normal exhausted its retries, using the mean");
    mu
}

/// Move `center` to a uniformly random point within distance `r` of it
///
/// At most [`MAX_DIMENSIONS`] leading coordinates are used.
///
/// This is the one transform that worker threads call concurrently. The lock
/// is held only while the radius and the direction are drawn; normalizing and
/// writing back touch a stack scratch array and the caller's buffer.
///
/// If the drawn direction has zero length (a broken source can do that) the
/// center is left where it is.
pub fn hypersphere_sample<R: BlockSource>(rng: &Mutex<R>, r: f64, center: &mut [f64]) {
    let d = center.len().min(MAX_DIMENSIONS);
    if d == 0 {
        return;
    }

    let mut scratch = [0.0f64; MAX_DIMENSIONS];
    let mut norm_sq = 0.0;

    let scale = {
        let mut guard = rng.lock();
        let scale = r * uniform_real(&mut *guard, 0.0, 1.0).powf(1.0 / d as f64);
        for slot in scratch.iter_mut().take(d) {
            let value = normal(&mut *guard, 0.0, 1.0);
            *slot = value;
            norm_sq += value * value;
        }
        scale
    };

    if norm_sq == 0.0 {
        tracing::warn!(dimensions = d, "hypersphere direction has zero length, center unchanged");
        return;
    }

    let factor = scale / norm_sq.sqrt();
    for (c, s) in center.iter_mut().zip(&scratch[..d]) {
        *c = s.mul_add(factor, *c);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rng::Xorshift128Plus;

    /// Always returns the same block
    struct Stuck(u64);

    impl BlockSource for Stuck {
        fn next_block(&mut self) -> u64 {
            self.0
        }
    }

    #[test]
    fn test_full_width_range() {
        let mut rng = Xorshift128Plus::from_passphrase("wide");
        for _ in 0..100 {
            let value = uniform_integer(&mut rng, 0, u64::MAX);
            // Every u64 is valid; this exercises the 64-bit mask path.
            let _ = value;
        }
        let mut stuck = Stuck(42);
        assert_eq!(uniform_integer(&mut stuck, 0, u64::MAX), 42);
    }

    #[test]
    fn test_first_slice_accepted() {
        // diff = 5 → width 3, leftover 1; the lowest slice after the shift is 0b101.
        let mut stuck = Stuck(0b1010);
        assert_eq!(uniform_integer(&mut stuck, 10, 15), 15);
    }

    #[test]
    fn test_later_slice_accepted() {
        // All-ones except one zeroed 3-bit slice: the first slices are 7 and
        // rejected for diff = 5, the zeroed slice is accepted.
        let block = !(0b111u64 << 7);
        let mut stuck = Stuck(block);
        assert_eq!(uniform_integer(&mut stuck, 0, 5), 0);
    }

    #[test]
    fn test_midpoint_fallback_is_in_range() {
        let mut stuck = Stuck(u64::MAX);
        assert_eq!(uniform_integer(&mut stuck, 0, 5), 2);
        assert_eq!(uniform_integer(&mut stuck, 10, 21), 15);
    }

    #[test]
    fn test_midpoint_does_not_overflow() {
        let mut stuck = Stuck(u64::MAX);
        let value = uniform_integer(&mut stuck, u64::MAX - 4, u64::MAX - 2);
        assert_eq!(value, u64::MAX - 3);
    }

    #[test]
    fn test_uniform_real_extremes() {
        let mut zero = Stuck(0);
        assert_eq!(uniform_real(&mut zero, 2.0, 4.0), 2.0);

        let mut ones = Stuck(u64::MAX);
        let top = uniform_real(&mut ones, 0.0, 1.0);
        assert!(top < 1.0);
        assert!(top > 0.999_999);
    }

    #[test]
    fn test_normal_fallback_returns_mean() {
        // A zero block maps to -1 for both coordinates, so s = 2 and every
        // attempt is rejected.
        let mut stuck = Stuck(0);
        assert_eq!(normal(&mut stuck, 3.5, 2.0), 3.5);
    }

    #[test]
    fn test_hypersphere_zero_norm_keeps_center() {
        // The top half of the range maps u and v to ~0.0 → s = 0 is rejected,
        // normals fall back to 0 and the direction has zero length.
        let rng = Mutex::new(Stuck(1u64 << 63));
        let mut center = [0.25, 0.75, 0.5];
        hypersphere_sample(&rng, 1.0, &mut center);
        assert_eq!(center, [0.25, 0.75, 0.5]);
    }

    #[test]
    fn test_hypersphere_zero_radius_keeps_center() {
        let rng = Mutex::new(Xorshift128Plus::from_passphrase("still"));
        let mut center = [0.1, 0.2];
        hypersphere_sample(&rng, 0.0, &mut center);
        assert_eq!(center, [0.1, 0.2]);
    }

    #[test]
    fn test_hypersphere_clips_to_max_dimensions() {
        let rng = Mutex::new(Xorshift128Plus::from_passphrase("wide ball"));
        let mut center = vec![0.0; MAX_DIMENSIONS + 5];
        hypersphere_sample(&rng, 1.0, &mut center);
        assert!(center[MAX_DIMENSIONS..].iter().all(|&c| c == 0.0));
        assert!(center[..MAX_DIMENSIONS].iter().any(|&c| c != 0.0));
    }
}
