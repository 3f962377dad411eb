//! Array and vector helpers
//!
//! Shuffling, affine rescaling between the unit hypercube and parameter
//! space, Euclidean distance, and Latin Hypercube Sampling for the initial
//! particle layout.

use crate::rng::BlockSource;
use crate::transform::{uniform_integer, uniform_real};
use thiserror::Error;

/// Errors from vector algorithms
#[derive(Debug, Error, PartialEq, Eq)]
pub enum VectorError {
    #[error("Latin hypercube needs at least one point and one dimension (got {points} x {dimensions})")]
    EmptySample { points: usize, dimensions: usize },

    #[error("Failed to allocate {entries} entries for Latin hypercube sampling")]
    Allocation { entries: usize },
}

/// Randomly permute `list` in place (Fisher–Yates)
pub fn shuffle<R: BlockSource + ?Sized, T>(rng: &mut R, list: &mut [T]) {
    for i in (1..list.len()).rev() {
        let j = uniform_integer(rng, 0, i as u64) as usize;
        list.swap(i, j);
    }
}

/// Write `input * coefs + lower` component-wise into `output`
///
/// Operates over the shortest of the four slices.
pub fn affine_map(input: &[f64], output: &mut [f64], coefs: &[f64], lower: &[f64]) {
    for (((out, &x), &m), &b) in output.iter_mut().zip(input).zip(coefs).zip(lower) {
        *out = x.mul_add(m, b);
    }
}

/// Euclidean distance between `v` and `w`
pub fn distance(v: &[f64], w: &[f64]) -> f64 {
    v.iter()
        .zip(w)
        .map(|(a, b)| {
            let diff = a - b;
            diff * diff
        })
        .sum::<f64>()
        .sqrt()
}

/// Points produced by [`latin_hypercube`], stored row-major
#[derive(Debug, Clone, PartialEq)]
pub struct LatinHypercube {
    coords: Vec<f64>,
    points: usize,
    dimensions: usize,
}

impl LatinHypercube {
    /// Number of points
    pub fn points(&self) -> usize {
        self.points
    }

    /// Number of coordinates per point
    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Coordinates of point `i`
    ///
    /// # Panics
    /// Panics if `i >= self.points()`.
    pub fn point(&self, i: usize) -> &[f64] {
        &self.coords[i * self.dimensions..(i + 1) * self.dimensions]
    }

    /// Iterate over all points in order
    pub fn iter(&self) -> impl Iterator<Item = &[f64]> {
        self.coords.chunks_exact(self.dimensions)
    }
}

fn try_buffer<T: Clone>(entries: usize, fill: T) -> Result<Vec<T>, VectorError> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(entries)
        .map_err(|_| VectorError::Allocation { entries })?;
    buffer.resize(entries, fill);
    Ok(buffer)
}

/// Sample `n` points in `[0, 1]^d` with Latin Hypercube Sampling
///
/// Each axis is cut into `n` cells of width `1/n`. Every axis gets its own
/// shuffled assignment of cells to points, so no two points share a cell
/// along any single axis. Within its cell a point is placed uniformly.
///
/// # Errors
/// - [`VectorError::EmptySample`] if `n` or `d` is zero
/// - [`VectorError::Allocation`] if the scratch or output buffers cannot be
///   allocated
///
/// # Example
/// ```
/// use pso_engine_core::rng::Xorshift128Plus;
/// use pso_engine_core::vector::latin_hypercube;
///
/// let mut rng = Xorshift128Plus::from_passphrase("grid");
/// let sample = latin_hypercube(&mut rng, 4, 2).unwrap();
/// assert_eq!(sample.points(), 4);
/// assert!(sample.iter().all(|p| p.iter().all(|&x| (0.0..=1.0).contains(&x))));
/// ```
pub fn latin_hypercube<R: BlockSource + ?Sized>(
    rng: &mut R,
    n: usize,
    d: usize,
) -> Result<LatinHypercube, VectorError> {
    if n == 0 || d == 0 {
        return Err(VectorError::EmptySample {
            points: n,
            dimensions: d,
        });
    }

    let entries = n
        .checked_mul(d)
        .ok_or(VectorError::Allocation { entries: usize::MAX })?;

    // Column j holds the cell index of every point along axis j.
    let mut cells = try_buffer(entries, 0usize)?;
    for column in cells.chunks_exact_mut(n) {
        for (i, cell) in column.iter_mut().enumerate() {
            *cell = i;
        }
        shuffle(rng, column);
    }

    let eps = 1.0 / n as f64;
    let mut coords = try_buffer(entries, 0.0f64)?;
    for i in 0..n {
        for j in 0..d {
            let cell = cells[j * n + i] as f64;
            coords[i * d + j] = cell.mul_add(eps, uniform_real(rng, 0.0, eps));
        }
    }

    Ok(LatinHypercube {
        coords,
        points: n,
        dimensions: d,
    })
}
