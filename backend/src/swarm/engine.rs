//! Swarm Engine
//!
//! Owns the particles, the search bounds, the informant topology and the
//! entropy source, and implements one PSO iteration as three phases:
//!
//! ```text
//! For each iteration:
//! 1. shuffle_indices      (sequential)
//! 2. evaluate subranges   (parallel over disjoint permutation positions)
//! 3. finalize_iteration   (sequential barrier: global best, broadcasts,
//!                          topology refresh, budget)
//! ```
//!
//! # State machine
//!
//! ```text
//! initialize ──► Ready ──(finalize: budget left)──► Ready
//!                  │
//!                  └─(finalize: budget exhausted)──► Terminated
//! ```
//!
//! # Example
//!
//! ```rust
//! use pso_engine_core::{Swarm, SwarmConfig};
//!
//! let mut config = SwarmConfig::with_bounds(vec![-5.0, -5.0], vec![5.0, 5.0]);
//! config.size = 8;
//! config.max_evaluations = 400;
//!
//! let sphere = |pos: &[f64]| pos.iter().map(|x| x * x).sum::<f64>();
//! let mut swarm = Swarm::initialize(sphere, &config, Some("example")).unwrap();
//!
//! loop {
//!     swarm.shuffle_indices().unwrap();
//!     swarm.evaluate_subrange(0, swarm.size() - 1).unwrap();
//!     if !swarm.finalize_iteration().unwrap() {
//!         break;
//!     }
//! }
//!
//! let optimum = swarm.extract_best();
//! assert!(optimum.fitness < 1.0);
//! ```

use crate::config::SwarmConfig;
use crate::limits::{MAX_DIMENSIONS, MAX_NEIGHBORS, MAX_SWARM_SIZE};
use crate::models::particle::reflect;
use crate::models::{Particle, Vector};
use crate::rng::{RandomSource, RngError};
use crate::swarm::fitness::{Fitness, FitnessError};
use crate::swarm::topology;
use crate::transform::{hypersphere_sample, uniform_real};
use crate::vector::{affine_map, distance, latin_hypercube, shuffle, LatinHypercube, VectorError};
use parking_lot::Mutex;
use serde::Serialize;
use std::ops::RangeInclusive;
use thiserror::Error;

// ============================================================================
// Errors and results
// ============================================================================

/// Swarm error types
#[derive(Debug, Error)]
pub enum SwarmError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("RNG error: {0}")]
    Rng(#[from] RngError),

    #[error("Sampling error: {0}")]
    Sampling(#[from] VectorError),

    #[error("Failed to allocate storage for {particles} particles")]
    Allocation { particles: usize },

    #[error("Evaluation of particle {particle} failed: {source}")]
    Evaluation {
        particle: usize,
        #[source]
        source: FitnessError,
    },

    #[error("Fitness evaluation failed: {0}")]
    Fitness(#[source] FitnessError),

    #[error("Expected at least {expected} coordinates, got {got}")]
    DimensionMismatch { expected: usize, got: usize },

    #[error("Invalid subrange {begin}..={end} for a swarm of {size} particles")]
    InvalidRange { begin: usize, end: usize, size: usize },

    #[error("Subranges overlap at permutation position {position}")]
    OverlappingRanges { position: usize },

    #[error("Swarm has exhausted its evaluation budget")]
    Terminated,
}

/// Lifecycle state of a swarm
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SwarmState {
    /// Iterations may run
    Ready,
    /// The evaluation budget is exhausted; only queries are allowed
    Terminated,
}

/// Best position found, in real units, with its fitness
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Optimum {
    pub position: Vec<f64>,
    pub fitness: f64,
}

// ============================================================================
// Shared evaluation context
// ============================================================================

/// Affine map from the unit hypercube to parameter space
#[derive(Debug, Clone)]
struct Bounds {
    lower: Vector,
    coefs: Vector,
}

/// Map `pos` into real units (via `tmp`) and evaluate it
fn map_and_evaluate<F: Fitness>(
    fitness: &F,
    bounds: &Bounds,
    dimensions: usize,
    pos: &[f64],
    tmp: &mut [f64],
) -> Result<f64, FitnessError> {
    let d = dimensions;
    affine_map(&pos[..d], &mut tmp[..d], &bounds.coefs[..d], &bounds.lower[..d]);

    let value = fitness.evaluate(&tmp[..d])?;
    if value.is_nan() {
        return Err(FitnessError::NotANumber);
    }
    Ok(value)
}

/// Evaluate particle `particle` at `pos`, tagging failures with its index
fn evaluate_point<F: Fitness>(
    fitness: &F,
    bounds: &Bounds,
    dimensions: usize,
    particle: usize,
    pos: &Vector,
    tmp: &mut Vector,
) -> Result<f64, SwarmError> {
    map_and_evaluate(fitness, bounds, dimensions, pos, tmp)
        .map_err(|source| SwarmError::Evaluation { particle, source })
}

/// Read-only view of the swarm shared by all workers of one phase
struct Evaluator<'a, F> {
    fitness: &'a F,
    bounds: &'a Bounds,
    rng: &'a Mutex<RandomSource>,
    c: f64,
    omega: f64,
    dimensions: usize,
}

impl<F> Clone for Evaluator<'_, F> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<F> Copy for Evaluator<'_, F> {}

impl<F: Fitness> Evaluator<'_, F> {
    /// Move one particle and update its personal best
    fn step(&self, index: usize, particle: &mut Particle) -> Result<(), SwarmError> {
        let d = self.dimensions;
        let Particle {
            x, p, l, v, tmp, q, ..
        } = particle;

        // Update center: pulled toward p alone when p and l coincide,
        // otherwise toward both.
        if distance(&p[..d], &l[..d]) == 0.0 {
            for j in 0..d {
                tmp[j] = x[j] + self.c / 2.0 * (p[j] - x[j]);
            }
        } else {
            for j in 0..d {
                tmp[j] = x[j] + self.c / 3.0 * (p[j] + l[j] - 2.0 * x[j]);
            }
        }

        let radius = distance(&x[..d], &tmp[..d]);
        hypersphere_sample(self.rng, radius, &mut tmp[..d]);

        for j in 0..d {
            v[j] = self.omega * v[j] + tmp[j] - x[j];
            x[j] += v[j];
            reflect(&mut x[j], &mut v[j]);
        }

        let fitness = evaluate_point(self.fitness, self.bounds, d, index, x, tmp)?;

        if fitness < *q {
            *p = *x;
            *q = fitness;
        }

        Ok(())
    }
}

/// A batch of particles one worker owns for one evaluation phase
///
/// Obtained from [`Swarm::subranges`]. Batches from the same call borrow
/// disjoint particles and may be evaluated on different threads.
pub struct Subrange<'a, F> {
    evaluator: Evaluator<'a, F>,
    members: Vec<(usize, &'a mut Particle)>,
    range: RangeInclusive<usize>,
}

impl<F: Fitness> Subrange<'_, F> {
    /// Permutation positions covered by this batch
    pub fn range(&self) -> &RangeInclusive<usize> {
        &self.range
    }

    /// Number of particles in this batch
    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// Move every particle in the batch, returning the number of evaluations
    ///
    /// Stops at the first evaluation failure.
    pub fn evaluate(self) -> Result<usize, SwarmError> {
        let count = self.members.len();
        for (index, particle) in self.members {
            self.evaluator.step(index, particle)?;
        }
        Ok(count)
    }
}

// ============================================================================
// Swarm
// ============================================================================

/// Particle swarm minimizing a fitness function over a bounded box
pub struct Swarm<F> {
    fitness: F,
    c: f64,
    omega: f64,
    dimensions: usize,
    size: usize,
    neighbors: usize,
    budget: usize,
    remaining: usize,
    evaluations: usize,
    iteration: usize,

    /// Entropy source; the lock is only contended by hypersphere sampling
    rng: Mutex<RandomSource>,

    bounds: Bounds,
    particles: Vec<Particle>,

    /// Visitation order of the particles, reshuffled every iteration
    indices: [usize; MAX_SWARM_SIZE],

    best_fitness: f64,
    best_position: Vector,
    state: SwarmState,
}

impl<F: Fitness> Swarm<F> {
    /// Create a swarm and evaluate every particle once
    ///
    /// Initial positions come from Latin Hypercube Sampling; initial
    /// velocities keep each particle inside the box for one step. Particles
    /// that beat all their informants then broadcast their position.
    ///
    /// # Arguments
    ///
    /// * `fitness` - Function to minimize, called with real-unit positions
    /// * `config` - Swarm parameters and bounds
    /// * `passphrase` - Seed phrase for the xorshift backend (None = OS seed)
    ///
    /// # Errors
    ///
    /// * `InvalidConfig` - zero or out-of-range sizes, bad bounds
    /// * `Rng` - the entropy source cannot be constructed
    /// * `Sampling` / `Allocation` - initial storage cannot be allocated
    /// * `Evaluation` - the fitness function failed on an initial position
    pub fn initialize(
        fitness: F,
        config: &SwarmConfig,
        passphrase: Option<&str>,
    ) -> Result<Self, SwarmError> {
        Self::validate_config(config)?;

        let d = config.dimensions();
        let n = config.size;
        let k = config.neighbors;

        let mut rng = RandomSource::new(config.backend, passphrase)?;
        let sample = latin_hypercube(&mut rng, n, d)?;

        let mut bounds = Bounds {
            lower: [0.0; MAX_DIMENSIONS],
            coefs: [0.0; MAX_DIMENSIONS],
        };
        for (j, (&lo, &hi)) in config.lower.iter().zip(&config.upper).enumerate() {
            bounds.lower[j] = lo;
            bounds.coefs[j] = hi - lo;
        }

        let mut particles = Vec::new();
        particles
            .try_reserve_exact(n)
            .map_err(|_| SwarmError::Allocation { particles: n })?;
        particles.resize(n, Particle::new(d, k));

        let mut swarm = Self {
            fitness,
            c: config.c,
            omega: config.omega,
            dimensions: d,
            size: n,
            neighbors: k,
            budget: config.max_evaluations,
            remaining: config.max_evaluations,
            evaluations: 0,
            iteration: 0,
            rng: Mutex::new(rng),
            bounds,
            particles,
            indices: [0; MAX_SWARM_SIZE],
            best_fitness: f64::INFINITY,
            best_position: [0.0; MAX_DIMENSIONS],
            state: SwarmState::Ready,
        };

        topology::generate(swarm.rng.get_mut(), &mut swarm.particles);
        swarm.seed_particles(&sample)?;

        tracing::info!(
            dimensions = d,
            size = n,
            neighbors = k,
            budget = config.max_evaluations,
            backend = %config.backend,
            best_fitness = swarm.best_fitness,
            "swarm initialized"
        );

        Ok(swarm)
    }

    /// Validate configuration
    fn validate_config(config: &SwarmConfig) -> Result<(), SwarmError> {
        let d = config.dimensions();

        if d == 0 {
            return Err(SwarmError::InvalidConfig(
                "at least one dimension is required".to_string(),
            ));
        }

        if d > MAX_DIMENSIONS {
            return Err(SwarmError::InvalidConfig(format!(
                "{} dimensions exceed the maximum of {}",
                d, MAX_DIMENSIONS
            )));
        }

        if config.upper.len() != d {
            return Err(SwarmError::InvalidConfig(format!(
                "{} lower bounds but {} upper bounds",
                d,
                config.upper.len()
            )));
        }

        for (j, (&lo, &hi)) in config.lower.iter().zip(&config.upper).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SwarmError::InvalidConfig(format!(
                    "bounds of dimension {} must be finite",
                    j
                )));
            }
            if hi < lo {
                return Err(SwarmError::InvalidConfig(format!(
                    "upper bound {} is below lower bound {} in dimension {}",
                    hi, lo, j
                )));
            }
        }

        if config.size == 0 || config.size > MAX_SWARM_SIZE {
            return Err(SwarmError::InvalidConfig(format!(
                "swarm size must be in 1..={}, got {}",
                MAX_SWARM_SIZE, config.size
            )));
        }

        if config.neighbors == 0 || config.neighbors > MAX_NEIGHBORS {
            return Err(SwarmError::InvalidConfig(format!(
                "neighbor count must be in 1..={}, got {}",
                MAX_NEIGHBORS, config.neighbors
            )));
        }

        if config.max_evaluations == 0 {
            return Err(SwarmError::InvalidConfig(
                "max_evaluations must be > 0".to_string(),
            ));
        }

        if !config.c.is_finite() || !config.omega.is_finite() {
            return Err(SwarmError::InvalidConfig(
                "c and omega must be finite".to_string(),
            ));
        }

        Ok(())
    }

    /// Place, evaluate and launch every particle, then run the first broadcasts
    fn seed_particles(&mut self, sample: &LatinHypercube) -> Result<(), SwarmError> {
        let d = self.dimensions;
        let rng = self.rng.get_mut();

        for (i, (particle, point)) in self.particles.iter_mut().zip(sample.iter()).enumerate() {
            self.indices[i] = i;

            particle.place(point, f64::INFINITY);
            let fitness = evaluate_point(
                &self.fitness,
                &self.bounds,
                d,
                i,
                &particle.x,
                &mut particle.tmp,
            )?;
            particle.q = fitness;
            particle.m = fitness;

            if i == 0 || fitness < self.best_fitness {
                self.best_fitness = fitness;
                self.best_position = particle.x;
            }

            for j in 0..d {
                particle.v[j] = uniform_real(rng, -particle.x[j], 1.0 - particle.x[j]);
            }
        }

        self.evaluations += self.size;

        for i in 0..self.size {
            if topology::is_local_best(&self.particles, i) {
                topology::broadcast(&mut self.particles, i);
            }
        }

        Ok(())
    }

    fn ensure_ready(&self) -> Result<(), SwarmError> {
        match self.state {
            SwarmState::Ready => Ok(()),
            SwarmState::Terminated => Err(SwarmError::Terminated),
        }
    }

    /// Split the swarm into the shared evaluation context and the particles
    fn split(&mut self) -> (Evaluator<'_, F>, &mut [Particle], &[usize]) {
        let evaluator = Evaluator {
            fitness: &self.fitness,
            bounds: &self.bounds,
            rng: &self.rng,
            c: self.c,
            omega: self.omega,
            dimensions: self.dimensions,
        };
        (evaluator, &mut self.particles, &self.indices[..self.size])
    }

    // ========================================================================
    // Iteration phases
    // ========================================================================

    /// Evaluate `pos` (unit-cube coordinates) using `tmp` as scratch
    ///
    /// On return `tmp` holds `pos` in real units.
    ///
    /// # Errors
    ///
    /// * `DimensionMismatch` - either slice is shorter than [`Swarm::dimensions`]
    /// * `Fitness` - the fitness function failed or returned NaN
    pub fn compute_fitness(&self, pos: &[f64], tmp: &mut [f64]) -> Result<f64, SwarmError> {
        let d = self.dimensions;
        let shortest = pos.len().min(tmp.len());
        if shortest < d {
            return Err(SwarmError::DimensionMismatch {
                expected: d,
                got: shortest,
            });
        }

        map_and_evaluate(&self.fitness, &self.bounds, d, pos, tmp).map_err(SwarmError::Fitness)
    }

    /// Reshuffle the particle visitation order
    ///
    /// Must run once per iteration before any evaluation.
    pub fn shuffle_indices(&mut self) -> Result<(), SwarmError> {
        self.ensure_ready()?;
        shuffle(self.rng.get_mut(), &mut self.indices[..self.size]);
        Ok(())
    }

    /// Hand out disjoint batches of particles for parallel evaluation
    ///
    /// Each range selects positions in the current visitation order
    /// (inclusive on both ends).
    ///
    /// # Errors
    ///
    /// * `InvalidRange` - a range is empty or reaches past the swarm
    /// * `OverlappingRanges` - two ranges share a position
    /// * `Terminated` - the budget is exhausted
    pub fn subranges(
        &mut self,
        ranges: &[RangeInclusive<usize>],
    ) -> Result<Vec<Subrange<'_, F>>, SwarmError> {
        self.ensure_ready()?;

        let size = self.size;
        for range in ranges {
            if range.start() > range.end() || *range.end() >= size {
                return Err(SwarmError::InvalidRange {
                    begin: *range.start(),
                    end: *range.end(),
                    size,
                });
            }
        }

        let (evaluator, particles, indices) = self.split();
        let mut slots: Vec<Option<&mut Particle>> = particles.iter_mut().map(Some).collect();

        let mut batches = Vec::with_capacity(ranges.len());
        for range in ranges {
            let mut members = Vec::with_capacity(range.end() - range.start() + 1);
            for position in range.clone() {
                let index = indices[position];
                let particle = slots[index]
                    .take()
                    .ok_or(SwarmError::OverlappingRanges { position })?;
                members.push((index, particle));
            }
            batches.push(Subrange {
                evaluator,
                members,
                range: range.clone(),
            });
        }

        Ok(batches)
    }

    /// Move the particles at visitation positions `begin..=end`
    ///
    /// Calling this on disjoint ranges from several threads is what
    /// [`Swarm::subranges`] makes safe; this method is the single-threaded
    /// form.
    pub fn evaluate_subrange(&mut self, begin: usize, end: usize) -> Result<(), SwarmError> {
        for batch in self.subranges(&[begin..=end])? {
            batch.evaluate()?;
        }
        Ok(())
    }

    /// Close the iteration
    ///
    /// Updates the global best, lets every particle that improved on its
    /// informant record broadcast, and redraws the whole topology when the
    /// global best stalled. Returns whether another iteration fits in the
    /// remaining budget.
    pub fn finalize_iteration(&mut self) -> Result<bool, SwarmError> {
        self.ensure_ready()?;

        let previous = self.best_fitness;

        for position in 0..self.size {
            let i = self.indices[position];
            let q = self.particles[i].q;

            if q < self.best_fitness {
                self.best_fitness = q;
                self.best_position = self.particles[i].p;
            }

            if q < self.particles[i].m {
                topology::broadcast(&mut self.particles, i);
            }
        }

        if self.best_fitness >= previous {
            tracing::debug!(
                iteration = self.iteration,
                best_fitness = self.best_fitness,
                "global best stalled, regenerating topology"
            );
            topology::generate(self.rng.get_mut(), &mut self.particles);
        }

        self.iteration += 1;
        self.evaluations += self.size;
        self.remaining = self.remaining.saturating_sub(self.size);

        tracing::debug!(
            iteration = self.iteration,
            remaining = self.remaining,
            best_fitness = self.best_fitness,
            "iteration finalized"
        );

        let proceed = self.remaining >= self.size;
        if !proceed {
            self.state = SwarmState::Terminated;
            tracing::info!(
                iterations = self.iteration,
                evaluations = self.evaluations,
                best_fitness = self.best_fitness,
                "evaluation budget exhausted"
            );
        }

        Ok(proceed)
    }

    // ========================================================================
    // Results and accessors
    // ========================================================================

    /// Best position found so far (real units) and its fitness
    pub fn extract_best(&self) -> Optimum {
        let d = self.dimensions;
        let mut position = vec![0.0; d];
        affine_map(
            &self.best_position[..d],
            &mut position,
            &self.bounds.coefs[..d],
            &self.bounds.lower[..d],
        );
        Optimum {
            position,
            fitness: self.best_fitness,
        }
    }

    /// Tear the swarm down, handing back its entropy source
    pub fn dispose(self) -> RandomSource {
        self.rng.into_inner()
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    pub fn size(&self) -> usize {
        self.size
    }

    /// Random informants per particle
    pub fn neighbors(&self) -> usize {
        self.neighbors
    }

    /// Evaluation budget the swarm was created with
    pub fn budget(&self) -> usize {
        self.budget
    }

    /// Evaluations left in the budget
    pub fn remaining_evaluations(&self) -> usize {
        self.remaining
    }

    /// Fitness evaluations performed, including initialization
    pub fn evaluations(&self) -> usize {
        self.evaluations
    }

    /// Completed iterations
    pub fn iteration(&self) -> usize {
        self.iteration
    }

    pub fn best_fitness(&self) -> f64 {
        self.best_fitness
    }

    /// Best position in unit-cube coordinates
    pub fn best_unit_position(&self) -> &[f64] {
        &self.best_position[..self.dimensions]
    }

    pub fn state(&self) -> SwarmState {
        self.state
    }

    /// Particles in storage order (not visitation order)
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Current visitation order
    pub fn visitation_order(&self) -> &[usize] {
        &self.indices[..self.size]
    }
}
