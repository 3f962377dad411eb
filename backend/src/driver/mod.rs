//! Parallel driver
//!
//! Runs a swarm to completion on a fixed number of OS threads:
//!
//! ```text
//! loop:
//!   report progress
//!   shuffle_indices                 (main thread)
//!   evaluate one subrange per worker (scoped threads, joined)
//!   finalize_iteration              (main thread) → stop when false
//! ```
//!
//! Workers share nothing but the swarm's hypersphere lock; each owns the
//! particles of its own contiguous slice of the visitation order.

use crate::config::DriverConfig;
use crate::swarm::{Fitness, Optimum, Swarm, SwarmError};
use serde::Serialize;
use std::ops::RangeInclusive;
use std::thread;
use thiserror::Error;

/// Driver error types
#[derive(Debug, Error)]
pub enum DriverError {
    #[error("Invalid config: {0}")]
    InvalidConfig(String),

    #[error("Failed to spawn worker thread: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("Worker {worker} panicked")]
    WorkerPanicked { worker: usize },

    #[error(transparent)]
    Swarm(#[from] SwarmError),
}

/// Snapshot reported before every iteration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Progress {
    /// Iterations completed so far
    pub iteration: usize,

    /// Evaluations left in the budget
    pub remaining_evaluations: usize,

    /// Share of the budget consumed, in `[0, 1]`
    pub fraction_complete: f64,

    /// Best fitness found so far
    pub best_fitness: f64,
}

/// Outcome of a complete run
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RunSummary {
    /// Iterations run
    pub iterations: usize,

    /// Fitness evaluations, including initialization
    pub evaluations: usize,

    /// Best position (real units) and fitness
    pub optimum: Optimum,
}

/// Split `[0, size)` into at most `workers` contiguous inclusive ranges
///
/// The first `size % workers` ranges get one extra index. Workers that would
/// receive nothing are left out.
///
/// # Example
/// ```
/// use pso_engine_core::driver::partition;
///
/// assert_eq!(partition(10, 3), vec![0..=3, 4..=6, 7..=9]);
/// assert_eq!(partition(2, 4), vec![0..=0, 1..=1]);
/// ```
pub fn partition(size: usize, workers: usize) -> Vec<RangeInclusive<usize>> {
    if size == 0 || workers == 0 {
        return Vec::new();
    }

    let per_worker = size / workers;
    let remainder = size % workers;

    let mut ranges = Vec::with_capacity(workers.min(size));
    let mut begin = 0;
    for worker in 0..workers {
        let len = per_worker + usize::from(worker < remainder);
        if len == 0 {
            break;
        }
        ranges.push(begin..=begin + len - 1);
        begin += len;
    }
    ranges
}

/// Runs swarms across a fixed pool of worker threads
#[derive(Debug, Clone)]
pub struct ParallelDriver {
    config: DriverConfig,
}

impl ParallelDriver {
    /// Create a driver
    ///
    /// # Errors
    /// `InvalidConfig` if `workers` is zero.
    pub fn new(config: DriverConfig) -> Result<Self, DriverError> {
        if config.workers == 0 {
            return Err(DriverError::InvalidConfig(
                "workers must be > 0".to_string(),
            ));
        }
        Ok(Self { config })
    }

    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Iterate `swarm` until its budget is exhausted
    pub fn run<F: Fitness>(&self, swarm: &mut Swarm<F>) -> Result<RunSummary, DriverError> {
        self.run_with_progress(swarm, |_| {})
    }

    /// Iterate `swarm` until its budget is exhausted, reporting progress
    ///
    /// `observer` runs on the calling thread before every iteration.
    ///
    /// # Errors
    ///
    /// Any worker failure (evaluation error, panic) aborts the run after the
    /// current phase has been joined; the swarm is left mid-iteration.
    pub fn run_with_progress<F, P>(
        &self,
        swarm: &mut Swarm<F>,
        mut observer: P,
    ) -> Result<RunSummary, DriverError>
    where
        F: Fitness,
        P: FnMut(&Progress),
    {
        let ranges = partition(swarm.size(), self.config.workers);
        let budget = swarm.budget().max(1) as f64;

        tracing::info!(
            workers = ranges.len(),
            size = swarm.size(),
            budget = swarm.budget(),
            "starting parallel run"
        );

        loop {
            observer(&Progress {
                iteration: swarm.iteration(),
                remaining_evaluations: swarm.remaining_evaluations(),
                fraction_complete: 1.0 - swarm.remaining_evaluations() as f64 / budget,
                best_fitness: swarm.best_fitness(),
            });

            swarm.shuffle_indices()?;
            Self::evaluate_parallel(swarm, &ranges)?;

            if !swarm.finalize_iteration()? {
                break;
            }
        }

        let summary = RunSummary {
            iterations: swarm.iteration(),
            evaluations: swarm.evaluations(),
            optimum: swarm.extract_best(),
        };

        tracing::info!(
            iterations = summary.iterations,
            evaluations = summary.evaluations,
            fitness = summary.optimum.fitness,
            "run complete"
        );

        Ok(summary)
    }

    /// Evaluate every subrange on its own thread and join them all
    fn evaluate_parallel<F: Fitness>(
        swarm: &mut Swarm<F>,
        ranges: &[RangeInclusive<usize>],
    ) -> Result<(), DriverError> {
        let batches = swarm.subranges(ranges)?;

        thread::scope(|scope| {
            let mut failure = None;
            let mut handles = Vec::with_capacity(batches.len());

            for (worker, batch) in batches.into_iter().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("pso-worker-{}", worker))
                    .spawn_scoped(scope, move || batch.evaluate());
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(e) => {
                        failure = Some(DriverError::Spawn(e));
                        break;
                    }
                }
            }

            for (worker, handle) in handles {
                let outcome = match handle.join() {
                    Ok(Ok(_)) => continue,
                    Ok(Err(e)) => DriverError::Swarm(e),
                    Err(_) => DriverError::WorkerPanicked { worker },
                };
                tracing::error!(worker, error = %outcome, "worker failed");
                failure.get_or_insert(outcome);
            }

            failure.map_or(Ok(()), Err)
        })
    }
}

impl Default for ParallelDriver {
    fn default() -> Self {
        Self {
            config: DriverConfig::default(),
        }
    }
}
