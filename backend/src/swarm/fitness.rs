//! Fitness functions
//!
//! The swarm minimizes a caller-supplied scalar function of a position in
//! real (parameter) units. Workers call it concurrently on different
//! particles, hence the `Sync` bound.

use thiserror::Error;

/// Failure to produce a fitness value
///
/// Any evaluation failure aborts the run: the swarm cannot stay coherent with
/// a particle whose update was skipped.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum FitnessError {
    #[error("Fitness evaluation failed: {0}")]
    Failed(String),

    #[error("Fitness function returned NaN")]
    NotANumber,
}

/// A function to minimize; lower is better
///
/// Any `Fn(&[f64]) -> f64 + Sync` closure is a fitness function. Implement the
/// trait directly when evaluation can fail, e.g. when an ODE solver diverges.
///
/// # Example
/// ```
/// use pso_engine_core::Fitness;
///
/// let sphere = |pos: &[f64]| pos.iter().map(|x| x * x).sum::<f64>();
/// assert_eq!(sphere.evaluate(&[3.0, 4.0]).unwrap(), 25.0);
/// ```
pub trait Fitness: Sync {
    fn evaluate(&self, position: &[f64]) -> Result<f64, FitnessError>;
}

impl<F> Fitness for F
where
    F: Fn(&[f64]) -> f64 + Sync,
{
    fn evaluate(&self, position: &[f64]) -> Result<f64, FitnessError> {
        Ok(self(position))
    }
}
