//! PyO3 wrapper for Swarm
//!
//! This module provides the Python interface to the Rust swarm.

use pyo3::exceptions::{PyRuntimeError, PyValueError};
use pyo3::prelude::*;
use pyo3::types::PyDict;

use super::types::{parse_swarm_config, PyFitness};
use crate::config::DriverConfig;
use crate::driver::ParallelDriver;
use crate::swarm::{Swarm as RustSwarm, SwarmError};

/// Python wrapper for Rust Swarm
///
/// # Example (from Python)
///
/// ```python
/// from pso_engine_core import Swarm
///
/// def sphere(x):
///     return sum(v * v for v in x)
///
/// swarm = Swarm(sphere, {"lower": [-5, -5], "upper": [5, 5], "max_evaluations": 4000}, "seed")
/// position, fitness = swarm.run(threads=2)
/// ```
#[pyclass(name = "Swarm")]
pub struct PySwarm {
    inner: RustSwarm<PyFitness>,
}

fn swarm_error(e: SwarmError) -> PyErr {
    match e {
        SwarmError::InvalidConfig(msg) => PyValueError::new_err(msg),
        other => PyRuntimeError::new_err(other.to_string()),
    }
}

#[pymethods]
impl PySwarm {
    /// Create a swarm and evaluate every particle once
    ///
    /// # Errors
    ///
    /// Raises ValueError for an invalid configuration, RuntimeError if the
    /// fitness callable fails.
    #[new]
    #[pyo3(signature = (fitness, config, phrase=None))]
    fn new(fitness: Py<PyAny>, config: &Bound<'_, PyDict>, phrase: Option<&str>) -> PyResult<Self> {
        let rust_config = parse_swarm_config(config)?;
        let inner = RustSwarm::initialize(PyFitness::new(fitness), &rust_config, phrase)
            .map_err(swarm_error)?;
        Ok(PySwarm { inner })
    }

    /// Run until the evaluation budget is exhausted
    ///
    /// Returns `(position, fitness)` of the best point found.
    #[pyo3(signature = (threads=4))]
    fn run(&mut self, py: Python<'_>, threads: usize) -> PyResult<(Vec<f64>, f64)> {
        let driver = ParallelDriver::new(DriverConfig { workers: threads })
            .map_err(|e| PyValueError::new_err(e.to_string()))?;

        let inner = &mut self.inner;
        let summary = py
            .allow_threads(|| driver.run(inner))
            .map_err(|e| PyRuntimeError::new_err(e.to_string()))?;

        Ok((summary.optimum.position, summary.optimum.fitness))
    }

    /// Best `(position, fitness)` found so far
    fn best(&self) -> (Vec<f64>, f64) {
        let optimum = self.inner.extract_best();
        (optimum.position, optimum.fitness)
    }

    /// Completed iterations
    #[getter]
    fn iteration(&self) -> usize {
        self.inner.iteration()
    }

    /// Fitness evaluations performed
    #[getter]
    fn evaluations(&self) -> usize {
        self.inner.evaluations()
    }
}
