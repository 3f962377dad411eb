//! Type conversion utilities for FFI boundary
//!
//! Converts Python dicts and callables into engine types.

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::config::SwarmConfig;
use crate::rng::RngBackend;
use crate::swarm::{Fitness, FitnessError};

// ========================================================================
// PyDict Extraction Helpers
// ========================================================================

/// Extract a required field from a Python dict
///
/// # Errors
/// Returns PyValueError if the field is missing or has the wrong type.
fn extract_required<T>(dict: &Bound<'_, PyDict>, key: &str) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    dict.get_item(key)?
        .ok_or_else(|| PyValueError::new_err(format!("Missing required field '{}'", key)))?
        .extract()
        .map_err(|e| PyValueError::new_err(format!("Invalid type for '{}': {}", key, e)))
}

/// Extract an optional field, falling back to `default` when absent
fn extract_or<T>(dict: &Bound<'_, PyDict>, key: &str, default: T) -> PyResult<T>
where
    T: for<'py> FromPyObject<'py>,
{
    match dict.get_item(key)? {
        Some(value) => value
            .extract()
            .map_err(|e| PyValueError::new_err(format!("Invalid type for '{}': {}", key, e))),
        None => Ok(default),
    }
}

/// Build a [`SwarmConfig`] from a Python dict
///
/// `lower` and `upper` are required; every other key falls back to the
/// default. `backend` accepts any uid understood by [`RngBackend::from_uid`].
pub fn parse_swarm_config(dict: &Bound<'_, PyDict>) -> PyResult<SwarmConfig> {
    let defaults = SwarmConfig::default();

    let backend = match dict.get_item("backend")? {
        Some(value) => {
            let uid: String = value.extract()?;
            RngBackend::from_uid(&uid).map_err(|e| PyValueError::new_err(e.to_string()))?
        }
        None => defaults.backend,
    };

    Ok(SwarmConfig {
        c: extract_or(dict, "c", defaults.c)?,
        omega: extract_or(dict, "omega", defaults.omega)?,
        lower: extract_required(dict, "lower")?,
        upper: extract_required(dict, "upper")?,
        size: extract_or(dict, "size", defaults.size)?,
        max_evaluations: extract_or(dict, "max_evaluations", defaults.max_evaluations)?,
        neighbors: extract_or(dict, "neighbors", defaults.neighbors)?,
        backend,
    })
}

/// A Python callable used as a fitness function
///
/// Each evaluation takes the GIL, so Python fitness functions serialize
/// across workers; only the swarm bookkeeping runs in parallel.
pub struct PyFitness {
    callable: Py<PyAny>,
}

impl PyFitness {
    pub fn new(callable: Py<PyAny>) -> Self {
        Self { callable }
    }
}

impl Fitness for PyFitness {
    fn evaluate(&self, position: &[f64]) -> Result<f64, FitnessError> {
        Python::with_gil(|py| {
            self.callable
                .call1(py, (position.to_vec(),))
                .and_then(|value| value.extract::<f64>(py))
                .map_err(|e| FitnessError::Failed(e.to_string()))
        })
    }
}
