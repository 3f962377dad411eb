//! PSO Engine Core - Rust Engine
//!
//! Thread-parallel Particle Swarm Optimization over a bounded box of up to
//! 50 dimensions, with a pluggable entropy source.
//!
//! # Architecture
//!
//! - **rng**: Entropy backends (xorshift128+, OS entropy)
//! - **transform**: Uniform, normal and hypersphere sampling
//! - **vector**: Shuffle, affine map, distance, Latin Hypercube Sampling
//! - **models**: Particle storage
//! - **swarm**: PSO state machine and informant topology
//! - **driver**: Multi-threaded iteration loop
//! - **config**: Serde configuration
//!
//! # Critical Invariants
//!
//! 1. Particles never leave the unit hypercube; real units only exist at the
//!    fitness boundary
//! 2. The global best fitness never increases
//! 3. With the xorshift backend and one worker, a passphrase fully determines
//!    a run

// Module declarations
pub mod config;
pub mod driver;
pub mod limits;
pub mod models;
pub mod rng;
pub mod swarm;
pub mod transform;
pub mod vector;

// Re-exports for convenience
pub use config::{ConfigError, DriverConfig, RunConfig, SwarmConfig};
pub use driver::{partition, DriverError, ParallelDriver, Progress, RunSummary};
pub use limits::{MAX_DIMENSIONS, MAX_NEIGHBORS, MAX_SWARM_SIZE, MAX_TRIES};
pub use models::Particle;
pub use rng::{BlockSource, RandomSource, RngBackend, RngError};
pub use swarm::{Fitness, FitnessError, Optimum, Subrange, Swarm, SwarmError, SwarmState};

// FFI module (when feature enabled)
#[cfg(feature = "pyo3")]
pub mod ffi;

// PyO3 exports (when feature enabled)
#[cfg(feature = "pyo3")]
use pyo3::prelude::*;

#[cfg(feature = "pyo3")]
#[pymodule]
fn pso_engine_core(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add_class::<ffi::swarm::PySwarm>()?;
    Ok(())
}
