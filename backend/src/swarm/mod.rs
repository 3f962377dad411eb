//! Swarm - particle state machine
//!
//! See `engine.rs` for the iteration protocol.

pub mod engine;
pub mod fitness;
mod topology;

pub use engine::{Optimum, Subrange, Swarm, SwarmError, SwarmState};
pub use fitness::{Fitness, FitnessError};
