//! Fixed capacities of the engine
//!
//! Every per-particle vector is an inline array sized by these constants, so
//! the hot evaluation loop never touches the allocator.

/// Maximum dimensionality of the search space (also caps hypersphere sampling)
pub const MAX_DIMENSIONS: usize = 50;

/// Maximum number of particles in a swarm
pub const MAX_SWARM_SIZE: usize = 50;

/// Maximum number of random informants per particle
pub const MAX_NEIGHBORS: usize = 25;

/// Attempts made by rejection samplers before falling back to a fixed value
///
/// With an acceptance probability of 1/2 the fallback is reached with
/// probability 2^-128 on genuinely random input.
pub const MAX_TRIES: usize = 128;
