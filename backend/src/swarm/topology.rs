//! Random informant topology
//!
//! Every particle has `k` informants drawn uniformly with replacement from
//! the rest of the swarm, plus itself. The edges are directed: particle `i`
//! listing `j` means `i` tells `j` about its best, not the reverse. The graph
//! is stored as index arrays inside the particles.

use crate::models::Particle;
use crate::rng::BlockSource;
use crate::transform::uniform_integer;

/// Draw a fresh topology for every particle
///
/// In a swarm of one particle every informant slot points at itself.
pub(crate) fn generate<R: BlockSource + ?Sized>(rng: &mut R, particles: &mut [Particle]) {
    let n = particles.len();

    for (i, particle) in particles.iter_mut().enumerate() {
        let k = particle.informants();

        for slot in particle.neighbors[..k].iter_mut() {
            *slot = if n == 1 {
                i
            } else {
                // Draw from the n - 1 other particles and skip over self.
                let j = uniform_integer(rng, 0, (n - 2) as u64) as usize;
                if j >= i {
                    j + 1
                } else {
                    j
                }
            };
        }

        particle.neighbors[k] = i;
    }
}

/// Whether particle `index` is at least as fit as each of its informants
pub(crate) fn is_local_best(particles: &[Particle], index: usize) -> bool {
    let particle = &particles[index];
    let k = particle.informants();

    particle.neighbors[..k]
        .iter()
        .all(|&peer| particle.q <= particles[peer].q)
}

/// Share particle `index`'s personal best with everyone it informs
///
/// Each listed neighbor, including the particle itself, adopts the personal
/// best as its informant best.
pub(crate) fn broadcast(particles: &mut [Particle], index: usize) {
    let source = &particles[index];
    let best = source.p;
    let fitness = source.q;
    let neighbors = source.neighbors;
    let k = source.informants();

    tracing::trace!(particle = index, fitness, "broadcasting personal best");

    for &peer in &neighbors[..=k] {
        let peer = &mut particles[peer];
        peer.l = best;
        peer.m = fitness;
    }
}
