//! Particle model
//!
//! A particle is one candidate solution. All of its vectors are fixed-size
//! inline arrays; only the first `dimensions` entries are meaningful.
//!
//! # Critical Invariants
//!
//! 1. `x`, `p` and `l` stay inside the unit hypercube
//! 2. `q` is the fitness of `p` and never increases
//! 3. `neighbors[informants]` is the particle's own index

use crate::limits::{MAX_DIMENSIONS, MAX_NEIGHBORS};

/// Fixed-capacity coordinate vector
pub type Vector = [f64; MAX_DIMENSIONS];

/// One member of the swarm
#[derive(Debug, Clone)]
pub struct Particle {
    /// Current position
    pub(crate) x: Vector,

    /// Personal best position
    pub(crate) p: Vector,

    /// Best position reported by an informant
    pub(crate) l: Vector,

    /// Velocity
    pub(crate) v: Vector,

    /// Scratch space for update centers and real-unit coordinates
    pub(crate) tmp: Vector,

    /// Fitness of `p`
    pub(crate) q: f64,

    /// Fitness of `l`
    pub(crate) m: f64,

    /// Informant indices; the last used slot is the particle itself
    pub(crate) neighbors: [usize; MAX_NEIGHBORS + 1],

    dimensions: usize,
    informants: usize,
}

impl Particle {
    /// Create a particle at the origin with no fitness recorded yet
    pub(crate) fn new(dimensions: usize, informants: usize) -> Self {
        Self {
            x: [0.0; MAX_DIMENSIONS],
            p: [0.0; MAX_DIMENSIONS],
            l: [0.0; MAX_DIMENSIONS],
            v: [0.0; MAX_DIMENSIONS],
            tmp: [0.0; MAX_DIMENSIONS],
            q: f64::INFINITY,
            m: f64::INFINITY,
            neighbors: [0; MAX_NEIGHBORS + 1],
            dimensions,
            informants,
        }
    }

    /// Place the particle at `point`, making it its own best and informant best
    pub(crate) fn place(&mut self, point: &[f64], fitness: f64) {
        let d = self.dimensions;
        self.x[..d].copy_from_slice(&point[..d]);
        self.p = self.x;
        self.l = self.x;
        self.q = fitness;
        self.m = fitness;
    }

    /// Current position in the unit hypercube
    pub fn position(&self) -> &[f64] {
        &self.x[..self.dimensions]
    }

    /// Current velocity
    pub fn velocity(&self) -> &[f64] {
        &self.v[..self.dimensions]
    }

    /// Best position this particle has visited
    pub fn best_position(&self) -> &[f64] {
        &self.p[..self.dimensions]
    }

    /// Fitness at [`Particle::best_position`]
    pub fn best_fitness(&self) -> f64 {
        self.q
    }

    /// Best position an informant has reported
    pub fn informant_position(&self) -> &[f64] {
        &self.l[..self.dimensions]
    }

    /// Fitness at [`Particle::informant_position`]
    pub fn informant_fitness(&self) -> f64 {
        self.m
    }

    /// Informant indices, ending with the particle's own index
    pub fn neighbors(&self) -> &[usize] {
        &self.neighbors[..=self.informants]
    }

    /// Number of random informants (excluding self)
    pub fn informants(&self) -> usize {
        self.informants
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }
}

/// Clamp one coordinate into `[0, 1]`, bouncing the velocity inelastically
///
/// On a boundary violation the position is pinned to the boundary and the
/// velocity is reversed and halved.
pub(crate) fn reflect(x: &mut f64, v: &mut f64) {
    if *x < 0.0 {
        *x = 0.0;
        *v *= -0.5;
    } else if *x > 1.0 {
        *x = 1.0;
        *v *= -0.5;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reflect_upper_boundary() {
        let mut x = 1.3;
        let mut v = 0.8;
        reflect(&mut x, &mut v);
        assert_eq!(x, 1.0);
        assert_eq!(v, -0.4);
    }

    #[test]
    fn test_reflect_lower_boundary() {
        let mut x = -0.25;
        let mut v = -0.6;
        reflect(&mut x, &mut v);
        assert_eq!(x, 0.0);
        assert_eq!(v, 0.3);
    }

    #[test]
    fn test_reflect_inside_untouched() {
        let mut x = 0.5;
        let mut v = 0.2;
        reflect(&mut x, &mut v);
        assert_eq!((x, v), (0.5, 0.2));

        let mut edge = 1.0;
        reflect(&mut edge, &mut v);
        assert_eq!((edge, v), (1.0, 0.2));
    }

    #[test]
    fn test_place_sets_all_records() {
        let mut particle = Particle::new(2, 3);
        particle.place(&[0.25, 0.5], 1.5);

        assert_eq!(particle.position(), &[0.25, 0.5]);
        assert_eq!(particle.best_position(), &[0.25, 0.5]);
        assert_eq!(particle.informant_position(), &[0.25, 0.5]);
        assert_eq!(particle.best_fitness(), 1.5);
        assert_eq!(particle.informant_fitness(), 1.5);
        assert_eq!(particle.neighbors().len(), 4);
    }
}
