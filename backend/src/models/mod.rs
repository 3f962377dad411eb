pub mod particle;

pub use particle::{Particle, Vector};
