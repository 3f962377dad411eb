//! Python bindings
//!
//! Exposes [`crate::Swarm`] as a Python class driven by a Python callable.

pub mod swarm;
pub mod types;
