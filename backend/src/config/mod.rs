//! Run configuration
//!
//! Serde-deserializable settings for the swarm and the parallel driver.
//! Every field has a default, so a JSON file only needs the values it
//! changes:
//!
//! ```json
//! {
//!   "swarm": { "lower": [0, 0], "upper": [1, 1], "size": 10, "neighbors": 3 },
//!   "driver": { "workers": 2 }
//! }
//! ```

use crate::rng::RngBackend;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors raised while loading or fingerprinting a configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Swarm parameters
///
/// The dimension of the search space is the length of the bound vectors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwarmConfig {
    /// Exploration factor pulling particles toward their best records
    pub c: f64,

    /// Velocity inertia
    pub omega: f64,

    /// Lower bound of every parameter (real units)
    pub lower: Vec<f64>,

    /// Upper bound of every parameter (real units)
    pub upper: Vec<f64>,

    /// Number of particles
    pub size: usize,

    /// Total fitness evaluations allowed
    pub max_evaluations: usize,

    /// Random informants per particle
    pub neighbors: usize,

    /// Entropy backend
    pub backend: RngBackend,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            c: 1.193,
            omega: 0.721,
            lower: Vec::new(),
            upper: Vec::new(),
            size: 40,
            max_evaluations: 2_000_000,
            neighbors: 3,
            backend: RngBackend::Xorshift,
        }
    }
}

impl SwarmConfig {
    /// Default parameters over the box `[lower, upper]`
    pub fn with_bounds(lower: Vec<f64>, upper: Vec<f64>) -> Self {
        Self {
            lower,
            upper,
            ..Self::default()
        }
    }

    /// Dimension of the search space
    pub fn dimensions(&self) -> usize {
        self.lower.len()
    }

    /// Lowercase hex SHA-256 of the serialized configuration
    ///
    /// Two runs with the same fingerprint and the same passphrase on the
    /// xorshift backend with one worker are identical.
    pub fn fingerprint(&self) -> Result<String, ConfigError> {
        let json = serde_json::to_string(self)?;

        let mut hasher = Sha256::new();
        hasher.update(json.as_bytes());
        let result = hasher.finalize();

        Ok(format!("{:x}", result))
    }
}

/// Parallel driver parameters
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Worker threads spawned per iteration
    pub workers: usize,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self { workers: 4 }
    }
}

/// Complete run configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub swarm: SwarmConfig,
    pub driver: DriverConfig,
}

impl RunConfig {
    /// Parse a configuration from JSON text
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a JSON configuration file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }
}
