//! Entropy sources
//!
//! Two interchangeable backends supply raw randomness in 64-bit blocks:
//!
//! - **xorshift128+**: deterministic, seeded from a passphrase
//! - **OS entropy**: buffered reads from the operating system CSPRNG
//!
//! Everything random in the engine goes through [`BlockSource`]; the
//! distribution layer in `transform` is generic over it.

mod urandom;
mod xorshift;

pub use urandom::OsEntropy;
pub use xorshift::{derive_seed, Seed, Xorshift128Plus};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A supplier of raw 64-bit entropy blocks
pub trait BlockSource {
    /// Return the next block and advance the internal state
    fn next_block(&mut self) -> u64;
}

impl<R: BlockSource + ?Sized> BlockSource for &mut R {
    fn next_block(&mut self) -> u64 {
        (**self).next_block()
    }
}

/// Errors raised while constructing an entropy source
#[derive(Debug, Error)]
pub enum RngError {
    #[error("Unknown RNG backend identifier: {0}")]
    UnknownBackend(String),

    #[error("The xorshift128+ backend needs a passphrase when OS entropy is unavailable")]
    MissingPassphrase,

    #[error("OS entropy unavailable: {0}")]
    Entropy(getrandom::Error),
}

/// The closed set of entropy backends known at build time
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RngBackend {
    /// Deterministic xorshift128+ generator
    #[default]
    #[serde(alias = "xorshift128+")]
    Xorshift,

    /// Buffered reader over the OS CSPRNG
    #[serde(alias = "/dev/urandom")]
    Urandom,
}

impl RngBackend {
    /// Every registered backend
    pub const ALL: [RngBackend; 2] = [RngBackend::Xorshift, RngBackend::Urandom];

    /// Human-readable name; not unique, never used for dispatch
    pub fn name(self) -> &'static str {
        match self {
            RngBackend::Xorshift => "xorshift128+",
            RngBackend::Urandom => "/dev/urandom",
        }
    }

    /// Globally unique identifier of the implementation
    pub fn uid(self) -> &'static str {
        match self {
            RngBackend::Xorshift => "1f3a3ccab4d1cc0447e2f8c07f35cce7",
            RngBackend::Urandom => "58fd3704b7de783c46c1e9d11f8fe3e2",
        }
    }

    /// Resolve a backend from its uid
    ///
    /// # Errors
    /// [`RngError::UnknownBackend`] when no registered backend reports `uid`.
    pub fn from_uid(uid: &str) -> Result<Self, RngError> {
        Self::ALL
            .into_iter()
            .find(|backend| backend.uid() == uid)
            .ok_or_else(|| RngError::UnknownBackend(uid.to_string()))
    }
}

impl fmt::Display for RngBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for RngBackend {
    type Err = RngError;

    /// Accepts the config spelling, the display name, or the uid
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "xorshift" => Ok(RngBackend::Xorshift),
            "urandom" => Ok(RngBackend::Urandom),
            other => Self::ALL
                .into_iter()
                .find(|backend| backend.name() == other)
                .map_or_else(|| Self::from_uid(other), Ok),
        }
    }
}

/// The entropy source owned by a swarm
///
/// Cloning the xorshift variant forks the sequence; cloning the OS variant
/// yields an independent reader.
#[derive(Debug, Clone)]
pub enum RandomSource {
    Xorshift(Xorshift128Plus),
    Urandom(OsEntropy),
}

impl RandomSource {
    /// Construct and initialize a source for `backend`
    ///
    /// The xorshift backend derives its seed from `passphrase`; without one it
    /// is seeded straight from OS entropy. The OS backend ignores the
    /// passphrase.
    ///
    /// # Errors
    /// - [`RngError::MissingPassphrase`] if xorshift has no passphrase and the
    ///   OS cannot supply a seed
    /// - [`RngError::Entropy`] if the OS backend cannot read entropy at all
    pub fn new(backend: RngBackend, passphrase: Option<&str>) -> Result<Self, RngError> {
        match backend {
            RngBackend::Xorshift => {
                let seed = match passphrase {
                    Some(phrase) => derive_seed(phrase),
                    None => Seed::from_os().map_err(|e| {
                        tracing::warn!(error = %e, "cannot seed xorshift128+ from OS entropy");
                        RngError::MissingPassphrase
                    })?,
                };
                Ok(RandomSource::Xorshift(Xorshift128Plus::from_seed(seed)))
            }
            RngBackend::Urandom => {
                if passphrase.is_some() {
                    tracing::debug!("passphrase ignored by the OS entropy backend");
                }
                Ok(RandomSource::Urandom(OsEntropy::new()?))
            }
        }
    }

    /// Resolve `uid` to a backend and construct it
    ///
    /// # Errors
    /// [`RngError::UnknownBackend`] for an unrecognized uid, otherwise as
    /// [`RandomSource::new`].
    pub fn from_uid(uid: &str, passphrase: Option<&str>) -> Result<Self, RngError> {
        Self::new(RngBackend::from_uid(uid)?, passphrase)
    }

    /// Which backend this source runs on
    pub fn backend(&self) -> RngBackend {
        match self {
            RandomSource::Xorshift(_) => RngBackend::Xorshift,
            RandomSource::Urandom(_) => RngBackend::Urandom,
        }
    }
}

impl BlockSource for RandomSource {
    fn next_block(&mut self) -> u64 {
        match self {
            RandomSource::Xorshift(rng) => rng.next_block(),
            RandomSource::Urandom(rng) => rng.next_block(),
        }
    }
}

impl rand_core::RngCore for RandomSource {
    fn next_u32(&mut self) -> u32 {
        (self.next_block() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.next_block()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for chunk in dest.chunks_mut(8) {
            let bytes = self.next_block().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}
