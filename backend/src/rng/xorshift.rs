//! xorshift128+ random number generator
//!
//! Fast, deterministic generator with 128 bits of state and 64-bit output.
//!
//! # Determinism
//!
//! Same passphrase → same seed → same sequence of blocks. This is what makes
//! an optimization run reproducible.

use super::BlockSource;

/// Replacement state used when a seed of all zeros is supplied
const ZERO_SEED_SUBSTITUTE: [u64; 2] = [0xbadd_beef_badd_cafe, 0xcafe_d00d_8bad_f00d];

/// Blocks discarded after seeding to mitigate weak seeds
const WARM_UP_BLOCKS: usize = 128;

const FNV_OFFSET_BASIS: u128 = 0x6c62_272e_07bb_0142_62b8_2175_6295_c58d;
const FNV_PRIME: u128 = 0x0000_0000_0100_0000_0000_0000_0000_013b;

/// A 128-bit seed for [`Xorshift128Plus`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Seed(pub u128);

impl Seed {
    /// Read a seed from the operating system CSPRNG
    pub fn from_os() -> Result<Self, getrandom::Error> {
        let mut buf = [0u8; 16];
        getrandom::getrandom(&mut buf)?;
        Ok(Seed(u128::from_le_bytes(buf)))
    }

    /// The two 64-bit state words (low half first)
    pub fn words(self) -> [u64; 2] {
        [self.0 as u64, (self.0 >> 64) as u64]
    }
}

/// Derive a seed from a human-readable passphrase
///
/// Uses the 128-bit FNV-1a hash over the passphrase bytes, so the result is
/// deterministic and depends on byte order.
///
/// # Example
/// ```
/// use pso_engine_core::rng::derive_seed;
///
/// assert_eq!(derive_seed("alpha"), derive_seed("alpha"));
/// assert_ne!(derive_seed("alpha"), derive_seed("ahpla"));
/// ```
pub fn derive_seed(passphrase: &str) -> Seed {
    let hash = passphrase.bytes().fold(FNV_OFFSET_BASIS, |hash, byte| {
        (hash ^ u128::from(byte)).wrapping_mul(FNV_PRIME)
    });
    Seed(hash)
}

/// Deterministic random number generator using xorshift128+
///
/// # Example
/// ```
/// use pso_engine_core::rng::{derive_seed, BlockSource, Xorshift128Plus};
///
/// let mut rng1 = Xorshift128Plus::from_seed(derive_seed("seed phrase"));
/// let mut rng2 = Xorshift128Plus::from_seed(derive_seed("seed phrase"));
/// assert_eq!(rng1.next_block(), rng2.next_block());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Xorshift128Plus {
    state: [u64; 2],
}

impl Xorshift128Plus {
    /// Create a generator from `seed` and spin it past the warm-up blocks
    ///
    /// An all-zero seed would lock the generator at zero forever, so a fixed
    /// non-zero pair is substituted.
    pub fn from_seed(seed: Seed) -> Self {
        let words = seed.words();
        let state = if words == [0, 0] {
            ZERO_SEED_SUBSTITUTE
        } else {
            words
        };

        let mut rng = Self { state };
        for _ in 0..WARM_UP_BLOCKS {
            rng.next_block();
        }
        rng
    }

    /// Create a generator from a passphrase
    pub fn from_passphrase(passphrase: &str) -> Self {
        Self::from_seed(derive_seed(passphrase))
    }

    /// Current internal state
    pub fn state(&self) -> [u64; 2] {
        self.state
    }
}

impl BlockSource for Xorshift128Plus {
    fn next_block(&mut self) -> u64 {
        let mut x = self.state[0];
        let y = self.state[1];

        self.state[0] = y;
        x ^= x << 23;
        self.state[1] = x ^ y ^ (x >> 18) ^ (y >> 5);

        self.state[1].wrapping_add(y)
    }
}
