//! Buffered OS entropy
//!
//! Reads 256 bytes at a time from the operating system CSPRNG and hands them
//! out as 64-bit blocks.

use super::{BlockSource, RngError};

const BUFFER_BLOCKS: usize = 32;

/// Entropy source backed by the operating system
///
/// A clone starts with an empty buffer and reads fresh entropy on its first
/// draw, so it never replays blocks already handed out by the original.
#[derive(Debug)]
pub struct OsEntropy {
    buffer: [u64; BUFFER_BLOCKS],
    cursor: usize,
    refill_failures: u64,
}

impl OsEntropy {
    /// Create a source, verifying that the OS can supply entropy
    ///
    /// # Errors
    /// [`RngError::Entropy`] when the first read fails.
    pub fn new() -> Result<Self, RngError> {
        let mut source = Self {
            buffer: [0; BUFFER_BLOCKS],
            cursor: BUFFER_BLOCKS,
            refill_failures: 0,
        };
        Self::read_os(&mut source.buffer).map_err(RngError::Entropy)?;
        source.cursor = 0;
        Ok(source)
    }

    /// Number of refills that failed since construction
    pub fn refill_failures(&self) -> u64 {
        self.refill_failures
    }

    fn read_os(buffer: &mut [u64; BUFFER_BLOCKS]) -> Result<(), getrandom::Error> {
        let mut bytes = [0u8; BUFFER_BLOCKS * 8];
        getrandom::getrandom(&mut bytes)?;
        for (block, chunk) in buffer.iter_mut().zip(bytes.chunks_exact(8)) {
            let mut word = [0u8; 8];
            word.copy_from_slice(chunk);
            *block = u64::from_le_bytes(word);
        }
        Ok(())
    }

    fn refill(&mut self) {
        // On failure the stale buffer is served again.
        if let Err(e) = Self::read_os(&mut self.buffer) {
            self.refill_failures += 1;
            tracing::error!(error = %e, failures = self.refill_failures, "OS entropy refill failed");
        }
        self.cursor = 0;
    }
}

impl Clone for OsEntropy {
    fn clone(&self) -> Self {
        Self {
            buffer: [0; BUFFER_BLOCKS],
            cursor: BUFFER_BLOCKS,
            refill_failures: self.refill_failures,
        }
    }
}

impl BlockSource for OsEntropy {
    fn next_block(&mut self) -> u64 {
        if self.cursor == BUFFER_BLOCKS {
            self.refill();
        }
        let block = self.buffer[self.cursor];
        self.cursor += 1;
        block
    }
}
