//! SHA-256 digest of the emitted result stream.
//!
//! Long runs are often repeated on different machines or thread counts;
//! since the output is deterministic, equal digests certify equal results
//! without keeping the streams around.

use sha2::{Digest, Sha256};

pub struct ResultChecksum {
    hasher: Sha256,
}

impl ResultChecksum {
    pub fn new() -> Self {
        Self {
            hasher: Sha256::new(),
        }
    }

    /// Absorb the bytes of one output line.
    pub fn update(&mut self, bytes: &[u8]) {
        self.hasher.update(bytes);
    }

    /// Hex digest.
    pub fn finish(self) -> String {
        let digest = self.hasher.finalize();
        let mut hex = String::with_capacity(digest.len() * 2);
        for byte in digest {
            hex.push_str(&format!("{byte:02x}"));
        }
        hex
    }
}

impl Default for ResultChecksum {
    fn default() -> Self {
        Self::new()
    }
}
