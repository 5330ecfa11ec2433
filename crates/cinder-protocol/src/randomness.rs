//! Randomness source for winner selection
//!
//! Winner selection needs a verifiable pseudo-random value derived from
//! chain state at the maturity block. The trait isolates that dependency:
//! production wires it to the platform's verifiable-randomness primitive,
//! tests use [`ChainRandomness`] with a known seed or [`FixedRandomness`]
//! to force a draw.

use cinder_core::BlockHeight;
use serde::{Deserialize, Serialize};

/// Source of per-block pseudo-random draws
pub trait RandomnessSource {
    /// Draw the 32-byte random value for a block height
    ///
    /// Must be deterministic per height: repeated draws for the same height
    /// return the same bytes.
    fn draw(&self, block_height: BlockHeight) -> [u8; 32];
}

/// BLAKE3 chain randomness seeded at deployment
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ChainRandomness {
    seed: [u8; 32],
}

impl ChainRandomness {
    /// Create from a raw seed
    pub fn new(seed: [u8; 32]) -> Self {
        Self { seed }
    }

    /// Derive the seed from a phrase; test and fixture convenience
    pub fn from_phrase(phrase: &str) -> Self {
        Self {
            seed: *blake3::hash(phrase.as_bytes()).as_bytes(),
        }
    }
}

impl RandomnessSource for ChainRandomness {
    fn draw(&self, block_height: BlockHeight) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(&self.seed);
        hasher.update(&block_height.to_be_bytes());
        *hasher.finalize().as_bytes()
    }
}

/// Returns the same bytes for every height; forces a known winner in tests
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct FixedRandomness(pub [u8; 32]);

impl FixedRandomness {
    /// Fixed draw whose low 16 bytes encode `value`
    pub fn from_value(value: u128) -> Self {
        let mut bytes = [0u8; 32];
        bytes[..16].copy_from_slice(&value.to_be_bytes());
        Self(bytes)
    }
}

impl RandomnessSource for FixedRandomness {
    fn draw(&self, _block_height: BlockHeight) -> [u8; 32] {
        self.0
    }
}
