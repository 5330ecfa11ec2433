//! Core type definitions for the Cinder protocol
//!
//! Identities are opaque 32-byte principals supplied by the surrounding
//! platform; the protocol never inspects them beyond equality. Hot-path
//! lookups use the dense [`ParticipantId`] assigned at registration instead
//! of principal-keyed maps.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Block height supplied by the caller with every transaction
pub type BlockHeight = u64;

/// Reward cycle index (fixed-length block windows after activation)
pub type RewardCycle = u64;

/// Amount of city tokens in smallest units
pub type TokenAmount = u128;

/// Amount of burned base currency in smallest units
pub type ValueAmount = u128;

/// Governance job identifier, assigned monotonically
pub type JobId = u64;

/// Principal - opaque caller identity
///
/// Wraps the 32-byte identity the platform layer resolves from transaction
/// signatures. Contract principals and wallet principals share this type.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Principal {
    id: [u8; 32],
}

impl Principal {
    /// Create a principal from raw bytes
    pub fn new(id: [u8; 32]) -> Self {
        Self { id }
    }

    /// Derive a principal from a human-readable name using BLAKE3
    ///
    /// Used by deployment fixtures and tests; real deployments receive
    /// principals from the platform.
    pub fn from_name(name: &str) -> Self {
        let hash = blake3::hash(name.as_bytes());
        Self {
            id: *hash.as_bytes(),
        }
    }

    /// Get the raw bytes
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.id
    }

    /// Convert to hex string
    pub fn to_hex(&self) -> String {
        hex::encode(self.id)
    }

    /// Parse from hex string
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s)?;
        let mut id = [0u8; 32];
        id.copy_from_slice(&bytes);
        Ok(Self { id })
    }
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Principal({})", &self.to_hex()[..12])
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", &self.to_hex()[..12])
    }
}

/// ParticipantId - dense integer id assigned at registration
///
/// Ids start at 1, are strictly increasing, and are never reused or
/// reassigned. They key every ledger lookup after registration.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ParticipantId(u32);

impl ParticipantId {
    /// Create from a raw id (must be nonzero)
    pub fn new(id: u32) -> Self {
        debug_assert!(id != 0, "participant ids start at 1");
        Self(id)
    }

    /// Raw id value
    pub fn get(&self) -> u32 {
        self.0
    }

    /// Zero-based arena index for this id
    pub fn index(&self) -> usize {
        (self.0 - 1) as usize
    }
}

impl fmt::Debug for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ParticipantId({})", self.0)
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
