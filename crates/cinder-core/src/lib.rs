//! # Cinder Core - Shared Protocol Types
//!
//! Foundation types for the Cinder proof-of-burn city-token protocol:
//! principal identities, the protocol error taxonomy, and the configuration
//! constants every deployment is parameterized by.
//!
//! ## Protocol at a glance
//!
//! | Phase | What happens |
//! |-------|--------------|
//! | Registration | Early participants sign up until the activation threshold |
//! | Mining | Participants burn base currency to compete for block rewards |
//! | Claiming | Retrospective weighted winner mints the scheduled coinbase |
//! | Stacking | Token holders lock tokens to earn a share of miners' burns |
//! | Governance | 3-of-N multisig job queue gates upgrades and wallet changes |

pub mod config;
pub mod error;
pub mod types;

// Re-exports
pub use config::ProtocolConfig;
pub use error::{ProtocolError, Result};
pub use types::{BlockHeight, JobId, ParticipantId, Principal, RewardCycle, TokenAmount, ValueAmount};

/// City token constants
pub mod constants {
    /// Token symbol
    pub const SYMBOL: &str = "CITY";

    /// Token name
    pub const NAME: &str = "Cinder City Token";

    /// Decimal places
    pub const DECIMALS: u8 = 6;

    /// One city token in smallest units
    pub const ONE_CITY: u128 = 1_000_000; // 10^6

    /// Maximum reward cycles a single lock may span
    pub const MAX_LOCK_PERIOD: u64 = 32;

    /// Share of each mining burn routed to stackers, in percent
    pub const STACKER_SPLIT_PERCENT: u128 = 70;
}

pub use constants::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_city() {
        assert_eq!(ONE_CITY, 10u128.pow(DECIMALS as u32));
    }

    #[test]
    fn test_split_is_a_percentage() {
        assert!(STACKER_SPLIT_PERCENT <= 100);
    }
}
