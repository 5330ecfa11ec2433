//! Protocol configuration
//!
//! One canonical core parameterized by its deployment constants replaces the
//! per-city, per-version contract duplication of earlier token families.

use crate::constants::{MAX_LOCK_PERIOD, ONE_CITY, STACKER_SPLIT_PERCENT};
use serde::{Deserialize, Serialize};

/// Deployment constants for a Cinder city
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProtocolConfig {
    /// Registered participants required before activation is scheduled
    pub activation_threshold: u32,

    /// Blocks between threshold-reached and the activation block
    pub activation_delay: u64,

    /// Blocks per reward cycle
    pub reward_cycle_length: u64,

    /// Maximum cycles a single stacking lock may span
    pub max_lock_period: u64,

    /// Blocks that must elapse before a mined block's winner can claim
    pub maturity_window: u64,

    /// Percent of each mining burn credited to the cycle's stackers
    pub stacker_split_percent: u128,

    /// Approvals required to execute a governance job
    pub job_quorum: u32,

    /// Blocks after activation paying the bonus coinbase
    pub bonus_period_length: u64,

    /// Blocks per halving epoch after the bonus period
    pub epoch_length: u64,

    /// Coinbase during the bonus period
    pub coinbase_bonus: u128,

    /// Coinbase per halving epoch; index 5 is the terminal amount used
    /// for every epoch past the fifth halving
    pub coinbase_epochs: [u128; 6],
}

impl Default for ProtocolConfig {
    fn default() -> Self {
        Self {
            activation_threshold: 20,
            activation_delay: 150,
            reward_cycle_length: 2_100,
            max_lock_period: MAX_LOCK_PERIOD,
            maturity_window: 100,
            stacker_split_percent: STACKER_SPLIT_PERCENT,
            job_quorum: 3,
            bonus_period_length: 10_000,
            epoch_length: 210_000,
            coinbase_bonus: 250_000 * ONE_CITY,
            coinbase_epochs: [
                100_000 * ONE_CITY,
                50_000 * ONE_CITY,
                25_000 * ONE_CITY,
                12_500 * ONE_CITY,
                6_250 * ONE_CITY,
                3_125 * ONE_CITY,
            ],
        }
    }
}

impl ProtocolConfig {
    /// Configuration with short windows for exercising full lifecycles in tests
    pub fn compact() -> Self {
        Self {
            activation_threshold: 2,
            activation_delay: 10,
            reward_cycle_length: 50,
            maturity_window: 5,
            bonus_period_length: 20,
            epoch_length: 100,
            ..Self::default()
        }
    }
}
