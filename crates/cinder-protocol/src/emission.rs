//! # Emission Schedule
//!
//! Halving coinbase schedule for the city token.
//!
//! ```text
//! Offset from activation          Coinbase
//! ─────────────────────────────────────────
//! [0, bonus)                      250,000 CITY   (bonus window)
//! [bonus, bonus + 1*epoch)        100,000 CITY   (epoch 0)
//! [.., bonus + 2*epoch)            50,000 CITY   (epoch 1)
//! [.., bonus + 3*epoch)            25,000 CITY   (epoch 2)
//! [.., bonus + 4*epoch)            12,500 CITY   (epoch 3)
//! [.., bonus + 5*epoch)             6,250 CITY   (epoch 4)
//! [bonus + 5*epoch, ...)            3,125 CITY   (terminal)
//! ```
//!
//! The schedule is a pure function of blocks-since-activation; claiming a
//! block's reward is the only point where these amounts enter circulation.

use cinder_core::{BlockHeight, ProtocolConfig, TokenAmount};
use serde::{Deserialize, Serialize};

/// Number of halving epochs before the terminal amount takes over
pub const HALVING_EPOCHS: u64 = 5;

/// Pure coinbase schedule derived from the deployment configuration
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EmissionSchedule {
    bonus_period_length: u64,
    epoch_length: u64,
    coinbase_bonus: TokenAmount,
    coinbase_epochs: [TokenAmount; 6],
}

impl EmissionSchedule {
    /// Build the schedule from deployment constants
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            bonus_period_length: config.bonus_period_length,
            epoch_length: config.epoch_length,
            coinbase_bonus: config.coinbase_bonus,
            coinbase_epochs: config.coinbase_epochs,
        }
    }

    /// Halving epoch for an offset past the bonus window, clamped to the
    /// terminal epoch; `None` inside the bonus window
    pub fn epoch_at(&self, offset: u64) -> Option<u64> {
        if offset < self.bonus_period_length {
            return None;
        }
        Some(((offset - self.bonus_period_length) / self.epoch_length).min(HALVING_EPOCHS))
    }

    /// Coinbase for a block `offset` blocks after activation
    pub fn coinbase_offset(&self, offset: u64) -> TokenAmount {
        match self.epoch_at(offset) {
            None => self.coinbase_bonus,
            Some(epoch) => self.coinbase_epochs[epoch as usize],
        }
    }

    /// Coinbase for a block height given the resolved activation block;
    /// blocks before activation emit nothing
    pub fn coinbase_at(&self, block: BlockHeight, activation_block: BlockHeight) -> TokenAmount {
        if block < activation_block {
            return 0;
        }
        self.coinbase_offset(block - activation_block)
    }

    /// Total emission if every block through `offset` (inclusive) were claimed
    ///
    /// Used by supply-projection queries; actual supply is bounded by this
    /// since unclaimed blocks never mint.
    pub fn emitted_through(&self, offset: u64) -> TokenAmount {
        let mut remaining = offset as u128 + 1;
        let bonus_blocks = remaining.min(self.bonus_period_length as u128);
        let mut total = bonus_blocks * self.coinbase_bonus;
        remaining -= bonus_blocks;

        for amount in &self.coinbase_epochs[..HALVING_EPOCHS as usize] {
            let epoch_blocks = remaining.min(self.epoch_length as u128);
            total += epoch_blocks * amount;
            remaining -= epoch_blocks;
        }

        total + remaining * self.coinbase_epochs[HALVING_EPOCHS as usize]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cinder_core::constants::ONE_CITY;

    fn schedule() -> EmissionSchedule {
        EmissionSchedule::new(&ProtocolConfig::default())
    }

    #[test]
    fn test_bonus_window() {
        let s = schedule();

        assert_eq!(s.coinbase_offset(0), 250_000 * ONE_CITY);
        assert_eq!(s.coinbase_offset(9_999), 250_000 * ONE_CITY);
    }

    #[test]
    fn test_first_epoch_boundary() {
        let s = schedule();

        // Exactly at the end of the bonus window the first epoch amount applies
        assert_eq!(s.coinbase_offset(10_000), 100_000 * ONE_CITY);
        assert_eq!(s.epoch_at(10_000), Some(0));
    }

    #[test]
    fn test_halving_epochs() {
        let s = schedule();
        let bonus = 10_000u64;
        let epoch = 210_000u64;

        assert_eq!(s.coinbase_offset(bonus + epoch), 50_000 * ONE_CITY);
        assert_eq!(s.coinbase_offset(bonus + 2 * epoch), 25_000 * ONE_CITY);
        assert_eq!(s.coinbase_offset(bonus + 3 * epoch), 12_500 * ONE_CITY);
        assert_eq!(s.coinbase_offset(bonus + 4 * epoch), 6_250 * ONE_CITY);
    }

    #[test]
    fn test_terminal_amount() {
        let s = schedule();
        let terminal_start = 10_000 + 5 * 210_000u64;

        assert_eq!(s.coinbase_offset(terminal_start), 3_125 * ONE_CITY);
        assert_eq!(s.coinbase_offset(terminal_start * 10), 3_125 * ONE_CITY);
        assert_eq!(s.epoch_at(u64::MAX), Some(HALVING_EPOCHS));
    }

    #[test]
    fn test_pre_activation_emits_nothing() {
        let s = schedule();

        assert_eq!(s.coinbase_at(99, 100), 0);
        assert_eq!(s.coinbase_at(100, 100), 250_000 * ONE_CITY);
    }

    #[test]
    fn test_emitted_through() {
        let s = schedule();

        assert_eq!(s.emitted_through(0), 250_000 * ONE_CITY);
        assert_eq!(s.emitted_through(9), 10 * 250_000 * ONE_CITY);

        // Crossing the bonus boundary adds the epoch-0 amount
        let expected = 10_000u128 * 250_000 * ONE_CITY + 100_000 * ONE_CITY;
        assert_eq!(s.emitted_through(10_000), expected);
    }
}
