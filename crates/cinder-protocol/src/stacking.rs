//! Stacking ledger and reward-cycle accounting
//!
//! Locks always begin at the next reward cycle. A lock of `n` cycles placed
//! during cycle `c` credits the participant's locked balance in every cycle
//! of `[c + 1, c + n]` and schedules the tokens for return in cycle `c + n`.
//! Repeated locks accumulate additively and independently, so the sum of a
//! participant's to-return entries always equals the total they ever
//! stacked.

use cinder_core::{
    ParticipantId, ProtocolError, Result, RewardCycle, TokenAmount, ValueAmount,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// One participant's position in one reward cycle
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct StackingEntry {
    /// Tokens locked through this cycle
    pub locked: TokenAmount,

    /// Tokens scheduled to leave custody at the end of this cycle;
    /// nonzero only in a lock's final cycle
    pub to_return: TokenAmount,

    /// Set once the participant redeems this cycle
    pub redeemed: bool,
}

/// Aggregates for one reward cycle
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleTotals {
    /// Tokens locked by all participants this cycle
    pub total_locked: TokenAmount,

    /// Miners' burned value credited to this cycle's stackers
    pub miner_contribution: ValueAmount,
}

/// Per-(participant, cycle) stacking ledger with cycle aggregates
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StackingLedger {
    entries: HashMap<(ParticipantId, RewardCycle), StackingEntry>,
    totals: BTreeMap<RewardCycle, CycleTotals>,
    max_lock_period: u64,
}

impl StackingLedger {
    /// Create an empty ledger with the maximum lock period
    pub fn new(max_lock_period: u64) -> Self {
        Self {
            entries: HashMap::new(),
            totals: BTreeMap::new(),
            max_lock_period,
        }
    }

    /// Record a lock starting at the cycle after `current_cycle`
    ///
    /// The token transfer into custody happens in the token ledger before
    /// this is called; this only updates the cycle bookkeeping.
    pub fn stack(
        &mut self,
        id: ParticipantId,
        amount: TokenAmount,
        lock_period: u64,
        current_cycle: RewardCycle,
    ) -> Result<()> {
        if amount == 0 || lock_period == 0 || lock_period > self.max_lock_period {
            return Err(ProtocolError::CannotStack {
                max_lock: self.max_lock_period,
            });
        }

        let first = current_cycle + 1;
        let last = current_cycle + lock_period;

        for cycle in first..=last {
            let entry = self.entries.entry((id, cycle)).or_default();
            entry.locked = entry.locked.checked_add(amount).expect("locked balance overflow");

            let totals = self.totals.entry(cycle).or_default();
            totals.total_locked = totals
                .total_locked
                .checked_add(amount)
                .expect("cycle lock total overflow");
        }

        let final_entry = self.entries.entry((id, last)).or_default();
        final_entry.to_return = final_entry
            .to_return
            .checked_add(amount)
            .expect("to-return overflow");

        log::debug!(
            "participant {} locked {} for cycles {}..={}",
            id,
            amount,
            first,
            last
        );
        Ok(())
    }

    /// Credit a mining burn's stacker share to a cycle
    pub fn add_miner_contribution(&mut self, cycle: RewardCycle, amount: ValueAmount) {
        let totals = self.totals.entry(cycle).or_default();
        totals.miner_contribution = totals
            .miner_contribution
            .checked_add(amount)
            .expect("miner contribution overflow");
    }

    /// Tokens locked by all participants in a cycle
    pub fn total_locked(&self, cycle: RewardCycle) -> TokenAmount {
        self.totals.get(&cycle).map(|t| t.total_locked).unwrap_or(0)
    }

    /// Aggregates for a cycle
    pub fn cycle_totals(&self, cycle: RewardCycle) -> CycleTotals {
        self.totals.get(&cycle).copied().unwrap_or_default()
    }

    /// Tokens a participant has locked in a cycle
    pub fn locked_balance(&self, id: ParticipantId, cycle: RewardCycle) -> TokenAmount {
        self.entries
            .get(&(id, cycle))
            .map(|e| e.locked)
            .unwrap_or(0)
    }

    /// A participant's entry for a cycle
    pub fn entry(&self, id: ParticipantId, cycle: RewardCycle) -> Option<&StackingEntry> {
        self.entries.get(&(id, cycle))
    }

    /// Redeem a completed cycle: the pro-rata value share plus any tokens
    /// scheduled for return
    ///
    /// The caller verifies the cycle has ended; this enforces the
    /// per-entry exactly-once rule.
    pub fn redeem(
        &mut self,
        id: ParticipantId,
        cycle: RewardCycle,
    ) -> Result<(ValueAmount, TokenAmount)> {
        let totals = self.cycle_totals(cycle);
        let entry = self
            .entries
            .get_mut(&(id, cycle))
            .filter(|e| !e.redeemed && e.locked > 0)
            .ok_or(ProtocolError::NothingToRedeem { cycle })?;

        let payout = if totals.total_locked > 0 {
            totals
                .miner_contribution
                .checked_mul(entry.locked)
                .expect("payout numerator overflow")
                / totals.total_locked
        } else {
            0
        };

        entry.redeemed = true;
        Ok((payout, entry.to_return))
    }
}
