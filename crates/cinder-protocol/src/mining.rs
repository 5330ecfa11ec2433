//! Mining commitment ledger and winner selection
//!
//! Commitments are recorded per (block height, participant) and are
//! irreversible at submission time: the burned value has already moved to
//! the treasury/stacker split when the commitment lands here. Winners are
//! resolved retrospectively once the maturity window has elapsed, weighted
//! by committed value.

use cinder_core::{BlockHeight, ParticipantId, ProtocolError, Result, ValueAmount};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Commitments and claim record for one block height
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct BlockRecord {
    /// Committed value per participant, ordered by id
    commitments: BTreeMap<ParticipantId, ValueAmount>,

    /// Sum of all commitments at this height
    total_committed: ValueAmount,

    /// Set exactly once, by the resolved winner's successful claim
    claimed_by: Option<ParticipantId>,
}

impl BlockRecord {
    /// Value a participant committed at this height
    pub fn commitment_of(&self, id: ParticipantId) -> ValueAmount {
        self.commitments.get(&id).copied().unwrap_or(0)
    }

    /// Total value committed at this height
    pub fn total_committed(&self) -> ValueAmount {
        self.total_committed
    }

    /// Number of distinct committers
    pub fn miner_count(&self) -> u32 {
        self.commitments.len() as u32
    }

    /// Participant that claimed this block's reward, if any
    pub fn claimed_by(&self) -> Option<ParticipantId> {
        self.claimed_by
    }
}

/// Per-height commitment ledger with retrospective winner selection
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MiningLedger {
    blocks: BTreeMap<BlockHeight, BlockRecord>,
    maturity_window: u64,
}

impl MiningLedger {
    /// Create an empty ledger with the claim maturity window
    pub fn new(maturity_window: u64) -> Self {
        Self {
            blocks: BTreeMap::new(),
            maturity_window,
        }
    }

    /// Record for a block height, if anyone committed there
    pub fn block(&self, height: BlockHeight) -> Option<&BlockRecord> {
        self.blocks.get(&height)
    }

    /// Whether a participant committed at a height
    pub fn has_committed(&self, id: ParticipantId, height: BlockHeight) -> bool {
        self.blocks
            .get(&height)
            .map(|record| record.commitments.contains_key(&id))
            .unwrap_or(false)
    }

    /// Record a commitment; the caller has already validated funds and value
    pub fn insert_commitment(
        &mut self,
        id: ParticipantId,
        height: BlockHeight,
        amount: ValueAmount,
    ) -> Result<()> {
        let record = self.blocks.entry(height).or_default();
        if record.commitments.contains_key(&id) {
            return Err(ProtocolError::AlreadyMined {
                participant: id,
                block: height,
            });
        }

        record.total_committed = record
            .total_committed
            .checked_add(amount)
            .expect("block commitment total overflow");
        record.commitments.insert(id, amount);
        Ok(())
    }

    /// Whether a block's maturity window has elapsed
    pub fn is_matured(&self, height: BlockHeight, current_block: BlockHeight) -> bool {
        current_block >= height + self.maturity_window
    }

    /// Block height whose chain state seeds the winner draw
    pub fn maturity_height(&self, height: BlockHeight) -> BlockHeight {
        height + self.maturity_window
    }

    /// Resolve the winner for a matured block
    ///
    /// The draw samples a value in `[0, total_committed)`; each committer
    /// owns a sub-range proportional to their committed value, so equal
    /// commitments are separated by the draw, never by insertion order.
    pub fn winner(
        &self,
        height: BlockHeight,
        current_block: BlockHeight,
        draw: [u8; 32],
    ) -> Result<ParticipantId> {
        let record = self
            .blocks
            .get(&height)
            .ok_or(ProtocolError::NoCommittersAtBlock { block: height })?;
        if !self.is_matured(height, current_block) {
            return Err(ProtocolError::NotMaturedYet { block: height });
        }

        let sample =
            u128::from_be_bytes(draw[..16].try_into().expect("draw is 32 bytes"))
                % record.total_committed;

        let mut cumulative = 0u128;
        for (id, amount) in &record.commitments {
            cumulative += amount;
            if sample < cumulative {
                return Ok(*id);
            }
        }
        unreachable!("sample below total commitment")
    }

    /// Record the winner's claim; the caller has already validated it
    pub fn mark_claimed(&mut self, height: BlockHeight, id: ParticipantId) {
        if let Some(record) = self.blocks.get_mut(&height) {
            record.claimed_by = Some(id);
        }
    }
}
