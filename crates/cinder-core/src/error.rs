//! Error types for Cinder protocol operations
//!
//! Every guard failure surfaces synchronously as one of these variants and
//! leaves state unchanged. Arithmetic overflow on amount sums is not
//! represented here: it aborts the transaction via checked arithmetic
//! (`expect`) instead of returning a wrapped result.

use crate::types::{BlockHeight, JobId, ParticipantId, Principal, RewardCycle};
use thiserror::Error;

/// Result type alias for protocol operations
pub type Result<T> = std::result::Result<T, ProtocolError>;

/// Errors that can occur in Cinder protocol operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProtocolError {
    // === Authorization ===
    /// Caller lacks the required role or identity
    #[error("Caller is not authorized for this operation")]
    Unauthorized,

    // === Phase Guards ===
    /// Contract has not reached its activation block
    #[error("Contract is not activated")]
    NotActivated,

    /// Stacking is not available before the first reward cycle
    #[error("Stacking is unavailable before the first reward cycle")]
    StackingUnavailable,

    // === Registration ===
    /// Principal already holds a participant id
    #[error("Principal is already registered: {0}")]
    AlreadyRegistered(Principal),

    /// Registration is closed once the activation threshold is reached
    #[error("Activation threshold of {threshold} participants already reached")]
    ThresholdReached { threshold: u32 },

    /// Principal was never registered
    #[error("Unknown participant: {0}")]
    ParticipantUnknown(Principal),

    // === Mining ===
    /// A commitment already exists for this participant at this height
    #[error("Participant {participant} already mined block {block}")]
    AlreadyMined {
        participant: ParticipantId,
        block: BlockHeight,
    },

    /// Zero-valued commitments are rejected
    #[error("Commitment value must be positive")]
    ZeroCommitment,

    /// Amount exceeds the caller's available balance
    #[error("Insufficient balance: need {required}, have {available}")]
    InsufficientBalance { required: u128, available: u128 },

    // === Claims ===
    /// Maturity window has not elapsed for this block
    #[error("Block {block} has not matured yet")]
    NotMaturedYet { block: BlockHeight },

    /// Nobody committed at this block height
    #[error("No commitments at block {block}")]
    NoCommittersAtBlock { block: BlockHeight },

    /// Caller did not commit at this block height
    #[error("Caller did not commit in block {block}")]
    DidNotCommitInBlock { block: BlockHeight },

    /// Caller is not the resolved winner for this block
    #[error("Caller is not the winner of block {block}")]
    NotTheWinner { block: BlockHeight },

    /// The block's reward has already been claimed
    #[error("Reward for block {block} already claimed")]
    AlreadyClaimed { block: BlockHeight },

    // === Stacking ===
    /// Lock period or amount outside the allowed range
    #[error("Cannot stack: lock period must be 1..={max_lock} cycles and amount positive")]
    CannotStack { max_lock: u64 },

    /// Reward cycle has not ended yet
    #[error("Reward cycle {cycle} is not completed")]
    CycleNotCompleted { cycle: RewardCycle },

    /// Nothing locked in this cycle, or already redeemed
    #[error("Nothing to redeem for cycle {cycle}")]
    NothingToRedeem { cycle: RewardCycle },

    // === Governance ===
    /// No job with this id
    #[error("Unknown job: {0}")]
    UnknownJob(JobId),

    /// Operation requires an inactive job
    #[error("Job {0} is already active")]
    JobIsActive(JobId),

    /// Operation requires an activated job
    #[error("Job {0} is not active")]
    JobIsNotActive(JobId),

    /// Approver repeated their current vote
    #[error("Approver already voted this way on job {0}")]
    AlreadyVotedThisWay(JobId),

    /// Job has not reached the approval quorum
    #[error("Job {0} is not approved")]
    JobIsNotApproved(JobId),

    /// Job was already executed
    #[error("Job {0} is already executed")]
    JobIsExecuted(JobId),

    /// Argument name already present on the job
    #[error("Argument already exists: {name}")]
    ArgumentAlreadyExists { name: String },

    // === Contract Registry ===
    /// Contract principal is not registered
    #[error("Core contract not found: {0}")]
    CoreContractNotFound(Principal),

    /// Contract principal is already registered
    #[error("Contract already exists: {0}")]
    ContractAlreadyExists(Principal),

    /// Contract is not in the state the operation requires
    #[error("Contract {0} is in the wrong state for this operation")]
    IncorrectContractState(Principal),
}

/// Stable numeric codes for API responses
impl ProtocolError {
    /// Get the error code exposed to callers
    pub fn code(&self) -> u32 {
        match self {
            Self::Unauthorized => 1000,
            Self::NotActivated => 1001,
            Self::StackingUnavailable => 1002,
            Self::AlreadyRegistered(_) => 1003,
            Self::ThresholdReached { .. } => 1004,
            Self::ParticipantUnknown(_) => 1005,
            Self::AlreadyMined { .. } => 2001,
            Self::ZeroCommitment => 2002,
            Self::InsufficientBalance { .. } => 2003,
            Self::NotMaturedYet { .. } => 2004,
            Self::NoCommittersAtBlock { .. } => 2005,
            Self::DidNotCommitInBlock { .. } => 2006,
            Self::NotTheWinner { .. } => 2007,
            Self::AlreadyClaimed { .. } => 2008,
            Self::CannotStack { .. } => 3001,
            Self::CycleNotCompleted { .. } => 3002,
            Self::NothingToRedeem { .. } => 3003,
            Self::UnknownJob(_) => 4001,
            Self::JobIsActive(_) => 4002,
            Self::JobIsNotActive(_) => 4003,
            Self::AlreadyVotedThisWay(_) => 4004,
            Self::JobIsNotApproved(_) => 4005,
            Self::JobIsExecuted(_) => 4006,
            Self::ArgumentAlreadyExists { .. } => 4007,
            Self::CoreContractNotFound(_) => 5001,
            Self::ContractAlreadyExists(_) => 5002,
            Self::IncorrectContractState(_) => 5003,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(ProtocolError::Unauthorized.code(), 1000);
        assert_eq!(ProtocolError::ZeroCommitment.code(), 2002);
        assert_eq!(ProtocolError::UnknownJob(7).code(), 4001);
    }

    #[test]
    fn test_error_display() {
        let err = ProtocolError::AlreadyMined {
            participant: ParticipantId::new(3),
            block: 120,
        };

        let msg = format!("{}", err);
        assert!(msg.contains("already mined block 120"));
    }
}
