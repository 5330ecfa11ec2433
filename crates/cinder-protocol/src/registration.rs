//! Registration and the activation gate
//!
//! Admits a bounded set of early participants, then schedules activation a
//! fixed delay after the threshold registration. Participant records live in
//! an arena indexed by [`ParticipantId`]; a secondary principal index serves
//! the registration path.

use cinder_core::{BlockHeight, ParticipantId, Principal, ProtocolConfig, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Participant arena plus the activation latch
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ParticipantRegistry {
    threshold: u32,
    delay: u64,

    /// Arena of principals; `ParticipantId` n lives at index n - 1
    principals: Vec<Principal>,

    /// Secondary index for the registration path
    ids: HashMap<Principal, ParticipantId>,

    /// Latched once when the threshold registration lands; immutable after
    activation_block: Option<BlockHeight>,
}

impl ParticipantRegistry {
    /// Create an empty registry from deployment constants
    pub fn new(config: &ProtocolConfig) -> Self {
        Self {
            threshold: config.activation_threshold,
            delay: config.activation_delay,
            principals: Vec::new(),
            ids: HashMap::new(),
            activation_block: None,
        }
    }

    /// Register a participant and assign the next id
    ///
    /// The registration that reaches the threshold latches
    /// `activation_block = current_block + delay`.
    pub fn register(
        &mut self,
        principal: Principal,
        current_block: BlockHeight,
    ) -> Result<ParticipantId> {
        if self.ids.contains_key(&principal) {
            return Err(ProtocolError::AlreadyRegistered(principal));
        }
        if self.principals.len() as u32 >= self.threshold {
            return Err(ProtocolError::ThresholdReached {
                threshold: self.threshold,
            });
        }

        self.principals.push(principal);
        let id = ParticipantId::new(self.principals.len() as u32);
        self.ids.insert(principal, id);

        if self.principals.len() as u32 == self.threshold {
            let activation = current_block + self.delay;
            self.activation_block = Some(activation);
            log::info!(
                "activation threshold reached at block {}, activating at block {}",
                current_block,
                activation
            );
        }

        Ok(id)
    }

    /// Id assigned to a principal
    pub fn participant_id(&self, principal: &Principal) -> Result<ParticipantId> {
        self.ids
            .get(principal)
            .copied()
            .ok_or(ProtocolError::ParticipantUnknown(*principal))
    }

    /// Principal behind an id
    pub fn principal_of(&self, id: ParticipantId) -> Option<Principal> {
        self.principals.get(id.index()).copied()
    }

    /// Whether the contract is active at a block height
    pub fn is_active(&self, block: BlockHeight) -> bool {
        match self.activation_block {
            Some(activation) => block >= activation,
            None => false,
        }
    }

    /// Resolved activation block; errors until the latch fires
    pub fn activation_block(&self) -> Result<BlockHeight> {
        self.activation_block.ok_or(ProtocolError::NotActivated)
    }

    /// Latched activation block without the phase-guard error
    pub fn activation_block_opt(&self) -> Option<BlockHeight> {
        self.activation_block
    }

    /// Participant-count threshold
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Participants registered so far
    pub fn registered_count(&self) -> u32 {
        self.principals.len() as u32
    }
}
