//! Core-contract registry
//!
//! Tracks the lifecycle of every core contract a deployment has seen and
//! which one is current. Upgrades retire the old contract and register the
//! replacement as a single indivisible update.
//!
//! Height bookkeeping convention: ranges are inclusive and non-overlapping.
//! An upgrade at block `h` closes the old contract at `end_height = h - 1`
//! and opens the new one at `start_height = h`.

use cinder_core::{BlockHeight, Principal, ProtocolError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Lifecycle state of a registered core contract
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContractState {
    /// Registered but not yet through its activation window
    Deployed,

    /// The live contract
    Active,

    /// Retired by an upgrade
    Inactive,

    /// Abandoned without ever activating
    Failed,
}

/// Registration record for a core contract
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractInfo {
    pub state: ContractState,

    /// First block this contract was current for
    pub start_height: BlockHeight,

    /// Last block this contract was current for; `None` while current
    pub end_height: Option<BlockHeight>,
}

/// Registry of core contracts with a single current pointer
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractRegistry {
    deployer: Principal,
    contracts: HashMap<Principal, ContractInfo>,
    current: Option<Principal>,
    initialized: bool,
}

impl ContractRegistry {
    /// Create an empty registry owned by the deployer
    pub fn new(deployer: Principal) -> Self {
        Self {
            deployer,
            contracts: HashMap::new(),
            current: None,
            initialized: false,
        }
    }

    /// One-time bootstrap: register the first core contract
    pub fn initialize(
        &mut self,
        caller: Principal,
        target: Principal,
        current_block: BlockHeight,
    ) -> Result<()> {
        if self.initialized || caller != self.deployer {
            return Err(ProtocolError::Unauthorized);
        }

        self.contracts.insert(
            target,
            ContractInfo {
                state: ContractState::Deployed,
                start_height: current_block,
                end_height: None,
            },
        );
        self.current = Some(target);
        self.initialized = true;

        log::info!("contract registry initialized with {}", target);
        Ok(())
    }

    /// Whether `initialize` has run
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Promote the current contract from Deployed to Active
    ///
    /// Called when the registration gate latches its activation block.
    pub fn record_activation(&mut self, height: BlockHeight) {
        if let Some(current) = self.current {
            if let Some(info) = self.contracts.get_mut(&current) {
                if info.state == ContractState::Deployed {
                    info.state = ContractState::Active;
                    log::info!("contract {} active as of block {}", current, height);
                }
            }
        }
    }

    /// Retire `old` and register `new` as the current contract
    pub fn upgrade(
        &mut self,
        old: Principal,
        new: Principal,
        current_block: BlockHeight,
    ) -> Result<()> {
        if !self.contracts.contains_key(&old) {
            return Err(ProtocolError::CoreContractNotFound(old));
        }
        if old == new || self.contracts.contains_key(&new) {
            return Err(ProtocolError::ContractAlreadyExists(new));
        }
        if self.current != Some(old) {
            return Err(ProtocolError::IncorrectContractState(old));
        }

        let info = self
            .contracts
            .get_mut(&old)
            .expect("checked contract disappeared");
        info.state = ContractState::Inactive;
        info.end_height = Some(current_block - 1);

        self.contracts.insert(
            new,
            ContractInfo {
                state: ContractState::Deployed,
                start_height: current_block,
                end_height: None,
            },
        );
        self.current = Some(new);

        log::info!("core contract upgraded: {} -> {} at block {}", old, new, current_block);
        Ok(())
    }

    /// The current core contract, if initialized
    pub fn active_contract(&self) -> Option<Principal> {
        self.current
    }

    /// Registration record for a contract
    pub fn contract_info(&self, contract: &Principal) -> Result<&ContractInfo> {
        self.contracts
            .get(contract)
            .ok_or(ProtocolError::CoreContractNotFound(*contract))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deployer() -> Principal {
        Principal::from_name("deployer")
    }

    fn v1() -> Principal {
        Principal::from_name("core-v1")
    }

    fn v2() -> Principal {
        Principal::from_name("core-v2")
    }

    #[test]
    fn test_initialize_once() {
        let mut registry = ContractRegistry::new(deployer());

        registry.initialize(deployer(), v1(), 5).unwrap();
        assert_eq!(registry.active_contract(), Some(v1()));
        assert_eq!(
            registry.initialize(deployer(), v2(), 6),
            Err(ProtocolError::Unauthorized)
        );
    }

    #[test]
    fn test_initialize_owner_only() {
        let mut registry = ContractRegistry::new(deployer());

        assert_eq!(
            registry.initialize(Principal::from_name("stranger"), v1(), 5),
            Err(ProtocolError::Unauthorized)
        );
    }

    #[test]
    fn test_upgrade_heights() {
        let mut registry = ContractRegistry::new(deployer());
        registry.initialize(deployer(), v1(), 5).unwrap();

        registry.upgrade(v1(), v2(), 100).unwrap();

        let old = registry.contract_info(&v1()).unwrap();
        assert_eq!(old.state, ContractState::Inactive);
        assert_eq!(old.start_height, 5);
        assert_eq!(old.end_height, Some(99));

        let new = registry.contract_info(&v2()).unwrap();
        assert_eq!(new.state, ContractState::Deployed);
        assert_eq!(new.start_height, 100);
        assert_eq!(new.end_height, None);

        assert_eq!(registry.active_contract(), Some(v2()));
    }

    #[test]
    fn test_upgrade_guards() {
        let mut registry = ContractRegistry::new(deployer());
        registry.initialize(deployer(), v1(), 5).unwrap();

        assert_eq!(
            registry.upgrade(v2(), v1(), 100),
            Err(ProtocolError::CoreContractNotFound(v2()))
        );
        assert_eq!(
            registry.upgrade(v1(), v1(), 100),
            Err(ProtocolError::ContractAlreadyExists(v1()))
        );

        registry.upgrade(v1(), v2(), 100).unwrap();

        // A retired contract cannot be upgraded away from again
        let v3 = Principal::from_name("core-v3");
        assert_eq!(
            registry.upgrade(v1(), v3, 200),
            Err(ProtocolError::IncorrectContractState(v1()))
        );
    }

    #[test]
    fn test_record_activation() {
        let mut registry = ContractRegistry::new(deployer());
        registry.initialize(deployer(), v1(), 5).unwrap();

        registry.record_activation(160);
        assert_eq!(
            registry.contract_info(&v1()).unwrap().state,
            ContractState::Active
        );
    }
}
