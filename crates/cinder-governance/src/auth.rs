//! Governed execution
//!
//! Ties the job queue and the contract registry together. Each governed
//! operation is a tagged [`GovernedAction`] decoded from a job's frozen
//! argument map at execution time; the executor compares the caller's
//! independently supplied arguments against the frozen ones and refuses to
//! run on any mismatch.

use crate::jobs::JobQueue;
use crate::registry::ContractRegistry;
use cinder_core::{BlockHeight, JobId, Principal, ProtocolError, Result};
use serde::{Deserialize, Serialize};

/// Frozen argument names used by the job executors
pub const ARG_OLD_CONTRACT: &str = "oldContract";
pub const ARG_NEW_CONTRACT: &str = "newContract";
pub const ARG_NEW_CITY_WALLET: &str = "newCityWallet";
pub const ARG_OLD_APPROVER: &str = "oldApprover";
pub const ARG_NEW_APPROVER: &str = "newApprover";

/// An operation a quorum of approvers has authorized
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum GovernedAction {
    /// Retire one core contract and register its replacement
    UpgradeCoreContract { old: Principal, new: Principal },

    /// Re-point the city treasury wallet
    SetCityWallet { wallet: Principal },

    /// Swap a member of the approver set
    ReplaceApprover { old: Principal, new: Principal },
}

/// Authorization layer state: job queue plus contract registry
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AuthState {
    pub jobs: JobQueue,
    pub registry: ContractRegistry,
}

impl AuthState {
    /// Create the auth layer with its initial approver set and deployer
    pub fn new(quorum: u32, approvers: Vec<Principal>, deployer: Principal) -> Self {
        Self {
            jobs: JobQueue::new(quorum, approvers),
            registry: ContractRegistry::new(deployer),
        }
    }

    /// Direct upgrade path: city wallet or the current contract itself
    pub fn upgrade_core_contract(
        &mut self,
        caller: Principal,
        city_wallet: Principal,
        old: Principal,
        new: Principal,
        current_block: BlockHeight,
    ) -> Result<()> {
        let authorized =
            caller == city_wallet || self.registry.active_contract() == Some(caller);
        if !authorized {
            return Err(ProtocolError::Unauthorized);
        }

        self.registry.upgrade(old, new, current_block)
    }

    /// Execute an approved contract-upgrade job
    ///
    /// The caller re-supplies both principals; they must match the job's
    /// frozen arguments exactly.
    pub fn execute_upgrade_job(
        &mut self,
        caller: Principal,
        job_id: JobId,
        old: Principal,
        new: Principal,
        current_block: BlockHeight,
    ) -> Result<GovernedAction> {
        self.validate_execution(caller, job_id)?;

        let job = self.jobs.get_job(job_id)?;
        let frozen_old = job
            .principal_argument_by_name(ARG_OLD_CONTRACT)
            .ok_or(ProtocolError::Unauthorized)?;
        let frozen_new = job
            .principal_argument_by_name(ARG_NEW_CONTRACT)
            .ok_or(ProtocolError::Unauthorized)?;
        if frozen_old != old || frozen_new != new {
            return Err(ProtocolError::Unauthorized);
        }

        self.registry.upgrade(old, new, current_block)?;
        self.jobs.set_executed(job_id);
        Ok(GovernedAction::UpgradeCoreContract { old, new })
    }

    /// Execute an approved city-wallet change
    ///
    /// Returns the action for the owner of the value ledger to apply.
    pub fn execute_set_city_wallet_job(
        &mut self,
        caller: Principal,
        job_id: JobId,
        new_wallet: Principal,
    ) -> Result<GovernedAction> {
        self.validate_execution(caller, job_id)?;

        let job = self.jobs.get_job(job_id)?;
        let frozen = job
            .principal_argument_by_name(ARG_NEW_CITY_WALLET)
            .ok_or(ProtocolError::Unauthorized)?;
        if frozen != new_wallet {
            return Err(ProtocolError::Unauthorized);
        }

        self.jobs.set_executed(job_id);
        Ok(GovernedAction::SetCityWallet { wallet: new_wallet })
    }

    /// Execute an approved approver replacement
    ///
    /// The replaced approver loses create/approve rights immediately;
    /// votes already cast stay in their jobs' tallies.
    pub fn execute_replace_approver_job(
        &mut self,
        caller: Principal,
        job_id: JobId,
        old: Principal,
        new: Principal,
    ) -> Result<GovernedAction> {
        self.validate_execution(caller, job_id)?;

        let job = self.jobs.get_job(job_id)?;
        let frozen_old = job
            .principal_argument_by_name(ARG_OLD_APPROVER)
            .ok_or(ProtocolError::Unauthorized)?;
        let frozen_new = job
            .principal_argument_by_name(ARG_NEW_APPROVER)
            .ok_or(ProtocolError::Unauthorized)?;
        if frozen_old != old || frozen_new != new {
            return Err(ProtocolError::Unauthorized);
        }

        self.jobs.replace_approver(old, new)?;
        self.jobs.set_executed(job_id);
        Ok(GovernedAction::ReplaceApprover { old, new })
    }

    fn validate_execution(&self, caller: Principal, job_id: JobId) -> Result<()> {
        let job = self.jobs.get_job(job_id)?;

        if !job.is_active {
            return Err(ProtocolError::JobIsNotActive(job_id));
        }
        if job.is_executed {
            return Err(ProtocolError::JobIsExecuted(job_id));
        }
        if caller != job.target {
            return Err(ProtocolError::Unauthorized);
        }
        if !self.jobs.is_approved(job_id)? {
            return Err(ProtocolError::JobIsNotApproved(job_id));
        }
        Ok(())
    }
}
