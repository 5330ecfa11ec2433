//! Protocol facade
//!
//! [`CityProtocol`] owns every ledger and exposes the full request/response
//! call surface: registration, mining, stacking, governance, and the
//! contract registry. Callers supply their identity and the current block
//! height with each call; the facade imposes no ordering of its own.
//!
//! Every mutating entry point evaluates all of its guards before the first
//! state change, so a failed call leaves the ledgers exactly as they were.

use crate::emission::EmissionSchedule;
use crate::ledger::{TokenLedger, ValueLedger};
use crate::mining::{BlockRecord, MiningLedger};
use crate::randomness::RandomnessSource;
use crate::registration::ParticipantRegistry;
use crate::stacking::{CycleTotals, StackingLedger};
use cinder_core::{
    BlockHeight, JobId, ParticipantId, Principal, ProtocolConfig, ProtocolError, Result,
    RewardCycle, TokenAmount, ValueAmount,
};
use cinder_governance::auth::{AuthState, GovernedAction};
use cinder_governance::jobs::Job;
use cinder_governance::registry::ContractInfo;
use parking_lot::Mutex;
use std::sync::Arc;

/// The Cinder protocol core for one city deployment
pub struct CityProtocol<R: RandomnessSource> {
    config: ProtocolConfig,
    emission: EmissionSchedule,
    participants: ParticipantRegistry,
    mining: MiningLedger,
    stacking: StackingLedger,
    values: ValueLedger,
    tokens: TokenLedger,
    auth: AuthState,
    randomness: R,
}

impl<R: RandomnessSource> CityProtocol<R> {
    /// Create a deployment with its governance bootstrap
    pub fn new(
        config: ProtocolConfig,
        randomness: R,
        deployer: Principal,
        city_wallet: Principal,
        approvers: Vec<Principal>,
    ) -> Self {
        Self {
            emission: EmissionSchedule::new(&config),
            participants: ParticipantRegistry::new(&config),
            mining: MiningLedger::new(config.maturity_window),
            stacking: StackingLedger::new(config.max_lock_period),
            values: ValueLedger::new(city_wallet),
            tokens: TokenLedger::new(),
            auth: AuthState::new(config.job_quorum, approvers, deployer),
            randomness,
            config,
        }
    }

    /// Deployment constants
    pub fn config(&self) -> &ProtocolConfig {
        &self.config
    }

    /// Emission schedule
    pub fn emission(&self) -> &EmissionSchedule {
        &self.emission
    }

    // === Fixture / balance surface ===

    /// Seed a principal's base-currency balance
    pub fn fund_value(&mut self, principal: Principal, amount: ValueAmount) {
        self.values.fund(principal, amount);
    }

    /// Base-currency balance of a principal
    pub fn value_balance(&self, principal: &Principal) -> ValueAmount {
        self.values.balance(principal)
    }

    /// City-token balance of a principal
    pub fn token_balance(&self, principal: &Principal) -> TokenAmount {
        self.tokens.balance(principal)
    }

    /// City tokens ever minted
    pub fn total_supply(&self) -> TokenAmount {
        self.tokens.total_supply()
    }

    /// Tokens currently held in stacking custody
    pub fn token_custody(&self) -> TokenAmount {
        self.tokens.custody()
    }

    /// Current city treasury wallet
    pub fn city_wallet(&self) -> Principal {
        self.values.city_wallet()
    }

    /// Base currency held by the city treasury
    pub fn city_treasury_balance(&self) -> ValueAmount {
        self.values.balance(&self.values.city_wallet())
    }

    /// Base currency escrowed for stackers
    pub fn reward_escrow(&self) -> ValueAmount {
        self.values.reward_escrow()
    }

    // === Registration & activation ===

    /// Register the caller as an early participant
    pub fn register(&mut self, caller: Principal, current_block: BlockHeight) -> Result<ParticipantId> {
        let unlatched = self.participants.activation_block_opt().is_none();
        let id = self.participants.register(caller, current_block)?;

        if unlatched {
            if let Some(activation) = self.participants.activation_block_opt() {
                self.auth.registry.record_activation(activation);
            }
        }
        Ok(id)
    }

    /// Whether the deployment is active at a block height
    pub fn is_active(&self, block: BlockHeight) -> bool {
        self.participants.is_active(block)
    }

    /// Resolved activation block
    pub fn activation_block(&self) -> Result<BlockHeight> {
        self.participants.activation_block()
    }

    /// Participant-count threshold
    pub fn activation_threshold(&self) -> u32 {
        self.participants.threshold()
    }

    /// Participants registered so far
    pub fn registered_count(&self) -> u32 {
        self.participants.registered_count()
    }

    /// Id assigned to a principal
    pub fn participant_id(&self, principal: &Principal) -> Result<ParticipantId> {
        self.participants.participant_id(principal)
    }

    // === Reward cycles ===

    /// Reward cycle containing a block height
    pub fn reward_cycle_of(&self, block: BlockHeight) -> Result<RewardCycle> {
        let activation = self.participants.activation_block()?;
        if block < activation {
            return Err(ProtocolError::NotActivated);
        }
        Ok((block - activation) / self.config.reward_cycle_length)
    }

    /// First block of a reward cycle
    pub fn first_block_of_cycle(&self, cycle: RewardCycle) -> Result<BlockHeight> {
        let activation = self.participants.activation_block()?;
        Ok(activation + cycle * self.config.reward_cycle_length)
    }

    // === Mining ===

    /// Burn base currency to mine the current block
    pub fn commit_value(
        &mut self,
        caller: Principal,
        current_block: BlockHeight,
        amount: ValueAmount,
    ) -> Result<()> {
        if !self.is_active(current_block) {
            return Err(ProtocolError::NotActivated);
        }
        if amount == 0 {
            return Err(ProtocolError::ZeroCommitment);
        }
        let id = self.participants.participant_id(&caller)?;
        let available = self.values.balance(&caller);
        if available < amount {
            return Err(ProtocolError::InsufficientBalance {
                required: amount,
                available,
            });
        }
        if self.mining.has_committed(id, current_block) {
            return Err(ProtocolError::AlreadyMined {
                participant: id,
                block: current_block,
            });
        }

        self.apply_commitment(caller, id, current_block, amount)
    }

    /// Mine a contiguous range of blocks, one amount per block
    ///
    /// All-or-nothing: any block in the range already mined by the caller,
    /// any zero amount, or an insufficient total balance fails the whole
    /// batch with no state change.
    pub fn commit_value_many(
        &mut self,
        caller: Principal,
        first_block: BlockHeight,
        amounts: &[ValueAmount],
    ) -> Result<()> {
        if !self.is_active(first_block) {
            return Err(ProtocolError::NotActivated);
        }
        let id = self.participants.participant_id(&caller)?;

        let mut total: ValueAmount = 0;
        for (offset, amount) in amounts.iter().enumerate() {
            let block = first_block + offset as u64;
            if *amount == 0 {
                return Err(ProtocolError::ZeroCommitment);
            }
            if self.mining.has_committed(id, block) {
                return Err(ProtocolError::AlreadyMined {
                    participant: id,
                    block,
                });
            }
            total = total.checked_add(*amount).expect("batch commitment overflow");
        }

        let available = self.values.balance(&caller);
        if available < total {
            return Err(ProtocolError::InsufficientBalance {
                required: total,
                available,
            });
        }

        for (offset, amount) in amounts.iter().enumerate() {
            self.apply_commitment(caller, id, first_block + offset as u64, *amount)?;
        }
        Ok(())
    }

    /// Record one validated commitment: burn, split, ledger entry
    fn apply_commitment(
        &mut self,
        caller: Principal,
        id: ParticipantId,
        block: BlockHeight,
        amount: ValueAmount,
    ) -> Result<()> {
        let cycle = self.reward_cycle_of(block)?;
        let (city_share, stacker_share) = self.split_commitment(cycle, amount);

        self.values.burn_commitment(caller, city_share, stacker_share)?;
        self.mining.insert_commitment(id, block, amount)?;
        if stacker_share > 0 {
            self.stacking.add_miner_contribution(cycle, stacker_share);
        }

        log::debug!(
            "participant {} committed {} at block {} (city {}, stackers {})",
            id,
            amount,
            block,
            city_share,
            stacker_share
        );
        Ok(())
    }

    /// Split a burn between the city treasury and the cycle's stackers
    ///
    /// The whole burn goes to the city when the cycle has no tokens locked.
    fn split_commitment(&self, cycle: RewardCycle, amount: ValueAmount) -> (ValueAmount, ValueAmount) {
        if self.stacking.total_locked(cycle) == 0 {
            return (amount, 0);
        }
        let stacker_share = amount
            .checked_mul(self.config.stacker_split_percent)
            .expect("split overflow")
            / 100;
        (amount - stacker_share, stacker_share)
    }

    /// Claim a matured block's coinbase as its resolved winner
    pub fn claim_mining_reward(
        &mut self,
        caller: Principal,
        current_block: BlockHeight,
        target_block: BlockHeight,
    ) -> Result<TokenAmount> {
        let record = self
            .mining
            .block(target_block)
            .ok_or(ProtocolError::NoCommittersAtBlock { block: target_block })?;
        if !self.mining.is_matured(target_block, current_block) {
            return Err(ProtocolError::NotMaturedYet { block: target_block });
        }

        let id = self
            .participants
            .participant_id(&caller)
            .map_err(|_| ProtocolError::DidNotCommitInBlock { block: target_block })?;
        if record.commitment_of(id) == 0 {
            return Err(ProtocolError::DidNotCommitInBlock { block: target_block });
        }

        let draw = self.randomness.draw(self.mining.maturity_height(target_block));
        let winner = self.mining.winner(target_block, current_block, draw)?;
        if winner != id {
            return Err(ProtocolError::NotTheWinner { block: target_block });
        }
        if record.claimed_by().is_some() {
            return Err(ProtocolError::AlreadyClaimed { block: target_block });
        }

        let activation = self.participants.activation_block()?;
        let coinbase = self.emission.coinbase_at(target_block, activation);

        self.tokens.mint(caller, coinbase);
        self.mining.mark_claimed(target_block, id);

        log::info!(
            "participant {} claimed block {} for {} tokens",
            id,
            target_block,
            coinbase
        );
        Ok(coinbase)
    }

    /// Resolved winner of a matured block
    pub fn winner_at(
        &self,
        current_block: BlockHeight,
        target_block: BlockHeight,
    ) -> Result<ParticipantId> {
        let draw = self.randomness.draw(self.mining.maturity_height(target_block));
        self.mining.winner(target_block, current_block, draw)
    }

    /// Whether the caller committed at a block height
    pub fn has_committed(&self, caller: &Principal, block: BlockHeight) -> bool {
        match self.participants.participant_id(caller) {
            Ok(id) => self.mining.has_committed(id, block),
            Err(_) => false,
        }
    }

    /// Whether a claim by the caller would currently succeed
    pub fn can_claim(
        &self,
        caller: &Principal,
        current_block: BlockHeight,
        target_block: BlockHeight,
    ) -> bool {
        let id = match self.participants.participant_id(caller) {
            Ok(id) => id,
            Err(_) => return false,
        };
        let record = match self.mining.block(target_block) {
            Some(record) => record,
            None => return false,
        };
        if record.claimed_by().is_some() || record.commitment_of(id) == 0 {
            return false;
        }
        self.winner_at(current_block, target_block) == Ok(id)
    }

    /// Commitment record for a block height
    pub fn block_record(&self, block: BlockHeight) -> Option<&BlockRecord> {
        self.mining.block(block)
    }

    // === Stacking ===

    /// Lock city tokens for a number of future reward cycles
    pub fn stack_tokens(
        &mut self,
        caller: Principal,
        current_block: BlockHeight,
        amount: TokenAmount,
        lock_period: u64,
    ) -> Result<()> {
        if !self.is_active(current_block) {
            return Err(ProtocolError::StackingUnavailable);
        }
        let id = self.participants.participant_id(&caller)?;
        if amount == 0 || lock_period == 0 || lock_period > self.config.max_lock_period {
            return Err(ProtocolError::CannotStack {
                max_lock: self.config.max_lock_period,
            });
        }
        let cycle = self.reward_cycle_of(current_block)?;

        self.tokens.lock(caller, amount)?;
        self.stacking.stack(id, amount, lock_period, cycle)
    }

    /// Redeem a completed cycle: pro-rata value share plus returned tokens
    pub fn claim_stacking_reward(
        &mut self,
        caller: Principal,
        current_block: BlockHeight,
        cycle: RewardCycle,
    ) -> Result<(ValueAmount, TokenAmount)> {
        if !self.is_active(current_block) {
            return Err(ProtocolError::StackingUnavailable);
        }
        let id = self.participants.participant_id(&caller)?;
        let current_cycle = self.reward_cycle_of(current_block)?;
        if cycle >= current_cycle {
            return Err(ProtocolError::CycleNotCompleted { cycle });
        }

        let (payout, returned) = self.stacking.redeem(id, cycle)?;
        if payout > 0 {
            self.values.pay_reward(caller, payout);
        }
        if returned > 0 {
            self.tokens.unlock(caller, returned);
        }

        log::debug!(
            "participant {} redeemed cycle {}: {} value, {} tokens",
            id,
            cycle,
            payout,
            returned
        );
        Ok((payout, returned))
    }

    /// Tokens the caller has locked in a cycle
    pub fn locked_balance(&self, caller: &Principal, cycle: RewardCycle) -> TokenAmount {
        match self.participants.participant_id(caller) {
            Ok(id) => self.stacking.locked_balance(id, cycle),
            Err(_) => 0,
        }
    }

    /// Aggregates for a reward cycle
    pub fn cycle_totals(&self, cycle: RewardCycle) -> CycleTotals {
        self.stacking.cycle_totals(cycle)
    }

    // === Governance ===

    /// Create a governance job
    pub fn create_job(&mut self, caller: Principal, name: &str, target: Principal) -> Result<JobId> {
        self.auth.jobs.create_job(caller, name, target)
    }

    /// Attach a uint argument to an inactive job
    pub fn add_uint_argument(
        &mut self,
        caller: Principal,
        job_id: JobId,
        name: &str,
        value: u128,
    ) -> Result<()> {
        self.auth.jobs.add_uint_argument(caller, job_id, name, value)
    }

    /// Attach a principal argument to an inactive job
    pub fn add_principal_argument(
        &mut self,
        caller: Principal,
        job_id: JobId,
        name: &str,
        value: Principal,
    ) -> Result<()> {
        self.auth
            .jobs
            .add_principal_argument(caller, job_id, name, value)
    }

    /// Activate a job, freezing its arguments
    pub fn activate_job(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        self.auth.jobs.activate_job(caller, job_id)
    }

    /// Cast or switch an approval vote
    pub fn approve_job(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        self.auth.jobs.approve_job(caller, job_id)
    }

    /// Cast or switch a disapproval vote
    pub fn disapprove_job(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        self.auth.jobs.disapprove_job(caller, job_id)
    }

    /// Whether a job has reached the approval quorum
    pub fn is_job_approved(&self, job_id: JobId) -> Result<bool> {
        self.auth.jobs.is_approved(job_id)
    }

    /// A job by id
    pub fn get_job(&self, job_id: JobId) -> Result<&Job> {
        self.auth.jobs.get_job(job_id)
    }

    /// Uint argument by name
    pub fn get_uint_argument_by_name(&self, job_id: JobId, name: &str) -> Result<Option<u128>> {
        Ok(self.get_job(job_id)?.uint_argument_by_name(name))
    }

    /// Uint argument by insertion-order id
    pub fn get_uint_argument_by_id(&self, job_id: JobId, arg_id: u32) -> Result<Option<u128>> {
        Ok(self.get_job(job_id)?.uint_argument_by_id(arg_id))
    }

    /// Principal argument by name
    pub fn get_principal_argument_by_name(
        &self,
        job_id: JobId,
        name: &str,
    ) -> Result<Option<Principal>> {
        Ok(self.get_job(job_id)?.principal_argument_by_name(name))
    }

    /// Principal argument by insertion-order id
    pub fn get_principal_argument_by_id(
        &self,
        job_id: JobId,
        arg_id: u32,
    ) -> Result<Option<Principal>> {
        Ok(self.get_job(job_id)?.principal_argument_by_id(arg_id))
    }

    /// Mark an approved job executed without a governed side effect
    pub fn mark_executed(&mut self, caller: Principal, job_id: JobId) -> Result<()> {
        self.auth.jobs.mark_executed(caller, job_id)
    }

    /// Execute an approved contract upgrade
    pub fn execute_upgrade_job(
        &mut self,
        caller: Principal,
        job_id: JobId,
        old: Principal,
        new: Principal,
        current_block: BlockHeight,
    ) -> Result<()> {
        self.auth
            .execute_upgrade_job(caller, job_id, old, new, current_block)?;
        Ok(())
    }

    /// Execute an approved city-wallet change and re-point the treasury
    pub fn execute_set_city_wallet_job(
        &mut self,
        caller: Principal,
        job_id: JobId,
        new_wallet: Principal,
    ) -> Result<()> {
        let action = self
            .auth
            .execute_set_city_wallet_job(caller, job_id, new_wallet)?;
        if let GovernedAction::SetCityWallet { wallet } = action {
            self.values.set_city_wallet(wallet);
        }
        Ok(())
    }

    /// Execute an approved approver replacement
    pub fn execute_replace_approver_job(
        &mut self,
        caller: Principal,
        job_id: JobId,
        old: Principal,
        new: Principal,
    ) -> Result<()> {
        self.auth
            .execute_replace_approver_job(caller, job_id, old, new)?;
        Ok(())
    }

    /// Current approver set
    pub fn approvers(&self) -> &[Principal] {
        self.auth.jobs.approvers()
    }

    // === Contract registry ===

    /// One-time registry bootstrap; deployer only
    pub fn initialize_contracts(
        &mut self,
        caller: Principal,
        target: Principal,
        current_block: BlockHeight,
    ) -> Result<()> {
        self.auth.registry.initialize(caller, target, current_block)
    }

    /// Direct upgrade path for the city wallet or the active contract
    pub fn upgrade_core_contract(
        &mut self,
        caller: Principal,
        old: Principal,
        new: Principal,
        current_block: BlockHeight,
    ) -> Result<()> {
        let city_wallet = self.values.city_wallet();
        self.auth
            .upgrade_core_contract(caller, city_wallet, old, new, current_block)
    }

    /// Current core contract
    pub fn active_contract(&self) -> Option<Principal> {
        self.auth.registry.active_contract()
    }

    /// Registration record for a contract
    pub fn contract_info(&self, contract: &Principal) -> Result<&ContractInfo> {
        self.auth.registry.contract_info(contract)
    }
}

/// Shared handle serializing every call through one lock
///
/// Callers that hold the protocol across threads clone this handle; each
/// entry point then executes inside a single atomic critical section, the
/// transaction boundary the sequential model requires.
pub struct SharedProtocol<R: RandomnessSource> {
    inner: Arc<Mutex<CityProtocol<R>>>,
}

impl<R: RandomnessSource> Clone for SharedProtocol<R> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<R: RandomnessSource> SharedProtocol<R> {
    /// Wrap a protocol instance
    pub fn new(protocol: CityProtocol<R>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(protocol)),
        }
    }

    /// Run one call inside the lock
    pub fn with<T>(&self, call: impl FnOnce(&mut CityProtocol<R>) -> T) -> T {
        call(&mut self.inner.lock())
    }
}
