//! Asset ledgers
//!
//! Two independent ledgers back the protocol:
//!
//! - [`ValueLedger`] tracks the burned base currency: participant balances,
//!   the city treasury (keyed by the current city wallet), and the escrow
//!   pool holding the stackers' share of mining burns until redemption.
//! - [`TokenLedger`] tracks the mined city token: balances, the custody
//!   total for stacked tokens, and total supply. Winning claims are the
//!   only mint point.
//!
//! Amount arithmetic is checked; an overflow or an escrow underflow is an
//! invariant breach and aborts the transaction rather than wrapping.

use cinder_core::{Principal, ProtocolError, Result, TokenAmount, ValueAmount};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Base-currency ledger: balances, city treasury, stacker escrow
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ValueLedger {
    balances: HashMap<Principal, ValueAmount>,
    city_wallet: Principal,
    reward_escrow: ValueAmount,
}

impl ValueLedger {
    /// Create an empty ledger with the initial city wallet
    pub fn new(city_wallet: Principal) -> Self {
        Self {
            balances: HashMap::new(),
            city_wallet,
            reward_escrow: 0,
        }
    }

    /// Credit a principal; used by the deployment fixture to seed balances
    pub fn fund(&mut self, principal: Principal, amount: ValueAmount) {
        let balance = self.balances.entry(principal).or_insert(0);
        *balance = balance.checked_add(amount).expect("value balance overflow");
    }

    /// Spendable balance of a principal
    pub fn balance(&self, principal: &Principal) -> ValueAmount {
        self.balances.get(principal).copied().unwrap_or(0)
    }

    /// Current city treasury wallet
    pub fn city_wallet(&self) -> Principal {
        self.city_wallet
    }

    /// Re-point the treasury; future treasury credits go to the new wallet
    pub fn set_city_wallet(&mut self, wallet: Principal) {
        log::info!("city wallet changed: {} -> {}", self.city_wallet, wallet);
        self.city_wallet = wallet;
    }

    /// Value currently escrowed for stackers
    pub fn reward_escrow(&self) -> ValueAmount {
        self.reward_escrow
    }

    /// Burn a mining commitment: debit the miner, credit the city treasury
    /// and the stacker escrow in their configured shares
    pub fn burn_commitment(
        &mut self,
        from: Principal,
        city_share: ValueAmount,
        stacker_share: ValueAmount,
    ) -> Result<()> {
        let total = city_share
            .checked_add(stacker_share)
            .expect("commitment split overflow");
        let available = self.balance(&from);
        if available < total {
            return Err(ProtocolError::InsufficientBalance {
                required: total,
                available,
            });
        }

        *self.balances.get_mut(&from).expect("funded balance missing") -= total;

        let treasury = self.balances.entry(self.city_wallet).or_insert(0);
        *treasury = treasury.checked_add(city_share).expect("treasury overflow");
        self.reward_escrow = self
            .reward_escrow
            .checked_add(stacker_share)
            .expect("reward escrow overflow");
        Ok(())
    }

    /// Pay a stacker their share out of escrow
    pub fn pay_reward(&mut self, to: Principal, amount: ValueAmount) {
        self.reward_escrow = self
            .reward_escrow
            .checked_sub(amount)
            .expect("reward escrow underflow");
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).expect("value balance overflow");
    }
}

/// City-token ledger: balances, stacking custody, total supply
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct TokenLedger {
    balances: HashMap<Principal, TokenAmount>,
    custody: TokenAmount,
    total_supply: TokenAmount,
}

impl TokenLedger {
    /// Create an empty token ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlocked balance of a principal
    pub fn balance(&self, principal: &Principal) -> TokenAmount {
        self.balances.get(principal).copied().unwrap_or(0)
    }

    /// Tokens currently held in stacking custody
    pub fn custody(&self) -> TokenAmount {
        self.custody
    }

    /// Tokens ever minted
    pub fn total_supply(&self) -> TokenAmount {
        self.total_supply
    }

    /// Mint new tokens to a winner's balance
    pub fn mint(&mut self, to: Principal, amount: TokenAmount) {
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).expect("token balance overflow");
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .expect("token supply overflow");
    }

    /// Move tokens from a balance into stacking custody
    pub fn lock(&mut self, from: Principal, amount: TokenAmount) -> Result<()> {
        let available = self.balance(&from);
        if available < amount {
            return Err(ProtocolError::InsufficientBalance {
                required: amount,
                available,
            });
        }

        *self.balances.get_mut(&from).expect("funded balance missing") -= amount;
        self.custody = self.custody.checked_add(amount).expect("custody overflow");
        Ok(())
    }

    /// Return tokens from custody at the end of a lock
    pub fn unlock(&mut self, to: Principal, amount: TokenAmount) {
        self.custody = self.custody.checked_sub(amount).expect("custody underflow");
        let balance = self.balances.entry(to).or_insert(0);
        *balance = balance.checked_add(amount).expect("token balance overflow");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn miner() -> Principal {
        Principal::from_name("miner")
    }

    fn wallet() -> Principal {
        Principal::from_name("city-wallet")
    }

    #[test]
    fn test_burn_commitment_splits() {
        let mut values = ValueLedger::new(wallet());
        values.fund(miner(), 1_000);

        values.burn_commitment(miner(), 300, 700).unwrap();

        assert_eq!(values.balance(&miner()), 0);
        assert_eq!(values.balance(&wallet()), 300);
        assert_eq!(values.reward_escrow(), 700);
    }

    #[test]
    fn test_burn_requires_balance() {
        let mut values = ValueLedger::new(wallet());
        values.fund(miner(), 100);

        let result = values.burn_commitment(miner(), 60, 140);
        assert_eq!(
            result,
            Err(ProtocolError::InsufficientBalance {
                required: 200,
                available: 100,
            })
        );
        assert_eq!(values.balance(&miner()), 100);
        assert_eq!(values.reward_escrow(), 0);
    }

    #[test]
    fn test_pay_reward_draws_from_escrow() {
        let mut values = ValueLedger::new(wallet());
        values.fund(miner(), 1_000);
        values.burn_commitment(miner(), 300, 700).unwrap();

        let stacker = Principal::from_name("stacker");
        values.pay_reward(stacker, 700);

        assert_eq!(values.balance(&stacker), 700);
        assert_eq!(values.reward_escrow(), 0);
    }

    #[test]
    fn test_city_wallet_change_keeps_old_balance() {
        let mut values = ValueLedger::new(wallet());
        values.fund(miner(), 500);
        values.burn_commitment(miner(), 500, 0).unwrap();

        let new_wallet = Principal::from_name("new-city-wallet");
        values.set_city_wallet(new_wallet);

        assert_eq!(values.balance(&wallet()), 500);
        assert_eq!(values.balance(&new_wallet), 0);
    }

    #[test]
    fn test_token_mint_lock_unlock() {
        let mut tokens = TokenLedger::new();
        tokens.mint(miner(), 1_000);
        assert_eq!(tokens.total_supply(), 1_000);

        tokens.lock(miner(), 400).unwrap();
        assert_eq!(tokens.balance(&miner()), 600);
        assert_eq!(tokens.custody(), 400);

        assert_eq!(
            tokens.lock(miner(), 601),
            Err(ProtocolError::InsufficientBalance {
                required: 601,
                available: 600,
            })
        );

        tokens.unlock(miner(), 400);
        assert_eq!(tokens.balance(&miner()), 1_000);
        assert_eq!(tokens.custody(), 0);
        assert_eq!(tokens.total_supply(), 1_000);
    }
}
