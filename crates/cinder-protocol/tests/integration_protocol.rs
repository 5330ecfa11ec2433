//! Integration tests for the Cinder protocol core
//!
//! These tests drive full lifecycles through the facade: registration and
//! activation, mining burns and retrospective claims, stacking across
//! reward cycles, and governed contract upgrades.

use cinder_core::{Principal, ProtocolConfig, ProtocolError};
use cinder_governance::auth::{ARG_NEW_CITY_WALLET, ARG_NEW_CONTRACT, ARG_OLD_CONTRACT};
use cinder_governance::registry::ContractState;
use cinder_protocol::protocol::CityProtocol;
use cinder_protocol::randomness::ChainRandomness;

fn deployer() -> Principal {
    Principal::from_name("deployer")
}

fn city_wallet() -> Principal {
    Principal::from_name("city-wallet")
}

fn approvers() -> Vec<Principal> {
    (1..=5)
        .map(|i| Principal::from_name(&format!("approver_{}", i)))
        .collect()
}

/// Compact-window deployment with alice and bob registered at block 100.
///
/// Threshold 2, delay 10: activation lands at block 110. Cycles are 50
/// blocks, so cycle 0 spans [110, 160) and cycle 1 spans [160, 210).
fn active_protocol() -> (CityProtocol<ChainRandomness>, Principal, Principal) {
    let mut p = CityProtocol::new(
        ProtocolConfig::compact(),
        ChainRandomness::from_phrase("integration"),
        deployer(),
        city_wallet(),
        approvers(),
    );
    let alice = Principal::from_name("alice");
    let bob = Principal::from_name("bob");

    p.register(alice, 100).unwrap();
    p.register(bob, 100).unwrap();
    p.fund_value(alice, 1_000_000);
    p.fund_value(bob, 1_000_000);
    (p, alice, bob)
}

mod activation_tests {
    use super::*;

    #[test]
    fn test_threshold_latches_activation() {
        let (p, _, _) = active_protocol();

        assert_eq!(p.activation_block(), Ok(110));
        assert!(!p.is_active(109));
        assert!(p.is_active(110));
        assert_eq!(p.registered_count(), 2);
    }

    #[test]
    fn test_registration_closes_at_threshold() {
        let (mut p, _, _) = active_protocol();

        assert_eq!(
            p.register(Principal::from_name("carol"), 120),
            Err(ProtocolError::ThresholdReached { threshold: 2 })
        );
    }

    #[test]
    fn test_cycle_arithmetic() {
        let (p, _, _) = active_protocol();

        assert_eq!(p.reward_cycle_of(110), Ok(0));
        assert_eq!(p.reward_cycle_of(159), Ok(0));
        assert_eq!(p.reward_cycle_of(160), Ok(1));
        assert_eq!(p.first_block_of_cycle(1), Ok(160));
        assert_eq!(p.reward_cycle_of(109), Err(ProtocolError::NotActivated));
    }
}

mod mining_tests {
    use super::*;

    #[test]
    fn test_single_miner_no_stackers_pays_city_in_full() {
        let (mut p, alice, _) = active_protocol();

        p.commit_value(alice, 110, 200).unwrap();

        assert_eq!(p.city_treasury_balance(), 200);
        assert_eq!(p.reward_escrow(), 0);
        assert_eq!(p.cycle_totals(0).miner_contribution, 0);
        assert_eq!(p.value_balance(&alice), 999_800);
    }

    #[test]
    fn test_winner_claims_coinbase_exactly_once() {
        let (mut p, alice, bob) = active_protocol();

        p.commit_value(alice, 111, 400).unwrap();
        p.commit_value(bob, 111, 600).unwrap();

        // Maturity window is 5 blocks
        assert_eq!(
            p.claim_mining_reward(alice, 115, 111),
            Err(ProtocolError::NotMaturedYet { block: 111 })
        );

        let winner_id = p.winner_at(116, 111).unwrap();
        let (winner, loser) = if winner_id == p.participant_id(&alice).unwrap() {
            (alice, bob)
        } else {
            (bob, alice)
        };

        assert!(p.can_claim(&winner, 116, 111));
        assert!(!p.can_claim(&loser, 116, 111));

        assert_eq!(
            p.claim_mining_reward(loser, 116, 111),
            Err(ProtocolError::NotTheWinner { block: 111 })
        );

        // Block 111 is one block past activation, inside the bonus window
        let coinbase = p.claim_mining_reward(winner, 116, 111).unwrap();
        assert_eq!(coinbase, p.emission().coinbase_at(111, 110));
        assert_eq!(p.token_balance(&winner), coinbase);
        assert_eq!(p.total_supply(), coinbase);

        assert_eq!(
            p.claim_mining_reward(winner, 117, 111),
            Err(ProtocolError::AlreadyClaimed { block: 111 })
        );
    }

    #[test]
    fn test_claim_guards() {
        let (mut p, alice, bob) = active_protocol();

        assert_eq!(
            p.claim_mining_reward(alice, 200, 111),
            Err(ProtocolError::NoCommittersAtBlock { block: 111 })
        );

        p.commit_value(alice, 111, 400).unwrap();
        assert_eq!(
            p.claim_mining_reward(bob, 200, 111),
            Err(ProtocolError::DidNotCommitInBlock { block: 111 })
        );
    }

    #[test]
    fn test_duplicate_commitment_rejected() {
        let (mut p, alice, _) = active_protocol();

        p.commit_value(alice, 110, 100).unwrap();
        let id = p.participant_id(&alice).unwrap();
        assert_eq!(
            p.commit_value(alice, 110, 100),
            Err(ProtocolError::AlreadyMined {
                participant: id,
                block: 110,
            })
        );
    }
}

mod stacking_tests {
    use super::*;

    /// Mine and claim one block so `who` holds spendable city tokens.
    fn earn_tokens(p: &mut CityProtocol<ChainRandomness>, who: Principal, block: u64) -> u128 {
        p.commit_value(who, block, 1_000).unwrap();
        p.claim_mining_reward(who, block + 5, block).unwrap()
    }

    #[test]
    fn test_stacked_cycle_split_and_redemption() {
        let (mut p, alice, bob) = active_protocol();

        // Bob earns tokens during cycle 0 and locks 500 for one cycle
        earn_tokens(&mut p, bob, 110);
        let bob_tokens = p.token_balance(&bob);
        p.stack_tokens(bob, 120, 500, 1).unwrap();
        assert_eq!(p.token_balance(&bob), bob_tokens - 500);
        assert_eq!(p.token_custody(), 500);
        assert_eq!(p.locked_balance(&bob, 1), 500);

        let city_before = p.city_treasury_balance();

        // Alice mines 1000 during cycle 1, where bob's lock is active
        p.commit_value(alice, 160, 1_000).unwrap();
        assert_eq!(p.cycle_totals(1).miner_contribution, 700);
        assert_eq!(p.city_treasury_balance(), city_before + 300);
        assert_eq!(p.reward_escrow(), 700);

        // Cycle 1 is still open
        assert_eq!(
            p.claim_stacking_reward(bob, 200, 1),
            Err(ProtocolError::CycleNotCompleted { cycle: 1 })
        );

        // After cycle 1 closes, one call pays the share and returns the lock
        let bob_value_before = p.value_balance(&bob);
        let (payout, returned) = p.claim_stacking_reward(bob, 215, 1).unwrap();
        assert_eq!(payout, 700);
        assert_eq!(returned, 500);
        assert_eq!(p.value_balance(&bob), bob_value_before + 700);
        assert_eq!(p.token_balance(&bob), bob_tokens);
        assert_eq!(p.token_custody(), 0);
        assert_eq!(p.reward_escrow(), 0);

        assert_eq!(
            p.claim_stacking_reward(bob, 216, 1),
            Err(ProtocolError::NothingToRedeem { cycle: 1 })
        );
    }

    #[test]
    fn test_overlapping_locks() {
        let (mut p, _, bob) = active_protocol();
        earn_tokens(&mut p, bob, 110);

        // 20 tokens for 4 cycles during cycle 0, 432 more for 8 during cycle 2
        p.stack_tokens(bob, 120, 20, 4).unwrap();
        p.stack_tokens(bob, 211, 432, 8).unwrap();

        for cycle in 1..=2u64 {
            assert_eq!(p.locked_balance(&bob, cycle), 20, "cycle {}", cycle);
        }
        for cycle in 3..=4u64 {
            assert_eq!(p.locked_balance(&bob, cycle), 452, "cycle {}", cycle);
        }
        for cycle in 5..=10u64 {
            assert_eq!(p.locked_balance(&bob, cycle), 432, "cycle {}", cycle);
        }
        assert_eq!(p.locked_balance(&bob, 11), 0);
        assert_eq!(p.token_custody(), 452);

        // Tokens come back only in each lock's final cycle
        let (_, returned) = p.claim_stacking_reward(bob, 215 + 3 * 50, 4).unwrap();
        assert_eq!(returned, 20);
        let (_, returned) = p.claim_stacking_reward(bob, 215 + 9 * 50, 10).unwrap();
        assert_eq!(returned, 432);
        assert_eq!(p.token_custody(), 0);
    }

    #[test]
    fn test_stack_requires_unlocked_tokens() {
        let (mut p, _, bob) = active_protocol();
        earn_tokens(&mut p, bob, 110);
        let balance = p.token_balance(&bob);

        assert_eq!(
            p.stack_tokens(bob, 120, balance + 1, 1),
            Err(ProtocolError::InsufficientBalance {
                required: balance + 1,
                available: balance,
            })
        );
        assert_eq!(
            p.stack_tokens(bob, 120, 100, 33),
            Err(ProtocolError::CannotStack { max_lock: 32 })
        );
    }
}

mod governance_tests {
    use super::*;

    fn v1() -> Principal {
        Principal::from_name("cinder-core-v1")
    }

    fn v2() -> Principal {
        Principal::from_name("cinder-core-v2")
    }

    #[test]
    fn test_upgrade_job_end_to_end() {
        let (mut p, _, _) = active_protocol();
        let a = approvers();

        p.initialize_contracts(deployer(), v1(), 1).unwrap();

        let job = p.create_job(a[0], "upgrade core contract", v2()).unwrap();
        p.add_principal_argument(a[0], job, ARG_OLD_CONTRACT, v1()).unwrap();
        p.add_principal_argument(a[0], job, ARG_NEW_CONTRACT, v2()).unwrap();
        p.activate_job(a[0], job).unwrap();

        for approver in a.iter().take(3) {
            p.approve_job(*approver, job).unwrap();
        }
        assert!(p.is_job_approved(job).unwrap());

        // Wrong principal supplied at execution time is refused
        assert_eq!(
            p.execute_upgrade_job(v2(), job, v1(), Principal::from_name("evil"), 500),
            Err(ProtocolError::Unauthorized)
        );

        p.execute_upgrade_job(v2(), job, v1(), v2(), 500).unwrap();

        let old = p.contract_info(&v1()).unwrap();
        assert_eq!(old.state, ContractState::Inactive);
        assert_eq!(old.end_height, Some(499));
        assert_eq!(p.contract_info(&v2()).unwrap().state, ContractState::Deployed);
        assert_eq!(p.active_contract(), Some(v2()));

        assert_eq!(
            p.execute_upgrade_job(v2(), job, v1(), v2(), 501),
            Err(ProtocolError::JobIsExecuted(job))
        );
    }

    #[test]
    fn test_city_wallet_job_repoints_treasury() {
        let (mut p, alice, _) = active_protocol();
        let a = approvers();
        let new_wallet = Principal::from_name("new-city-wallet");
        let target = v1();

        p.commit_value(alice, 110, 100).unwrap();
        assert_eq!(p.value_balance(&city_wallet()), 100);

        let job = p.create_job(a[0], "rotate city wallet", target).unwrap();
        p.add_principal_argument(a[0], job, ARG_NEW_CITY_WALLET, new_wallet).unwrap();
        p.activate_job(a[0], job).unwrap();
        for approver in a.iter().take(3) {
            p.approve_job(*approver, job).unwrap();
        }

        p.execute_set_city_wallet_job(target, job, new_wallet).unwrap();
        assert_eq!(p.city_wallet(), new_wallet);

        // New burns credit the new wallet; the old balance stays put
        p.commit_value(alice, 111, 60).unwrap();
        assert_eq!(p.value_balance(&city_wallet()), 100);
        assert_eq!(p.value_balance(&new_wallet), 60);
    }

    #[test]
    fn test_direct_upgrade_requires_city_wallet() {
        let (mut p, alice, _) = active_protocol();
        p.initialize_contracts(deployer(), v1(), 1).unwrap();

        assert_eq!(
            p.upgrade_core_contract(alice, v1(), v2(), 300),
            Err(ProtocolError::Unauthorized)
        );

        p.upgrade_core_contract(city_wallet(), v1(), v2(), 300).unwrap();
        assert_eq!(p.active_contract(), Some(v2()));
    }
}
