// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use validator_system::balance::Balance;
use validator_system::base_types::{Address, TxContext};
use validator_system::event::{SystemEpochInfoEvent, SystemEvent};
use validator_system::genesis::Genesis;
use validator_system::system_state::SYSTEM_STATE_OBJECT_ID;
use validator_system::test_utils::{
    advance_epoch, advance_epoch_params, advance_epoch_with, build_genesis, genesis_with_stakes,
    system_ctx, tokens, validator_metadata,
};
use validator_system::{AdvanceEpochParams, SystemError, SystemState, SystemStateTrait};

fn genesis(num_validators: usize) -> Genesis {
    build_genesis(&genesis_with_stakes(&vec![
        tokens(2_000_000);
        num_validators
    ]))
}

fn sender(seed: u64) -> TxContext {
    TxContext::new_for_testing(Address::from_seed(seed))
}

fn epoch_info(ctx: &TxContext) -> SystemEpochInfoEvent {
    ctx.events()
        .iter()
        .find_map(|e| match e {
            SystemEvent::SystemEpochInfo(info) => Some(info.clone()),
            _ => None,
        })
        .expect("every epoch change emits its summary")
}

fn total_stake(state: &SystemState) -> u64 {
    state.inner().map(|inner| inner.validators.total_stake).unwrap_or_default()
}

fn storage_fund_balance(state: &SystemState) -> u64 {
    state
        .inner()
        .map(|inner| inner.storage_fund.total_balance())
        .unwrap_or_default()
}

/// Registers `seed` as a candidate backed by a joining-size stake from
/// another address.
fn stake_candidate(state: &mut SystemState, seed: u64) {
    let (metadata, _) = validator_metadata(seed);
    let address = metadata.address;
    state
        .execute(&mut sender(seed), |inner, ctx| {
            inner.request_add_validator_candidate(metadata, 1_000, 0, ctx)
        })
        .unwrap();
    state
        .execute(&mut sender(seed + 1_000), |inner, ctx| {
            inner.request_add_stake(Balance::new(tokens(2_000_000)), address, ctx)
        })
        .unwrap();
}

#[test]
fn candidate_joins_at_the_next_epoch() {
    let mut state = genesis(4).system_state;
    stake_candidate(&mut state, 100);
    let address = Address::from_seed(100);
    state
        .execute(&mut sender(100), |inner, ctx| inner.request_add_validator(ctx))
        .unwrap();
    assert_eq!(state.active_validator_addresses().len(), 4);

    let ctx = advance_epoch(&mut state).unwrap();
    assert!(state.active_validator_addresses().contains(&address));
    assert_eq!(state.get_current_epoch_committee().num_members(), 5);
    assert!(ctx.events().iter().any(|e| matches!(
        e,
        SystemEvent::ValidatorJoin(join) if join.validator_address == address && join.epoch == 1
    )));
    let inner = state.inner().unwrap();
    assert_eq!(inner.validator_stake_amount(&address).unwrap(), tokens(2_000_000));
    assert_eq!(inner.validator_voting_power(&address).unwrap(), 2_000);
}

#[test]
fn candidate_must_register_itself() {
    let mut state = genesis(4).system_state;
    let (metadata, _) = validator_metadata(100);
    let err = state
        .execute(&mut sender(101), |inner, ctx| {
            inner.request_add_validator_candidate(metadata, 1_000, 0, ctx)
        })
        .unwrap_err();
    assert_eq!(
        err,
        SystemError::SenderMismatch {
            sender: Address::from_seed(101),
            address: Address::from_seed(100),
        }
    );
}

#[test]
fn commission_rate_is_capped_at_twenty_percent() {
    let mut state = genesis(4).system_state;
    let mut ctx = sender(1);
    assert_eq!(
        state.execute(&mut ctx, |inner, ctx| inner.request_set_commission_rate(2_001, ctx)),
        Err(SystemError::CommissionRateTooHigh {
            rate: 2_001,
            max: 2_000
        })
    );
    state
        .execute(&mut ctx, |inner, ctx| inner.request_set_commission_rate(2_000, ctx))
        .unwrap();
    let validator = state
        .inner()
        .unwrap()
        .validator_by_address(&Address::from_seed(1))
        .unwrap();
    assert_eq!(validator.next_epoch_commission_rate, 2_000);
}

#[test]
fn epoch_changes_conserve_supply_and_stake() {
    let mut state = genesis(4).system_state;
    let params = AdvanceEpochParams {
        validator_subsidy: tokens(1_000),
        computation_charge: tokens(300),
        computation_charge_burned: tokens(100),
        storage_charge: tokens(50),
        storage_rebate: tokens(20),
        non_refundable_storage_fee: tokens(5),
        ..advance_epoch_params(0)
    };

    for _ in 0..3 {
        let supply_before = state.total_supply();
        let stake_before = total_stake(&state);
        let fund_before = storage_fund_balance(&state);

        let (rebate, mut ctx) = advance_epoch_with(&mut state, params.clone()).unwrap();
        let info = epoch_info(&ctx);

        assert_eq!(info.epoch, state.epoch());
        assert_eq!(info.minted_tokens_amount, tokens(900));
        assert_eq!(info.total_gas_fees, tokens(350));
        assert_eq!(info.tips_amount, tokens(200));
        assert_eq!(
            info.total_stake_rewards_distributed + info.burnt_tokens_amount,
            tokens(1_200)
        );
        assert_eq!(
            state.total_supply(),
            supply_before + info.minted_tokens_amount - info.burnt_tokens_amount
        );
        assert_eq!(
            total_stake(&state),
            stake_before + info.total_stake_rewards_distributed
        );
        assert_eq!(info.total_stake, total_stake(&state));
        assert_eq!(rebate.value(), tokens(20));
        assert_eq!(storage_fund_balance(&state), fund_before + tokens(30));

        // Genesis validators charge a commission, paid as fresh stake.
        let recipients: Vec<_> = ctx.take_transfers().into_iter().map(|(to, _)| to).collect();
        assert_eq!(recipients, state.active_validator_addresses());
    }
}

#[test]
fn burned_charges_beyond_the_subsidy_are_destroyed() {
    let mut state = genesis(4).system_state;
    let supply_before = state.total_supply();
    let params = AdvanceEpochParams {
        validator_subsidy: tokens(10),
        computation_charge: tokens(100),
        computation_charge_burned: tokens(60),
        ..advance_epoch_params(0)
    };
    let (_, ctx) = advance_epoch_with(&mut state, params).unwrap();
    let info = epoch_info(&ctx);
    assert_eq!(info.minted_tokens_amount, 0);
    assert!(info.burnt_tokens_amount >= tokens(50));
    assert_eq!(
        info.total_stake_rewards_distributed + info.burnt_tokens_amount,
        tokens(100)
    );
    assert_eq!(state.total_supply(), supply_before - info.burnt_tokens_amount);
}

#[test]
fn burned_above_the_charge_is_rejected() {
    let mut state = genesis(4).system_state;
    let params = AdvanceEpochParams {
        computation_charge: tokens(1),
        computation_charge_burned: tokens(2),
        ..advance_epoch_params(0)
    };
    assert_eq!(
        advance_epoch_with(&mut state, params).map(|_| ()),
        Err(SystemError::BurnedExceedsComputationCharge {
            burned: tokens(2),
            charge: tokens(1),
        })
    );
    assert_eq!(state.epoch(), 0);
}

#[test]
fn wrong_epoch_leaves_state_unchanged() {
    let mut state = genesis(4).system_state;
    let before = state.to_bytes().unwrap();
    let mut ctx = system_ctx();
    let result = state.execute(&mut ctx, |inner, ctx| {
        inner.advance_epoch(&advance_epoch_params(3), ctx)
    });
    assert_eq!(
        result.map(|_| ()),
        Err(SystemError::AdvancedToWrongEpoch {
            expected: 1,
            requested: 3
        })
    );
    assert_eq!(state.to_bytes().unwrap(), before);
    assert!(ctx.events().is_empty());
}

#[test]
fn only_the_system_advances_epochs() {
    let mut state = genesis(4).system_state;
    let mut ctx = sender(1);
    let result = state.execute(&mut ctx, |inner, ctx| {
        inner.advance_epoch(&advance_epoch_params(1), ctx)
    });
    assert_eq!(
        result.map(|_| ()),
        Err(SystemError::NotSystemAddress(Address::from_seed(1)))
    );
}

#[test]
fn repeated_reports_count_once_and_quorum_slashes() {
    let genesis = genesis(4);
    let mut state = genesis.system_state;
    let caps = genesis.operation_caps;
    let reportee = Address::from_seed(1);

    for _ in 0..2 {
        state
            .execute(&mut sender(2), |inner, _| inner.report_validator(&caps[1], reportee))
            .unwrap();
    }
    assert_eq!(state.inner().unwrap().reporters_of(&reportee).len(), 1);

    assert_eq!(
        state.execute(&mut sender(1), |inner, _| inner.report_validator(&caps[0], reportee)),
        Err(SystemError::CannotReportOneself)
    );
    assert_eq!(
        state.execute(&mut sender(2), |inner, _| {
            inner.report_validator(&caps[1], Address::from_seed(50))
        }),
        Err(SystemError::NotAValidator(Address::from_seed(50)))
    );
    assert_eq!(
        state.execute(&mut sender(3), |inner, _| inner.undo_report_validator(&caps[2], reportee)),
        Err(SystemError::ReportRecordNotFound(reportee))
    );

    for cap in &caps[2..] {
        state
            .execute(&mut sender(9), |inner, _| inner.report_validator(cap, reportee))
            .unwrap();
    }
    let stake_before = state
        .inner()
        .unwrap()
        .validator_stake_amount(&reportee)
        .unwrap();
    let params = AdvanceEpochParams {
        validator_subsidy: tokens(1_000),
        reward_slashing_rate: 10_000,
        ..advance_epoch_params(0)
    };
    advance_epoch_with(&mut state, params).unwrap();

    let inner = state.inner().unwrap();
    assert_eq!(inner.validator_stake_amount(&reportee).unwrap(), stake_before);
    assert!(inner.validator_stake_amount(&Address::from_seed(2)).unwrap() > stake_before);
    assert_eq!(inner.reporters_of(&reportee).len(), 3);
}

#[test]
fn staging_another_validators_address_is_rejected() {
    let mut state = genesis(4).system_state;
    let taken = state
        .inner()
        .unwrap()
        .validator_by_address(&Address::from_seed(1))
        .unwrap()
        .metadata()
        .net_address
        .clone();
    let before = state.to_bytes().unwrap();
    assert_eq!(
        state.execute(&mut sender(2), |inner, ctx| {
            inner.update_validator_next_epoch_network_address(taken, ctx)
        }),
        Err(SystemError::DuplicateValidator)
    );
    assert_eq!(state.to_bytes().unwrap(), before);
}

#[test]
fn candidate_cannot_claim_a_staged_address() {
    let mut state = genesis(4).system_state;
    let staged = "/ip4/127.0.0.1/tcp/45000".to_string();
    state
        .execute(&mut sender(1), |inner, ctx| {
            inner.update_validator_next_epoch_network_address(staged.clone(), ctx)
        })
        .unwrap();
    let before = state.to_bytes().unwrap();

    let (mut metadata, _) = validator_metadata(100);
    metadata.net_address = staged.clone();
    assert_eq!(
        state.execute(&mut sender(100), |inner, ctx| {
            inner
                .request_add_validator_candidate(metadata, 1_000, 0, ctx)
                .map(|_| ())
        }),
        Err(SystemError::DuplicateValidator)
    );
    assert_eq!(state.to_bytes().unwrap(), before);

    // Once the staged address takes effect it is still taken.
    advance_epoch(&mut state).unwrap();
    let (mut metadata, _) = validator_metadata(100);
    metadata.net_address = staged;
    assert_eq!(
        state.execute(&mut sender(100), |inner, ctx| {
            inner
                .request_add_validator_candidate(metadata, 1_000, 0, ctx)
                .map(|_| ())
        }),
        Err(SystemError::DuplicateValidator)
    );
}

#[test]
fn withdrawing_in_the_staking_epoch_returns_the_principal() {
    let mut state = genesis(4).system_state;
    let validator = Address::from_seed(1);
    let mut ctx = sender(500);
    let receipt = state
        .execute(&mut ctx, |inner, ctx| {
            inner.request_add_stake(Balance::new(tokens(10)), validator, ctx)
        })
        .unwrap();
    let withdrawn = state
        .execute(&mut ctx, |inner, ctx| inner.request_withdraw_stake(receipt, ctx))
        .unwrap();
    assert_eq!(withdrawn.value(), tokens(10));
    assert!(matches!(
        ctx.events().last(),
        Some(SystemEvent::UnstakingRequest(event))
            if event.principal_amount == tokens(10) && event.reward_amount == 0
    ));
}

#[test]
fn active_stake_earns_rewards() {
    let mut state = genesis(4).system_state;
    let validator = Address::from_seed(1);
    let mut ctx = sender(500);
    let receipt = state
        .execute(&mut ctx, |inner, ctx| {
            inner.request_add_stake(Balance::new(tokens(1_000)), validator, ctx)
        })
        .unwrap();
    advance_epoch(&mut state).unwrap();
    let params = AdvanceEpochParams {
        validator_subsidy: tokens(1_000),
        ..advance_epoch_params(0)
    };
    advance_epoch_with(&mut state, params).unwrap();

    let estimated = state.inner().unwrap().estimated_reward(&receipt).unwrap();
    assert!(estimated > 0);
    let withdrawn = state
        .execute(&mut ctx, |inner, ctx| inner.request_withdraw_stake(receipt, ctx))
        .unwrap();
    assert_eq!(withdrawn.value(), tokens(1_000) + estimated);
}

#[test]
fn stake_from_several_balances_returns_change() {
    let mut state = genesis(4).system_state;
    let (receipt, change) = state
        .execute(&mut sender(500), |inner, ctx| {
            inner.request_add_stake_mul_balance(
                vec![Balance::new(tokens(5)), Balance::new(tokens(7))],
                Some(tokens(10)),
                Address::from_seed(1),
                ctx,
            )
        })
        .unwrap();
    assert_eq!(receipt.principal(), tokens(10));
    assert_eq!(change.value(), tokens(2));
}

#[test]
fn low_stake_validator_leaves_after_the_grace_period() {
    let mut stakes = vec![tokens(2_000_000); 4];
    stakes.push(tokens(1_200_000));
    let mut state = build_genesis(&genesis_with_stakes(&stakes)).system_state;
    let at_risk = Address::from_seed(5);
    let grace_period = state
        .inner()
        .unwrap()
        .parameters
        .validator_low_stake_grace_period;

    for _ in 0..grace_period {
        advance_epoch(&mut state).unwrap();
        assert!(state.active_validator_addresses().contains(&at_risk));
    }
    let ctx = advance_epoch(&mut state).unwrap();
    assert!(!state.active_validator_addresses().contains(&at_risk));
    assert!(ctx.events().iter().any(|e| matches!(
        e,
        SystemEvent::ValidatorLeave(leave) if leave.validator_address == at_risk && !leave.is_voluntary
    )));
}

#[test]
fn validator_count_never_drops_below_minimum() {
    let mut state = genesis(4).system_state;
    assert_eq!(
        state.execute(&mut sender(1), |inner, ctx| inner.request_remove_validator(ctx)),
        Err(SystemError::BelowMinValidatorCount { min: 4 })
    );

    stake_candidate(&mut state, 100);
    state
        .execute(&mut sender(100), |inner, ctx| inner.request_add_validator(ctx))
        .unwrap();
    state
        .execute(&mut sender(1), |inner, ctx| inner.request_remove_validator(ctx))
        .unwrap();

    advance_epoch(&mut state).unwrap();
    let active = state.active_validator_addresses();
    assert_eq!(active.len(), 4);
    assert!(!active.contains(&Address::from_seed(1)));
    assert!(active.contains(&Address::from_seed(100)));
}

#[test]
fn withdrawn_candidacy_frees_its_stake() {
    let mut state = genesis(4).system_state;
    let (metadata, _) = validator_metadata(100);
    let address = metadata.address;
    state
        .execute(&mut sender(100), |inner, ctx| {
            inner.request_add_validator_candidate(metadata, 1_000, 0, ctx)
        })
        .unwrap();
    let mut staker = sender(500);
    let receipt = state
        .execute(&mut staker, |inner, ctx| {
            inner.request_add_stake(Balance::new(tokens(10)), address, ctx)
        })
        .unwrap();
    state
        .execute(&mut sender(100), |inner, ctx| {
            inner.request_remove_validator_candidate(ctx)
        })
        .unwrap();

    let withdrawn = state
        .execute(&mut staker, |inner, ctx| inner.request_withdraw_stake(receipt, ctx))
        .unwrap();
    assert_eq!(withdrawn.value(), tokens(10));
}

#[test]
fn events_serialize_with_their_type() {
    let mut state = genesis(4).system_state;
    let ctx = advance_epoch(&mut state).unwrap();
    let json = serde_json::to_value(epoch_info_event(&ctx)).unwrap();
    assert_eq!(json["type"], "SystemEpochInfo");
    assert_eq!(json["epoch"], 1);
    assert_eq!(state.wrapper().id, SYSTEM_STATE_OBJECT_ID);
}

fn epoch_info_event(ctx: &TxContext) -> &SystemEvent {
    ctx.events()
        .iter()
        .find(|e| matches!(e, SystemEvent::SystemEpochInfo(_)))
        .expect("epoch summary")
}

#[test]
fn stake_receipts_split_and_join_within_a_pool() {
    let mut state = genesis(4).system_state;
    let mut ctx = sender(500);
    let mut stake_with = |validator: u64, amount: u64, ctx: &mut TxContext| {
        state
            .execute(ctx, |inner, ctx| {
                inner.request_add_stake(Balance::new(amount), Address::from_seed(validator), ctx)
            })
            .unwrap()
    };
    let mut receipt = stake_with(1, tokens(10), &mut ctx);
    let other_pool = stake_with(2, tokens(3), &mut ctx);

    let part = receipt.split(tokens(4), &mut ctx).unwrap();
    assert_eq!((receipt.principal(), part.principal()), (tokens(6), tokens(4)));
    assert_ne!(part.id(), receipt.id());
    assert!(matches!(
        receipt.split(tokens(6) - 1, &mut ctx),
        Err(SystemError::StakingBelowThreshold { .. })
    ));

    receipt.join(part).unwrap();
    assert_eq!(receipt.principal(), tokens(10));
    assert_eq!(
        receipt.join(other_pool),
        Err(SystemError::IncompatibleStakeReceipts)
    );
}

#[test]
fn committee_quorum_needs_two_thirds_of_the_votes() {
    let state = genesis(4).system_state;
    let committee = state.get_current_epoch_committee();
    let members: Vec<_> = committee.members.iter().map(|m| m.address).collect();
    assert!(!committee.reaches_quorum(&members[..2]));
    assert!(committee.reaches_quorum(&members[..3]));
    assert_eq!(committee.weight(&Address::from_seed(99)), 0);
}
