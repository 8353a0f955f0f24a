// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use pretty_assertions::assert_eq;
use validator_system::balance::Balance;
use validator_system::base_types::{Address, TxContext};
use validator_system::event::SystemEvent;
use validator_system::store::{EpochChangeOutcome, SystemStateStore};
use validator_system::test_utils::{
    advance_epoch_params, build_genesis, genesis_with_stakes, system_ctx, tokens,
};
use validator_system::{AdvanceEpochParams, SystemError, SystemStateTrait};

fn store() -> SystemStateStore {
    let genesis = build_genesis(&genesis_with_stakes(&[tokens(2_000_000); 4]));
    SystemStateStore::new(genesis.system_state)
}

#[test]
fn failed_epoch_change_falls_back_to_safe_mode() {
    let store = store();
    let stake_before = store.summary().total_stake;
    let supply_before = store.read(|state| state.total_supply());

    let params = AdvanceEpochParams {
        computation_charge: tokens(100),
        computation_charge_burned: tokens(40),
        storage_charge: tokens(30),
        reward_slashing_rate: 10_001,
        ..advance_epoch_params(1)
    };
    let mut ctx = system_ctx();
    let outcome = store.change_epoch(&params, &mut ctx).unwrap();
    assert!(matches!(
        outcome,
        EpochChangeOutcome::SafeMode {
            error: SystemError::BpsTooLarge(10_001)
        }
    ));
    assert!(ctx.events().is_empty());

    let summary = store.summary();
    assert!(summary.safe_mode);
    assert_eq!(summary.epoch, 1);
    assert_eq!(summary.safe_mode_computation_charges, tokens(100));
    assert_eq!(summary.safe_mode_computation_charges_burned, tokens(40));
    assert_eq!(summary.safe_mode_storage_charges, tokens(30));
    assert_eq!(summary.total_stake, stake_before);
    assert_eq!(store.read(|state| state.total_supply()), supply_before);
}

#[test]
fn next_epoch_change_settles_safe_mode_charges() {
    let store = store();
    let fund_before = store.summary().storage_fund_non_refundable_balance;
    let safe_mode_params = AdvanceEpochParams {
        computation_charge: tokens(100),
        computation_charge_burned: tokens(40),
        storage_charge: tokens(30),
        reward_slashing_rate: 10_001,
        ..advance_epoch_params(1)
    };
    store
        .change_epoch(&safe_mode_params, &mut system_ctx())
        .unwrap();

    let params = AdvanceEpochParams {
        computation_charge: tokens(10),
        ..advance_epoch_params(2)
    };
    let mut ctx = system_ctx();
    let outcome = store.change_epoch(&params, &mut ctx).unwrap();
    assert!(matches!(outcome, EpochChangeOutcome::Normal { .. }));

    let info = ctx
        .events()
        .iter()
        .find_map(|e| match e {
            SystemEvent::SystemEpochInfo(info) => Some(info.clone()),
            _ => None,
        })
        .unwrap();
    assert_eq!(info.epoch, 2);
    assert_eq!(info.total_gas_fees, tokens(140));
    assert_eq!(info.tips_amount, tokens(70));
    assert_eq!(info.minted_tokens_amount, 0);
    assert_eq!(
        info.total_stake_rewards_distributed + info.burnt_tokens_amount,
        tokens(110)
    );

    let summary = store.summary();
    assert!(!summary.safe_mode);
    assert_eq!(summary.safe_mode_computation_charges, 0);
    assert_eq!(summary.safe_mode_computation_charges_burned, 0);
    assert_eq!(summary.safe_mode_storage_charges, 0);
    assert_eq!(summary.storage_fund_total_object_storage_rebates, tokens(30));
    assert_eq!(summary.storage_fund_non_refundable_balance, fund_before);
}

#[test]
fn out_of_order_epoch_change_is_not_masked() {
    let store = store();
    let before = store.to_bytes().unwrap();

    assert_eq!(
        store
            .change_epoch(&advance_epoch_params(2), &mut system_ctx())
            .map(|_| ()),
        Err(SystemError::AdvancedToWrongEpoch {
            expected: 1,
            requested: 2
        })
    );
    let mut ctx = TxContext::new_for_testing(Address::from_seed(1));
    assert_eq!(
        store.change_epoch(&advance_epoch_params(1), &mut ctx).map(|_| ()),
        Err(SystemError::NotSystemAddress(Address::from_seed(1)))
    );
    assert_eq!(store.to_bytes().unwrap(), before);
}

#[test]
fn wrong_epoch_wins_over_other_rejections() {
    let store = store();
    let before = store.to_bytes().unwrap();
    let params = AdvanceEpochParams {
        reward_slashing_rate: 10_001,
        ..advance_epoch_params(2)
    };

    assert_eq!(
        store.change_epoch(&params, &mut system_ctx()).map(|_| ()),
        Err(SystemError::AdvancedToWrongEpoch {
            expected: 1,
            requested: 2
        })
    );
    let summary = store.summary();
    assert_eq!(summary.epoch, 0);
    assert!(!summary.safe_mode);
    assert_eq!(store.to_bytes().unwrap(), before);
}

#[test]
fn safe_mode_cannot_skip_an_epoch() {
    let store = store();
    let result = store.execute(&mut system_ctx(), |inner, _| {
        inner.advance_epoch_safe_mode(&advance_epoch_params(3))
    });

    assert_eq!(
        result,
        Err(SystemError::AdvancedToWrongEpoch {
            expected: 1,
            requested: 3
        })
    );
    assert_eq!(store.summary().epoch, 0);
    assert!(!store.summary().safe_mode);
}

#[test]
fn concurrent_stakes_are_all_recorded() {
    let store = store();
    let validator = Address::from_seed(1);

    std::thread::scope(|s| {
        for staker in 0..8u64 {
            let store = &store;
            s.spawn(move || {
                let mut ctx = TxContext::new_for_testing(Address::from_seed(1_000 + staker));
                store
                    .execute(&mut ctx, |inner, ctx| {
                        inner.request_add_stake(Balance::new(tokens(5)), validator, ctx)
                    })
                    .unwrap();
            });
        }
    });

    let pending = store.read(|state| {
        state
            .inner()
            .and_then(|inner| inner.validator_by_address(&validator).ok())
            .map(|v| v.pending_stake_amount())
    });
    assert_eq!(pending, Some(tokens(40)));
}

#[test]
fn persisted_store_reopens_with_the_same_summary() {
    let store = store();
    store
        .change_epoch(&advance_epoch_params(1), &mut system_ctx())
        .unwrap();
    let reopened = SystemStateStore::from_bytes(&store.to_bytes().unwrap()).unwrap();
    assert_eq!(reopened.summary(), store.summary());
    assert_eq!(reopened.into_inner().epoch(), 1);
}
