// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::validator_set::ValidatorSetV1;
use super::*;
use crate::balance::Balance;
use crate::test_utils::{advance_epoch, build_genesis, genesis_with_stakes, tokens};

fn genesis_state() -> SystemState {
    build_genesis(&genesis_with_stakes(&[tokens(2_000_000); 4])).system_state
}

/// The genesis ledger rewritten in the first layout.
fn legacy_state() -> SystemState {
    let inner = genesis_state()
        .inner()
        .cloned()
        .expect("genesis is current");
    let validators = ValidatorSetV1 {
        total_stake: inner.validators.total_stake,
        active_validators: inner.validators.active_validators,
        pending_active_validators: vec![],
        pending_removals: vec![],
        staking_pool_mappings: inner.validators.staking_pool_mappings,
        inactive_validators: inner.validators.inactive_validators,
        validator_candidates: inner.validators.validator_candidates,
        at_risk_validators: inner.validators.at_risk_validators,
    };
    SystemState::V1(SystemStateInnerV1::new(
        inner.treasury_cap,
        validators,
        inner.storage_fund,
        inner.parameters,
        inner.protocol_version,
        inner.epoch_start_timestamp_ms,
    ))
}

#[test]
fn persisted_state_keeps_its_version() {
    let current = genesis_state();
    let restored = SystemState::from_bytes(&current.to_bytes().unwrap()).unwrap();
    assert_eq!(restored.version(), CURRENT_SYSTEM_STATE_VERSION);
    assert_eq!(restored.to_bytes().unwrap(), current.to_bytes().unwrap());

    let legacy = legacy_state();
    let restored = SystemState::from_bytes(&legacy.to_bytes().unwrap()).unwrap();
    assert_eq!(restored.version(), INIT_SYSTEM_STATE_VERSION);
    assert_eq!(restored.epoch(), 0);
}

#[test]
fn unknown_version_is_rejected() {
    let bytes = bcs::to_bytes(&PersistedSystemState {
        wrapper: SystemStateWrapper {
            id: SYSTEM_STATE_OBJECT_ID,
            version: 3,
        },
        inner: vec![],
    })
    .unwrap();
    assert_eq!(
        SystemState::from_bytes(&bytes),
        Err(SystemError::UnsupportedSystemStateVersion(3))
    );
}

#[test]
fn foreign_root_is_rejected() {
    let mut persisted: PersistedSystemState =
        bcs::from_bytes(&genesis_state().to_bytes().unwrap()).unwrap();
    persisted.wrapper.id = ObjectID::from_single_byte(6);
    let bytes = bcs::to_bytes(&persisted).unwrap();
    assert!(matches!(
        SystemState::from_bytes(&bytes),
        Err(SystemError::SystemStateSerialization(_))
    ));
}

#[test]
fn legacy_state_is_readable_without_migration() {
    let legacy = legacy_state();
    assert!(legacy.inner().is_none());
    assert_eq!(legacy.system_state_version(), INIT_SYSTEM_STATE_VERSION);
    assert_eq!(legacy.active_validator_addresses().len(), 4);
    assert_eq!(legacy.get_current_epoch_committee().total_votes(), 10_000);

    let summary = legacy.into_system_state_summary();
    assert_eq!(summary.system_state_version, INIT_SYSTEM_STATE_VERSION);
    assert_eq!(summary.committee_members.len(), 4);
}

#[test]
fn first_write_migrates_legacy_state() {
    let mut state = legacy_state();
    let committee = state.get_current_epoch_committee();
    let supply = state.total_supply();

    advance_epoch(&mut state).unwrap();

    let inner = state.inner().expect("migrated");
    assert_eq!(inner.system_state_version, CURRENT_SYSTEM_STATE_VERSION);
    assert_eq!(inner.epoch, 1);
    assert_eq!(inner.safe_mode_computation_charges_burned, 0);
    assert_eq!(state.total_supply(), supply);
    let addresses: Vec<_> = committee.members.iter().map(|m| m.address).collect();
    assert_eq!(inner.committee_addresses(), addresses);
}

#[test]
fn failed_write_does_not_migrate() {
    let mut state = legacy_state();
    let mut ctx = TxContext::new_for_testing(Address::from_seed(9));
    let result = state.execute(&mut ctx, |_, _| {
        Err::<(), _>(SystemError::InvalidStakeAmount)
    });
    assert_eq!(result, Err(SystemError::InvalidStakeAmount));
    assert_eq!(state.version(), INIT_SYSTEM_STATE_VERSION);
}

#[test]
fn failed_call_leaves_state_and_context_untouched() {
    let mut state = genesis_state();
    let before = state.to_bytes().unwrap();
    let validator = state.active_validator_addresses()[0];
    let mut ctx = TxContext::new_for_testing(Address::from_seed(9));

    let result = state.execute(&mut ctx, |inner, ctx| {
        inner.request_add_stake(Balance::new(tokens(10)), validator, ctx)?;
        Err::<(), _>(SystemError::ArithmeticOverflow)
    });

    assert_eq!(result, Err(SystemError::ArithmeticOverflow));
    assert_eq!(state.to_bytes().unwrap(), before);
    assert!(ctx.events().is_empty());
    assert!(ctx.take_transfers().is_empty());
}

#[test]
fn successful_call_is_committed() {
    let mut state = genesis_state();
    let validator = state.active_validator_addresses()[0];
    let mut ctx = TxContext::new_for_testing(Address::from_seed(9));

    let receipt = state
        .execute(&mut ctx, |inner, ctx| {
            inner.request_add_stake(Balance::new(tokens(10)), validator, ctx)
        })
        .unwrap();

    assert_eq!(receipt.principal(), tokens(10));
    assert_eq!(ctx.events().len(), 1);
    let inner = state.inner().unwrap();
    assert_eq!(
        inner.validator_by_address(&validator).unwrap().pending_stake_amount(),
        tokens(10)
    );
}
