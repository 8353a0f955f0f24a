// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Builders shared by unit tests, integration tests and the simulator.

use crate::balance::Balance;
use crate::base_types::{Address, TransactionDigest, TxContext};
use crate::crypto::{generate_proof_of_possession, ValidatorKeys};
use crate::error::SystemResult;
use crate::genesis::{Genesis, GenesisConfig, ValidatorGenesisConfig};
use crate::system_state::system_state_inner_v1::NANOS_PER_TOKEN;
use crate::system_state::validator::{
    UnverifiedValidatorOperationCap, ValidatorMetadataV1, ValidatorV1,
};
use crate::system_state::{AdvanceEpochParams, SystemState, SystemStateTrait};

pub const DEFAULT_MAX_COMMITTEE_SIZE: u64 = 150;

pub fn tokens(amount: u64) -> u64 {
    amount * NANOS_PER_TOKEN
}

/// Valid metadata for the validator identified by `seed`. Names, addresses
/// and keys are all derived from the seed.
pub fn validator_metadata(seed: u64) -> (ValidatorMetadataV1, ValidatorKeys) {
    let keys = ValidatorKeys::from_seed(seed);
    let address = Address::from_seed(seed);
    let port = 20_000 + 10 * seed;
    let metadata = ValidatorMetadataV1 {
        address,
        authority_pubkey_bytes: keys.authority_pubkey_bytes(),
        network_pubkey_bytes: keys.network_pubkey_bytes(),
        protocol_pubkey_bytes: keys.protocol_pubkey_bytes(),
        proof_of_possession: generate_proof_of_possession(&keys.authority, &address),
        name: format!("validator-{seed}"),
        description: format!("validator {seed}"),
        image_url: String::new(),
        project_url: String::new(),
        net_address: format!("/ip4/127.0.0.1/tcp/{port}"),
        p2p_address: format!("/ip4/127.0.0.1/udp/{}", port + 1),
        primary_address: format!("/ip4/127.0.0.1/udp/{}", port + 2),
        next_epoch_authority_pubkey_bytes: None,
        next_epoch_proof_of_possession: None,
        next_epoch_network_pubkey_bytes: None,
        next_epoch_protocol_pubkey_bytes: None,
        next_epoch_net_address: None,
        next_epoch_p2p_address: None,
        next_epoch_primary_address: None,
    };
    (metadata, keys)
}

/// A fresh candidate record for `seed`.
pub fn candidate_validator(
    seed: u64,
    ctx: &mut TxContext,
) -> (ValidatorV1, UnverifiedValidatorOperationCap) {
    let (metadata, _) = validator_metadata(seed);
    ValidatorV1::new(metadata, 1_000, 0, ctx).expect("test metadata is valid")
}

/// An active validator for `seed` holding `stake` from genesis.
pub fn active_validator(seed: u64, stake: u64, ctx: &mut TxContext) -> ValidatorV1 {
    let (mut validator, _) = candidate_validator(seed, ctx);
    if stake > 0 {
        validator
            .request_add_stake_at_genesis(Balance::new(stake), ctx)
            .expect("genesis stake");
    }
    validator.activate(0).expect("activate");
    validator
}

/// Default genesis with one validator per entry of `stakes`.
pub fn genesis_with_stakes(stakes: &[u64]) -> GenesisConfig {
    let mut config = GenesisConfig::default();
    config.validators = stakes
        .iter()
        .enumerate()
        .map(|(i, stake)| {
            let keys = ValidatorKeys::from_seed(i as u64 + 1);
            ValidatorGenesisConfig::from_keys(i, &keys, *stake)
        })
        .collect();
    config
}

pub fn build_genesis(config: &GenesisConfig) -> Genesis {
    config.build().expect("genesis must build")
}

pub fn advance_epoch_params(epoch: u64) -> AdvanceEpochParams {
    AdvanceEpochParams {
        epoch,
        next_protocol_version: 1,
        epoch_start_timestamp_ms: epoch * 1_000,
        max_committee_size: DEFAULT_MAX_COMMITTEE_SIZE,
        ..Default::default()
    }
}

pub fn system_ctx() -> TxContext {
    TxContext::new_system(TransactionDigest::random())
}

/// Runs a regular epoch change into the next epoch with the given inputs and
/// returns the context holding its events and transfers.
pub fn advance_epoch_with(
    state: &mut SystemState,
    mut params: AdvanceEpochParams,
) -> SystemResult<(Balance, TxContext)> {
    params.epoch = state.epoch() + 1;
    let mut ctx = system_ctx();
    let rebate = state.execute(&mut ctx, |inner, ctx| inner.advance_epoch(&params, ctx))?;
    Ok((rebate, ctx))
}

/// Advances one epoch without fees or subsidy.
pub fn advance_epoch(state: &mut SystemState) -> SystemResult<TxContext> {
    let params = advance_epoch_params(state.epoch() + 1);
    advance_epoch_with(state, params).map(|(_, ctx)| ctx)
}
