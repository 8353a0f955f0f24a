// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::{Balance, TreasuryCap};
use crate::base_types::{Address, TransactionDigest, TxContext};
use crate::config::Config;
use crate::crypto::{generate_proof_of_possession, ValidatorKeys};
use crate::error::{SystemError, SystemResult};
use crate::fp_ensure;
use crate::governance::StakeReceipt;
use crate::storage_fund::StorageFundV1;
use crate::system_state::system_state_inner_v1::{SystemParametersV1, NANOS_PER_TOKEN};
use crate::system_state::system_state_inner_v2::SystemStateInnerV2;
use crate::system_state::validator::{
    UnverifiedValidatorOperationCap, ValidatorMetadataV1, ValidatorV1,
};
use crate::system_state::validator_set::ValidatorSetV2;
use crate::system_state::SystemState;
use itertools::Itertools;
use rand::{rngs::StdRng, SeedableRng};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};
use tracing::info;

pub const DEFAULT_INITIAL_SUPPLY: u64 = 10_000_000_000 * NANOS_PER_TOKEN;
pub const DEFAULT_STORAGE_FUND: u64 = 1_000 * NANOS_PER_TOKEN;
pub const DEFAULT_GAS_PRICE: u64 = 1_000;
pub const DEFAULT_COMMISSION_RATE: u64 = 200;

#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct ValidatorGenesisConfig {
    pub address: Address,
    #[serde_as(as = "Hex")]
    pub authority_pubkey_bytes: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub network_pubkey_bytes: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub protocol_pubkey_bytes: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub proof_of_possession: Vec<u8>,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub image_url: String,
    #[serde(default)]
    pub project_url: String,
    pub net_address: String,
    pub p2p_address: String,
    pub primary_address: String,
    pub stake: u64,
    pub gas_price: u64,
    pub commission_rate: u64,
}

impl ValidatorGenesisConfig {
    /// A validator on localhost whose ports are derived from `index`.
    pub fn from_keys(index: usize, keys: &ValidatorKeys, stake: u64) -> Self {
        let address = Address::from_seed(index as u64 + 1);
        let port = 8000 + 10 * index;
        Self {
            address,
            authority_pubkey_bytes: keys.authority_pubkey_bytes(),
            network_pubkey_bytes: keys.network_pubkey_bytes(),
            protocol_pubkey_bytes: keys.protocol_pubkey_bytes(),
            proof_of_possession: generate_proof_of_possession(&keys.authority, &address),
            name: format!("validator-{index}"),
            description: String::new(),
            image_url: String::new(),
            project_url: String::new(),
            net_address: format!("/ip4/127.0.0.1/tcp/{port}"),
            p2p_address: format!("/ip4/127.0.0.1/udp/{}", port + 1),
            primary_address: format!("/ip4/127.0.0.1/udp/{}", port + 2),
            stake,
            gas_price: DEFAULT_GAS_PRICE,
            commission_rate: DEFAULT_COMMISSION_RATE,
        }
    }

    pub fn to_metadata(&self) -> ValidatorMetadataV1 {
        ValidatorMetadataV1 {
            address: self.address,
            authority_pubkey_bytes: self.authority_pubkey_bytes.clone(),
            network_pubkey_bytes: self.network_pubkey_bytes.clone(),
            protocol_pubkey_bytes: self.protocol_pubkey_bytes.clone(),
            proof_of_possession: self.proof_of_possession.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
            image_url: self.image_url.clone(),
            project_url: self.project_url.clone(),
            net_address: self.net_address.clone(),
            p2p_address: self.p2p_address.clone(),
            primary_address: self.primary_address.clone(),
            next_epoch_authority_pubkey_bytes: None,
            next_epoch_proof_of_possession: None,
            next_epoch_network_pubkey_bytes: None,
            next_epoch_protocol_pubkey_bytes: None,
            next_epoch_net_address: None,
            next_epoch_p2p_address: None,
            next_epoch_primary_address: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct GenesisConfig {
    pub protocol_version: u64,
    pub epoch_start_timestamp_ms: u64,
    pub parameters: SystemParametersV1,
    pub max_committee_size: u64,
    /// Total supply minted into the treasury at genesis.
    pub initial_supply: u64,
    /// Part of the initial supply seeding the storage fund.
    pub storage_fund_amount: u64,
    pub validators: Vec<ValidatorGenesisConfig>,
}

impl Config for GenesisConfig {}

impl Default for GenesisConfig {
    fn default() -> Self {
        let parameters = SystemParametersV1::default();
        Self {
            protocol_version: 1,
            epoch_start_timestamp_ms: 0,
            max_committee_size: parameters.max_validator_count,
            parameters,
            initial_supply: DEFAULT_INITIAL_SUPPLY,
            storage_fund_amount: DEFAULT_STORAGE_FUND,
            validators: vec![],
        }
    }
}

/// Everything genesis hands out besides the ledger itself.
#[derive(Debug)]
pub struct Genesis {
    pub system_state: SystemState,
    pub stake_receipts: Vec<(Address, StakeReceipt)>,
    pub operation_caps: Vec<UnverifiedValidatorOperationCap>,
    /// Supply not allocated to stake or the storage fund.
    pub remaining_supply: Balance,
}

impl GenesisConfig {
    /// `num_validators` validators with keys drawn from `seed`, each staking
    /// the joining minimum.
    pub fn generate(num_validators: usize, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let config = Self::default();
        let stake = config.parameters.min_validator_joining_stake;
        let validators = (0..num_validators)
            .map(|i| ValidatorGenesisConfig::from_keys(i, &ValidatorKeys::generate(&mut rng), stake))
            .collect();
        Self { validators, ..config }
    }

    /// Creates the validators, stakes them at epoch 0 on behalf of their own
    /// addresses, activates them and selects the first committee.
    pub fn build(&self) -> SystemResult<Genesis> {
        let mut ctx = TxContext::new_system(TransactionDigest::genesis());
        let (treasury_cap, mut remaining_supply) = TreasuryCap::new(self.initial_supply);
        let storage_fund = StorageFundV1::new(remaining_supply.split(self.storage_fund_amount)?);

        let mut validators = Vec::with_capacity(self.validators.len());
        let mut stake_receipts = Vec::with_capacity(self.validators.len());
        let mut operation_caps = Vec::with_capacity(self.validators.len());
        for config in &self.validators {
            let (mut validator, cap) = ValidatorV1::new(
                config.to_metadata(),
                config.gas_price,
                config.commission_rate,
                &mut ctx,
            )?;
            let receipt = validator
                .request_add_stake_at_genesis(remaining_supply.split(config.stake)?, &mut ctx)?;
            validator.activate(0)?;
            stake_receipts.push((config.address, receipt));
            operation_caps.push(cap);
            validators.push(validator);
        }
        fp_ensure!(
            validators
                .iter()
                .tuple_combinations()
                .all(|(a, b)| !a.is_duplicate(b)),
            SystemError::DuplicateValidator
        );

        let validator_set = ValidatorSetV2::new(validators, self.max_committee_size)?;
        let inner = SystemStateInnerV2::new(
            treasury_cap,
            validator_set,
            storage_fund,
            self.parameters.clone(),
            self.protocol_version,
            self.epoch_start_timestamp_ms,
        );
        info!(
            validators = self.validators.len(),
            total_stake = inner.validators.total_stake,
            reference_gas_price = inner.reference_gas_price,
            "Built genesis system state"
        );
        Ok(Genesis {
            system_state: SystemState::new_genesis(inner),
            stake_receipts,
            operation_caps,
            remaining_supply,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system_state::SystemStateTrait;

    #[test]
    fn generated_genesis_is_deterministic() {
        let a = GenesisConfig::generate(4, 7);
        let b = GenesisConfig::generate(4, 7);
        assert_eq!(a, b);
        assert_ne!(a, GenesisConfig::generate(4, 8));
    }

    #[test]
    fn build_stakes_and_activates_every_validator() {
        let config = GenesisConfig::generate(4, 0);
        let genesis = config.build().unwrap();
        let state = &genesis.system_state;
        assert_eq!(state.epoch(), 0);
        assert_eq!(state.active_validator_addresses().len(), 4);
        assert_eq!(state.reference_gas_price(), DEFAULT_GAS_PRICE);
        assert_eq!(genesis.stake_receipts.len(), 4);

        let committee = state.get_current_epoch_committee();
        assert_eq!(committee.total_votes(), 10_000);

        let staked: u64 = config.validators.iter().map(|v| v.stake).sum();
        assert_eq!(
            genesis.remaining_supply.value() + staked + config.storage_fund_amount,
            state.total_supply()
        );
    }

    #[test]
    fn duplicate_genesis_validators_are_rejected() {
        let mut config = GenesisConfig::generate(2, 0);
        config.validators[1].name = config.validators[0].name.clone();
        assert_eq!(
            config.build().unwrap_err(),
            SystemError::DuplicateValidator
        );
    }
}
