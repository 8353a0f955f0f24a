// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{Address, EpochId, ObjectID};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

/// Flattened, read-only view of the system state for explorers and tools. It
/// depends as little as possible on the internal layout of the ledger.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemStateSummary {
    /// The current epoch ID, starting from 0.
    pub epoch: EpochId,
    /// The current protocol version, starting from 1.
    pub protocol_version: u64,
    /// The current version of the system state data structure type.
    pub system_state_version: u64,
    /// The current total supply of the native currency.
    pub total_supply: u64,
    /// The storage rebates of all the objects stored in the storage fund.
    pub storage_fund_total_object_storage_rebates: u64,
    /// The non-refundable portion of the storage fund.
    pub storage_fund_non_refundable_balance: u64,
    /// The reference gas price for the current epoch.
    pub reference_gas_price: u64,
    /// Whether the last epoch change fell back to safe mode.
    pub safe_mode: bool,
    /// Storage charges accumulated while in safe mode.
    pub safe_mode_storage_charges: u64,
    /// Computation charges accumulated while in safe mode.
    pub safe_mode_computation_charges: u64,
    /// Burned computation charges accumulated while in safe mode.
    pub safe_mode_computation_charges_burned: u64,
    /// Storage rebates accumulated while in safe mode.
    pub safe_mode_storage_rebates: u64,
    /// Non-refundable storage fees accumulated while in safe mode.
    pub safe_mode_non_refundable_storage_fee: u64,
    /// Unix timestamp of the current epoch start, in milliseconds.
    pub epoch_start_timestamp_ms: u64,

    // System parameters
    pub epoch_duration_ms: u64,
    pub min_validator_count: u64,
    pub max_validator_count: u64,
    pub min_validator_joining_stake: u64,
    pub validator_low_stake_threshold: u64,
    pub validator_very_low_stake_threshold: u64,
    pub validator_low_stake_grace_period: u64,

    // Validator set
    /// Total amount of stake backing the active validators.
    pub total_stake: u64,
    pub active_validators: Vec<ValidatorSummary>,
    /// Addresses of the active validators in the committee.
    pub committee_members: Vec<Address>,
    pub pending_active_validators_size: u64,
    /// Removal requests, as indices into `active_validators`.
    pub pending_removals: Vec<u64>,
    /// Map from staking pool ID to the address of its validator.
    pub staking_pool_mappings: Vec<(ObjectID, Address)>,
    pub inactive_pools_size: u64,
    pub validator_candidates_size: u64,
    /// Validators at risk of removal, with the number of epochs spent below the
    /// low stake threshold.
    pub at_risk_validators: Vec<(Address, u64)>,
    /// Reportees and their reporters.
    pub validator_report_records: Vec<(Address, Vec<Address>)>,
}

/// Flattened view of one validator, including its staking pool.
#[serde_as]
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorSummary {
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
    pub description: String,
    pub image_url: String,
    pub project_url: String,
    pub net_address: String,
    pub p2p_address: String,
    pub primary_address: String,
    #[serde_as(as = "Option<Hex>")]
    pub next_epoch_authority_pubkey_bytes: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    pub next_epoch_proof_of_possession: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    pub next_epoch_network_pubkey_bytes: Option<Vec<u8>>,
    #[serde_as(as = "Option<Hex>")]
    pub next_epoch_protocol_pubkey_bytes: Option<Vec<u8>>,
    pub next_epoch_net_address: Option<String>,
    pub next_epoch_p2p_address: Option<String>,
    pub next_epoch_primary_address: Option<String>,

    pub voting_power: u64,
    pub operation_cap_id: ObjectID,
    pub gas_price: u64,
    pub commission_rate: u64,
    pub next_epoch_stake: u64,
    pub next_epoch_gas_price: u64,
    pub next_epoch_commission_rate: u64,

    // Staking pool information
    pub staking_pool_id: ObjectID,
    /// `None` while the validator is still a candidate.
    pub staking_pool_activation_epoch: Option<EpochId>,
    pub staking_pool_deactivation_epoch: Option<EpochId>,
    pub staking_pool_balance: u64,
    pub rewards_pool: u64,
    pub pool_token_balance: u64,
    pub pending_stake: u64,
    pub pending_total_withdraw: u64,
    pub pending_pool_token_withdraw: u64,
    pub exchange_rates_size: u64,
}
