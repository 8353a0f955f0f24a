// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{Address, EpochId, ObjectID};
use crate::system_state::staking_pool::PoolTokenExchangeRate;
use derive_more::From;
use serde::{Deserialize, Serialize};

/// Summary of one successful epoch change.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SystemEpochInfoEvent {
    pub epoch: EpochId,
    pub protocol_version: u64,
    pub reference_gas_price: u64,
    pub total_stake: u64,
    pub storage_charge: u64,
    pub storage_rebate: u64,
    pub storage_fund_balance: u64,
    pub total_gas_fees: u64,
    pub total_stake_rewards_distributed: u64,
    pub burnt_tokens_amount: u64,
    pub minted_tokens_amount: u64,
    pub tips_amount: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StakingRequestEvent {
    pub pool_id: ObjectID,
    pub validator_address: Address,
    pub staker_address: Address,
    pub epoch: EpochId,
    pub amount: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct UnstakingRequestEvent {
    pub pool_id: ObjectID,
    pub validator_address: Address,
    pub staker_address: Address,
    pub stake_activation_epoch: EpochId,
    pub unstaking_epoch: EpochId,
    pub principal_amount: u64,
    pub reward_amount: u64,
}

/// Per validator figures recorded at the end of every epoch.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorEpochInfoEvent {
    pub epoch: EpochId,
    pub validator_address: Address,
    pub reference_gas_survey_quote: u64,
    pub stake: u64,
    pub voting_power: u64,
    pub commission_rate: u64,
    pub pool_staking_reward: u64,
    pub pool_token_exchange_rate: PoolTokenExchangeRate,
    pub tallying_rule_reporters: Vec<Address>,
    pub tallying_rule_global_score: u64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorJoinEvent {
    pub epoch: EpochId,
    pub validator_address: Address,
    pub staking_pool_id: ObjectID,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorLeaveEvent {
    pub epoch: EpochId,
    pub validator_address: Address,
    pub staking_pool_id: ObjectID,
    pub is_voluntary: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, From)]
#[serde(tag = "type")]
pub enum SystemEvent {
    SystemEpochInfo(SystemEpochInfoEvent),
    StakingRequest(StakingRequestEvent),
    UnstakingRequest(UnstakingRequestEvent),
    ValidatorEpochInfo(ValidatorEpochInfoEvent),
    ValidatorJoin(ValidatorJoinEvent),
    ValidatorLeave(ValidatorLeaveEvent),
}
