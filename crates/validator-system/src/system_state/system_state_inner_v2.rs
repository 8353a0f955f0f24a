// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::{Balance, TreasuryCap};
use crate::base_types::{Address, EpochId, ObjectID, TxContext, SYSTEM_ADDRESS};
use crate::committee::Committee;
use crate::error::{SystemError, SystemResult};
use crate::event::SystemEpochInfoEvent;
use crate::fp_ensure;
use crate::governance::StakeReceipt;
use crate::storage_fund::StorageFundV1;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use super::report_records::ValidatorReportRecords;
use super::staking_pool::PoolTokenExchangeRate;
use super::system_state_inner_v1::{SystemParametersV1, SystemStateInnerV1};
use super::system_state_summary::SystemStateSummary;
use super::validator::{UnverifiedValidatorOperationCap, ValidatorMetadataV1, ValidatorV1};
use super::validator_set::{CapScope, LowStakeRule, ValidatorSetV2, BASIS_POINT_DENOMINATOR};
use super::{AdvanceEpochParams, SystemStateTrait, CURRENT_SYSTEM_STATE_VERSION};

/// The ledger every mutating call operates on.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct SystemStateInnerV2 {
    pub epoch: EpochId,
    pub protocol_version: u64,
    pub system_state_version: u64,
    pub treasury_cap: TreasuryCap,
    pub validators: ValidatorSetV2,
    pub storage_fund: StorageFundV1,
    pub parameters: SystemParametersV1,
    pub reference_gas_price: u64,
    pub validator_report_records: ValidatorReportRecords,
    pub safe_mode: bool,
    pub safe_mode_storage_charges: Balance,
    pub safe_mode_computation_charges: Balance,
    pub safe_mode_computation_charges_burned: u64,
    pub safe_mode_storage_rebates: u64,
    pub safe_mode_non_refundable_storage_fee: u64,
    pub epoch_start_timestamp_ms: u64,
}

impl From<SystemStateInnerV1> for SystemStateInnerV2 {
    fn from(v1: SystemStateInnerV1) -> Self {
        Self {
            epoch: v1.epoch,
            protocol_version: v1.protocol_version,
            system_state_version: CURRENT_SYSTEM_STATE_VERSION,
            treasury_cap: v1.treasury_cap,
            validators: ValidatorSetV2::from(v1.validators),
            storage_fund: v1.storage_fund,
            parameters: v1.parameters,
            reference_gas_price: v1.reference_gas_price,
            validator_report_records: v1.validator_report_records,
            safe_mode: v1.safe_mode,
            safe_mode_storage_charges: v1.safe_mode_storage_charges,
            safe_mode_computation_charges: v1.safe_mode_computation_charges,
            safe_mode_computation_charges_burned: 0,
            safe_mode_storage_rebates: v1.safe_mode_storage_rebates,
            safe_mode_non_refundable_storage_fee: v1.safe_mode_non_refundable_storage_fee,
            epoch_start_timestamp_ms: v1.epoch_start_timestamp_ms,
        }
    }
}

impl SystemStateInnerV2 {
    pub fn new(
        treasury_cap: TreasuryCap,
        validators: ValidatorSetV2,
        storage_fund: StorageFundV1,
        parameters: SystemParametersV1,
        protocol_version: u64,
        epoch_start_timestamp_ms: u64,
    ) -> Self {
        let reference_gas_price = validators.derive_reference_gas_price();
        Self {
            epoch: 0,
            protocol_version,
            system_state_version: CURRENT_SYSTEM_STATE_VERSION,
            treasury_cap,
            validators,
            storage_fund,
            parameters,
            reference_gas_price,
            validator_report_records: ValidatorReportRecords::default(),
            safe_mode: false,
            safe_mode_storage_charges: Balance::zero(),
            safe_mode_computation_charges: Balance::zero(),
            safe_mode_computation_charges_burned: 0,
            safe_mode_storage_rebates: 0,
            safe_mode_non_refundable_storage_fee: 0,
            epoch_start_timestamp_ms,
        }
    }

    // ==== validator lifecycle ====

    /// Registers the sender as a validator candidate and hands back the cap
    /// that operates it.
    pub fn request_add_validator_candidate(
        &mut self,
        metadata: ValidatorMetadataV1,
        gas_price: u64,
        commission_rate: u64,
        ctx: &mut TxContext,
    ) -> SystemResult<UnverifiedValidatorOperationCap> {
        fp_ensure!(
            metadata.address == ctx.sender(),
            SystemError::SenderMismatch {
                sender: ctx.sender(),
                address: metadata.address,
            }
        );
        let (validator, cap) = ValidatorV1::new(metadata, gas_price, commission_rate, ctx)?;
        self.validators.request_add_validator_candidate(validator)?;
        Ok(cap)
    }

    pub fn request_remove_validator_candidate(&mut self, ctx: &mut TxContext) -> SystemResult {
        self.validators
            .request_remove_validator_candidate(&ctx.sender(), self.epoch)
    }

    pub fn request_add_validator(&mut self, ctx: &mut TxContext) -> SystemResult {
        self.validators.request_add_validator(
            &ctx.sender(),
            self.parameters.min_validator_joining_stake,
            self.parameters.max_validator_count,
        )
    }

    pub fn request_remove_validator(&mut self, ctx: &mut TxContext) -> SystemResult {
        self.validators.request_remove_validator(
            &ctx.sender(),
            self.parameters.min_validator_count,
            self.epoch,
        )
    }

    pub fn request_set_gas_price(
        &mut self,
        cap: &UnverifiedValidatorOperationCap,
        new_gas_price: u64,
    ) -> SystemResult {
        self.validators.request_set_gas_price(cap, new_gas_price)
    }

    pub fn set_candidate_gas_price(
        &mut self,
        cap: &UnverifiedValidatorOperationCap,
        new_gas_price: u64,
    ) -> SystemResult {
        self.validators.set_candidate_gas_price(cap, new_gas_price)
    }

    pub fn request_set_commission_rate(
        &mut self,
        new_commission_rate: u64,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .request_set_commission_rate(&ctx.sender(), new_commission_rate)
    }

    pub fn set_candidate_commission_rate(
        &mut self,
        new_commission_rate: u64,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .set_candidate_commission_rate(&ctx.sender(), new_commission_rate)
    }

    /// Issues a new operation cap for the sender's validator. The previous cap
    /// stops being honored.
    pub fn rotate_operation_cap(
        &mut self,
        ctx: &mut TxContext,
    ) -> SystemResult<UnverifiedValidatorOperationCap> {
        let address = ctx.sender();
        self.validators.rotate_operation_cap(&address, ctx)
    }

    // ==== staking ====

    pub fn request_add_stake(
        &mut self,
        stake: Balance,
        validator_address: Address,
        ctx: &mut TxContext,
    ) -> SystemResult<StakeReceipt> {
        self.validators
            .request_add_stake(&validator_address, stake, self.epoch, ctx)
    }

    /// Stakes `stake_amount` out of the joined `stakes`, or all of it when no
    /// amount is given, and returns the change.
    pub fn request_add_stake_mul_balance(
        &mut self,
        stakes: Vec<Balance>,
        stake_amount: Option<u64>,
        validator_address: Address,
        ctx: &mut TxContext,
    ) -> SystemResult<(StakeReceipt, Balance)> {
        let mut total = Balance::zero();
        for stake in stakes {
            total.join(stake)?;
        }
        let stake = match stake_amount {
            Some(amount) => total.split(amount)?,
            None => total.withdraw_all(),
        };
        let receipt = self.request_add_stake(stake, validator_address, ctx)?;
        Ok((receipt, total))
    }

    pub fn request_withdraw_stake(
        &mut self,
        receipt: StakeReceipt,
        ctx: &mut TxContext,
    ) -> SystemResult<Balance> {
        self.validators
            .request_withdraw_stake(receipt, self.epoch, ctx)
    }

    // ==== reporting ====

    /// Records that the validator behind `cap` reports `reportee`. Both must be
    /// active validators.
    pub fn report_validator(
        &mut self,
        cap: &UnverifiedValidatorOperationCap,
        reportee: Address,
    ) -> SystemResult {
        let reporter = self
            .validators
            .verify_cap(cap, CapScope::ActiveOnly)?
            .validator_address();
        fp_ensure!(
            self.validators.is_active_validator(&reportee),
            SystemError::NotAValidator(reportee)
        );
        debug!(%reporter, %reportee, "Validator reported");
        self.validator_report_records.report(reporter, reportee)
    }

    pub fn undo_report_validator(
        &mut self,
        cap: &UnverifiedValidatorOperationCap,
        reportee: Address,
    ) -> SystemResult {
        let reporter = self
            .validators
            .verify_cap(cap, CapScope::ActiveOnly)?
            .validator_address();
        self.validator_report_records.undo_report(reporter, reportee)
    }

    // ==== metadata updates ====

    pub fn update_validator_name(&mut self, name: String, ctx: &mut TxContext) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::Any, |v| v.update_name(name))
    }

    pub fn update_validator_description(
        &mut self,
        description: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators.update_validator(&ctx.sender(), CapScope::Any, |v| {
            v.update_description(description)
        })
    }

    pub fn update_validator_image_url(
        &mut self,
        image_url: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::Any, |v| v.update_image_url(image_url))
    }

    pub fn update_validator_project_url(
        &mut self,
        project_url: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators.update_validator(&ctx.sender(), CapScope::Any, |v| {
            v.update_project_url(project_url)
        })
    }

    pub fn update_validator_next_epoch_network_address(
        &mut self,
        net_address: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::ActiveOrPending, |v| {
                v.update_next_epoch_network_address(net_address)
            })
    }

    pub fn update_candidate_validator_network_address(
        &mut self,
        net_address: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::CandidateOnly, |v| {
                v.update_candidate_network_address(net_address)
            })
    }

    pub fn update_validator_next_epoch_p2p_address(
        &mut self,
        p2p_address: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::ActiveOrPending, |v| {
                v.update_next_epoch_p2p_address(p2p_address)
            })
    }

    pub fn update_candidate_validator_p2p_address(
        &mut self,
        p2p_address: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::CandidateOnly, |v| {
                v.update_candidate_p2p_address(p2p_address)
            })
    }

    pub fn update_validator_next_epoch_primary_address(
        &mut self,
        primary_address: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::ActiveOrPending, |v| {
                v.update_next_epoch_primary_address(primary_address)
            })
    }

    pub fn update_candidate_validator_primary_address(
        &mut self,
        primary_address: String,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::CandidateOnly, |v| {
                v.update_candidate_primary_address(primary_address)
            })
    }

    pub fn update_validator_next_epoch_authority_pubkey(
        &mut self,
        authority_pubkey: Vec<u8>,
        proof_of_possession: Vec<u8>,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::ActiveOrPending, |v| {
                v.update_next_epoch_authority_pubkey(authority_pubkey, proof_of_possession)
            })
    }

    pub fn update_candidate_validator_authority_pubkey(
        &mut self,
        authority_pubkey: Vec<u8>,
        proof_of_possession: Vec<u8>,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::CandidateOnly, |v| {
                v.update_candidate_authority_pubkey(authority_pubkey, proof_of_possession)
            })
    }

    pub fn update_validator_next_epoch_network_pubkey(
        &mut self,
        network_pubkey: Vec<u8>,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::ActiveOrPending, |v| {
                v.update_next_epoch_network_pubkey(network_pubkey)
            })
    }

    pub fn update_candidate_validator_network_pubkey(
        &mut self,
        network_pubkey: Vec<u8>,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::CandidateOnly, |v| {
                v.update_candidate_network_pubkey(network_pubkey)
            })
    }

    pub fn update_validator_next_epoch_protocol_pubkey(
        &mut self,
        protocol_pubkey: Vec<u8>,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::ActiveOrPending, |v| {
                v.update_next_epoch_protocol_pubkey(protocol_pubkey)
            })
    }

    pub fn update_candidate_validator_protocol_pubkey(
        &mut self,
        protocol_pubkey: Vec<u8>,
        ctx: &mut TxContext,
    ) -> SystemResult {
        self.validators
            .update_validator(&ctx.sender(), CapScope::CandidateOnly, |v| {
                v.update_candidate_protocol_pubkey(protocol_pubkey)
            })
    }

    // ==== epoch change ====

    /// Moves the ledger to `params.epoch`: reconciles the subsidy with the
    /// burned computation charges, pays validators, settles every pool,
    /// rotates the validator set and advances the storage fund. Returns the
    /// storage rebates owed to transaction senders.
    pub fn advance_epoch(
        &mut self,
        params: &AdvanceEpochParams,
        ctx: &mut TxContext,
    ) -> SystemResult<Balance> {
        fp_ensure!(
            ctx.sender() == SYSTEM_ADDRESS,
            SystemError::NotSystemAddress(ctx.sender())
        );
        self.ensure_next_epoch(params.epoch)?;
        fp_ensure!(
            params.reward_slashing_rate <= BASIS_POINT_DENOMINATOR,
            SystemError::BpsTooLarge(params.reward_slashing_rate)
        );
        let computation_charge = params
            .computation_charge
            .checked_add(self.safe_mode_computation_charges.value())
            .ok_or(SystemError::ArithmeticOverflow)?;
        let computation_charge_burned = params
            .computation_charge_burned
            .checked_add(self.safe_mode_computation_charges_burned)
            .ok_or(SystemError::ArithmeticOverflow)?;
        fp_ensure!(
            computation_charge_burned <= computation_charge,
            SystemError::BurnedExceedsComputationCharge {
                burned: computation_charge_burned,
                charge: computation_charge,
            }
        );

        // Fold in whatever was collected while in safe mode.
        let mut storage_charges = Balance::new(params.storage_charge);
        storage_charges.join(self.safe_mode_storage_charges.withdraw_all())?;
        let mut computation_reward = Balance::new(params.computation_charge);
        computation_reward.join(self.safe_mode_computation_charges.withdraw_all())?;
        let storage_rebate = params
            .storage_rebate
            .checked_add(std::mem::take(&mut self.safe_mode_storage_rebates))
            .ok_or(SystemError::ArithmeticOverflow)?;
        let non_refundable_storage_fee = params
            .non_refundable_storage_fee
            .checked_add(std::mem::take(
                &mut self.safe_mode_non_refundable_storage_fee,
            ))
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.safe_mode_computation_charges_burned = 0;

        let storage_charge = storage_charges.value();
        let tips_amount = computation_charge - computation_charge_burned;

        let mut minted_tokens_amount = 0;
        let mut burnt_tokens_amount = 0;
        if params.validator_subsidy > computation_charge_burned {
            minted_tokens_amount = params.validator_subsidy - computation_charge_burned;
            computation_reward.join(self.treasury_cap.mint(minted_tokens_amount)?)?;
        } else if computation_charge_burned > params.validator_subsidy {
            let excess = computation_reward.split(computation_charge_burned - params.validator_subsidy)?;
            burnt_tokens_amount = self.treasury_cap.burn(excess)?;
        }

        self.epoch += 1;

        let total_rewards_amount = computation_reward.value();
        let low_stake_rule = LowStakeRule {
            low_stake_threshold: self.parameters.validator_low_stake_threshold,
            very_low_stake_threshold: self.parameters.validator_very_low_stake_threshold,
            grace_period: self.parameters.validator_low_stake_grace_period,
        };
        self.validators.advance_epoch(
            self.epoch,
            &mut computation_reward,
            &mut self.validator_report_records,
            params.reward_slashing_rate,
            low_stake_rule,
            params.max_committee_size,
            ctx,
        )?;

        let leftover = computation_reward.value();
        let total_stake_rewards_distributed = total_rewards_amount - leftover;
        burnt_tokens_amount += self.treasury_cap.burn(computation_reward)?;

        self.protocol_version = params.next_protocol_version;
        self.epoch_start_timestamp_ms = params.epoch_start_timestamp_ms;
        self.reference_gas_price = self.validators.derive_reference_gas_price();

        let refunded_storage_rebate = self.storage_fund.advance_epoch(
            storage_charges,
            storage_rebate,
            non_refundable_storage_fee,
        )?;

        info!(
            epoch = self.epoch,
            protocol_version = self.protocol_version,
            reference_gas_price = self.reference_gas_price,
            total_stake = self.validators.total_stake,
            total_stake_rewards_distributed,
            minted_tokens_amount,
            burnt_tokens_amount,
            "Advanced epoch"
        );
        ctx.emit(SystemEpochInfoEvent {
            epoch: self.epoch,
            protocol_version: self.protocol_version,
            reference_gas_price: self.reference_gas_price,
            total_stake: self.validators.total_stake,
            storage_charge,
            storage_rebate,
            storage_fund_balance: self.storage_fund.total_balance(),
            total_gas_fees: computation_charge + storage_charge,
            total_stake_rewards_distributed,
            burnt_tokens_amount,
            minted_tokens_amount,
            tips_amount,
        });

        self.safe_mode = false;
        fp_ensure!(
            self.safe_mode_storage_charges.value() == 0
                && self.safe_mode_computation_charges.value() == 0
                && self.safe_mode_computation_charges_burned == 0
                && self.safe_mode_storage_rebates == 0
                && self.safe_mode_non_refundable_storage_fee == 0,
            SystemError::SafeModeGasNotProcessed
        );

        Ok(refunded_storage_rebate)
    }

    fn ensure_next_epoch(&self, requested: EpochId) -> SystemResult {
        let expected = self.epoch + 1;
        fp_ensure!(
            requested == expected,
            SystemError::AdvancedToWrongEpoch {
                expected,
                requested,
            }
        );
        Ok(())
    }

    /// The fallback epoch change: no rewards, no validator set changes. Gas
    /// charges are kept aside until the next successful `advance_epoch`.
    pub fn advance_epoch_safe_mode(&mut self, params: &AdvanceEpochParams) -> SystemResult {
        self.ensure_next_epoch(params.epoch)?;
        warn!(epoch = params.epoch, "Advancing epoch in safe mode");
        self.epoch = params.epoch;
        self.safe_mode = true;
        self.safe_mode_storage_charges
            .join(Balance::new(params.storage_charge))?;
        self.safe_mode_computation_charges
            .join(Balance::new(params.computation_charge))?;
        self.safe_mode_computation_charges_burned = self
            .safe_mode_computation_charges_burned
            .checked_add(params.computation_charge_burned)
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.safe_mode_storage_rebates = self
            .safe_mode_storage_rebates
            .checked_add(params.storage_rebate)
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.safe_mode_non_refundable_storage_fee = self
            .safe_mode_non_refundable_storage_fee
            .checked_add(params.non_refundable_storage_fee)
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.epoch_start_timestamp_ms = params.epoch_start_timestamp_ms;
        self.protocol_version = params.next_protocol_version;
        Ok(())
    }

    // ==== queries ====

    pub fn committee_addresses(&self) -> Vec<Address> {
        self.validators.committee_addresses()
    }

    pub fn validator_stake_amount(&self, validator_address: &Address) -> SystemResult<u64> {
        self.validators.validator_stake_amount(validator_address)
    }

    pub fn validator_voting_power(&self, validator_address: &Address) -> SystemResult<u64> {
        self.validators.validator_voting_power(validator_address)
    }

    pub fn validator_staking_pool_id(&self, validator_address: &Address) -> SystemResult<ObjectID> {
        self.validators.validator_staking_pool_id(validator_address)
    }

    pub fn pool_exchange_rate_at_epoch(
        &self,
        pool_id: &ObjectID,
        epoch: EpochId,
    ) -> SystemResult<PoolTokenExchangeRate> {
        self.validators.pool_exchange_rate_at_epoch(pool_id, epoch)
    }

    pub fn validator_address_by_pool_id(&self, pool_id: &ObjectID) -> SystemResult<Address> {
        self.validators
            .staking_pool_mappings()
            .get(pool_id)
            .copied()
            .ok_or(SystemError::NoPoolFound(*pool_id))
    }

    pub fn validator_by_address(&self, validator_address: &Address) -> SystemResult<&ValidatorV1> {
        self.validators
            .get_validator_ref_including_candidates(validator_address)
    }

    pub fn reporters_of(&self, reportee: &Address) -> BTreeSet<Address> {
        self.validator_report_records.reporters_of(reportee)
    }

    pub fn storage_fund_total_object_storage_rebates(&self) -> u64 {
        self.storage_fund.total_object_storage_rebates()
    }

    pub fn storage_fund_non_refundable_balance(&self) -> u64 {
        self.storage_fund.non_refundable_balance()
    }

    /// Rewards `receipt` would earn on top of its principal if withdrawn now.
    pub fn estimated_reward(&self, receipt: &StakeReceipt) -> SystemResult<u64> {
        let validator = self.validators.get_validator_by_pool_id(&receipt.pool_id())?;
        let withdraw_amount = validator
            .staking_pool
            .estimated_withdraw_amount(receipt, self.epoch);
        Ok(withdraw_amount.saturating_sub(receipt.principal()))
    }
}

impl SystemStateTrait for SystemStateInnerV2 {
    fn epoch(&self) -> u64 {
        self.epoch
    }

    fn reference_gas_price(&self) -> u64 {
        self.reference_gas_price
    }

    fn protocol_version(&self) -> u64 {
        self.protocol_version
    }

    fn system_state_version(&self) -> u64 {
        self.system_state_version
    }

    fn epoch_start_timestamp_ms(&self) -> u64 {
        self.epoch_start_timestamp_ms
    }

    fn epoch_duration_ms(&self) -> u64 {
        self.parameters.epoch_duration_ms
    }

    fn safe_mode(&self) -> bool {
        self.safe_mode
    }

    fn total_supply(&self) -> u64 {
        self.treasury_cap.total_supply()
    }

    fn active_validator_addresses(&self) -> Vec<Address> {
        self.validators.active_validator_addresses()
    }

    fn get_current_epoch_committee(&self) -> Committee {
        self.validators.committee(self.epoch)
    }

    fn into_system_state_summary(self) -> SystemStateSummary {
        let committee_members = self.validators.committee_addresses();
        SystemStateSummary {
            epoch: self.epoch,
            protocol_version: self.protocol_version,
            system_state_version: self.system_state_version,
            total_supply: self.treasury_cap.total_supply(),
            storage_fund_total_object_storage_rebates: self
                .storage_fund
                .total_object_storage_rebates(),
            storage_fund_non_refundable_balance: self.storage_fund.non_refundable_balance(),
            reference_gas_price: self.reference_gas_price,
            safe_mode: self.safe_mode,
            safe_mode_storage_charges: self.safe_mode_storage_charges.value(),
            safe_mode_computation_charges: self.safe_mode_computation_charges.value(),
            safe_mode_computation_charges_burned: self.safe_mode_computation_charges_burned,
            safe_mode_storage_rebates: self.safe_mode_storage_rebates,
            safe_mode_non_refundable_storage_fee: self.safe_mode_non_refundable_storage_fee,
            epoch_start_timestamp_ms: self.epoch_start_timestamp_ms,
            epoch_duration_ms: self.parameters.epoch_duration_ms,
            min_validator_count: self.parameters.min_validator_count,
            max_validator_count: self.parameters.max_validator_count,
            min_validator_joining_stake: self.parameters.min_validator_joining_stake,
            validator_low_stake_threshold: self.parameters.validator_low_stake_threshold,
            validator_very_low_stake_threshold: self
                .parameters
                .validator_very_low_stake_threshold,
            validator_low_stake_grace_period: self.parameters.validator_low_stake_grace_period,
            total_stake: self.validators.total_stake,
            active_validators: self
                .validators
                .active_validators
                .iter()
                .map(|v| v.to_validator_summary())
                .collect(),
            committee_members,
            pending_active_validators_size: self.validators.pending_active_validators.len() as u64,
            pending_removals: self.validators.pending_removals.clone(),
            staking_pool_mappings: self
                .validators
                .staking_pool_mappings
                .iter()
                .map(|(pool_id, address)| (*pool_id, *address))
                .collect(),
            inactive_pools_size: self.validators.inactive_validators.len() as u64,
            validator_candidates_size: self.validators.validator_candidates.len() as u64,
            at_risk_validators: self
                .validators
                .at_risk_validators
                .iter()
                .map(|(address, epochs)| (*address, *epochs))
                .collect(),
            validator_report_records: self
                .validator_report_records
                .iter()
                .map(|(reportee, reporters)| (*reportee, reporters.iter().copied().collect()))
                .collect(),
        }
    }
}
