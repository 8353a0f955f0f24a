// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::Balance;
use crate::base_types::{Address, EpochId, ObjectID, TxContext};
use crate::committee::{
    Committee, CommitteeMember, VoteUnit, QUORUM_THRESHOLD, TOTAL_VOTING_POWER,
};
use crate::error::{SystemError, SystemResult};
use crate::event::{ValidatorEpochInfoEvent, ValidatorJoinEvent, ValidatorLeaveEvent};
use crate::fp_ensure;
use crate::governance::{StakeReceipt, MIN_STAKING_THRESHOLD};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info, warn};

use super::report_records::ValidatorReportRecords;
use super::staking_pool::PoolTokenExchangeRate;
use super::validator::{UnverifiedValidatorOperationCap, ValidatorOperationCap, ValidatorV1};
use super::voting_power;

pub const BASIS_POINT_DENOMINATOR: u64 = 10_000;

/// Which validators an operation cap may stand for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CapScope {
    ActiveOnly,
    ActiveOrPending,
    CandidateOnly,
    Any,
}

/// The validator set layout before the committee was tracked separately from
/// the active set. Every active validator was a committee member.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct ValidatorSetV1 {
    pub total_stake: u64,
    pub active_validators: Vec<ValidatorV1>,
    pub pending_active_validators: Vec<ValidatorV1>,
    pub pending_removals: Vec<u64>,
    pub staking_pool_mappings: BTreeMap<ObjectID, Address>,
    pub inactive_validators: BTreeMap<ObjectID, ValidatorV1>,
    pub validator_candidates: BTreeMap<Address, ValidatorV1>,
    pub at_risk_validators: BTreeMap<Address, u64>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct ValidatorSetV2 {
    pub total_stake: u64,
    pub active_validators: Vec<ValidatorV1>,
    /// Indices into `active_validators`, ascending.
    pub committee_members: Vec<u64>,
    pub pending_active_validators: Vec<ValidatorV1>,
    /// Indices into `active_validators`.
    pub pending_removals: Vec<u64>,
    pub staking_pool_mappings: BTreeMap<ObjectID, Address>,
    pub inactive_validators: BTreeMap<ObjectID, ValidatorV1>,
    pub validator_candidates: BTreeMap<Address, ValidatorV1>,
    pub at_risk_validators: BTreeMap<Address, u64>,
}

impl From<ValidatorSetV1> for ValidatorSetV2 {
    fn from(v1: ValidatorSetV1) -> Self {
        let committee_members = (0..v1.active_validators.len() as u64).collect();
        Self {
            total_stake: v1.total_stake,
            active_validators: v1.active_validators,
            committee_members,
            pending_active_validators: v1.pending_active_validators,
            pending_removals: v1.pending_removals,
            staking_pool_mappings: v1.staking_pool_mappings,
            inactive_validators: v1.inactive_validators,
            validator_candidates: v1.validator_candidates,
            at_risk_validators: v1.at_risk_validators,
        }
    }
}

/// Thresholds that decide which validators are escorted out at epoch change.
#[derive(Clone, Copy, Debug)]
pub struct LowStakeRule {
    pub low_stake_threshold: u64,
    pub very_low_stake_threshold: u64,
    pub grace_period: u64,
}

impl ValidatorSetV2 {
    /// Builds the set from validators that are already staked and activated.
    pub fn new(
        init_active_validators: Vec<ValidatorV1>,
        max_committee_size: u64,
    ) -> SystemResult<Self> {
        let staking_pool_mappings = init_active_validators
            .iter()
            .map(|v| (v.staking_pool_id(), v.address()))
            .collect();
        let mut set = Self {
            total_stake: 0,
            active_validators: init_active_validators,
            committee_members: vec![],
            pending_active_validators: vec![],
            pending_removals: vec![],
            staking_pool_mappings,
            inactive_validators: BTreeMap::new(),
            validator_candidates: BTreeMap::new(),
            at_risk_validators: BTreeMap::new(),
        };
        set.total_stake = set.calculate_total_stakes();
        set.select_committee_and_set_voting_power(max_committee_size)?;
        Ok(set)
    }

    // ==== lookups ====

    pub fn find_active(&self, address: &Address) -> Option<usize> {
        self.active_validators
            .iter()
            .position(|v| &v.address() == address)
    }

    fn find_pending(&self, address: &Address) -> Option<usize> {
        self.pending_active_validators
            .iter()
            .position(|v| &v.address() == address)
    }

    pub fn is_active_validator(&self, address: &Address) -> bool {
        self.find_active(address).is_some()
    }

    pub fn is_pending_validator(&self, address: &Address) -> bool {
        self.find_pending(address).is_some()
    }

    pub fn is_validator_candidate(&self, address: &Address) -> bool {
        self.validator_candidates.contains_key(address)
    }

    pub fn is_committee_member(&self, address: &Address) -> bool {
        self.committee_validators().any(|v| &v.address() == address)
    }

    pub fn get_active_validator_ref(&self, address: &Address) -> SystemResult<&ValidatorV1> {
        self.find_active(address)
            .map(|i| &self.active_validators[i])
            .ok_or(SystemError::NotAValidator(*address))
    }

    fn get_active_or_pending_validator_ref(
        &self,
        address: &Address,
    ) -> SystemResult<&ValidatorV1> {
        self.active_validators
            .iter()
            .chain(self.pending_active_validators.iter())
            .find(|v| &v.address() == address)
            .ok_or(SystemError::NotActiveOrPendingValidator(*address))
    }

    fn get_active_or_pending_validator_mut(
        &mut self,
        address: &Address,
    ) -> SystemResult<&mut ValidatorV1> {
        self.active_validators
            .iter_mut()
            .chain(self.pending_active_validators.iter_mut())
            .find(|v| &v.address() == address)
            .ok_or(SystemError::NotActiveOrPendingValidator(*address))
    }

    fn get_candidate_ref(&self, address: &Address) -> SystemResult<&ValidatorV1> {
        self.validator_candidates
            .get(address)
            .ok_or(SystemError::NotValidatorCandidate(*address))
    }

    pub fn get_validator_ref_including_candidates(
        &self,
        address: &Address,
    ) -> SystemResult<&ValidatorV1> {
        self.get_active_or_pending_validator_ref(address)
            .ok()
            .or_else(|| self.validator_candidates.get(address))
            .ok_or(SystemError::ValidatorNotFound(*address))
    }

    fn get_validator_mut_including_candidates(
        &mut self,
        address: &Address,
    ) -> SystemResult<&mut ValidatorV1> {
        if self.validator_candidates.contains_key(address) {
            return self
                .validator_candidates
                .get_mut(address)
                .ok_or(SystemError::ValidatorNotFound(*address));
        }
        self.get_active_or_pending_validator_mut(address)
            .map_err(|_| SystemError::ValidatorNotFound(*address))
    }

    fn get_validator_ref_in_scope(
        &self,
        address: &Address,
        scope: CapScope,
    ) -> SystemResult<&ValidatorV1> {
        match scope {
            CapScope::ActiveOnly => self.get_active_validator_ref(address),
            CapScope::ActiveOrPending => self.get_active_or_pending_validator_ref(address),
            CapScope::CandidateOnly => self.get_candidate_ref(address),
            CapScope::Any => self.get_validator_ref_including_candidates(address),
        }
    }

    fn get_validator_mut_in_scope(
        &mut self,
        address: &Address,
        scope: CapScope,
    ) -> SystemResult<&mut ValidatorV1> {
        match scope {
            CapScope::ActiveOnly => {
                let i = self
                    .find_active(address)
                    .ok_or(SystemError::NotAValidator(*address))?;
                Ok(&mut self.active_validators[i])
            }
            CapScope::ActiveOrPending => self.get_active_or_pending_validator_mut(address),
            CapScope::CandidateOnly => self
                .validator_candidates
                .get_mut(address)
                .ok_or(SystemError::NotValidatorCandidate(*address)),
            CapScope::Any => self.get_validator_mut_including_candidates(address),
        }
    }

    /// The validator owning `pool_id`, active, pending, candidate or inactive.
    pub fn get_validator_by_pool_id(&self, pool_id: &ObjectID) -> SystemResult<&ValidatorV1> {
        if let Some(address) = self.staking_pool_mappings.get(pool_id) {
            return self.get_validator_ref_including_candidates(address);
        }
        self.inactive_validators
            .get(pool_id)
            .ok_or(SystemError::NoPoolFound(*pool_id))
    }

    fn get_validator_by_pool_id_mut(
        &mut self,
        pool_id: &ObjectID,
    ) -> SystemResult<&mut ValidatorV1> {
        if let Some(address) = self.staking_pool_mappings.get(pool_id).copied() {
            return self.get_validator_mut_including_candidates(&address);
        }
        self.inactive_validators
            .get_mut(pool_id)
            .ok_or(SystemError::NoPoolFound(*pool_id))
    }

    pub fn committee_validators(&self) -> impl Iterator<Item = &ValidatorV1> {
        self.committee_members
            .iter()
            .filter_map(|i| self.active_validators.get(*i as usize))
    }

    pub fn next_epoch_validator_count(&self) -> u64 {
        (self.active_validators.len() - self.pending_removals.len()
            + self.pending_active_validators.len()) as u64
    }

    // ==== duplicate checks ====

    fn is_duplicate_with_active(&self, validator: &ValidatorV1, exclude: Option<Address>) -> bool {
        count_duplicates(self.active_validators.iter(), validator, exclude) > 0
    }

    fn is_duplicate_with_pending(&self, validator: &ValidatorV1, exclude: Option<Address>) -> bool {
        count_duplicates(self.pending_active_validators.iter(), validator, exclude) > 0
    }

    fn is_duplicate_with_candidates(
        &self,
        validator: &ValidatorV1,
        exclude: Option<Address>,
    ) -> bool {
        count_duplicates(self.validator_candidates.values(), validator, exclude) > 0
    }

    // ==== lifecycle ====

    /// Registers a new candidate. Candidates can be staked with right away.
    pub fn request_add_validator_candidate(&mut self, validator: ValidatorV1) -> SystemResult {
        let address = validator.address();
        fp_ensure!(
            !self.is_validator_candidate(&address),
            SystemError::AlreadyValidatorCandidate(address)
        );
        fp_ensure!(
            !self.is_duplicate_with_active(&validator, None)
                && !self.is_duplicate_with_pending(&validator, None)
                && !self.is_duplicate_with_candidates(&validator, None),
            SystemError::DuplicateValidator
        );
        fp_ensure!(
            validator.is_preactive(),
            SystemError::ValidatorNotPreactive(address)
        );
        self.staking_pool_mappings
            .insert(validator.staking_pool_id(), address);
        self.validator_candidates.insert(address, validator);
        info!(validator = %address, "Validator candidate added");
        Ok(())
    }

    /// Withdraws a candidacy. The pool is deactivated so stakers can withdraw.
    pub fn request_remove_validator_candidate(
        &mut self,
        address: &Address,
        current_epoch: EpochId,
    ) -> SystemResult {
        let validator = self.get_candidate_ref(address)?;
        fp_ensure!(
            validator.is_preactive(),
            SystemError::ValidatorNotPreactive(*address)
        );
        let mut validator = self
            .validator_candidates
            .remove(address)
            .ok_or(SystemError::NotValidatorCandidate(*address))?;
        let pool_id = validator.staking_pool_id();
        self.staking_pool_mappings.remove(&pool_id);
        validator.deactivate(current_epoch)?;
        self.inactive_validators.insert(pool_id, validator);
        info!(validator = %address, "Validator candidate removed");
        Ok(())
    }

    /// Moves a candidate to the pending active set; it joins at the next epoch.
    pub fn request_add_validator(
        &mut self,
        address: &Address,
        min_joining_stake: u64,
        max_validator_count: u64,
    ) -> SystemResult {
        let validator = self.get_candidate_ref(address)?;
        fp_ensure!(
            validator.is_preactive(),
            SystemError::ValidatorNotPreactive(*address)
        );
        fp_ensure!(
            !self.is_duplicate_with_active(validator, None)
                && !self.is_duplicate_with_pending(validator, None),
            SystemError::DuplicateValidator
        );
        let stake = validator.total_stake();
        fp_ensure!(
            stake >= min_joining_stake,
            SystemError::MinJoiningStakeNotReached {
                stake,
                min: min_joining_stake,
            }
        );
        fp_ensure!(
            self.next_epoch_validator_count() < max_validator_count,
            SystemError::ValidatorCountLimitExceeded {
                max: max_validator_count,
            }
        );
        let validator = self
            .validator_candidates
            .remove(address)
            .ok_or(SystemError::NotValidatorCandidate(*address))?;
        self.pending_active_validators.push(validator);
        info!(validator = %address, "Validator pending activation");
        Ok(())
    }

    /// Requests that an active validator leaves at the next epoch, or drops a
    /// pending validator right away.
    pub fn request_remove_validator(
        &mut self,
        address: &Address,
        min_validator_count: u64,
        current_epoch: EpochId,
    ) -> SystemResult {
        if let Some(index) = self.find_pending(address) {
            let mut validator = self.pending_active_validators.remove(index);
            let pool_id = validator.staking_pool_id();
            self.staking_pool_mappings.remove(&pool_id);
            validator.deactivate(current_epoch)?;
            self.inactive_validators.insert(pool_id, validator);
            info!(validator = %address, "Pending validator removed");
            return Ok(());
        }

        let index = self
            .find_active(address)
            .ok_or(SystemError::NotActiveOrPendingValidator(*address))?;
        fp_ensure!(
            !self.pending_removals.contains(&(index as u64)),
            SystemError::ValidatorAlreadyRemoved(*address)
        );
        // A set already below the minimum must still be able to shrink.
        if self.active_validators.len() as u64 >= min_validator_count {
            fp_ensure!(
                self.next_epoch_validator_count() > min_validator_count,
                SystemError::BelowMinValidatorCount {
                    min: min_validator_count,
                }
            );
        }
        self.pending_removals.push(index as u64);
        info!(validator = %address, "Validator removal requested");
        Ok(())
    }

    // ==== staking ====

    pub fn request_add_stake(
        &mut self,
        validator_address: &Address,
        stake: Balance,
        current_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult<StakeReceipt> {
        let amount = stake.value();
        fp_ensure!(
            amount >= MIN_STAKING_THRESHOLD,
            SystemError::StakingBelowThreshold {
                amount,
                min: MIN_STAKING_THRESHOLD,
            }
        );
        let staker = ctx.sender();
        let validator = self.get_validator_mut_including_candidates(validator_address)?;
        validator.request_add_stake(stake, staker, current_epoch, ctx)
    }

    /// Routes the withdrawal to the pool named by the receipt, which may belong
    /// to a validator that already left.
    pub fn request_withdraw_stake(
        &mut self,
        receipt: StakeReceipt,
        current_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult<Balance> {
        let staker = ctx.sender();
        let validator = self.get_validator_by_pool_id_mut(&receipt.pool_id())?;
        validator.request_withdraw_stake(receipt, staker, current_epoch, ctx)
    }

    // ==== operation caps, gas price and commission ====

    pub fn verify_cap(
        &self,
        cap: &UnverifiedValidatorOperationCap,
        scope: CapScope,
    ) -> SystemResult<ValidatorOperationCap> {
        let address = cap.authorizer_validator_address;
        let validator = self.get_validator_ref_in_scope(&address, scope)?;
        fp_ensure!(
            validator.operation_cap_id == cap.id,
            SystemError::InvalidOperationCap(cap.id)
        );
        Ok(ValidatorOperationCap {
            authorizer_validator_address: address,
        })
    }

    pub fn rotate_operation_cap(
        &mut self,
        address: &Address,
        ctx: &mut TxContext,
    ) -> SystemResult<UnverifiedValidatorOperationCap> {
        let validator = self.get_validator_mut_including_candidates(address)?;
        let cap = validator.new_operation_cap(ctx);
        debug!(validator = %address, cap_id = %cap.id, "Operation cap rotated");
        Ok(cap)
    }

    pub fn request_set_gas_price(
        &mut self,
        cap: &UnverifiedValidatorOperationCap,
        new_gas_price: u64,
    ) -> SystemResult {
        let verified = self.verify_cap(cap, CapScope::ActiveOrPending)?;
        self.get_validator_mut_in_scope(&verified.validator_address(), CapScope::ActiveOrPending)?
            .request_set_gas_price(&verified, new_gas_price)
    }

    pub fn set_candidate_gas_price(
        &mut self,
        cap: &UnverifiedValidatorOperationCap,
        new_gas_price: u64,
    ) -> SystemResult {
        let verified = self.verify_cap(cap, CapScope::CandidateOnly)?;
        self.get_validator_mut_in_scope(&verified.validator_address(), CapScope::CandidateOnly)?
            .set_candidate_gas_price(&verified, new_gas_price)
    }

    pub fn request_set_commission_rate(&mut self, address: &Address, new_rate: u64) -> SystemResult {
        self.get_active_or_pending_validator_mut(address)?
            .request_set_commission_rate(new_rate)
    }

    pub fn set_candidate_commission_rate(
        &mut self,
        address: &Address,
        new_rate: u64,
    ) -> SystemResult {
        self.get_validator_mut_in_scope(address, CapScope::CandidateOnly)?
            .set_candidate_commission_rate(new_rate)
    }

    // ==== metadata updates ====

    /// Applies `update` to a copy of the validator at `address` in `scope` and
    /// stores it only if it stays distinct from every other validator that
    /// `scope` competes with.
    pub fn update_validator(
        &mut self,
        address: &Address,
        scope: CapScope,
        update: impl FnOnce(&mut ValidatorV1) -> SystemResult,
    ) -> SystemResult {
        let mut updated = self.get_validator_ref_in_scope(address, scope)?.clone();
        update(&mut updated)?;

        let exclude = Some(*address);
        let mut duplicate = self.is_duplicate_with_active(&updated, exclude)
            || self.is_duplicate_with_pending(&updated, exclude);
        if matches!(scope, CapScope::CandidateOnly | CapScope::Any) {
            duplicate = duplicate || self.is_duplicate_with_candidates(&updated, exclude);
        }
        fp_ensure!(!duplicate, SystemError::DuplicateValidator);

        *self.get_validator_mut_in_scope(address, scope)? = updated;
        Ok(())
    }

    // ==== epoch change ====

    /// Distributes `total_validator_rewards`, settles every pool, applies
    /// removals and low stake departures, promotes pending validators and
    /// selects the committee of `new_epoch`. Whatever cannot be paid out due to
    /// rounding stays in `total_validator_rewards`.
    #[allow(clippy::too_many_arguments)]
    pub fn advance_epoch(
        &mut self,
        new_epoch: EpochId,
        total_validator_rewards: &mut Balance,
        report_records: &mut ValidatorReportRecords,
        reward_slashing_rate: u64,
        low_stake_rule: LowStakeRule,
        max_committee_size: u64,
        ctx: &mut TxContext,
    ) -> SystemResult {
        let total_reward = total_validator_rewards.value();

        // Rewards without taking the tallying rule into account.
        let unadjusted_rewards = self.compute_unadjusted_reward_distribution(total_reward);

        let slashed_validators = self.compute_slashed_validators(report_records);
        let slashed_indices: BTreeSet<usize> = slashed_validators
            .iter()
            .filter_map(|a| self.find_active(a))
            .collect();
        let total_slashed_voting_power: VoteUnit = slashed_indices
            .iter()
            .map(|i| self.active_validators[*i].voting_power)
            .sum();

        let (total_adjustment, individual_adjustments) = compute_reward_adjustments(
            &slashed_indices,
            reward_slashing_rate,
            &unadjusted_rewards,
        );
        let adjusted_rewards = self.compute_adjusted_reward_distribution(
            total_slashed_voting_power,
            &unadjusted_rewards,
            total_adjustment,
            &individual_adjustments,
        );

        self.distribute_reward(&adjusted_rewards, total_validator_rewards, new_epoch, ctx)?;

        for validator in self.active_validators.iter_mut() {
            validator.adjust_stake_and_gas_price();
        }
        for validator in self.active_validators.iter_mut() {
            validator.process_pending_stakes_and_withdraws(new_epoch)?;
        }

        self.emit_validator_epoch_events(
            new_epoch,
            &adjusted_rewards,
            report_records,
            &slashed_indices,
            ctx,
        );

        // Staged metadata of joining validators is effectuated below with the rest.
        self.process_pending_validators(new_epoch, ctx)?;
        self.process_pending_removals(report_records, new_epoch, ctx)?;
        self.update_and_process_low_stake_departures(low_stake_rule, report_records, new_epoch, ctx)?;

        self.total_stake = self.calculate_total_stakes();
        self.select_committee_and_set_voting_power(max_committee_size)?;

        for validator in self.active_validators.iter_mut() {
            validator.effectuate_staged_metadata();
        }
        Ok(())
    }

    /// Each validator's share of `total_reward`, proportional to voting power.
    fn compute_unadjusted_reward_distribution(&self, total_reward: u64) -> Vec<u64> {
        self.active_validators
            .iter()
            .map(|v| {
                (v.voting_power as u128 * total_reward as u128 / TOTAL_VOTING_POWER as u128) as u64
            })
            .collect()
    }

    /// Validators reported by peers holding at least a quorum of voting power.
    fn compute_slashed_validators(&self, report_records: &ValidatorReportRecords) -> Vec<Address> {
        report_records
            .iter()
            .filter(|(reportee, _)| self.is_active_validator(reportee))
            .filter_map(|(reportee, reporters)| {
                let reporter_votes = self.sum_voting_power_by_addresses(reporters);
                (reporter_votes >= QUORUM_THRESHOLD).then_some(*reportee)
            })
            .collect()
    }

    fn sum_voting_power_by_addresses(&self, addresses: &BTreeSet<Address>) -> VoteUnit {
        self.active_validators
            .iter()
            .filter(|v| addresses.contains(&v.address()))
            .map(|v| v.voting_power)
            .sum()
    }

    fn compute_adjusted_reward_distribution(
        &self,
        total_slashed_voting_power: VoteUnit,
        unadjusted_rewards: &[u64],
        total_adjustment: u64,
        individual_adjustments: &BTreeMap<usize, u64>,
    ) -> Vec<u64> {
        let total_unslashed_voting_power = TOTAL_VOTING_POWER.saturating_sub(total_slashed_voting_power);
        self.active_validators
            .iter()
            .enumerate()
            .map(|(i, v)| match individual_adjustments.get(&i) {
                Some(adjustment) => unadjusted_rewards[i] - adjustment,
                None if total_unslashed_voting_power == 0 => unadjusted_rewards[i],
                None => {
                    // Slashed rewards go to the unslashed, by voting power.
                    let tallying_rule_reward = total_adjustment as u128 * v.voting_power as u128
                        / total_unslashed_voting_power as u128;
                    unadjusted_rewards[i] + tallying_rule_reward as u64
                }
            })
            .collect()
    }

    /// Pays each validator its reward. The commission is restaked with the
    /// validator's own pool and the receipt sent to the validator; the rest
    /// compounds for all stakers.
    fn distribute_reward(
        &mut self,
        adjusted_rewards: &[u64],
        total_validator_rewards: &mut Balance,
        new_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult {
        let current_epoch = new_epoch - 1;
        for (validator, reward_amount) in self.active_validators.iter_mut().zip(adjusted_rewards) {
            let mut staker_reward = total_validator_rewards.split(*reward_amount)?;
            let commission_amount = (*reward_amount as u128 * validator.commission_rate as u128
                / BASIS_POINT_DENOMINATOR as u128) as u64;
            let validator_reward = staker_reward.split(commission_amount)?;

            if validator_reward.value() > 0 {
                let address = validator.address();
                let receipt =
                    validator.request_add_stake(validator_reward, address, current_epoch, ctx)?;
                ctx.transfer(receipt, address);
            }
            validator.deposit_stake_rewards(staker_reward)?;
        }
        Ok(())
    }

    fn emit_validator_epoch_events(
        &self,
        new_epoch: EpochId,
        adjusted_rewards: &[u64],
        report_records: &ValidatorReportRecords,
        slashed_indices: &BTreeSet<usize>,
        ctx: &mut TxContext,
    ) {
        for (i, validator) in self.active_validators.iter().enumerate() {
            let address = validator.address();
            ctx.emit(ValidatorEpochInfoEvent {
                epoch: new_epoch,
                validator_address: address,
                reference_gas_survey_quote: validator.gas_price,
                stake: validator.total_stake(),
                voting_power: validator.voting_power,
                commission_rate: validator.commission_rate,
                pool_staking_reward: adjusted_rewards[i],
                pool_token_exchange_rate: validator
                    .staking_pool
                    .pool_token_exchange_rate_at_epoch(new_epoch),
                tallying_rule_reporters: report_records.reporters_of(&address).into_iter().collect(),
                tallying_rule_global_score: if slashed_indices.contains(&i) { 0 } else { 1 },
            });
        }
    }

    fn process_pending_validators(&mut self, new_epoch: EpochId, ctx: &mut TxContext) -> SystemResult {
        for mut validator in std::mem::take(&mut self.pending_active_validators) {
            validator.activate(new_epoch)?;
            info!(validator = %validator.address(), epoch = new_epoch, "Validator joined");
            ctx.emit(ValidatorJoinEvent {
                epoch: new_epoch,
                validator_address: validator.address(),
                staking_pool_id: validator.staking_pool_id(),
            });
            self.active_validators.push(validator);
        }
        Ok(())
    }

    fn process_pending_removals(
        &mut self,
        report_records: &mut ValidatorReportRecords,
        new_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult {
        let mut removals = std::mem::take(&mut self.pending_removals);
        // Highest index first so the remaining indices stay valid.
        removals.sort_unstable_by(|a, b| b.cmp(a));
        for index in removals {
            let validator = self.active_validators.remove(index as usize);
            self.process_validator_departure(validator, report_records, true, new_epoch, ctx)?;
        }
        Ok(())
    }

    fn update_and_process_low_stake_departures(
        &mut self,
        rule: LowStakeRule,
        report_records: &mut ValidatorReportRecords,
        new_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult {
        for i in (0..self.active_validators.len()).rev() {
            let validator = &self.active_validators[i];
            let address = validator.address();
            let stake = validator.total_stake();

            if stake >= rule.low_stake_threshold {
                self.at_risk_validators.remove(&address);
            } else if stake >= rule.very_low_stake_threshold {
                let num_epochs_at_risk = self.at_risk_validators.get(&address).copied().unwrap_or(0) + 1;
                if num_epochs_at_risk > rule.grace_period {
                    warn!(validator = %address, stake, num_epochs_at_risk, "Removing low stake validator");
                    let validator = self.active_validators.remove(i);
                    self.process_validator_departure(validator, report_records, false, new_epoch, ctx)?;
                } else {
                    debug!(validator = %address, stake, num_epochs_at_risk, "Validator at risk");
                    self.at_risk_validators.insert(address, num_epochs_at_risk);
                }
            } else {
                warn!(validator = %address, stake, "Removing very low stake validator");
                let validator = self.active_validators.remove(i);
                self.process_validator_departure(validator, report_records, false, new_epoch, ctx)?;
            }
        }
        Ok(())
    }

    fn process_validator_departure(
        &mut self,
        mut validator: ValidatorV1,
        report_records: &mut ValidatorReportRecords,
        is_voluntary: bool,
        new_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult {
        let address = validator.address();
        let pool_id = validator.staking_pool_id();

        self.staking_pool_mappings.remove(&pool_id);
        self.at_risk_validators.remove(&address);
        self.total_stake = self.total_stake.saturating_sub(validator.total_stake());
        report_records.clean_leaving_validator(&address);

        info!(validator = %address, epoch = new_epoch, is_voluntary, "Validator left");
        ctx.emit(ValidatorLeaveEvent {
            epoch: new_epoch,
            validator_address: address,
            staking_pool_id: pool_id,
            is_voluntary,
        });

        validator.deactivate(new_epoch)?;
        self.inactive_validators.insert(pool_id, validator);
        Ok(())
    }

    fn calculate_total_stakes(&self) -> u64 {
        self.active_validators.iter().map(|v| v.total_stake()).sum()
    }

    /// Picks the `max_committee_size` largest validators and assigns their
    /// voting power. Everyone else gets none.
    fn select_committee_and_set_voting_power(&mut self, max_committee_size: u64) -> SystemResult {
        let mut by_stake: Vec<usize> = (0..self.active_validators.len()).collect();
        by_stake.sort_by(|a, b| {
            self.active_validators[*b].cmp_by_stake(&self.active_validators[*a])
        });
        by_stake.truncate(max_committee_size as usize);
        by_stake.sort_unstable();

        for validator in self.active_validators.iter_mut() {
            validator.voting_power = 0;
        }
        voting_power::set_voting_power(&mut self.active_validators, &by_stake)?;
        self.committee_members = by_stake.into_iter().map(|i| i as u64).collect();
        Ok(())
    }

    /// The gas price such that committee members holding at least
    /// `TOTAL_VOTING_POWER - QUORUM_THRESHOLD` voting power quoted it or more.
    pub fn derive_reference_gas_price(&self) -> u64 {
        let mut entries: Vec<(u64, VoteUnit)> = self
            .committee_validators()
            .map(|v| (v.gas_price, v.voting_power))
            .collect();
        entries.sort_unstable_by(|a, b| b.0.cmp(&a.0));

        let threshold = TOTAL_VOTING_POWER - QUORUM_THRESHOLD;
        let mut sum = 0;
        let mut result = 0;
        for (gas_price, voting_power) in entries {
            if sum >= threshold {
                break;
            }
            result = gas_price;
            sum += voting_power;
        }
        result
    }

    // ==== queries ====

    pub fn active_validator_addresses(&self) -> Vec<Address> {
        self.active_validators.iter().map(|v| v.address()).collect()
    }

    pub fn committee_addresses(&self) -> Vec<Address> {
        self.committee_validators().map(|v| v.address()).collect()
    }

    pub fn validator_total_stake_amount(&self, address: &Address) -> SystemResult<u64> {
        Ok(self.get_active_validator_ref(address)?.total_stake())
    }

    pub fn validator_stake_amount(&self, address: &Address) -> SystemResult<u64> {
        Ok(self
            .get_validator_ref_including_candidates(address)?
            .total_stake())
    }

    pub fn validator_voting_power(&self, address: &Address) -> SystemResult<u64> {
        Ok(self.get_active_validator_ref(address)?.voting_power)
    }

    pub fn validator_staking_pool_id(&self, address: &Address) -> SystemResult<ObjectID> {
        Ok(self
            .get_validator_ref_including_candidates(address)?
            .staking_pool_id())
    }

    pub fn pool_exchange_rate_at_epoch(
        &self,
        pool_id: &ObjectID,
        epoch: EpochId,
    ) -> SystemResult<PoolTokenExchangeRate> {
        Ok(self
            .get_validator_by_pool_id(pool_id)?
            .staking_pool
            .pool_token_exchange_rate_at_epoch(epoch))
    }

    pub fn staking_pool_mappings(&self) -> &BTreeMap<ObjectID, Address> {
        &self.staking_pool_mappings
    }

    pub fn committee(&self, epoch: EpochId) -> Committee {
        let members: Vec<CommitteeMember> = self
            .committee_validators()
            .map(|v| v.to_committee_member())
            .collect();
        Committee { epoch, members }
    }
}

fn count_duplicates<'a>(
    validators: impl Iterator<Item = &'a ValidatorV1>,
    validator: &ValidatorV1,
    exclude: Option<Address>,
) -> usize {
    validators
        .filter(|v| Some(v.address()) != exclude)
        .filter(|v| v.is_duplicate(validator))
        .count()
}

/// Amount taken from each slashed validator, by index, and their total.
fn compute_reward_adjustments(
    slashed_indices: &BTreeSet<usize>,
    reward_slashing_rate: u64,
    unadjusted_rewards: &[u64],
) -> (u64, BTreeMap<usize, u64>) {
    let individual: BTreeMap<usize, u64> = slashed_indices
        .iter()
        .map(|i| {
            let adjustment = unadjusted_rewards[*i] as u128 * reward_slashing_rate as u128
                / BASIS_POINT_DENOMINATOR as u128;
            (*i, adjustment as u64)
        })
        .collect();
    let total = individual.values().sum();
    (total, individual)
}

#[cfg(test)]
#[path = "../unit_tests/validator_set_tests.rs"]
mod validator_set_tests;
