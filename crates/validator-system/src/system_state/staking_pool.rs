// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::Balance;
use crate::base_types::{EpochId, ObjectID, TxContext};
use crate::error::{SystemError, SystemResult};
use crate::fp_ensure;
use crate::governance::StakeReceipt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Ratio between the currency held by a pool and the pool tokens issued for it.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Eq, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct PoolTokenExchangeRate {
    pub stake_amount: u64,
    pub pool_token_amount: u64,
}

impl PoolTokenExchangeRate {
    pub fn initial() -> Self {
        Self::default()
    }

    pub fn new(stake_amount: u64, pool_token_amount: u64) -> Self {
        Self {
            stake_amount,
            pool_token_amount,
        }
    }

    /// Value of `token_amount` pool tokens at this rate.
    pub fn get_stake_amount(&self, token_amount: u64) -> u64 {
        // When either amount is 0 the pool holds no stake, the other side may be dust.
        if self.stake_amount == 0 || self.pool_token_amount == 0 {
            return token_amount;
        }
        let res = self.stake_amount as u128 * token_amount as u128 / self.pool_token_amount as u128;
        res as u64
    }

    /// Pool tokens worth `stake_amount` at this rate.
    pub fn get_token_amount(&self, stake_amount: u64) -> u64 {
        if self.stake_amount == 0 || self.pool_token_amount == 0 {
            return stake_amount;
        }
        let res = self.pool_token_amount as u128 * stake_amount as u128 / self.stake_amount as u128;
        res as u64
    }
}

/// A validator's pool of delegated stake.
///
/// Principal stays inside the stake receipts; the pool keeps the accounting
/// (`stake_balance`, `pool_token_balance`) and owns the accrued rewards.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct StakingPoolV1 {
    pub id: ObjectID,
    /// `None` while the pool is preactive, i.e. its validator is a candidate.
    pub activation_epoch: Option<EpochId>,
    pub deactivation_epoch: Option<EpochId>,
    pub stake_balance: u64,
    pub rewards_pool: Balance,
    pub pool_token_balance: u64,
    pub exchange_rates: BTreeMap<EpochId, PoolTokenExchangeRate>,
    pub pending_stake: u64,
    pub pending_total_withdraw: u64,
    pub pending_pool_token_withdraw: u64,
}

impl StakingPoolV1 {
    pub fn new(ctx: &mut TxContext) -> Self {
        Self {
            id: ctx.fresh_id(),
            activation_epoch: None,
            deactivation_epoch: None,
            stake_balance: 0,
            rewards_pool: Balance::zero(),
            pool_token_balance: 0,
            exchange_rates: BTreeMap::new(),
            pending_stake: 0,
            pending_total_withdraw: 0,
            pending_pool_token_withdraw: 0,
        }
    }

    pub fn is_preactive(&self) -> bool {
        self.activation_epoch.is_none()
    }

    pub fn is_inactive(&self) -> bool {
        self.deactivation_epoch.is_some()
    }

    fn is_preactive_at_epoch(&self, epoch: EpochId) -> bool {
        match self.activation_epoch {
            None => true,
            Some(activation_epoch) => activation_epoch > epoch,
        }
    }

    pub fn request_add_stake(
        &mut self,
        stake: Balance,
        stake_activation_epoch: EpochId,
        ctx: &mut TxContext,
    ) -> SystemResult<StakeReceipt> {
        let amount = stake.value();
        fp_ensure!(!self.is_inactive(), SystemError::StakeToInactivePool(self.id));
        fp_ensure!(amount > 0, SystemError::InvalidStakeAmount);
        self.pending_stake = self
            .pending_stake
            .checked_add(amount)
            .ok_or(SystemError::ArithmeticOverflow)?;
        Ok(StakeReceipt::new(
            ctx.fresh_id(),
            self.id,
            stake_activation_epoch,
            stake,
        ))
    }

    /// Redeems `receipt` at the rate of `current_epoch` and returns principal plus
    /// accrued rewards. The accounting is settled at the next epoch change unless
    /// the pool is not active, in which case it is settled right away.
    pub fn request_withdraw_stake(
        &mut self,
        receipt: StakeReceipt,
        current_epoch: EpochId,
    ) -> SystemResult<Balance> {
        fp_ensure!(receipt.pool_id() == self.id, SystemError::WrongPool(self.id));

        // Stake that has not become active yet is returned as is.
        if receipt.stake_activation_epoch() > current_epoch && !self.is_preactive() {
            let principal = receipt.into_principal();
            self.pending_stake = self
                .pending_stake
                .checked_sub(principal.value())
                .ok_or(SystemError::ArithmeticOverflow)?;
            return Ok(principal);
        }

        let rate_at_staking_epoch =
            self.pool_token_exchange_rate_at_epoch(receipt.stake_activation_epoch());
        let mut principal = receipt.into_principal();
        let principal_amount = principal.value();
        let pool_token_withdraw_amount = rate_at_staking_epoch.get_token_amount(principal_amount);

        let rewards = self.withdraw_rewards(
            principal_amount,
            pool_token_withdraw_amount,
            current_epoch,
        )?;
        let total_withdraw_amount = principal_amount + rewards.value();

        self.pending_total_withdraw += total_withdraw_amount;
        self.pending_pool_token_withdraw += pool_token_withdraw_amount;

        if self.is_preactive() || self.is_inactive() {
            self.process_pending_stake_withdraw()?;
        }

        principal.join(rewards)?;
        Ok(principal)
    }

    fn withdraw_rewards(
        &mut self,
        principal_withdraw_amount: u64,
        pool_token_withdraw_amount: u64,
        epoch: EpochId,
    ) -> SystemResult<Balance> {
        let rate = self.pool_token_exchange_rate_at_epoch(epoch);
        let total_withdraw_amount = rate.get_stake_amount(pool_token_withdraw_amount);
        let reward_withdraw_amount = total_withdraw_amount
            .saturating_sub(principal_withdraw_amount)
            // Withdrawing the last stake of a pool may ask for more than rounding left behind.
            .min(self.rewards_pool.value());
        self.rewards_pool.split(reward_withdraw_amount)
    }

    /// Settles the epoch: withdrawals first, then deposits at the rate they
    /// leave behind, and records the rate for `new_epoch`.
    pub fn process_pending_stakes_and_withdraws(&mut self, new_epoch: EpochId) -> SystemResult {
        self.process_pending_stake_withdraw()?;
        self.process_pending_stake()?;
        self.exchange_rates.insert(
            new_epoch,
            PoolTokenExchangeRate::new(self.stake_balance, self.pool_token_balance),
        );
        self.check_balance_invariants(new_epoch)
    }

    fn process_pending_stake_withdraw(&mut self) -> SystemResult {
        self.stake_balance = self
            .stake_balance
            .checked_sub(self.pending_total_withdraw)
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.pool_token_balance = self
            .pool_token_balance
            .checked_sub(self.pending_pool_token_withdraw)
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.pending_total_withdraw = 0;
        self.pending_pool_token_withdraw = 0;
        Ok(())
    }

    pub fn process_pending_stake(&mut self) -> SystemResult {
        let latest_rate = PoolTokenExchangeRate::new(self.stake_balance, self.pool_token_balance);
        self.stake_balance = self
            .stake_balance
            .checked_add(self.pending_stake)
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.pool_token_balance = latest_rate.get_token_amount(self.stake_balance);
        self.pending_stake = 0;
        Ok(())
    }

    /// Rewards raise the stake balance without minting pool tokens.
    pub fn deposit_rewards(&mut self, rewards: Balance) -> SystemResult {
        self.stake_balance = self
            .stake_balance
            .checked_add(rewards.value())
            .ok_or(SystemError::ArithmeticOverflow)?;
        self.rewards_pool.join(rewards)?;
        Ok(())
    }

    pub fn activate(&mut self, activation_epoch: EpochId) -> SystemResult {
        fp_ensure!(self.is_preactive(), SystemError::PoolAlreadyActive(self.id));
        fp_ensure!(!self.is_inactive(), SystemError::StakeToInactivePool(self.id));
        self.activation_epoch = Some(activation_epoch);
        self.exchange_rates
            .insert(activation_epoch, PoolTokenExchangeRate::initial());
        debug!(pool_id = %self.id, activation_epoch, "Staking pool activated");
        Ok(())
    }

    pub fn deactivate(&mut self, deactivation_epoch: EpochId) -> SystemResult {
        fp_ensure!(!self.is_inactive(), SystemError::StakeToInactivePool(self.id));
        self.deactivation_epoch = Some(deactivation_epoch);
        debug!(pool_id = %self.id, deactivation_epoch, "Staking pool deactivated");
        Ok(())
    }

    /// The rate in force at `epoch`: 1:1 before activation, frozen after
    /// deactivation, otherwise the latest recorded rate at or before `epoch`.
    pub fn pool_token_exchange_rate_at_epoch(&self, epoch: EpochId) -> PoolTokenExchangeRate {
        if self.is_preactive_at_epoch(epoch) {
            return PoolTokenExchangeRate::initial();
        }
        let epoch = self.deactivation_epoch.map_or(epoch, |d| d.min(epoch));
        let activation_epoch = self.activation_epoch.unwrap_or_default();
        self.exchange_rates
            .range(activation_epoch..=epoch)
            .next_back()
            .map(|(_, rate)| *rate)
            .unwrap_or_default()
    }

    fn check_balance_invariants(&self, epoch: EpochId) -> SystemResult {
        let rate = self.pool_token_exchange_rate_at_epoch(epoch);
        let expected = rate.get_token_amount(self.stake_balance);
        fp_ensure!(
            expected == self.pool_token_balance,
            SystemError::TokenBalancesDoNotMatchExchangeRate(self.id)
        );
        Ok(())
    }

    /// Principal plus rewards a receipt would redeem for at `epoch`.
    pub fn estimated_withdraw_amount(&self, receipt: &StakeReceipt, epoch: EpochId) -> u64 {
        if receipt.stake_activation_epoch() > epoch {
            return receipt.principal();
        }
        let tokens = self
            .pool_token_exchange_rate_at_epoch(receipt.stake_activation_epoch())
            .get_token_amount(receipt.principal());
        self.pool_token_exchange_rate_at_epoch(epoch)
            .get_stake_amount(tokens)
            .max(receipt.principal())
    }
}

#[cfg(test)]
#[path = "../unit_tests/staking_pool_tests.rs"]
mod staking_pool_tests;
