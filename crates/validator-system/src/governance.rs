// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::Balance;
use crate::base_types::{EpochId, ObjectID, TxContext};
use crate::error::{SystemError, SystemResult};
use crate::fp_ensure;
use serde::{Deserialize, Serialize};

/// Minimum principal of a single stake receipt, in the smallest currency unit.
pub const MIN_STAKING_THRESHOLD: u64 = 1_000_000_000;

/// Proof that `principal` was staked with the pool `pool_id`, counting from
/// `stake_activation_epoch`.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct StakeReceipt {
    id: ObjectID,
    pool_id: ObjectID,
    stake_activation_epoch: EpochId,
    principal: Balance,
}

impl StakeReceipt {
    pub(crate) fn new(
        id: ObjectID,
        pool_id: ObjectID,
        stake_activation_epoch: EpochId,
        principal: Balance,
    ) -> Self {
        Self {
            id,
            pool_id,
            stake_activation_epoch,
            principal,
        }
    }

    pub fn id(&self) -> ObjectID {
        self.id
    }

    pub fn pool_id(&self) -> ObjectID {
        self.pool_id
    }

    pub fn stake_activation_epoch(&self) -> EpochId {
        self.stake_activation_epoch
    }

    pub fn principal(&self) -> u64 {
        self.principal.value()
    }

    pub(crate) fn into_principal(self) -> Balance {
        self.principal
    }

    /// Splits `split_amount` off into a new receipt. Both halves must stay at or
    /// above the staking threshold.
    pub fn split(&mut self, split_amount: u64, ctx: &mut TxContext) -> SystemResult<StakeReceipt> {
        let original_amount = self.principal.value();
        fp_ensure!(
            split_amount <= original_amount,
            SystemError::InsufficientBalance {
                balance: original_amount,
                required: split_amount,
            }
        );
        let remaining_amount = original_amount - split_amount;
        fp_ensure!(
            remaining_amount >= MIN_STAKING_THRESHOLD,
            SystemError::StakingBelowThreshold {
                amount: remaining_amount,
                min: MIN_STAKING_THRESHOLD,
            }
        );
        fp_ensure!(
            split_amount >= MIN_STAKING_THRESHOLD,
            SystemError::StakingBelowThreshold {
                amount: split_amount,
                min: MIN_STAKING_THRESHOLD,
            }
        );
        Ok(StakeReceipt {
            id: ctx.fresh_id(),
            pool_id: self.pool_id,
            stake_activation_epoch: self.stake_activation_epoch,
            principal: self.principal.split(split_amount)?,
        })
    }

    pub fn is_equal_staking_metadata(&self, other: &StakeReceipt) -> bool {
        self.pool_id == other.pool_id && self.stake_activation_epoch == other.stake_activation_epoch
    }

    /// Merges `other` into this receipt; both must come from the same pool and
    /// activate in the same epoch.
    pub fn join(&mut self, other: StakeReceipt) -> SystemResult {
        fp_ensure!(
            self.is_equal_staking_metadata(&other),
            SystemError::IncompatibleStakeReceipts
        );
        self.principal.join(other.principal)?;
        Ok(())
    }
}
