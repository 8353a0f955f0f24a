// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::Balance;
use crate::error::SystemResult;
use serde::{Deserialize, Serialize};

/// Currency set aside to pay back storage when objects are deleted.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Default)]
pub struct StorageFundV1 {
    /// Sum of the storage rebates of all live objects.
    pub total_object_storage_rebates: Balance,
    pub non_refundable_balance: Balance,
}

impl StorageFundV1 {
    pub fn new(initial_fund: Balance) -> Self {
        Self {
            total_object_storage_rebates: Balance::zero(),
            non_refundable_balance: initial_fund,
        }
    }

    /// Takes in the storage charges of the epoch, moves the non refundable
    /// part aside, and returns the rebates already paid to transaction senders
    /// so the caller can dispose of them.
    pub fn advance_epoch(
        &mut self,
        storage_charges: Balance,
        storage_rebate_amount: u64,
        non_refundable_storage_fee_amount: u64,
    ) -> SystemResult<Balance> {
        self.total_object_storage_rebates.join(storage_charges)?;

        let non_refundable_storage_fee = self
            .total_object_storage_rebates
            .split(non_refundable_storage_fee_amount)?;
        self.non_refundable_balance
            .join(non_refundable_storage_fee)?;

        self.total_object_storage_rebates
            .split(storage_rebate_amount)
    }

    pub fn total_object_storage_rebates(&self) -> u64 {
        self.total_object_storage_rebates.value()
    }

    pub fn non_refundable_balance(&self) -> u64 {
        self.non_refundable_balance.value()
    }

    pub fn total_balance(&self) -> u64 {
        self.total_object_storage_rebates.value() + self.non_refundable_balance.value()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SystemError;

    #[test]
    fn advance_epoch_moves_fees_and_returns_rebate() {
        let mut fund = StorageFundV1::new(Balance::new(100));
        let rebate = fund.advance_epoch(Balance::new(500), 200, 50).unwrap();
        assert_eq!(rebate.value(), 200);
        assert_eq!(fund.total_object_storage_rebates(), 250);
        assert_eq!(fund.non_refundable_balance(), 150);
        assert_eq!(fund.total_balance(), 400);
    }

    #[test]
    fn rebate_larger_than_fund_is_rejected() {
        let mut fund = StorageFundV1::default();
        let err = fund.advance_epoch(Balance::new(10), 20, 0).unwrap_err();
        assert_eq!(
            err,
            SystemError::InsufficientBalance {
                balance: 10,
                required: 20
            }
        );
    }
}
