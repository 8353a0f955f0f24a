// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::error::{SystemError, SystemResult};
use crate::fp_ensure;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// An amount of the native currency owned by some part of the ledger.
///
/// Balances are moved, never copied: splitting one balance decreases it, and
/// joining consumes the other side.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Default)]
pub struct Balance {
    value: u64,
}

impl Balance {
    pub fn new(value: u64) -> Self {
        Self { value }
    }

    pub fn zero() -> Self {
        Self { value: 0 }
    }

    pub fn value(&self) -> u64 {
        self.value
    }

    pub fn join(&mut self, other: Balance) -> SystemResult<u64> {
        self.value = self
            .value
            .checked_add(other.value)
            .ok_or(SystemError::ArithmeticOverflow)?;
        Ok(self.value)
    }

    pub fn split(&mut self, amount: u64) -> SystemResult<Balance> {
        fp_ensure!(
            self.value >= amount,
            SystemError::InsufficientBalance {
                balance: self.value,
                required: amount,
            }
        );
        self.value -= amount;
        Ok(Balance::new(amount))
    }

    pub fn withdraw_all(&mut self) -> Balance {
        Balance::new(std::mem::take(&mut self.value))
    }

    pub fn destroy_zero(self) -> SystemResult {
        fp_ensure!(
            self.value == 0,
            SystemError::InsufficientBalance {
                balance: 0,
                required: self.value,
            }
        );
        Ok(())
    }
}

/// The issuance capability of the native currency. Only the ledger holds one.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Default)]
pub struct TreasuryCap {
    total_supply: u64,
}

impl TreasuryCap {
    pub fn new(initial_supply: u64) -> (Self, Balance) {
        (
            Self {
                total_supply: initial_supply,
            },
            Balance::new(initial_supply),
        )
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn mint(&mut self, amount: u64) -> SystemResult<Balance> {
        self.total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(SystemError::ArithmeticOverflow)?;
        debug!(amount, total_supply = self.total_supply, "Minted");
        Ok(Balance::new(amount))
    }

    pub fn burn(&mut self, balance: Balance) -> SystemResult<u64> {
        let amount = balance.value();
        self.total_supply = self
            .total_supply
            .checked_sub(amount)
            .ok_or(SystemError::ArithmeticOverflow)?;
        debug!(amount, total_supply = self.total_supply, "Burned");
        Ok(amount)
    }
}

#[cfg(test)]
#[path = "unit_tests/balance_tests.rs"]
mod balance_tests;
