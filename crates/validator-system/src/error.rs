// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{Address, EpochId, ObjectID};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[macro_export]
macro_rules! fp_bail {
    ($e:expr) => {
        return Err($e)
    };
}

#[macro_export(local_inner_macros)]
macro_rules! fp_ensure {
    ($cond:expr, $e:expr) => {
        if !($cond) {
            fp_bail!($e);
        }
    };
}

/// Reasons a piece of validator metadata fails verification.
#[derive(Eq, PartialEq, Clone, Copy, Debug, Serialize, Deserialize, Error, Hash)]
pub enum MetadataError {
    #[error("invalid proof of possession")]
    InvalidPop,
    #[error("invalid authority public key")]
    InvalidAuthorityPubkey,
    #[error("invalid network public key")]
    InvalidNetPubkey,
    #[error("invalid protocol public key")]
    InvalidProtocolPubkey,
    #[error("invalid network address")]
    InvalidNetAddr,
    #[error("invalid p2p address")]
    InvalidP2pAddr,
    #[error("invalid primary address")]
    InvalidPrimaryAddr,
}

/// Custom error type for the validator system.
#[derive(Eq, PartialEq, Clone, Debug, Serialize, Deserialize, Error, Hash)]
pub enum SystemError {
    // Metadata validation
    #[error("Validator metadata is invalid: {0}")]
    InvalidMetadata(MetadataError),
    #[error("Validator metadata field `{field}` has length {length}, limit is {limit}")]
    MetadataExceedingLengthLimit {
        field: String,
        length: usize,
        limit: usize,
    },
    #[error("Commission rate {rate} is higher than the maximum {max}")]
    CommissionRateTooHigh { rate: u64, max: u64 },
    #[error("Gas price {gas_price} is higher than the maximum {max}")]
    GasPriceHigherThanThreshold { gas_price: u64, max: u64 },
    #[error("Validator is a duplicate of an existing validator")]
    DuplicateValidator,

    // Lifecycle
    #[error("Address {0} is already a validator candidate")]
    AlreadyValidatorCandidate(Address),
    #[error("Address {0} is not a validator candidate")]
    NotValidatorCandidate(Address),
    #[error("Address {0} is not an active validator")]
    NotAValidator(Address),
    #[error("Address {0} is neither an active nor a pending validator")]
    NotActiveOrPendingValidator(Address),
    #[error("Address {0} is not a known validator")]
    ValidatorNotFound(Address),
    #[error("Validator {0} is not a candidate anymore")]
    ValidatorNotPreactive(Address),
    #[error("Validator {0} has already requested removal")]
    ValidatorAlreadyRemoved(Address),
    #[error("Validator stake {stake} is below the minimum joining stake {min}")]
    MinJoiningStakeNotReached { stake: u64, min: u64 },
    #[error("Validator count limit of {max} would be exceeded")]
    ValidatorCountLimitExceeded { max: u64 },
    #[error("Validator count would drop below the minimum of {min}")]
    BelowMinValidatorCount { min: u64 },
    #[error("Sender {sender} cannot register validator {address}")]
    SenderMismatch { sender: Address, address: Address },
    #[error("Operation capability {0} does not authorize this validator")]
    InvalidOperationCap(ObjectID),

    // Staking
    #[error("Stake amount must be positive")]
    InvalidStakeAmount,
    #[error("Stake amount {amount} is below the staking threshold {min}")]
    StakingBelowThreshold { amount: u64, min: u64 },
    #[error("No staking pool found with id {0}")]
    NoPoolFound(ObjectID),
    #[error("Stake receipt does not belong to staking pool {0}")]
    WrongPool(ObjectID),
    #[error("Stake receipts are not compatible for joining")]
    IncompatibleStakeReceipts,
    #[error("Cannot stake with an inactive staking pool {0}")]
    StakeToInactivePool(ObjectID),
    #[error("Staking pool {0} is already active")]
    PoolAlreadyActive(ObjectID),

    // Reports
    #[error("A validator cannot report itself")]
    CannotReportOneself,
    #[error("No report record found for validator {0}")]
    ReportRecordNotFound(Address),

    // Balances
    #[error("Balance {balance} is not enough to cover {required}")]
    InsufficientBalance { balance: u64, required: u64 },
    #[error("Arithmetic overflow in balance accounting")]
    ArithmeticOverflow,
    #[error("Basis points value {0} is above 10000")]
    BpsTooLarge(u64),
    #[error("Computation charge burned {burned} exceeds the computation charge {charge}")]
    BurnedExceedsComputationCharge { burned: u64, charge: u64 },
    #[error("Committee size must be positive")]
    EmptyCommittee,

    // Ordering and consistency faults
    #[error("Only the system address may call this function, sender is {0}")]
    NotSystemAddress(Address),
    #[error("Advancing to the wrong epoch: expected {expected}, requested {requested}")]
    AdvancedToWrongEpoch {
        expected: EpochId,
        requested: EpochId,
    },

    // Fatal invariant violations
    #[error("Validator {validator} has stake {pool_stake} but next epoch stake {next_epoch_stake}")]
    StakeBalanceMismatch {
        validator: Address,
        pool_stake: u64,
        next_epoch_stake: u64,
    },
    #[error("Token balance of staking pool {0} does not match its exchange rate")]
    TokenBalancesDoNotMatchExchangeRate(ObjectID),
    #[error("Safe mode gas accumulators were not fully processed")]
    SafeModeGasNotProcessed,
    #[error("Voting power invariant violated: {0}")]
    VotingPowerInvariantViolation(String),

    // System state object
    #[error("Unsupported system state version {0}")]
    UnsupportedSystemStateVersion(u64),
    #[error("Failed to serialize or deserialize the system state: {0}")]
    SystemStateSerialization(String),
}

pub type SystemResult<T = ()> = Result<T, SystemError>;

impl SystemError {
    /// Invariant violations indicate an accounting bug; the enclosing epoch
    /// transition must be abandoned.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            SystemError::StakeBalanceMismatch { .. }
                | SystemError::TokenBalancesDoNotMatchExchangeRate(_)
                | SystemError::SafeModeGasNotProcessed
                | SystemError::VotingPowerInvariantViolation(_)
                | SystemError::ArithmeticOverflow
        )
    }

    /// Faults caused by calling the engine out of order. Safe mode does not apply.
    pub fn is_ordering_fault(&self) -> bool {
        matches!(
            self,
            SystemError::NotSystemAddress(_) | SystemError::AdvancedToWrongEpoch { .. }
        )
    }
}

impl From<MetadataError> for SystemError {
    fn from(error: MetadataError) -> Self {
        SystemError::InvalidMetadata(error)
    }
}

impl From<bcs::Error> for SystemError {
    fn from(error: bcs::Error) -> Self {
        SystemError::SystemStateSerialization(error.to_string())
    }
}
