// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::{Balance, TreasuryCap};
use crate::base_types::{Address, EpochId};
use crate::committee::Committee;
use crate::storage_fund::StorageFundV1;
use serde::{Deserialize, Serialize};

use super::report_records::ValidatorReportRecords;
use super::system_state_inner_v2::SystemStateInnerV2;
use super::system_state_summary::SystemStateSummary;
use super::validator_set::{ValidatorSetV1, ValidatorSetV2};
use super::{SystemStateTrait, INIT_SYSTEM_STATE_VERSION};

/// One unit of the native currency in its smallest denomination.
pub const NANOS_PER_TOKEN: u64 = 1_000_000_000;

#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct SystemParametersV1 {
    /// The duration of an epoch, in milliseconds.
    pub epoch_duration_ms: u64,

    /// Minimum number of active validators at any moment.
    pub min_validator_count: u64,

    /// Maximum number of active validators at any moment.
    /// We do not allow the number of validators in any epoch to go above this.
    pub max_validator_count: u64,

    /// Lower-bound on the amount of stake required to become a validator.
    pub min_validator_joining_stake: u64,

    /// Validators with stake amount below `validator_low_stake_threshold` are considered to
    /// have low stake and will be escorted out of the validator set after being below this
    /// threshold for more than `validator_low_stake_grace_period` number of epochs.
    pub validator_low_stake_threshold: u64,

    /// Validators with stake below `validator_very_low_stake_threshold` will be removed
    /// immediately at epoch change, no grace period.
    pub validator_very_low_stake_threshold: u64,

    /// A validator can have stake below `validator_low_stake_threshold`
    /// for this many epochs before being kicked out.
    pub validator_low_stake_grace_period: u64,
}

impl Default for SystemParametersV1 {
    fn default() -> Self {
        Self {
            epoch_duration_ms: 24 * 60 * 60 * 1000,
            min_validator_count: 4,
            max_validator_count: 150,
            min_validator_joining_stake: 2_000_000 * NANOS_PER_TOKEN,
            validator_low_stake_threshold: 1_500_000 * NANOS_PER_TOKEN,
            validator_very_low_stake_threshold: 1_000_000 * NANOS_PER_TOKEN,
            validator_low_stake_grace_period: 7,
        }
    }
}

/// The first layout of the ledger. It predates committee selection and the
/// accumulator for burned computation charges, and is only ever read and
/// migrated.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct SystemStateInnerV1 {
    pub epoch: EpochId,
    pub protocol_version: u64,
    pub system_state_version: u64,
    pub treasury_cap: TreasuryCap,
    pub validators: ValidatorSetV1,
    pub storage_fund: StorageFundV1,
    pub parameters: SystemParametersV1,
    pub reference_gas_price: u64,
    pub validator_report_records: ValidatorReportRecords,
    pub safe_mode: bool,
    pub safe_mode_storage_charges: Balance,
    pub safe_mode_computation_charges: Balance,
    pub safe_mode_storage_rebates: u64,
    pub safe_mode_non_refundable_storage_fee: u64,
    pub epoch_start_timestamp_ms: u64,
}

impl SystemStateInnerV1 {
    /// A legacy ledger whose active validators are all committee members.
    pub fn new(
        treasury_cap: TreasuryCap,
        validators: ValidatorSetV1,
        storage_fund: StorageFundV1,
        parameters: SystemParametersV1,
        protocol_version: u64,
        epoch_start_timestamp_ms: u64,
    ) -> Self {
        Self {
            epoch: 0,
            protocol_version,
            system_state_version: INIT_SYSTEM_STATE_VERSION,
            treasury_cap,
            validators,
            storage_fund,
            parameters,
            reference_gas_price: 0,
            validator_report_records: ValidatorReportRecords::default(),
            safe_mode: false,
            safe_mode_storage_charges: Balance::zero(),
            safe_mode_computation_charges: Balance::zero(),
            safe_mode_storage_rebates: 0,
            safe_mode_non_refundable_storage_fee: 0,
            epoch_start_timestamp_ms,
        }
    }
}

impl SystemStateTrait for SystemStateInnerV1 {
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
        self.validators
            .active_validators
            .iter()
            .map(|v| v.address())
            .collect()
    }

    fn get_current_epoch_committee(&self) -> Committee {
        ValidatorSetV2::from(self.validators.clone()).committee(self.epoch)
    }

    fn into_system_state_summary(self) -> SystemStateSummary {
        let mut summary = SystemStateInnerV2::from(self).into_system_state_summary();
        summary.system_state_version = INIT_SYSTEM_STATE_VERSION;
        summary
    }
}
