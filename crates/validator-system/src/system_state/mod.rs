// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{Address, EpochId, ObjectID, TxContext};
use crate::committee::Committee;
use crate::error::{SystemError, SystemResult};
use enum_dispatch::enum_dispatch;
use serde::{Deserialize, Serialize};
use tracing::{error, info};

use self::system_state_inner_v1::SystemStateInnerV1;
use self::system_state_inner_v2::SystemStateInnerV2;
use self::system_state_summary::SystemStateSummary;

pub mod report_records;
pub mod staking_pool;
pub mod system_state_inner_v1;
pub mod system_state_inner_v2;
pub mod system_state_summary;
pub mod validator;
pub mod validator_set;
pub mod voting_power;

/// The well known id of the root system state record.
pub const SYSTEM_STATE_OBJECT_ID: ObjectID = ObjectID::from_single_byte(5);

pub const INIT_SYSTEM_STATE_VERSION: u64 = 1;

pub const CURRENT_SYSTEM_STATE_VERSION: u64 = 2;

/// The root record: a fixed id and the version of the inner state stored
/// under it. Upgrades swap the inner state and keep the root.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
pub struct SystemStateWrapper {
    pub id: ObjectID,
    pub version: u64,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSystemState {
    wrapper: SystemStateWrapper,
    inner: Vec<u8>,
}

/// Inputs of one epoch change, supplied by the orchestrator.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq, Default)]
pub struct AdvanceEpochParams {
    /// The epoch being entered.
    pub epoch: EpochId,
    pub next_protocol_version: u64,
    /// Amount of validator rewards the protocol targets for the epoch.
    pub validator_subsidy: u64,
    pub storage_charge: u64,
    pub computation_charge: u64,
    pub computation_charge_burned: u64,
    pub storage_rebate: u64,
    pub non_refundable_storage_fee: u64,
    /// Share of a slashed validator's rewards that is taken away, in basis points.
    pub reward_slashing_rate: u64,
    pub epoch_start_timestamp_ms: u64,
    pub max_committee_size: u64,
}

/// This is the standard API that all inner system state types should implement.
#[enum_dispatch]
pub trait SystemStateTrait {
    fn epoch(&self) -> u64;
    fn reference_gas_price(&self) -> u64;
    fn protocol_version(&self) -> u64;
    fn system_state_version(&self) -> u64;
    fn epoch_start_timestamp_ms(&self) -> u64;
    fn epoch_duration_ms(&self) -> u64;
    fn safe_mode(&self) -> bool;
    fn total_supply(&self) -> u64;
    fn active_validator_addresses(&self) -> Vec<Address>;
    fn get_current_epoch_committee(&self) -> Committee;
    fn into_system_state_summary(self) -> SystemStateSummary;
}

/// SystemState provides an abstraction over every version of the inner ledger.
/// Reads dispatch to whatever version is stored; writes go through
/// [`SystemState::execute`], which upgrades to the current version first.
#[derive(Debug, Serialize, Deserialize, Clone, Eq, PartialEq)]
#[enum_dispatch(SystemStateTrait)]
pub enum SystemState {
    V1(SystemStateInnerV1),
    V2(SystemStateInnerV2),
}

impl SystemState {
    pub fn new_genesis(inner: SystemStateInnerV2) -> Self {
        SystemState::V2(inner)
    }

    pub fn version(&self) -> u64 {
        match self {
            SystemState::V1(_) => 1,
            SystemState::V2(_) => 2,
        }
    }

    pub fn wrapper(&self) -> SystemStateWrapper {
        SystemStateWrapper {
            id: SYSTEM_STATE_OBJECT_ID,
            version: self.version(),
        }
    }

    /// The current version of the inner state, migrating older versions in place.
    pub fn load_inner_maybe_upgrade(&mut self) -> SystemResult<&mut SystemStateInnerV2> {
        if let SystemState::V1(v1) = self {
            let v2 = SystemStateInnerV2::from(v1.clone());
            info!(
                from = INIT_SYSTEM_STATE_VERSION,
                to = CURRENT_SYSTEM_STATE_VERSION,
                "Upgrading system state"
            );
            *self = SystemState::V2(v2);
        }
        match self {
            SystemState::V2(inner) => Ok(inner),
            other => Err(SystemError::UnsupportedSystemStateVersion(other.version())),
        }
    }

    pub fn inner(&self) -> Option<&SystemStateInnerV2> {
        match self {
            SystemState::V2(inner) => Some(inner),
            SystemState::V1(_) => None,
        }
    }

    /// Runs one mutating call. The call sees a scratch copy of the state; the
    /// copy replaces `self` only if the call succeeds, and the events and
    /// transfers of a failed call are dropped from `ctx`.
    pub fn execute<T>(
        &mut self,
        ctx: &mut TxContext,
        f: impl FnOnce(&mut SystemStateInnerV2, &mut TxContext) -> SystemResult<T>,
    ) -> SystemResult<T> {
        let mut scratch = self.clone();
        let checkpoint = ctx.checkpoint();
        let result = scratch
            .load_inner_maybe_upgrade()
            .and_then(|inner| f(inner, ctx));
        match result {
            Ok(value) => {
                *self = scratch;
                Ok(value)
            }
            Err(err) => {
                ctx.rollback_to(checkpoint);
                Err(err)
            }
        }
    }

    pub fn to_bytes(&self) -> SystemResult<Vec<u8>> {
        let inner = match self {
            SystemState::V1(inner) => bcs::to_bytes(inner)?,
            SystemState::V2(inner) => bcs::to_bytes(inner)?,
        };
        Ok(bcs::to_bytes(&PersistedSystemState {
            wrapper: self.wrapper(),
            inner,
        })?)
    }

    pub fn from_bytes(bytes: &[u8]) -> SystemResult<Self> {
        let persisted: PersistedSystemState = bcs::from_bytes(bytes)?;
        if persisted.wrapper.id != SYSTEM_STATE_OBJECT_ID {
            return Err(SystemError::SystemStateSerialization(format!(
                "unexpected root id {}",
                persisted.wrapper.id
            )));
        }
        match persisted.wrapper.version {
            1 => Ok(SystemState::V1(bcs::from_bytes(&persisted.inner)?)),
            2 => Ok(SystemState::V2(bcs::from_bytes(&persisted.inner)?)),
            version => {
                error!("Unsupported system state version: {}", version);
                Err(SystemError::UnsupportedSystemStateVersion(version))
            }
        }
    }
}

#[cfg(test)]
#[path = "../unit_tests/system_state_tests.rs"]
mod system_state_tests;
