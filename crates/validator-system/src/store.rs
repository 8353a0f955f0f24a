// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::balance::Balance;
use crate::base_types::TxContext;
use crate::error::{SystemError, SystemResult};
use crate::system_state::system_state_inner_v2::SystemStateInnerV2;
use crate::system_state::system_state_summary::SystemStateSummary;
use crate::system_state::{AdvanceEpochParams, SystemState, SystemStateTrait};
use parking_lot::RwLock;
use tracing::{error, info};

/// How an epoch change ended.
#[derive(Debug)]
pub enum EpochChangeOutcome {
    Normal {
        refunded_storage_rebate: Balance,
    },
    /// The regular epoch change failed with `error`; the epoch advanced in
    /// safe mode instead.
    SafeMode { error: SystemError },
}

/// Owns the system state. Mutating calls are serialized through the write
/// lock and each one either commits in full or leaves the state untouched.
pub struct SystemStateStore {
    state: RwLock<SystemState>,
}

impl SystemStateStore {
    pub fn new(state: SystemState) -> Self {
        Self {
            state: RwLock::new(state),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> SystemResult<Self> {
        Ok(Self::new(SystemState::from_bytes(bytes)?))
    }

    pub fn read<T>(&self, f: impl FnOnce(&SystemState) -> T) -> T {
        f(&self.state.read())
    }

    pub fn execute<T>(
        &self,
        ctx: &mut TxContext,
        f: impl FnOnce(&mut SystemStateInnerV2, &mut TxContext) -> SystemResult<T>,
    ) -> SystemResult<T> {
        self.state.write().execute(ctx, f)
    }

    /// Advances to `params.epoch`. Calls made out of order are rejected as is;
    /// any other failure of the regular path is logged and the epoch advances
    /// in safe mode.
    pub fn change_epoch(
        &self,
        params: &AdvanceEpochParams,
        ctx: &mut TxContext,
    ) -> SystemResult<EpochChangeOutcome> {
        let mut state = self.state.write();
        match state.execute(ctx, |inner, ctx| inner.advance_epoch(params, ctx)) {
            Ok(refunded_storage_rebate) => Ok(EpochChangeOutcome::Normal {
                refunded_storage_rebate,
            }),
            Err(err) if err.is_ordering_fault() => Err(err),
            Err(err) => {
                error!(
                    epoch = params.epoch,
                    fatal = err.is_fatal(),
                    "Failed to advance epoch, switching to safe mode: {err}"
                );
                state.execute(ctx, |inner, _| inner.advance_epoch_safe_mode(params))?;
                info!(epoch = state.epoch(), "Epoch advanced in safe mode");
                Ok(EpochChangeOutcome::SafeMode { error: err })
            }
        }
    }

    pub fn summary(&self) -> SystemStateSummary {
        self.state.read().clone().into_system_state_summary()
    }

    pub fn to_bytes(&self) -> SystemResult<Vec<u8>> {
        self.state.read().to_bytes()
    }

    pub fn into_inner(self) -> SystemState {
        self.state.into_inner()
    }
}
