// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{info, warn};
use validator_system::base_types::{TransactionDigest, TxContext};
use validator_system::event::{SystemEpochInfoEvent, SystemEvent};
use validator_system::genesis::GenesisConfig;
use validator_system::store::{EpochChangeOutcome, SystemStateStore};
use validator_system::system_state::system_state_summary::SystemStateSummary;
use validator_system::{AdvanceEpochParams, SystemState, SystemStateTrait};

pub mod commands;

/// Gas figures fed into every simulated epoch change.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct EpochInputs {
    pub validator_subsidy: u64,
    pub storage_charge: u64,
    pub computation_charge: u64,
    pub computation_charge_burned: u64,
    pub storage_rebate: u64,
    pub non_refundable_storage_fee: u64,
    pub reward_slashing_rate: u64,
    /// Epochs that are forced into safe mode, e.g. to exercise recovery.
    #[serde(default)]
    pub safe_mode_epochs: Vec<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub struct EpochReport {
    pub epoch: u64,
    pub safe_mode: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub info: Option<SystemEpochInfoEvent>,
}

pub struct Simulation {
    pub reports: Vec<EpochReport>,
    pub store: SystemStateStore,
    pub max_committee_size: u64,
}

/// What the tool keeps on disk between runs: the persisted system state and
/// the committee size the epoch changes were driven with.
#[derive(Debug, Serialize, Deserialize)]
struct StateFile {
    max_committee_size: u64,
    system_state: Vec<u8>,
}

/// Builds the genesis described by `config` and runs `epochs` epoch changes
/// with the same inputs.
pub fn simulate(config: &GenesisConfig, epochs: u64, inputs: &EpochInputs) -> Result<Simulation> {
    let genesis = config.build().map_err(|e| anyhow!("Failed to build genesis: {e}"))?;
    let store = SystemStateStore::new(genesis.system_state);
    let reports = run_epochs(&store, epochs, inputs, config.max_committee_size)?;
    Ok(Simulation {
        reports,
        store,
        max_committee_size: config.max_committee_size,
    })
}

/// Runs `epochs` epoch changes against an existing store.
pub fn run_epochs(
    store: &SystemStateStore,
    epochs: u64,
    inputs: &EpochInputs,
    max_committee_size: u64,
) -> Result<Vec<EpochReport>> {
    let mut reports = Vec::with_capacity(epochs as usize);
    for _ in 0..epochs {
        let (epoch, protocol_version, start, duration) = store.read(|state| {
            (
                state.epoch() + 1,
                state.protocol_version(),
                state.epoch_start_timestamp_ms(),
                state.epoch_duration_ms(),
            )
        });
        let params = AdvanceEpochParams {
            epoch,
            next_protocol_version: protocol_version,
            validator_subsidy: inputs.validator_subsidy,
            storage_charge: inputs.storage_charge,
            computation_charge: inputs.computation_charge,
            computation_charge_burned: inputs.computation_charge_burned,
            storage_rebate: inputs.storage_rebate,
            non_refundable_storage_fee: inputs.non_refundable_storage_fee,
            reward_slashing_rate: if inputs.safe_mode_epochs.contains(&epoch) {
                // Out of range on purpose: the regular path rejects it.
                u64::MAX
            } else {
                inputs.reward_slashing_rate
            },
            epoch_start_timestamp_ms: start + duration,
            max_committee_size,
        };

        let mut ctx = TxContext::new_system(TransactionDigest::random());
        let outcome = store
            .change_epoch(&params, &mut ctx)
            .map_err(|e| anyhow!("Epoch change to {epoch} rejected: {e}"))?;
        let report = match outcome {
            EpochChangeOutcome::Normal { .. } => {
                let info = ctx.take_events().into_iter().find_map(|e| match e {
                    SystemEvent::SystemEpochInfo(info) => Some(info),
                    _ => None,
                });
                info!(epoch, "Simulated epoch change");
                EpochReport {
                    epoch,
                    safe_mode: false,
                    error: None,
                    info,
                }
            }
            EpochChangeOutcome::SafeMode { error } => {
                warn!(epoch, %error, "Simulated epoch change ended in safe mode");
                EpochReport {
                    epoch,
                    safe_mode: true,
                    error: Some(error.to_string()),
                    info: None,
                }
            }
        };
        reports.push(report);
    }
    Ok(reports)
}

/// Reads a state file, returning the system state and the committee size it
/// was advanced with.
pub fn read_state_file(path: &Path) -> Result<(SystemState, u64)> {
    let bytes = fs::read(path)
        .with_context(|| format!("Unable to read system state from {}", path.display()))?;
    let file: StateFile = bcs::from_bytes(&bytes)
        .with_context(|| format!("Unable to decode state file {}", path.display()))?;
    let state = SystemState::from_bytes(&file.system_state)
        .map_err(|e| anyhow!("Unable to decode system state in {}: {e}", path.display()))?;
    Ok((state, file.max_committee_size))
}

pub fn read_state(path: &Path) -> Result<SystemState> {
    Ok(read_state_file(path)?.0)
}

pub fn write_state(store: &SystemStateStore, max_committee_size: u64, path: &Path) -> Result<()> {
    let system_state = store
        .to_bytes()
        .map_err(|e| anyhow!("Unable to encode system state: {e}"))?;
    let bytes = bcs::to_bytes(&StateFile {
        max_committee_size,
        system_state,
    })?;
    fs::write(path, bytes)
        .with_context(|| format!("Unable to write system state to {}", path.display()))
}

pub fn summarize(path: &Path) -> Result<SystemStateSummary> {
    Ok(read_state(path)?.into_system_state_summary())
}
