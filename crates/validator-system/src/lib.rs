// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Validator lifecycle, staking pools and the epoch change of a proof-of-stake
//! network, kept in one ledger value that every call mutates atomically.

pub mod balance;
pub mod base_types;
pub mod committee;
pub mod config;
pub mod crypto;
pub mod error;
pub mod event;
pub mod genesis;
pub mod governance;
pub mod network_address;
pub mod storage_fund;
pub mod store;
pub mod system_state;
pub mod test_utils;

pub use error::{SystemError, SystemResult};
pub use system_state::{AdvanceEpochParams, SystemState, SystemStateTrait};
