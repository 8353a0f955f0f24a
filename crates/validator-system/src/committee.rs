// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use crate::base_types::{Address, EpochId};
use serde::{Deserialize, Serialize};
use serde_with::{hex::Hex, serde_as};

pub type VoteUnit = u64;

/// Set total_voting_power as 10_000 by convention. Individual voting powers can be interpreted
/// as easily understandable basis points (e.g., voting_power: 100 = 1%, voting_power: 1 = 0.01%).
pub const TOTAL_VOTING_POWER: VoteUnit = 10_000;

/// Quorum threshold for our fixed voting power--any message signed by this much voting power can be trusted
/// up to BFT assumptions
pub const QUORUM_THRESHOLD: VoteUnit = 6_667;

/// Validity threshold defined by f+1
pub const VALIDITY_THRESHOLD: VoteUnit = 3_334;

/// Cap on the voting power of a single validator, unless the committee is too
/// small for the total to be reached under it.
pub const MAX_VOTING_POWER: VoteUnit = 1_000;

/// One member of the committee of an epoch, with what peers need to reach it.
#[serde_as]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CommitteeMember {
    pub address: Address,
    pub voting_power: VoteUnit,
    #[serde_as(as = "Hex")]
    pub authority_pubkey_bytes: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub network_pubkey_bytes: Vec<u8>,
    #[serde_as(as = "Hex")]
    pub protocol_pubkey_bytes: Vec<u8>,
    pub net_address: String,
    pub p2p_address: String,
    pub primary_address: String,
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Committee {
    pub epoch: EpochId,
    pub members: Vec<CommitteeMember>,
}

impl Committee {
    pub fn total_votes(&self) -> VoteUnit {
        self.members.iter().map(|m| m.voting_power).sum()
    }

    pub fn weight(&self, address: &Address) -> VoteUnit {
        self.members
            .iter()
            .find(|m| &m.address == address)
            .map(|m| m.voting_power)
            .unwrap_or(0)
    }

    pub fn is_member(&self, address: &Address) -> bool {
        self.members.iter().any(|m| &m.address == address)
    }

    pub fn num_members(&self) -> usize {
        self.members.len()
    }

    pub fn reaches_quorum<'a>(&self, signers: impl IntoIterator<Item = &'a Address>) -> bool {
        signers.into_iter().map(|a| self.weight(a)).sum::<VoteUnit>() >= QUORUM_THRESHOLD
    }
}
