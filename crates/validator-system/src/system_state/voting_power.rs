// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

//! Assignment of voting power to committee members.
//!
//! Voting power is proportional to stake, capped per validator, and always
//! sums to exactly `TOTAL_VOTING_POWER`. Power lost to the cap or to rounding
//! is handed out again starting from the largest stakers.

use crate::committee::{VoteUnit, MAX_VOTING_POWER, TOTAL_VOTING_POWER};
use crate::error::{SystemError, SystemResult};
use crate::fp_ensure;

use super::validator::ValidatorV1;

#[derive(Debug)]
struct VotingPowerInfo {
    validator_index: usize,
    voting_power: VoteUnit,
    stake: u64,
}

/// Highest voting power a single member can receive in a committee of `size`.
pub fn voting_power_threshold(size: usize) -> VoteUnit {
    if size == 0 {
        return TOTAL_VOTING_POWER;
    }
    TOTAL_VOTING_POWER.min(MAX_VOTING_POWER.max(TOTAL_VOTING_POWER.div_ceil(size as u64)))
}

/// Sets the voting power of `validators[i]` for every `i` in `members`.
pub fn set_voting_power(validators: &mut [ValidatorV1], members: &[usize]) -> SystemResult {
    fp_ensure!(!members.is_empty(), SystemError::EmptyCommittee);
    let threshold = voting_power_threshold(members.len());
    let (mut info_list, remaining_power) = init_voting_power_info(validators, members, threshold);
    adjust_voting_power(&mut info_list, threshold, remaining_power)?;
    for info in &info_list {
        validators[info.validator_index].voting_power = info.voting_power;
    }
    check_invariants(validators, members, threshold)
}

/// Initial power of each member, proportional to stake and capped at
/// `threshold`. Returns the members sorted by descending stake together with
/// the power left to distribute.
fn init_voting_power_info(
    validators: &[ValidatorV1],
    members: &[usize],
    threshold: VoteUnit,
) -> (Vec<VotingPowerInfo>, VoteUnit) {
    let total_stake: u128 = members
        .iter()
        .map(|i| validators[*i].total_stake() as u128)
        .sum();
    let mut total_power = 0;
    let mut result: Vec<VotingPowerInfo> = Vec::with_capacity(members.len());
    for &validator_index in members {
        let stake = validators[validator_index].total_stake();
        let adjusted_stake = if total_stake == 0 {
            0
        } else {
            stake as u128 * TOTAL_VOTING_POWER as u128 / total_stake
        };
        let voting_power = (adjusted_stake as u64).min(threshold);
        total_power += voting_power;
        let position = result
            .iter()
            .position(|info| info.stake <= stake)
            .unwrap_or(result.len());
        result.insert(
            position,
            VotingPowerInfo {
                validator_index,
                voting_power,
                stake,
            },
        );
    }
    (result, TOTAL_VOTING_POWER - total_power)
}

fn adjust_voting_power(
    info_list: &mut [VotingPowerInfo],
    threshold: VoteUnit,
    mut remaining_power: VoteUnit,
) -> SystemResult {
    let len = info_list.len();
    for (i, info) in info_list.iter_mut().enumerate() {
        if remaining_power == 0 {
            break;
        }
        // Spread what is left evenly over the members not visited yet.
        let planned = remaining_power.div_ceil((len - i) as u64);
        let target = threshold.min(info.voting_power + planned);
        let actual = (target - info.voting_power).min(remaining_power);
        info.voting_power += actual;
        remaining_power -= actual;
    }
    fp_ensure!(
        remaining_power == 0,
        SystemError::VotingPowerInvariantViolation(format!(
            "{remaining_power} voting power left undistributed"
        ))
    );
    Ok(())
}

fn check_invariants(
    validators: &[ValidatorV1],
    members: &[usize],
    threshold: VoteUnit,
) -> SystemResult {
    let total: VoteUnit = members.iter().map(|i| validators[*i].voting_power).sum();
    fp_ensure!(
        total == TOTAL_VOTING_POWER,
        SystemError::VotingPowerInvariantViolation(format!(
            "total voting power is {total}, expected {TOTAL_VOTING_POWER}"
        ))
    );
    for &i in members {
        let v = &validators[i];
        fp_ensure!(
            v.voting_power <= threshold,
            SystemError::VotingPowerInvariantViolation(format!(
                "validator {} has voting power {} over threshold {threshold}",
                v.address(),
                v.voting_power
            ))
        );
    }
    // A larger stake never gets less voting power.
    for &i in members {
        for &j in members {
            let (a, b) = (&validators[i], &validators[j]);
            fp_ensure!(
                a.total_stake() <= b.total_stake() || a.voting_power >= b.voting_power,
                SystemError::VotingPowerInvariantViolation(format!(
                    "validator {} has more stake but less voting power than {}",
                    a.address(),
                    b.address()
                ))
            );
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../unit_tests/voting_power_tests.rs"]
mod voting_power_tests;
