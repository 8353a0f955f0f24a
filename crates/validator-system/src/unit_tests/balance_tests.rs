// Copyright (c) Mysten Labs, Inc.
// SPDX-License-Identifier: Apache-2.0

use super::*;

#[test]
fn split_and_join() {
    let mut balance = Balance::new(100);
    let part = balance.split(30).unwrap();
    assert_eq!(part.value(), 30);
    assert_eq!(balance.value(), 70);
    assert_eq!(balance.join(part).unwrap(), 100);
}

#[test]
fn split_more_than_held_fails() {
    let mut balance = Balance::new(10);
    assert_eq!(
        balance.split(11),
        Err(SystemError::InsufficientBalance {
            balance: 10,
            required: 11
        })
    );
    assert_eq!(balance.value(), 10);
}

#[test]
fn join_overflow_is_reported() {
    let mut balance = Balance::new(u64::MAX);
    assert_eq!(
        balance.join(Balance::new(1)),
        Err(SystemError::ArithmeticOverflow)
    );
}

#[test]
fn withdraw_all_and_destroy_zero() {
    let mut balance = Balance::new(5);
    assert!(balance.clone().destroy_zero().is_err());
    let all = balance.withdraw_all();
    assert_eq!(all.value(), 5);
    balance.destroy_zero().unwrap();
}

#[test]
fn treasury_tracks_supply() {
    let (mut treasury, initial) = TreasuryCap::new(1_000);
    assert_eq!(initial.value(), 1_000);
    assert_eq!(treasury.total_supply(), 1_000);

    let minted = treasury.mint(500).unwrap();
    assert_eq!(minted.value(), 500);
    assert_eq!(treasury.total_supply(), 1_500);

    assert_eq!(treasury.burn(initial).unwrap(), 1_000);
    assert_eq!(treasury.total_supply(), 500);
}

#[test]
fn mint_overflow_leaves_supply_unchanged() {
    let (mut treasury, _) = TreasuryCap::new(u64::MAX);
    assert_eq!(treasury.mint(1), Err(SystemError::ArithmeticOverflow));
    assert_eq!(treasury.total_supply(), u64::MAX);
}
