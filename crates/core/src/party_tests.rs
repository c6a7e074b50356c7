// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    leader = { 0, 2, true },
    follower = { 1, 2, false },
    single_party = { 0, 1, true },
)]
fn valid_party(index: u32, count: u32, leader: bool) {
    let party = Party::new(index, count).unwrap();
    assert_eq!(party.is_leader(), leader);
    assert!(party.is_local(index));
    assert_eq!(party.players().count(), count as usize);
}

#[yare::parameterized(
    zero_count = { 0, 0, PartyError::NoParties },
    index_equals_count = { 2, 2, PartyError::IndexOutOfRange { index: 2, count: 2 } },
    index_past_count = { 7, 3, PartyError::IndexOutOfRange { index: 7, count: 3 } },
)]
fn invalid_party(index: u32, count: u32, expected: PartyError) {
    assert_eq!(Party::new(index, count).unwrap_err(), expected);
}

#[test]
fn display_shows_index_and_count() {
    assert_eq!(Party::new(1, 3).unwrap().to_string(), "1/3");
}
