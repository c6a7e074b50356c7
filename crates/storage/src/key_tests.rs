// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use tg_core::test_support::strategies::arb_name;

#[test]
fn job_key_encodes_under_roster_root() {
    let key = RosterKey::new("default", "sched-1a2b").unwrap();
    assert_eq!(key.to_string(), "/tg/roster/default/sched-1a2b");
    assert_eq!(key.entry(2).to_string(), "/tg/roster/default/sched-1a2b/2");
}

#[test]
fn decodes_both_shapes() {
    let job: Key = "/tg/roster/foo/bar".parse().unwrap();
    assert_eq!(job, Key::Roster(RosterKey::new("foo", "bar").unwrap()));

    let entry: Key = "/tg/roster/foo/bar/1".parse().unwrap();
    let Key::Entry(entry) = entry else { panic!("expected entry key") };
    assert_eq!(entry.job(), "bar");
    assert_eq!(entry.roster().scope(), "foo");
    assert_eq!(entry.player(), 1);
}

#[yare::parameterized(
    non_integer = { "/tg/roster/foo/bar/1m" },
    exceeds_u32 = { "/tg/roster/foo/bar/8589934590" },
    exceeds_i64 = { "/tg/roster/foo/bar/9223372036854775807" },
    negative = { "/tg/roster/foo/bar/-1" },
    plus_sign = { "/tg/roster/foo/bar/+1" },
    leading_zero = { "/tg/roster/foo/bar/01" },
    inner_space = { "/tg/roster/foo/bar/1 " },
)]
fn invalid_player_index(s: &str) {
    assert_eq!(s.parse::<Key>().unwrap_err(), KeyError::InvalidPlayerIndex(s.to_string()));
}

#[test]
fn zero_player_is_canonical() {
    let key: Key = "/tg/roster/foo/bar/0".parse().unwrap();
    assert_eq!(key.to_string(), "/tg/roster/foo/bar/0");
}

#[yare::parameterized(
    wrong_root = { "/other/roster/foo/bar" },
    no_job = { "/tg/roster/foo" },
    empty_job = { "/tg/roster/foo/" },
    trailing_slash = { "/tg/roster/foo/bar/" },
    too_deep = { "/tg/roster/foo/bar/1/2" },
    bad_chars = { "/tg/roster/foo/b.r" },
    head_key = { "/tg/heads/0" },
)]
fn malformed(s: &str) {
    assert_eq!(s.parse::<Key>().unwrap_err(), KeyError::Malformed(s.to_string()));
}

#[test]
fn constructor_rejects_invalid_names() {
    assert!(RosterKey::new("default", "a/b").is_err());
    assert!(RosterKey::new("", "job").is_err());
}

#[test]
fn prefixes() {
    assert_eq!(roster_prefix("default"), "/tg/roster/default/");
    assert_eq!(head_key(3), "/tg/heads/3");
    assert!(RosterKey::new("default", "j").unwrap().to_string().starts_with(&roster_prefix("default")));
}

proptest! {
    #[test]
    fn job_key_round_trips(scope in arb_name(), job in arb_name()) {
        let key = RosterKey::new(scope, job).unwrap();
        let encoded = key.to_string();
        let decoded: Key = encoded.parse().unwrap();
        prop_assert_eq!(decoded.to_string(), encoded);
        prop_assert_eq!(decoded, Key::Roster(key));
    }

    #[test]
    fn entry_key_round_trips(scope in arb_name(), job in arb_name(), player in any::<u32>()) {
        let key = RosterKey::new(scope, job).unwrap().entry(player);
        let encoded = key.to_string();
        let decoded: Key = encoded.parse().unwrap();
        prop_assert_eq!(decoded.to_string(), encoded);
        prop_assert_eq!(decoded, Key::Entry(key));
    }

    #[test]
    fn accepted_entry_keys_re_encode_identically(player in "[-+ 0-9]{1,6}") {
        let text = format!("/tg/roster/foo/bar/{player}");
        if let Ok(key) = text.parse::<Key>() {
            prop_assert_eq!(key.to_string(), text);
        }
    }
}
