// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

#[test]
#[serial]
fn identity_retry_defaults_to_a_minute() {
    std::env::remove_var("TG_IDENTITY_RETRY_MS");
    assert_eq!(identity_retry(), Duration::from_secs(60));
}

#[test]
#[serial]
fn identity_retry_reads_millis() {
    std::env::set_var("TG_IDENTITY_RETRY_MS", "250");
    assert_eq!(identity_retry(), Duration::from_millis(250));
    std::env::remove_var("TG_IDENTITY_RETRY_MS");
}

#[test]
#[serial]
fn unparsable_override_is_ignored() {
    std::env::set_var("TG_WATCH_BACKOFF_MS", "soon");
    assert_eq!(watch_backoff(), None);
    std::env::remove_var("TG_WATCH_BACKOFF_MS");
}

#[test]
#[serial]
fn workload_poll_is_unset_by_default() {
    std::env::remove_var("TG_WORKLOAD_POLL_MS");
    assert_eq!(workload_poll(), None);
}
