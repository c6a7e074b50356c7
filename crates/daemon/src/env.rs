// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::time::Duration;

fn millis(var: &str) -> Option<Duration> {
    std::env::var(var).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

/// Delay before a failed reconcile pass or a torn-down roster watch is
/// retried (`TG_WATCH_BACKOFF_MS`).
pub fn watch_backoff() -> Option<Duration> {
    millis("TG_WATCH_BACKOFF_MS")
}

/// Workload phase polling period override (`TG_WORKLOAD_POLL_MS`).
pub fn workload_poll() -> Option<Duration> {
    millis("TG_WORKLOAD_POLL_MS")
}

/// Retry period for the startup identity lookup (default 60s,
/// configurable via `TG_IDENTITY_RETRY_MS`).
pub fn identity_retry() -> Duration {
    millis("TG_IDENTITY_RETRY_MS").unwrap_or(Duration::from_secs(60))
}

/// How long shutdown waits for the loops to stop (default 5s,
/// configurable via `TG_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    millis("TG_DRAIN_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
