// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine timing configuration

use std::time::Duration;

/// Timing knobs shared by the party's loops.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Delay before retrying after a transient failure, and before
    /// restarting a torn-down roster watch.
    pub backoff: Duration,
    /// How often workload phases and rendezvous addresses are polled.
    pub workload_poll: Duration,
    /// Scheduler evaluation period.
    pub scheduler_interval: Duration,
    /// Lookups of a just-published remote job before an entry is dropped.
    pub job_lookup_attempts: u32,
    pub job_lookup_delay: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            backoff: Duration::from_secs(5),
            workload_poll: Duration::from_secs(5),
            scheduler_interval: Duration::from_secs(60),
            job_lookup_attempts: 10,
            job_lookup_delay: Duration::from_millis(100),
        }
    }
}

impl EngineConfig {
    tg_core::setters! {
        set {
            backoff: Duration,
            workload_poll: Duration,
            scheduler_interval: Duration,
            job_lookup_attempts: u32,
            job_lookup_delay: Duration,
        }
    }
}
