// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduler resource: concurrency limit, job TTL and per-type policies.

use crate::tuple::TupleType;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StrategyKind {
    #[default]
    Lottery,
    LeastAvailableFirst,
}

crate::simple_display! {
    StrategyKind {
        Lottery => "lottery",
        LeastAvailableFirst => "least-available-first",
    }
}

/// Scheduling policy for one tuple type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulingPolicy {
    #[serde(rename = "type")]
    pub tuple_type: TupleType,
    /// Generation is considered once fewer tuples than this are available.
    pub threshold: u64,
    /// Lottery weight.
    pub priority: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchedulerSpec {
    /// Maximum number of active jobs.
    pub concurrency: u32,
    /// Seconds a terminal job is retained before deletion.
    pub ttl_secs: u64,
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default)]
    pub policies: Vec<SchedulingPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchedulerSpecError {
    #[error("policy for {0} has zero priority")]
    ZeroPriority(TupleType),
    #[error("duplicate policy for {0}")]
    DuplicatePolicy(TupleType),
}

impl SchedulerSpec {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    pub fn policy_for(&self, tuple_type: TupleType) -> Option<&SchedulingPolicy> {
        self.policies.iter().find(|p| p.tuple_type == tuple_type)
    }

    pub fn validate(&self) -> Result<(), SchedulerSpecError> {
        let mut seen = HashSet::new();
        for policy in &self.policies {
            if policy.priority == 0 {
                return Err(SchedulerSpecError::ZeroPriority(policy.tuple_type));
            }
            if !seen.insert(policy.tuple_type) {
                return Err(SchedulerSpecError::DuplicatePolicy(policy.tuple_type));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scheduler {
    pub name: String,
    pub spec: SchedulerSpec,
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
