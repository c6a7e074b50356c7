// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::generator::{GeneratorSpec, PullPolicy, TupleGenerator, TupleTypeSpec};
use crate::job::JobSpec;
use crate::scheduler::{Scheduler, SchedulerSpec, SchedulingPolicy, StrategyKind};
use crate::tuple::TupleType;
use uuid::Uuid;

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::task::TaskState;
    use crate::tuple::TupleType;
    use proptest::prelude::*;

    pub fn arb_task_state() -> impl Strategy<Value = TaskState> {
        prop_oneof![
            Just(TaskState::Preparing),
            Just(TaskState::Launching),
            Just(TaskState::Generating),
            Just(TaskState::Provisioning),
            Just(TaskState::Completed),
            Just(TaskState::Failed),
        ]
    }

    pub fn arb_tuple_type() -> impl Strategy<Value = TupleType> {
        proptest::sample::select(TupleType::ALL.to_vec())
    }

    /// Resource names accepted in roster keys.
    pub fn arb_name() -> impl Strategy<Value = String> {
        "[A-Za-z0-9_][A-Za-z0-9_-]{0,23}"
    }
}

// ── Model factories ─────────────────────────────────────────────────────

pub const TEST_IMAGE: &str = "registry.local/generator:test";

pub fn job_spec(tuple_type: TupleType, count: u64) -> JobSpec {
    JobSpec {
        id: Uuid::new_v4(),
        tuple_type,
        count,
        generator: GeneratorSpec {
            image: TEST_IMAGE.to_string(),
            image_pull_policy: PullPolicy::IfNotPresent,
        },
    }
}

pub fn generator(name: &str, supports: &[(TupleType, u64)]) -> TupleGenerator {
    TupleGenerator {
        name: name.to_string(),
        generator: GeneratorSpec {
            image: format!("registry.local/{name}:test"),
            image_pull_policy: PullPolicy::IfNotPresent,
        },
        supports: supports
            .iter()
            .map(|&(tuple_type, batch_size)| TupleTypeSpec { tuple_type, batch_size })
            .collect(),
    }
}

/// Policy tuples are `(type, threshold, priority)`.
pub fn scheduler(name: &str, concurrency: u32, policies: &[(TupleType, u64, u32)]) -> Scheduler {
    Scheduler {
        name: name.to_string(),
        spec: SchedulerSpec {
            concurrency,
            ttl_secs: 600,
            strategy: StrategyKind::Lottery,
            policies: policies
                .iter()
                .map(|&(tuple_type, threshold, priority)| SchedulingPolicy {
                    tuple_type,
                    threshold,
                    priority,
                })
                .collect(),
        },
    }
}
