// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-core: Data model for the tuple generation operator

pub mod macros;

pub mod clock;
pub mod generator;
pub mod job;
pub mod party;
pub mod scheduler;
pub mod task;
pub mod telemetry;
pub mod tuple;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use clock::{Clock, FakeClock, SystemClock};
pub use generator::{serviceable_generator, GeneratorSpec, PullPolicy, TupleGenerator, TupleTypeSpec};
#[cfg(any(test, feature = "test-support"))]
pub use job::JobBuilder;
pub use job::{aggregate_state, Job, JobSpec, JobState, JobStatus};
pub use party::{Party, PartyError, LEADER_INDEX};
pub use scheduler::{Scheduler, SchedulerSpec, SchedulerSpecError, SchedulingPolicy, StrategyKind};
#[cfg(any(test, feature = "test-support"))]
pub use task::TaskBuilder;
pub use task::{job_name_for_task, task_name, Task, TaskNameError, TaskState, TaskStatus};
pub use telemetry::{Telemetry, TupleMetrics};
pub use tuple::{TupleType, UnknownTupleType};
