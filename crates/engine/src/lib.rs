// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-engine: per-party coordination loops
//!
//! One [`Runtime`] per party drives:
//! - the roster watch dispatcher, mirroring remote jobs and task progress
//! - the job controller, publishing jobs and aggregating task states
//! - the task controller, stepping local tasks through their workloads
//! - the scheduler, creating jobs on the leader

mod config;
mod error;
mod identity;
mod queue;
mod runtime;
pub mod strategy;

#[cfg(any(test, feature = "test-support"))]
pub mod test_helpers;

pub use config::EngineConfig;
pub use error::EngineError;
pub use identity::resolve_party;
pub use queue::WorkQueue;
pub use runtime::{Controller, Requeue, Runtime, RuntimeDeps};
pub use strategy::{Candidate, SchedulingStrategy};
