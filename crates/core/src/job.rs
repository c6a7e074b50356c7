// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuple generation jobs.
//!
//! A job is one N-party generation run. Every party holds its own copy,
//! all sharing the same [`JobSpec`]; the status is computed locally from
//! the tasks the party knows about.

use crate::generator::GeneratorSpec;
use crate::task::TaskState;
use crate::tuple::TupleType;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Immutable job parameters, published by the leader under the job's roster key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Chunk identifier, shared by every party.
    pub id: Uuid,
    #[serde(rename = "type")]
    pub tuple_type: TupleType,
    /// Number of tuples to generate.
    pub count: u64,
    pub generator: GeneratorSpec,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobState {
    #[default]
    Pending,
    Running,
    Completed,
    Failed,
}

crate::simple_display! {
    JobState {
        Pending => "Pending",
        Running => "Running",
        Completed => "Completed",
        Failed => "Failed",
    }
}

impl JobState {
    pub fn is_done(self) -> bool {
        matches!(self, JobState::Completed | JobState::Failed)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobStatus {
    pub state: JobState,
    /// Epoch ms of the last state change.
    pub last_transition_ms: u64,
    /// Set once the local chunk has been activated in the tuple store.
    #[serde(default)]
    pub activated: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    /// Name of the owning scheduler, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub spec: JobSpec,
    #[serde(default)]
    pub status: JobStatus,
}

impl Job {
    pub fn new(name: impl Into<String>, spec: JobSpec, now_ms: u64) -> Self {
        Self {
            name: name.into(),
            owner: None,
            spec,
            status: JobStatus { last_transition_ms: now_ms, ..JobStatus::default() },
        }
    }

    pub fn owned_by(mut self, owner: impl Into<String>) -> Self {
        self.owner = Some(owner.into());
        self
    }

    pub fn is_done(&self) -> bool {
        self.status.state.is_done()
    }

    /// Record a move to `state`. Returns false when already in that state.
    pub fn transition(&mut self, state: JobState, now_ms: u64) -> bool {
        if self.status.state == state {
            return false;
        }
        self.status.state = state;
        self.status.last_transition_ms = now_ms;
        true
    }

    /// Completed locally but the chunk has not been activated yet.
    pub fn awaits_activation(&self) -> bool {
        self.status.state == JobState::Completed && !self.status.activated
    }
}

/// Compute a job's state from the states of the tasks known locally.
///
/// Evaluated in order: too few tasks is `Pending`, any non-terminal task is
/// `Running`, any failure is `Failed`, otherwise `Completed`.
pub fn aggregate_state<I>(tasks: I, party_count: u32) -> JobState
where
    I: IntoIterator<Item = TaskState>,
{
    let states: Vec<TaskState> = tasks.into_iter().collect();
    if states.len() < party_count as usize {
        JobState::Pending
    } else if states.iter().any(|s| !s.is_done()) {
        JobState::Running
    } else if states.contains(&TaskState::Failed) {
        JobState::Failed
    } else {
        JobState::Completed
    }
}

crate::builder! {
    pub struct JobBuilder => Job {
        into {
            name: String = "scheduler-job",
        }
        set {
            spec: JobSpec = crate::test_support::job_spec(TupleType::BitGfp, 1_000),
            status: JobStatus = JobStatus::default(),
        }
        option {
            owner: String = None,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl JobBuilder {
    pub fn state(mut self, state: JobState) -> Self {
        self.status.state = state;
        self
    }

    pub fn tuple_type(mut self, tuple_type: TupleType) -> Self {
        self.spec.tuple_type = tuple_type;
        self
    }

    pub fn count(mut self, count: u64) -> Self {
        self.spec.count = count;
        self
    }

    pub fn transitioned_at(mut self, ms: u64) -> Self {
        self.status.last_transition_ms = ms;
        self
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
