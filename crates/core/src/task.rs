// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-party tasks of a job.
//!
//! A task is local when its player is the hosting party, otherwise it is a
//! proxy mirroring the roster entry of a remote party.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskState {
    #[default]
    Preparing,
    Launching,
    Generating,
    Provisioning,
    Completed,
    Failed,
}

crate::simple_display! {
    TaskState {
        Preparing => "Preparing",
        Launching => "Launching",
        Generating => "Generating",
        Provisioning => "Provisioning",
        Completed => "Completed",
        Failed => "Failed",
    }
}

impl TaskState {
    pub fn is_done(self) -> bool {
        matches!(self, TaskState::Completed | TaskState::Failed)
    }
}

/// Status as published in a roster entry.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskStatus {
    pub state: TaskState,
    /// Rendezvous address of the party's generator, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,
}

impl TaskStatus {
    pub fn with_state(&self, state: TaskState) -> Self {
        Self { state, endpoint: self.endpoint.clone() }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    pub name: String,
    /// Name of the owning job.
    pub job: String,
    pub player: u32,
    #[serde(default)]
    pub status: TaskStatus,
}

impl Task {
    pub fn new(job: impl Into<String>, player: u32) -> Self {
        let job = job.into();
        Self { name: task_name(&job, player), job, player, status: TaskStatus::default() }
    }

    pub fn with_status(mut self, status: TaskStatus) -> Self {
        self.status = status;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TaskNameError {
    #[error("task name has no player suffix: {0}")]
    MissingPlayer(String),
    #[error("invalid player index in task name: {0}")]
    InvalidPlayer(String),
}

/// Resource name of the task for `player` within `job`.
pub fn task_name(job: &str, player: u32) -> String {
    format!("{job}-{player}")
}

/// Split a task name into its job name and player index.
pub fn job_name_for_task(name: &str) -> Result<(String, u32), TaskNameError> {
    let (job, player) =
        name.rsplit_once('-').ok_or_else(|| TaskNameError::MissingPlayer(name.to_string()))?;
    if job.is_empty() {
        return Err(TaskNameError::MissingPlayer(name.to_string()));
    }
    let player = player.parse::<u32>().map_err(|_| TaskNameError::InvalidPlayer(name.to_string()))?;
    Ok((job.to_string(), player))
}

crate::builder! {
    pub struct TaskBuilder => Task {
        into {
            name: String = "scheduler-job-0",
            job: String = "scheduler-job",
        }
        set {
            player: u32 = 0,
            status: TaskStatus = TaskStatus::default(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
impl TaskBuilder {
    pub fn state(mut self, state: TaskState) -> Self {
        self.status.state = state;
        self
    }

    pub fn endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.status.endpoint = Some(endpoint.into());
        self
    }
}

#[cfg(test)]
#[path = "task_tests.rs"]
mod tests;
