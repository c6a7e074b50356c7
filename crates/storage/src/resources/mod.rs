// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Party-local declarative resources: jobs, tasks, schedulers and generators.
//!
//! Ownership is explicit. Tasks are owned by their job and jobs optionally
//! by a scheduler; deleting a parent deletes its children. Every change is
//! announced as a [`ResourceEvent`] to subscribers, which is what drives
//! reconciliation.

mod memory;
mod snapshot;

pub use memory::{MemoryResourceStore, ResourceState};
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION};

use async_trait::async_trait;
use tg_core::{Job, JobStatus, Scheduler, Task, TaskStatus, TupleGenerator};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Job,
    Task,
    Scheduler,
    Generator,
}

tg_core::simple_display! {
    ResourceKind {
        Job => "job",
        Task => "task",
        Scheduler => "scheduler",
        Generator => "generator",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResourceError {
    #[error("{kind} not found: {name}")]
    NotFound { kind: ResourceKind, name: String },
    #[error("{kind} already exists: {name}")]
    AlreadyExists { kind: ResourceKind, name: String },
    #[error("resource store unavailable: {0}")]
    Unavailable(String),
}

impl ResourceError {
    pub fn not_found(kind: ResourceKind, name: &str) -> Self {
        Self::NotFound { kind, name: name.to_string() }
    }

    pub fn already_exists(kind: ResourceKind, name: &str) -> Self {
        Self::AlreadyExists { kind, name: name.to_string() }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists { .. })
    }
}

/// A resource was created, updated or deleted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceEvent {
    Job { name: String, owner: Option<String> },
    Task { name: String, job: String },
    Scheduler { name: String },
    Generator { name: String },
}

#[async_trait]
pub trait ResourceStore: Clone + Send + Sync + 'static {
    async fn get_job(&self, name: &str) -> Result<Option<Job>, ResourceError>;
    async fn list_jobs(&self) -> Result<Vec<Job>, ResourceError>;
    /// Fails with `AlreadyExists`, or `NotFound` when the owning scheduler is missing.
    async fn create_job(&self, job: Job) -> Result<(), ResourceError>;
    async fn update_job_status(&self, name: &str, status: JobStatus) -> Result<(), ResourceError>;
    /// Deletes the job and every task it owns. Returns whether it existed.
    async fn delete_job(&self, name: &str) -> Result<bool, ResourceError>;

    async fn get_task(&self, name: &str) -> Result<Option<Task>, ResourceError>;
    /// Tasks owned by `job`, in name order.
    async fn list_tasks(&self, job: &str) -> Result<Vec<Task>, ResourceError>;
    /// Fails with `AlreadyExists`, or `NotFound` when the owning job is missing.
    async fn create_task(&self, task: Task) -> Result<(), ResourceError>;
    async fn update_task_status(&self, name: &str, status: TaskStatus) -> Result<(), ResourceError>;
    async fn delete_task(&self, name: &str) -> Result<bool, ResourceError>;

    async fn get_scheduler(&self, name: &str) -> Result<Option<Scheduler>, ResourceError>;
    async fn list_schedulers(&self) -> Result<Vec<Scheduler>, ResourceError>;
    /// Create or replace a scheduler.
    async fn apply_scheduler(&self, scheduler: Scheduler) -> Result<(), ResourceError>;
    /// Deletes the scheduler and every job it owns.
    async fn delete_scheduler(&self, name: &str) -> Result<bool, ResourceError>;

    async fn list_generators(&self) -> Result<Vec<TupleGenerator>, ResourceError>;
    /// Create or replace a generator.
    async fn apply_generator(&self, generator: TupleGenerator) -> Result<(), ResourceError>;

    /// Receive every subsequent change.
    fn subscribe(&self) -> mpsc::UnboundedReceiver<ResourceEvent>;
}
