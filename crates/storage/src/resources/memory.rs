// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory resource store with parent indexing and optional snapshot file.

use super::snapshot::{self, Snapshot, SnapshotError};
use super::{ResourceError, ResourceEvent, ResourceKind, ResourceStore};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tg_core::{Job, JobStatus, Scheduler, Task, TaskStatus, TupleGenerator};
use tokio::sync::mpsc;

/// Persisted resource contents.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceState {
    #[serde(default)]
    pub jobs: BTreeMap<String, Job>,
    #[serde(default)]
    pub tasks: BTreeMap<String, Task>,
    #[serde(default)]
    pub schedulers: BTreeMap<String, Scheduler>,
    #[serde(default)]
    pub generators: BTreeMap<String, TupleGenerator>,
}

#[derive(Default)]
struct Inner {
    state: ResourceState,
    tasks_by_job: HashMap<String, BTreeSet<String>>,
    jobs_by_scheduler: HashMap<String, BTreeSet<String>>,
    subscribers: Vec<mpsc::UnboundedSender<ResourceEvent>>,
    unavailable: bool,
}

impl Inner {
    fn from_state(state: ResourceState) -> Self {
        let mut inner = Self::default();
        for task in state.tasks.values() {
            inner.tasks_by_job.entry(task.job.clone()).or_default().insert(task.name.clone());
        }
        for job in state.jobs.values() {
            if let Some(owner) = &job.owner {
                inner.jobs_by_scheduler.entry(owner.clone()).or_default().insert(job.name.clone());
            }
        }
        inner.state = state;
        inner
    }

    fn check(&self) -> Result<(), ResourceError> {
        if self.unavailable {
            return Err(ResourceError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn emit(&mut self, event: ResourceEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    fn remove_task(&mut self, name: &str) -> bool {
        let Some(task) = self.state.tasks.remove(name) else { return false };
        if let Some(names) = self.tasks_by_job.get_mut(&task.job) {
            names.remove(name);
            if names.is_empty() {
                self.tasks_by_job.remove(&task.job);
            }
        }
        self.emit(ResourceEvent::Task { name: task.name, job: task.job });
        true
    }

    fn remove_job(&mut self, name: &str) -> bool {
        let Some(job) = self.state.jobs.remove(name) else { return false };
        for task in self.tasks_by_job.remove(name).unwrap_or_default() {
            self.remove_task(&task);
        }
        if let Some(owner) = &job.owner {
            if let Some(names) = self.jobs_by_scheduler.get_mut(owner) {
                names.remove(name);
                if names.is_empty() {
                    self.jobs_by_scheduler.remove(owner);
                }
            }
        }
        self.emit(ResourceEvent::Job { name: job.name, owner: job.owner });
        true
    }
}

/// Resource store held in memory, shared between clones.
///
/// When opened on a snapshot file, every change is written through before
/// the call returns. A failed write leaves the change in memory and returns
/// [`ResourceError::Unavailable`], so callers retry it like any other
/// transient failure.
#[derive(Clone, Default)]
pub struct MemoryResourceStore {
    inner: Arc<Mutex<Inner>>,
    snapshot_path: Option<Arc<PathBuf>>,
    /// Serializes snapshot writes so a newer state is never overwritten by an older one.
    writer: Arc<tokio::sync::Mutex<()>>,
}

impl MemoryResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a store persisted at `path`, loading any existing snapshot.
    ///
    /// A snapshot that fails to parse is moved aside to a `.bak` file and the
    /// store starts empty.
    pub fn open(path: &Path) -> Result<Self, SnapshotError> {
        let state = match Snapshot::load(path) {
            Ok(Some(snapshot)) => snapshot.state,
            Ok(None) => ResourceState::default(),
            Err(SnapshotError::Json(e)) => {
                let bak = snapshot::rotate_bak_path(path);
                tracing::warn!(path = %path.display(), bak = %bak.display(), error = %e, "corrupt resource snapshot, starting empty");
                std::fs::rename(path, &bak)?;
                ResourceState::default()
            }
            Err(e) => return Err(e),
        };
        Ok(Self {
            inner: Arc::new(Mutex::new(Inner::from_state(state))),
            snapshot_path: Some(Arc::new(path.to_path_buf())),
            writer: Arc::default(),
        })
    }

    pub fn state(&self) -> ResourceState {
        self.inner.lock().state.clone()
    }

    /// Make every call fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }

    /// Write the current state to the snapshot file, off the async executor.
    async fn persist(&self) -> Result<(), ResourceError> {
        let Some(path) = &self.snapshot_path else { return Ok(()) };
        let _writer = self.writer.lock().await;
        let snapshot = Snapshot::new(self.state());
        let target = Arc::clone(path);
        tokio::task::spawn_blocking(move || snapshot.save(&target))
            .await
            .map_err(|e| ResourceError::Unavailable(format!("snapshot writer failed: {e}")))?
            .map_err(|e| {
                tracing::error!(path = %path.display(), error = %e, "failed to write resource snapshot");
                ResourceError::Unavailable(format!("failed to write resource snapshot: {e}"))
            })
    }
}

#[async_trait]
impl ResourceStore for MemoryResourceStore {
    async fn get_job(&self, name: &str) -> Result<Option<Job>, ResourceError> {
        let inner = self.inner.lock();
        inner.check()?;
        Ok(inner.state.jobs.get(name).cloned())
    }

    async fn list_jobs(&self) -> Result<Vec<Job>, ResourceError> {
        let inner = self.inner.lock();
        inner.check()?;
        Ok(inner.state.jobs.values().cloned().collect())
    }

    async fn create_job(&self, job: Job) -> Result<(), ResourceError> {
        {
            let mut inner = self.inner.lock();
            inner.check()?;
            if inner.state.jobs.contains_key(&job.name) {
                return Err(ResourceError::already_exists(ResourceKind::Job, &job.name));
            }
            if let Some(owner) = &job.owner {
                if !inner.state.schedulers.contains_key(owner) {
                    return Err(ResourceError::not_found(ResourceKind::Scheduler, owner));
                }
                inner.jobs_by_scheduler.entry(owner.clone()).or_default().insert(job.name.clone());
            }
            let event = ResourceEvent::Job { name: job.name.clone(), owner: job.owner.clone() };
            inner.state.jobs.insert(job.name.clone(), job);
            inner.emit(event);
        }
        self.persist().await
    }

    async fn update_job_status(&self, name: &str, status: JobStatus) -> Result<(), ResourceError> {
        {
            let mut inner = self.inner.lock();
            inner.check()?;
            let job = inner
                .state
                .jobs
                .get_mut(name)
                .ok_or_else(|| ResourceError::not_found(ResourceKind::Job, name))?;
            job.status = status;
            let event = ResourceEvent::Job { name: job.name.clone(), owner: job.owner.clone() };
            inner.emit(event);
        }
        self.persist().await
    }

    async fn delete_job(&self, name: &str) -> Result<bool, ResourceError> {
        let existed = {
            let mut inner = self.inner.lock();
            inner.check()?;
            inner.remove_job(name)
        };
        if existed {
            self.persist().await?;
        }
        Ok(existed)
    }

    async fn get_task(&self, name: &str) -> Result<Option<Task>, ResourceError> {
        let inner = self.inner.lock();
        inner.check()?;
        Ok(inner.state.tasks.get(name).cloned())
    }

    async fn list_tasks(&self, job: &str) -> Result<Vec<Task>, ResourceError> {
        let inner = self.inner.lock();
        inner.check()?;
        let names = inner.tasks_by_job.get(job).cloned().unwrap_or_default();
        Ok(names.iter().filter_map(|n| inner.state.tasks.get(n).cloned()).collect())
    }

    async fn create_task(&self, task: Task) -> Result<(), ResourceError> {
        {
            let mut inner = self.inner.lock();
            inner.check()?;
            if inner.state.tasks.contains_key(&task.name) {
                return Err(ResourceError::already_exists(ResourceKind::Task, &task.name));
            }
            if !inner.state.jobs.contains_key(&task.job) {
                return Err(ResourceError::not_found(ResourceKind::Job, &task.job));
            }
            inner.tasks_by_job.entry(task.job.clone()).or_default().insert(task.name.clone());
            let event = ResourceEvent::Task { name: task.name.clone(), job: task.job.clone() };
            inner.state.tasks.insert(task.name.clone(), task);
            inner.emit(event);
        }
        self.persist().await
    }

    async fn update_task_status(&self, name: &str, status: TaskStatus) -> Result<(), ResourceError> {
        {
            let mut inner = self.inner.lock();
            inner.check()?;
            let task = inner
                .state
                .tasks
                .get_mut(name)
                .ok_or_else(|| ResourceError::not_found(ResourceKind::Task, name))?;
            if task.status == status {
                return Ok(());
            }
            task.status = status;
            let event = ResourceEvent::Task { name: task.name.clone(), job: task.job.clone() };
            inner.emit(event);
        }
        self.persist().await
    }

    async fn delete_task(&self, name: &str) -> Result<bool, ResourceError> {
        let existed = {
            let mut inner = self.inner.lock();
            inner.check()?;
            inner.remove_task(name)
        };
        if existed {
            self.persist().await?;
        }
        Ok(existed)
    }

    async fn get_scheduler(&self, name: &str) -> Result<Option<Scheduler>, ResourceError> {
        let inner = self.inner.lock();
        inner.check()?;
        Ok(inner.state.schedulers.get(name).cloned())
    }

    async fn list_schedulers(&self) -> Result<Vec<Scheduler>, ResourceError> {
        let inner = self.inner.lock();
        inner.check()?;
        Ok(inner.state.schedulers.values().cloned().collect())
    }

    async fn apply_scheduler(&self, scheduler: Scheduler) -> Result<(), ResourceError> {
        {
            let mut inner = self.inner.lock();
            inner.check()?;
            if inner.state.schedulers.get(&scheduler.name) == Some(&scheduler) {
                return Ok(());
            }
            let event = ResourceEvent::Scheduler { name: scheduler.name.clone() };
            inner.state.schedulers.insert(scheduler.name.clone(), scheduler);
            inner.emit(event);
        }
        self.persist().await
    }

    async fn delete_scheduler(&self, name: &str) -> Result<bool, ResourceError> {
        {
            let mut inner = self.inner.lock();
            inner.check()?;
            if inner.state.schedulers.remove(name).is_none() {
                return Ok(false);
            }
            for job in inner.jobs_by_scheduler.remove(name).unwrap_or_default() {
                inner.remove_job(&job);
            }
            inner.emit(ResourceEvent::Scheduler { name: name.to_string() });
        }
        self.persist().await?;
        Ok(true)
    }

    async fn list_generators(&self) -> Result<Vec<TupleGenerator>, ResourceError> {
        let inner = self.inner.lock();
        inner.check()?;
        Ok(inner.state.generators.values().cloned().collect())
    }

    async fn apply_generator(&self, generator: TupleGenerator) -> Result<(), ResourceError> {
        {
            let mut inner = self.inner.lock();
            inner.check()?;
            if inner.state.generators.get(&generator.name) == Some(&generator) {
                return Ok(());
            }
            let event = ResourceEvent::Generator { name: generator.name.clone() };
            inner.state.generators.insert(generator.name.clone(), generator);
            inner.emit(event);
        }
        self.persist().await
    }

    fn subscribe(&self) -> mpsc::UnboundedReceiver<ResourceEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.lock().subscribers.push(tx);
        rx
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
