// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Task controller.
//!
//! Steps the local task of each job through its workloads:
//! Preparing → Launching → Generating → Provisioning → Completed, with
//! Failed reachable from the two observing states. The task's roster entry
//! is authoritative; the local resource mirrors it. Every transition
//! requeues so the next state is evaluated in its own pass.

use super::{Requeue, Runtime};
use crate::EngineError;
use tg_adapters::{GeneratorParams, ProvisionerParams, TupleStore, WorkloadLauncher, WorkloadPhase};
use tg_core::{job_name_for_task, task_name, Clock, Job, TaskState, TaskStatus};
use tg_storage::{ResourceStore, RosterStore};

impl<S, R, T, L, C> Runtime<S, R, T, L, C>
where
    S: RosterStore,
    R: ResourceStore,
    T: TupleStore,
    L: WorkloadLauncher,
    C: Clock,
{
    pub(crate) async fn reconcile_task(&self, name: &str) -> Result<Requeue, EngineError> {
        let (job_name, player) = job_name_for_task(name)?;
        let own = self.party.index();
        // Remote progress can unblock the local task
        let name = if player == own { name.to_string() } else { task_name(&job_name, own) };

        if self.resources.get_task(&name).await?.is_none() {
            if self.roster.delete_entry(&job_name, own).await? {
                tracing::info!(task = %name, "removed roster entry of deleted task");
            }
            self.launcher.release(&name).await?;
            return Ok(Requeue::Done);
        }
        let Some(job) = self.resources.get_job(&job_name).await? else {
            return Ok(Requeue::Done);
        };

        let status = match self.roster.entry(&job_name, own).await? {
            Some(status) => status,
            None => {
                let status = TaskStatus::default();
                self.roster.publish_entry(&job_name, own, &status).await?;
                self.resources.update_task_status(&name, status).await?;
                tracing::info!(task = %name, "published roster entry");
                return Ok(Requeue::Now);
            }
        };
        // Idempotent: unchanged statuses are not rewritten
        self.resources.update_task_status(&name, status.clone()).await?;

        match status.state {
            TaskState::Preparing => self.prepare(&name, &job, status).await,
            TaskState::Launching => self.launch(&name, &job, status).await,
            TaskState::Generating => self.observe_generator(&name, &job, status).await,
            TaskState::Provisioning => self.observe_provisioner(&name, &job, status).await,
            TaskState::Completed | TaskState::Failed => Ok(Requeue::Done),
        }
    }

    /// Endpoints of every party, indexed by player, if all are known.
    async fn endpoints(&self, job: &str, own: &TaskStatus) -> Result<Vec<Option<String>>, EngineError> {
        let mut endpoints = Vec::with_capacity(self.party.count() as usize);
        for player in self.party.players() {
            let endpoint = if self.party.is_local(player) {
                own.endpoint.clone()
            } else {
                self.roster.entry(job, player).await?.and_then(|s| s.endpoint)
            };
            endpoints.push(endpoint);
        }
        Ok(endpoints)
    }

    async fn prepare(&self, name: &str, job: &Job, mut status: TaskStatus) -> Result<Requeue, EngineError> {
        self.launcher.prepare(name).await?;
        let endpoints = self.endpoints(&job.name, &status).await?;
        if endpoints.iter().all(Option::is_some) {
            return self.set_state(name, job, status, TaskState::Launching).await;
        }
        if status.endpoint.is_some() {
            let missing = endpoints.iter().filter(|e| e.is_none()).count();
            tracing::debug!(task = name, missing, "waiting for peer endpoints");
            return Ok(Requeue::Done);
        }
        let Some(address) = self.launcher.rendezvous_address(name).await? else {
            return Ok(Requeue::After(self.config.workload_poll));
        };
        status.endpoint = Some(address);
        self.write_status(name, job, &status).await?;
        tracing::info!(task = name, endpoint = status.endpoint.as_deref(), "published endpoint");
        Ok(Requeue::Now)
    }

    async fn launch(&self, name: &str, job: &Job, status: TaskStatus) -> Result<Requeue, EngineError> {
        let endpoints = self.endpoints(&job.name, &status).await?;
        let Some(endpoints) = endpoints.into_iter().collect::<Option<Vec<String>>>() else {
            return Err(EngineError::Malformed(format!("task {name} is launching without every endpoint")));
        };
        let params = GeneratorParams {
            task: name.to_string(),
            job_id: job.spec.id,
            tuple_type: job.spec.tuple_type,
            count: job.spec.count,
            player: self.party.index(),
            endpoints,
            image: job.spec.generator.image.clone(),
            pull_policy: job.spec.generator.image_pull_policy,
        };
        self.launcher.start_generator(&params).await?;
        self.set_state(name, job, status, TaskState::Generating).await
    }

    async fn observe_generator(
        &self,
        name: &str,
        job: &Job,
        status: TaskStatus,
    ) -> Result<Requeue, EngineError> {
        match self.launcher.generator_phase(name).await? {
            WorkloadPhase::Succeeded => {
                let params = ProvisionerParams {
                    task: name.to_string(),
                    job_id: job.spec.id,
                    tuple_type: job.spec.tuple_type,
                };
                self.launcher.start_provisioner(&params).await?;
                self.set_state(name, job, status, TaskState::Provisioning).await
            }
            phase @ (WorkloadPhase::Failed | WorkloadPhase::Missing) => {
                tracing::warn!(task = name, %phase, "generator did not succeed");
                self.set_state(name, job, status, TaskState::Failed).await
            }
            WorkloadPhase::Pending | WorkloadPhase::Running => {
                Ok(Requeue::After(self.config.workload_poll))
            }
        }
    }

    async fn observe_provisioner(
        &self,
        name: &str,
        job: &Job,
        status: TaskStatus,
    ) -> Result<Requeue, EngineError> {
        match self.launcher.provisioner_phase(name).await? {
            WorkloadPhase::Succeeded => self.set_state(name, job, status, TaskState::Completed).await,
            phase @ (WorkloadPhase::Failed | WorkloadPhase::Missing) => {
                tracing::warn!(task = name, %phase, "provisioner did not succeed");
                self.set_state(name, job, status, TaskState::Failed).await
            }
            WorkloadPhase::Pending | WorkloadPhase::Running => {
                Ok(Requeue::After(self.config.workload_poll))
            }
        }
    }

    async fn set_state(
        &self,
        name: &str,
        job: &Job,
        status: TaskStatus,
        state: TaskState,
    ) -> Result<Requeue, EngineError> {
        let next = status.with_state(state);
        self.write_status(name, job, &next).await?;
        tracing::info!(task = name, state.from = %status.state, state.to = %state, "task state changed");
        Ok(Requeue::Now)
    }

    /// Roster entry first, then the local mirror.
    async fn write_status(&self, name: &str, job: &Job, status: &TaskStatus) -> Result<(), EngineError> {
        self.roster.publish_entry(&job.name, self.party.index(), status).await?;
        self.resources.update_task_status(name, status.clone()).await?;
        Ok(())
    }
}
