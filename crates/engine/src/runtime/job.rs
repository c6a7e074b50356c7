// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job controller

use super::{Requeue, Runtime};
use crate::EngineError;
use tg_adapters::{TupleStore, WorkloadLauncher};
use tg_core::{aggregate_state, task_name, Clock, Job, Task};
use tg_storage::{ResourceStore, RosterStore};

impl<S, R, T, L, C> Runtime<S, R, T, L, C>
where
    S: RosterStore,
    R: ResourceStore,
    T: TupleStore,
    L: WorkloadLauncher,
    C: Clock,
{
    pub(crate) async fn reconcile_job(&self, name: &str) -> Result<Requeue, EngineError> {
        let Some(mut job) = self.resources.get_job(name).await? else {
            // Only the leader owns the shared job key
            if self.party.is_leader() && self.roster.delete_job(name).await? {
                tracing::info!(job = name, "removed roster key of deleted job");
            }
            return Ok(Requeue::Done);
        };

        if self.roster.job_spec(name).await?.is_none() {
            if !self.party.is_leader() {
                tracing::debug!(job = name, "roster key not visible yet");
                return Ok(Requeue::After(self.config.backoff));
            }
            let revision = self.roster.publish_job(name, &job.spec).await?;
            tracing::info!(job = name, id = %job.spec.id, revision, "published job");
        }

        self.ensure_local_task(name).await?;

        if !job.is_done() {
            let tasks = self.resources.list_tasks(name).await?;
            let states =
                tasks.iter().filter(|t| t.player < self.party.count()).map(|t| t.status.state);
            let from = job.status.state;
            let to = aggregate_state(states, self.party.count());
            if job.transition(to, self.clock.epoch_ms()) {
                self.resources.update_job_status(name, job.status.clone()).await?;
                tracing::info!(job = name, state.from = %from, state.to = %to, "job state changed");
            }
        }

        if job.awaits_activation() {
            self.activate(&mut job).await?;
        }
        Ok(Requeue::Done)
    }

    async fn ensure_local_task(&self, job: &str) -> Result<(), EngineError> {
        let player = self.party.index();
        if self.resources.get_task(&task_name(job, player)).await?.is_some() {
            return Ok(());
        }
        match self.resources.create_task(Task::new(job, player)).await {
            Ok(()) => {
                tracing::info!(job, player, "created local task");
                Ok(())
            }
            Err(e) if e.is_already_exists() => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Make the local chunk consumable. A failure leaves `activated` unset
    /// so the next pass tries again.
    async fn activate(&self, job: &mut Job) -> Result<(), EngineError> {
        if let Err(e) = self.tuple_store.activate_chunk(job.spec.id).await {
            tracing::warn!(job = %job.name, id = %job.spec.id, error = %e, "chunk activation failed");
            return Err(e.into());
        }
        job.status.activated = true;
        self.resources.update_job_status(&job.name, job.status.clone()).await?;
        tracing::info!(job = %job.name, id = %job.spec.id, "activated chunk");
        Ok(())
    }
}
