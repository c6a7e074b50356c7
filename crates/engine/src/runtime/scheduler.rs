// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduling engine. Runs on the leader only.

use super::{Requeue, Runtime};
use crate::strategy::{Candidate, SchedulingStrategy};
use crate::EngineError;
use rand::seq::SliceRandom;
use std::collections::HashMap;
use std::time::Duration;
use tg_adapters::{TupleStore, WorkloadLauncher};
use tg_core::{
    serviceable_generator, Clock, Job, JobSpec, Scheduler, TupleGenerator, TupleType,
};
use tg_storage::{ResourceStore, RosterStore};
use uuid::Uuid;

impl<S, R, T, L, C> Runtime<S, R, T, L, C>
where
    S: RosterStore,
    R: ResourceStore,
    T: TupleStore,
    L: WorkloadLauncher,
    C: Clock,
{
    pub(crate) async fn reconcile_scheduler(&self, name: &str) -> Result<Requeue, EngineError> {
        if !self.party.is_leader() {
            return Ok(Requeue::Done);
        }
        let Some(scheduler) = self.resources.get_scheduler(name).await? else {
            return Ok(Requeue::Done);
        };
        let next = Requeue::After(self.config.scheduler_interval);
        if let Err(e) = scheduler.spec.validate() {
            tracing::warn!(scheduler = name, error = %e, "invalid scheduler spec");
            return Ok(next);
        }

        self.delete_expired_jobs(scheduler.spec.ttl()).await?;

        let active: Vec<Job> =
            self.resources.list_jobs().await?.into_iter().filter(|j| !j.is_done()).collect();
        if active.len() >= scheduler.spec.concurrency as usize {
            tracing::debug!(scheduler = name, active = active.len(), "concurrency limit reached");
            return Ok(next);
        }

        let telemetry = self.tuple_store.telemetry().await?;
        let mut in_flight: HashMap<TupleType, u64> = HashMap::new();
        for job in &active {
            *in_flight.entry(job.spec.tuple_type).or_default() += job.spec.count;
        }
        let generators = self.resources.list_generators().await?;
        let candidates: Vec<Candidate> = scheduler
            .spec
            .policies
            .iter()
            .filter(|p| serviceable_generator(&generators, p.tuple_type).is_some())
            .map(|p| Candidate {
                tuple_type: p.tuple_type,
                available: telemetry
                    .available(p.tuple_type)
                    .saturating_add(in_flight.get(&p.tuple_type).copied().unwrap_or(0)),
                threshold: p.threshold,
                priority: p.priority,
            })
            .collect();

        let selected = {
            let mut rng = self.rng.lock();
            scheduler.spec.strategy.select(&candidates, &mut *rng)
        };
        match selected {
            Some(tuple_type) => self.create_scheduled_job(&scheduler, &generators, tuple_type).await?,
            None => tracing::debug!(scheduler = name, candidates = candidates.len(), "nothing to schedule"),
        }
        Ok(next)
    }

    /// Delete terminal jobs older than `ttl`, in random order, stopping at
    /// the first failure.
    async fn delete_expired_jobs(&self, ttl: Duration) -> Result<(), EngineError> {
        let mut expired: Vec<Job> = self
            .resources
            .list_jobs()
            .await?
            .into_iter()
            .filter(|j| j.is_done() && self.clock.elapsed_since(j.status.last_transition_ms) > ttl)
            .collect();
        expired.shuffle(&mut *self.rng.lock());
        for job in expired {
            self.resources.delete_job(&job.name).await?;
            tracing::info!(job = %job.name, state = %job.status.state, "deleted expired job");
        }
        Ok(())
    }

    async fn create_scheduled_job(
        &self,
        scheduler: &Scheduler,
        generators: &[TupleGenerator],
        tuple_type: TupleType,
    ) -> Result<(), EngineError> {
        let Some((generator, support)) = serviceable_generator(generators, tuple_type) else {
            return Ok(());
        };
        let id = Uuid::new_v4();
        let spec = JobSpec {
            id,
            tuple_type,
            count: support.batch_size,
            generator: generator.generator.clone(),
        };
        let name = format!("{}-{}", scheduler.name, id);
        let job = Job::new(name.as_str(), spec, self.clock.epoch_ms()).owned_by(scheduler.name.as_str());
        self.resources.create_job(job).await?;
        tracing::info!(
            scheduler = %scheduler.name,
            job = %name,
            %tuple_type,
            count = support.batch_size,
            generator = %generator.name,
            "scheduled job"
        );
        Ok(())
    }
}
