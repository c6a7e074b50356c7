// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-party runtime: shared state and the loops that drive it.
//!
//! Reconciliation is level-triggered. Resource changes land names on one
//! [`WorkQueue`] per controller, each controller drains its queue
//! sequentially, and a pass ends with a [`Requeue`] decision. The roster
//! watch runs beside them as a single sequential consumer.

mod dispatcher;
mod job;
mod router;
mod scheduler;
mod task;

use crate::{EngineConfig, EngineError, WorkQueue};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::sync::Arc;
use std::time::Duration;
use tg_adapters::{TupleStore, WorkloadLauncher};
use tg_core::{Clock, Party};
use tg_storage::{ResourceStore, Roster, RosterStore};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Outcome of a reconcile pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requeue {
    /// Nothing left to do until the next change.
    Done,
    /// Run again right away.
    Now,
    /// Run again after a delay.
    After(Duration),
}

/// The reconcile loops of a party.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Controller {
    Job,
    Task,
    Scheduler,
}

tg_core::simple_display! {
    Controller {
        Job => "job",
        Task => "task",
        Scheduler => "scheduler",
    }
}

/// Collaborators of the runtime.
pub struct RuntimeDeps<S, R, T, L> {
    pub roster: S,
    pub resources: R,
    pub tuple_store: T,
    pub launcher: L,
}

#[derive(Default)]
struct Queues {
    jobs: WorkQueue,
    tasks: WorkQueue,
    schedulers: WorkQueue,
}

/// One party's coordination runtime.
pub struct Runtime<S, R, T, L, C> {
    party: Party,
    roster: Roster<S>,
    resources: R,
    tuple_store: T,
    launcher: L,
    clock: C,
    config: EngineConfig,
    rng: Mutex<StdRng>,
    queues: Queues,
}

impl<S, R, T, L, C> Runtime<S, R, T, L, C>
where
    S: RosterStore,
    R: ResourceStore,
    T: TupleStore,
    L: WorkloadLauncher,
    C: Clock,
{
    pub fn new(
        party: Party,
        scope: impl Into<String>,
        deps: RuntimeDeps<S, R, T, L>,
        clock: C,
        config: EngineConfig,
    ) -> Self {
        Self {
            party,
            roster: Roster::new(deps.roster, scope),
            resources: deps.resources,
            tuple_store: deps.tuple_store,
            launcher: deps.launcher,
            clock,
            config,
            rng: Mutex::new(StdRng::from_entropy()),
            queues: Queues::default(),
        }
    }

    /// Use a deterministic random source for scheduling.
    pub fn with_seed(self, seed: u64) -> Self {
        Self { rng: Mutex::new(StdRng::seed_from_u64(seed)), ..self }
    }

    pub fn party(&self) -> Party {
        self.party
    }

    pub fn roster(&self) -> &Roster<S> {
        &self.roster
    }

    pub fn resources(&self) -> &R {
        &self.resources
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn queue(&self, controller: Controller) -> &WorkQueue {
        match controller {
            Controller::Job => &self.queues.jobs,
            Controller::Task => &self.queues.tasks,
            Controller::Scheduler => &self.queues.schedulers,
        }
    }

    pub fn enqueue(&self, controller: Controller, name: impl Into<String>) {
        self.queue(controller).enqueue(name);
    }

    /// Run one reconcile pass for `name`.
    pub async fn reconcile(&self, controller: Controller, name: &str) -> Result<Requeue, EngineError> {
        match controller {
            Controller::Job => self.reconcile_job(name).await,
            Controller::Task => self.reconcile_task(name).await,
            Controller::Scheduler => self.reconcile_scheduler(name).await,
        }
    }

    /// Queue every known resource for a first pass.
    pub async fn resync(&self) -> Result<(), EngineError> {
        for job in self.resources.list_jobs().await? {
            for task in self.resources.list_tasks(&job.name).await? {
                self.enqueue(Controller::Task, task.name);
            }
            self.enqueue(Controller::Job, job.name);
        }
        for scheduler in self.resources.list_schedulers().await? {
            self.enqueue(Controller::Scheduler, scheduler.name);
        }
        Ok(())
    }

    /// Start every loop of the party. They stop when `cancel` fires.
    pub fn start(self: &Arc<Self>, cancel: &CancellationToken) -> Vec<JoinHandle<()>> {
        // Subscribe before the resync lists resources so no change falls in between
        let events = self.resources.subscribe();
        let mut handles = vec![
            tokio::spawn(Arc::clone(self).route_events(events, cancel.clone())),
            tokio::spawn(Arc::clone(self).run_dispatcher(cancel.clone())),
        ];
        for controller in [Controller::Job, Controller::Task, Controller::Scheduler] {
            handles.push(tokio::spawn(Arc::clone(self).run_controller(controller, cancel.clone())));
        }
        let runtime = Arc::clone(self);
        handles.push(tokio::spawn(async move {
            if let Err(e) = runtime.resync().await {
                tracing::warn!(error = %e, "initial resync failed");
            }
        }));
        tracing::info!(party = %self.party, scope = self.roster.scope(), "runtime started");
        handles
    }

    async fn run_controller(self: Arc<Self>, controller: Controller, cancel: CancellationToken) {
        let queue = self.queue(controller).clone();
        loop {
            let name = tokio::select! {
                _ = cancel.cancelled() => break,
                name = queue.next() => name,
            };
            match self.reconcile(controller, &name).await {
                Ok(Requeue::Done) => {}
                Ok(Requeue::Now) => queue.enqueue(name),
                Ok(Requeue::After(delay)) => queue.enqueue_after(name, delay),
                Err(e) if e.is_transient() => {
                    tracing::warn!(%controller, name, error = %e, "reconcile failed, retrying");
                    queue.enqueue_after(name, self.config.backoff);
                }
                Err(e) => {
                    tracing::error!(%controller, name, error = %e, "dropping malformed reconcile request");
                }
            }
        }
        tracing::debug!(%controller, "controller stopped");
    }
}

#[cfg(test)]
#[path = "../runtime_tests/mod.rs"]
mod tests;
