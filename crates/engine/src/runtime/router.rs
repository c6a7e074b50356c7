// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Resource change routing

use super::{Controller, Runtime};
use tg_adapters::{TupleStore, WorkloadLauncher};
use tg_core::Clock;
use tg_storage::{ResourceEvent, ResourceStore, RosterStore};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

impl<S, R, T, L, C> Runtime<S, R, T, L, C>
where
    S: RosterStore,
    R: ResourceStore,
    T: TupleStore,
    L: WorkloadLauncher,
    C: Clock,
{
    /// Map a resource change onto the controllers that must look at it.
    ///
    /// A task change also wakes its job, which aggregates task states; a job
    /// change wakes its owning scheduler, which counts active jobs.
    pub(crate) async fn route(&self, event: ResourceEvent) {
        match event {
            ResourceEvent::Job { name, owner } => {
                self.enqueue(Controller::Job, name);
                if let Some(owner) = owner {
                    self.enqueue(Controller::Scheduler, owner);
                }
            }
            ResourceEvent::Task { name, job } => {
                self.enqueue(Controller::Task, name);
                self.enqueue(Controller::Job, job);
            }
            ResourceEvent::Scheduler { name } => self.enqueue(Controller::Scheduler, name),
            // Generators change which types are serviceable
            ResourceEvent::Generator { .. } => match self.resources.list_schedulers().await {
                Ok(schedulers) => {
                    for scheduler in schedulers {
                        self.enqueue(Controller::Scheduler, scheduler.name);
                    }
                }
                Err(e) => tracing::warn!(error = %e, "cannot list schedulers after generator change"),
            },
        }
    }

    pub(crate) async fn route_events(
        self: std::sync::Arc<Self>,
        mut events: mpsc::UnboundedReceiver<ResourceEvent>,
        cancel: CancellationToken,
    ) {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                event = events.recv() => match event {
                    Some(event) => self.route(event).await,
                    None => {
                        tracing::warn!("resource event stream closed");
                        break;
                    }
                },
            }
        }
    }
}
