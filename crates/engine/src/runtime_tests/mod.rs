// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconcile passes driven one at a time against in-memory parties.

mod dispatcher;
mod job;
mod scheduler;
mod task;

use super::*;
use crate::test_helpers::{TestCluster, TestParty};
use tg_core::{test_support, Job, Task, TaskState, TaskStatus, TupleType};
use tg_storage::ResourceStore;

async fn reconcile(party: &TestParty, controller: Controller, name: &str) -> Requeue {
    party.runtime.reconcile(controller, name).await.unwrap()
}

/// Feed `party` every roster event past its head, as its dispatcher would.
async fn sync_roster(party: &TestParty) {
    let roster = party.runtime.roster();
    let player = party.index();
    let head = roster.head(player).await.unwrap();
    let mut stream = roster.watch(head + 1).await.unwrap();
    while let Ok(batch) = stream.try_recv() {
        let batch = batch.unwrap();
        for event in &batch.events {
            party.runtime.dispatch(event).await.unwrap();
        }
        roster.set_head(player, batch.revision).await.unwrap();
    }
}

fn job(name: &str) -> Job {
    Job::builder().name(name).spec(test_support::job_spec(TupleType::BitGfp, 1_000)).build()
}

/// Job on the leader, published and mirrored to every other party.
async fn published_job(cluster: &TestCluster, name: &str) -> Job {
    let job = job(name);
    cluster.leader().resources.create_job(job.clone()).await.unwrap();
    reconcile(cluster.leader(), Controller::Job, name).await;
    for party in &cluster.parties[1..] {
        sync_roster(party).await;
    }
    job
}

fn task_state(party: &TestParty, name: &str) -> Option<TaskState> {
    party.state().tasks.get(name).map(|t| t.status.state)
}

fn entry_status(state: TaskState, endpoint: Option<&str>) -> TaskStatus {
    TaskStatus { state, endpoint: endpoint.map(str::to_string) }
}

fn proxy(job: &str, player: u32, state: TaskState) -> Task {
    Task::new(job, player).with_status(entry_status(state, None))
}
