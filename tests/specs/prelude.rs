// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared helpers for the specs.

pub use std::time::Duration;
pub use tg_adapters::WorkloadPhase;
pub use tg_core::{task_name, test_support, Job, JobState, Party, TaskState, TupleType};
pub use tg_engine::test_helpers::{test_config, wait_for, TestCluster, TestParty};
pub use tg_storage::ResourceStore;

pub const WAIT: Duration = Duration::from_secs(10);

/// Create `name` on the leader, as an operator or scheduler would.
pub async fn submit_job(cluster: &TestCluster, name: &str) -> Job {
    let job = Job::builder().name(name).spec(test_support::job_spec(TupleType::BitGfp, 1_000)).build();
    cluster.leader().resources.create_job(job.clone()).await.unwrap();
    job
}

pub fn job_state(party: &TestParty, job: &str) -> Option<JobState> {
    party.state().jobs.get(job).map(|j| j.status.state)
}

pub fn activated(party: &TestParty, job: &str) -> bool {
    party.state().jobs.get(job).is_some_and(|j| j.status.activated)
}

/// State of `party`'s own task for `job`.
pub fn local_task_state(party: &TestParty, job: &str) -> Option<TaskState> {
    let name = task_name(job, party.index());
    party.state().tasks.get(&name).map(|t| t.status.state)
}

/// State `party` holds for `player`'s task, mirrored or local.
pub fn task_state_of(party: &TestParty, job: &str, player: u32) -> Option<TaskState> {
    party.state().tasks.get(&task_name(job, player)).map(|t| t.status.state)
}

pub async fn wait_for_tasks(cluster: &TestCluster, job: &str, state: TaskState) {
    wait_for(&format!("every local task of {job} in {state}"), WAIT, || {
        cluster.parties.iter().all(|p| local_task_state(p, job) == Some(state))
    })
    .await;
}

/// Let every party's generator finish with `phase`.
pub fn finish_generators(cluster: &TestCluster, job: &str, phase: WorkloadPhase) {
    for party in &cluster.parties {
        party.launcher.set_generator_phase(&task_name(job, party.index()), phase);
    }
}

pub fn finish_provisioners(cluster: &TestCluster, job: &str, phase: WorkloadPhase) {
    for party in &cluster.parties {
        party.launcher.set_provisioner_phase(&task_name(job, party.index()), phase);
    }
}

/// Drive a submitted job through both workload phases on every party.
pub async fn run_to_completion(cluster: &TestCluster, job: &str) {
    cluster.assign_addresses(job);
    wait_for_tasks(cluster, job, TaskState::Generating).await;
    finish_generators(cluster, job, WorkloadPhase::Succeeded);
    wait_for_tasks(cluster, job, TaskState::Provisioning).await;
    finish_provisioners(cluster, job, WorkloadPhase::Succeeded);
    wait_for(&format!("{job} completed and activated everywhere"), WAIT, || {
        cluster
            .parties
            .iter()
            .all(|p| job_state(p, job) == Some(JobState::Completed) && activated(p, job))
    })
    .await;
}
