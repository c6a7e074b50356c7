// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tg_core::{JobState, JobStatus};

#[tokio::test]
async fn leader_publishes_job_and_creates_local_task() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    let job = job("job-a");
    leader.resources.create_job(job.clone()).await.unwrap();

    assert_eq!(reconcile(leader, Controller::Job, "job-a").await, Requeue::Done);

    let spec = leader.runtime.roster().job_spec("job-a").await.unwrap();
    assert_eq!(spec, Some(job.spec));
    let task = leader.state().tasks.get("job-a-0").cloned().unwrap();
    assert_eq!((task.job.as_str(), task.player), ("job-a", 0));
    assert_eq!(leader.state().jobs["job-a"].status.state, JobState::Pending);
}

#[tokio::test]
async fn follower_waits_for_roster_key() {
    let cluster = TestCluster::new(2);
    let follower = cluster.party(1);
    follower.resources.create_job(job("job-a")).await.unwrap();

    let requeue = reconcile(follower, Controller::Job, "job-a").await;

    assert_eq!(requeue, Requeue::After(follower.runtime.config().backoff));
    assert!(follower.state().tasks.is_empty());
    assert_eq!(follower.runtime.roster().job_spec("job-a").await.unwrap(), None);
}

#[tokio::test]
async fn follower_mirror_creates_own_task() {
    let cluster = TestCluster::new(3);
    published_job(&cluster, "job-a").await;
    let follower = cluster.party(2);

    reconcile(follower, Controller::Job, "job-a").await;

    let tasks: Vec<String> = follower.state().tasks.keys().cloned().collect();
    assert_eq!(tasks, ["job-a-2"]);
}

#[tokio::test]
async fn deleted_job_removes_roster_key_on_leader_only() {
    let cluster = TestCluster::new(2);
    published_job(&cluster, "job-a").await;

    cluster.leader().resources.delete_job("job-a").await.unwrap();
    // Follower still holds its mirror but never touches the key
    cluster.party(1).resources.delete_job("job-a").await.unwrap();
    reconcile(cluster.party(1), Controller::Job, "job-a").await;
    assert!(cluster.leader().runtime.roster().job_spec("job-a").await.unwrap().is_some());

    reconcile(cluster.leader(), Controller::Job, "job-a").await;
    assert_eq!(cluster.leader().runtime.roster().job_spec("job-a").await.unwrap(), None);
}

#[yare::parameterized(
    too_few_tasks = { &[TaskState::Completed], JobState::Pending },
    one_running = { &[TaskState::Completed, TaskState::Generating], JobState::Running },
    running_beats_failed = { &[TaskState::Failed, TaskState::Preparing], JobState::Running },
    one_failed = { &[TaskState::Completed, TaskState::Failed], JobState::Failed },
    all_completed = { &[TaskState::Completed, TaskState::Completed], JobState::Completed },
)]
#[test_macro(tokio::test)]
async fn aggregates_task_states(states: &[TaskState], expected: JobState) {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader.resources.create_job(job("job-a")).await.unwrap();
    for (player, state) in states.iter().enumerate() {
        leader.resources.create_task(proxy("job-a", player as u32, *state)).await.unwrap();
    }

    reconcile(leader, Controller::Job, "job-a").await;

    let status = leader.state().jobs["job-a"].status.clone();
    assert_eq!(status.state, expected);
    assert_eq!(status.activated, expected == JobState::Completed);
}

#[tokio::test]
async fn completion_activates_chunk_once() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    let job = job("job-a");
    leader.resources.create_job(job.clone()).await.unwrap();
    for player in 0..2 {
        leader.resources.create_task(proxy("job-a", player, TaskState::Completed)).await.unwrap();
    }

    reconcile(leader, Controller::Job, "job-a").await;
    reconcile(leader, Controller::Job, "job-a").await;

    assert_eq!(leader.tuple_store.activated(), vec![job.spec.id]);
    assert_eq!(leader.tuple_store.activation_attempts().len(), 1);
}

#[tokio::test]
async fn failed_activation_is_retried_without_reverting_completion() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    let job = job("job-a");
    leader.resources.create_job(job.clone()).await.unwrap();
    for player in 0..2 {
        leader.resources.create_task(proxy("job-a", player, TaskState::Completed)).await.unwrap();
    }
    leader.tuple_store.fail_activations(1);

    let err = leader.runtime.reconcile(Controller::Job, "job-a").await.unwrap_err();
    assert!(err.is_transient());
    let status = leader.state().jobs["job-a"].status.clone();
    assert_eq!((status.state, status.activated), (JobState::Completed, false));

    reconcile(leader, Controller::Job, "job-a").await;
    let status = leader.state().jobs["job-a"].status.clone();
    assert_eq!((status.state, status.activated), (JobState::Completed, true));
    assert_eq!(leader.tuple_store.activation_attempts(), vec![job.spec.id, job.spec.id]);
    assert_eq!(leader.tuple_store.activated(), vec![job.spec.id]);
}

#[tokio::test]
async fn terminal_state_is_sticky() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    let status = JobStatus { state: JobState::Failed, last_transition_ms: 5, activated: false };
    let failed = Job { status, ..job("job-a") };
    leader.resources.create_job(failed).await.unwrap();
    for player in 0..2 {
        leader.resources.create_task(proxy("job-a", player, TaskState::Completed)).await.unwrap();
    }

    reconcile(leader, Controller::Job, "job-a").await;

    let status = leader.state().jobs["job-a"].status.clone();
    assert_eq!((status.state, status.last_transition_ms), (JobState::Failed, 5));
    assert!(leader.tuple_store.activation_attempts().is_empty());
}

#[tokio::test]
async fn transition_records_clock_time() {
    let cluster = TestCluster::new(1);
    let leader = cluster.leader();
    leader.resources.create_job(job("job-a")).await.unwrap();
    cluster.clock.set_epoch_ms(42_000);

    reconcile(leader, Controller::Job, "job-a").await;

    let status = leader.state().jobs["job-a"].status.clone();
    assert_eq!(status.state, JobState::Running);
    assert_eq!(status.last_transition_ms, 42_000);
}
