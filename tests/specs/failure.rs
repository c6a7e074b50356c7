// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Failures on one party surface on all of them.

use crate::prelude::*;

#[tokio::test]
async fn one_failed_generator_fails_the_job_on_every_party() {
    let mut cluster = TestCluster::new(3);
    cluster.start();
    submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");
    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;

    cluster.party(1).launcher.set_generator_phase(&task_name("job-a", 1), WorkloadPhase::Failed);

    wait_for("job-a failed everywhere", WAIT, || {
        cluster.parties.iter().all(|p| job_state(p, "job-a") == Some(JobState::Failed))
    })
    .await;
    // No abort crosses party boundaries
    assert_eq!(local_task_state(cluster.party(0), "job-a"), Some(TaskState::Generating));
    assert_eq!(local_task_state(cluster.party(2), "job-a"), Some(TaskState::Generating));
    for party in &cluster.parties {
        assert!(party.tuple_store.activation_attempts().is_empty());
    }
    cluster.shutdown().await;
}

#[tokio::test]
async fn failed_job_stays_failed_when_other_parties_finish() {
    let mut cluster = TestCluster::new(2);
    cluster.start();
    submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");
    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;

    cluster.party(1).launcher.set_generator_phase(&task_name("job-a", 1), WorkloadPhase::Failed);
    wait_for("job-a failed on the leader", WAIT, || {
        job_state(cluster.leader(), "job-a") == Some(JobState::Failed)
    })
    .await;

    cluster.leader().launcher.set_generator_phase(&task_name("job-a", 0), WorkloadPhase::Succeeded);
    cluster.leader().launcher.set_provisioner_phase(&task_name("job-a", 0), WorkloadPhase::Succeeded);
    wait_for("leader task completed", WAIT, || {
        local_task_state(cluster.leader(), "job-a") == Some(TaskState::Completed)
    })
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    assert_eq!(job_state(cluster.leader(), "job-a"), Some(JobState::Failed));
    assert!(cluster.leader().tuple_store.activation_attempts().is_empty());
    cluster.shutdown().await;
}

#[tokio::test]
async fn vanished_provisioner_fails_its_task() {
    let mut cluster = TestCluster::new(2);
    cluster.start();
    submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");
    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;
    finish_generators(&cluster, "job-a", WorkloadPhase::Succeeded);
    wait_for_tasks(&cluster, "job-a", TaskState::Provisioning).await;

    cluster.party(1).launcher.set_provisioner_phase(&task_name("job-a", 1), WorkloadPhase::Missing);

    wait_for("job-a failed everywhere", WAIT, || {
        cluster.parties.iter().all(|p| job_state(p, "job-a") == Some(JobState::Failed))
    })
    .await;
    cluster.shutdown().await;
}

#[tokio::test]
async fn activation_is_retried_until_it_succeeds() {
    let mut cluster = TestCluster::new(2);
    cluster.start();
    let job = submit_job(&cluster, "job-a").await;
    cluster.party(1).tuple_store.fail_activations(2);

    run_to_completion(&cluster, "job-a").await;

    let attempts = cluster.party(1).tuple_store.activation_attempts();
    assert_eq!(attempts, vec![job.spec.id; 3]);
    assert_eq!(cluster.party(1).tuple_store.activated(), vec![job.spec.id]);
    assert_eq!(cluster.leader().tuple_store.activation_attempts(), vec![job.spec.id]);
    cluster.shutdown().await;
}
