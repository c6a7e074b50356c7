// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A job submitted on the leader runs on every party and completes.

use crate::prelude::*;

#[tokio::test]
async fn three_parties_complete_and_activate_one_chunk() {
    let mut cluster = TestCluster::new(3);
    cluster.start();
    let job = submit_job(&cluster, "job-a").await;

    run_to_completion(&cluster, "job-a").await;

    for party in &cluster.parties {
        let mirror = &party.state().jobs["job-a"];
        assert_eq!(mirror.spec, job.spec, "party {} spec", party.index());
        assert_eq!(party.tuple_store.activated(), vec![job.spec.id], "party {}", party.index());
        for player in 0..3 {
            assert_eq!(task_state_of(party, "job-a", player), Some(TaskState::Completed));
        }
    }
    cluster.shutdown().await;
}

#[tokio::test]
async fn generators_receive_every_endpoint_in_player_order() {
    let mut cluster = TestCluster::new(3);
    cluster.start();
    let job = submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");

    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;

    for party in &cluster.parties {
        let params = party.launcher.generator_params(&task_name("job-a", party.index())).unwrap();
        assert_eq!(params.job_id, job.spec.id);
        assert_eq!(params.player, party.index());
        assert_eq!(params.count, 1_000);
        assert_eq!(params.endpoints, vec!["10.0.0.1:5000", "10.0.0.2:5000", "10.0.0.3:5000"]);
    }
    cluster.shutdown().await;
}

#[tokio::test]
async fn no_generator_starts_before_every_endpoint_is_known() {
    let mut cluster = TestCluster::new(3);
    cluster.start();
    submit_job(&cluster, "job-a").await;
    for party in &cluster.parties[..2] {
        party.launcher.set_address(&task_name("job-a", party.index()), "10.0.0.9:5000");
    }

    wait_for("party 2 to see both published endpoints", WAIT, || {
        let tasks = cluster.party(2).state().tasks;
        [0, 1].iter().all(|p| {
            tasks.get(&task_name("job-a", *p)).is_some_and(|t| t.status.endpoint.is_some())
        })
    })
    .await;
    tokio::time::sleep(Duration::from_millis(100)).await;

    for party in &cluster.parties {
        assert_eq!(local_task_state(party, "job-a"), Some(TaskState::Preparing));
        assert!(party.launcher.generator_params(&task_name("job-a", party.index())).is_none());
    }

    cluster.party(2).launcher.set_address(&task_name("job-a", 2), "10.0.0.3:5000");
    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;
    cluster.shutdown().await;
}

#[tokio::test]
async fn single_party_cluster_runs_alone() {
    let mut cluster = TestCluster::new(1);
    cluster.start();
    let job = submit_job(&cluster, "solo").await;

    run_to_completion(&cluster, "solo").await;

    assert_eq!(cluster.leader().tuple_store.activated(), vec![job.spec.id]);
    cluster.shutdown().await;
}

#[tokio::test]
async fn deleting_the_job_on_the_leader_removes_it_everywhere() {
    let mut cluster = TestCluster::new(3);
    cluster.start();
    submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");
    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;

    cluster.leader().resources.delete_job("job-a").await.unwrap();

    wait_for("every copy of job-a to be deleted", WAIT, || {
        cluster.parties.iter().all(|p| p.state().jobs.is_empty() && p.state().tasks.is_empty())
    })
    .await;
    wait_for("workloads released", WAIT, || {
        cluster.parties.iter().all(|p| p.launcher.released(&task_name("job-a", p.index())))
    })
    .await;
    wait_for("roster cleared", WAIT, || cluster.store.keys("/tg/roster/").is_empty()).await;
    cluster.shutdown().await;
}
