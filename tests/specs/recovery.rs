// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parties that were down or lost their watch catch up by replay.

use crate::prelude::*;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

async fn stop(cancel: CancellationToken, handles: Vec<JoinHandle<()>>) {
    cancel.cancel();
    for handle in handles {
        handle.await.unwrap();
    }
}

#[tokio::test]
async fn late_party_replays_what_it_missed() {
    let cluster = TestCluster::new(3);
    let _p0 = cluster.start_party(0);
    let _p1 = cluster.start_party(1);
    submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");

    wait_for("party 1 endpoint on the leader", WAIT, || {
        cluster.leader().state().tasks.get(&task_name("job-a", 1)).is_some_and(|t| t.status.endpoint.is_some())
    })
    .await;
    assert!(cluster.party(2).state().jobs.is_empty());

    let _p2 = cluster.start_party(2);
    run_to_completion(&cluster, "job-a").await;
    cluster.shutdown().await;
}

#[tokio::test]
async fn restarted_party_resumes_from_its_head() {
    let cluster = TestCluster::new(3);
    let _p0 = cluster.start_party(0);
    let _p1 = cluster.start_party(1);
    let (cancel, handles) = cluster.start_party(2);
    let first = submit_job(&cluster, "job-a").await;
    run_to_completion(&cluster, "job-a").await;

    stop(cancel, handles).await;
    let head = cluster.party(2).runtime.roster().head(2).await.unwrap();
    assert!(head > 0);

    let second = submit_job(&cluster, "job-b").await;
    wait_for("leader to publish job-b", WAIT, || {
        cluster.store.keys("/tg/roster/default/job-b").iter().any(|k| k == "/tg/roster/default/job-b")
    })
    .await;
    assert!(!cluster.party(2).state().jobs.contains_key("job-b"));

    let _p2 = cluster.start_party(2);
    run_to_completion(&cluster, "job-b").await;

    assert_eq!(cluster.party(2).tuple_store.activated(), vec![first.spec.id, second.spec.id]);
    cluster.shutdown().await;
}

#[tokio::test]
async fn broken_watches_restart_without_losing_events() {
    let mut cluster = TestCluster::new(3);
    cluster.start();
    submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");
    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;

    cluster.store.fail_watchers();
    finish_generators(&cluster, "job-a", WorkloadPhase::Succeeded);
    wait_for_tasks(&cluster, "job-a", TaskState::Provisioning).await;
    cluster.store.fail_watchers();
    finish_provisioners(&cluster, "job-a", WorkloadPhase::Succeeded);

    wait_for("job-a completed everywhere", WAIT, || {
        cluster.parties.iter().all(|p| job_state(p, "job-a") == Some(JobState::Completed))
    })
    .await;
    wait_for("every dispatcher watching again", WAIT, || cluster.store.watcher_count() == 3).await;
    cluster.shutdown().await;
}

#[tokio::test]
async fn party_with_lost_state_rebuilds_from_roster() {
    let mut cluster = TestCluster::new(2);
    let _p0 = cluster.start_party(0);
    let (cancel, handles) = cluster.start_party(1);
    submit_job(&cluster, "job-a").await;
    cluster.assign_addresses("job-a");
    wait_for_tasks(&cluster, "job-a", TaskState::Generating).await;

    stop(cancel, handles).await;
    assert!(cluster.party(1).runtime.roster().head(1).await.unwrap() > 0);

    // Same player, empty resource store
    let party = Party::new(1, 2).unwrap();
    cluster.parties[1] = TestParty::new(party, &cluster.store, &cluster.clock, test_config());
    let _p1 = cluster.start_party(1);

    wait_for("job-a mirrored on the restarted party", WAIT, || {
        cluster.party(1).state().jobs.contains_key("job-a")
    })
    .await;
    run_to_completion(&cluster, "job-a").await;
    cluster.shutdown().await;
}
