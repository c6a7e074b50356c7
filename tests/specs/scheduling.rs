// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Jobs originated by the leader's scheduler.

use crate::prelude::*;

const SCHEDULER: &str = "castor";

async fn configure_leader(cluster: &TestCluster, available: u64) {
    let leader = cluster.leader();
    leader
        .resources
        .apply_generator(test_support::generator("mp-spdz", &[(TupleType::BitGfp, 5_000)]))
        .await
        .unwrap();
    leader
        .resources
        .apply_scheduler(test_support::scheduler(SCHEDULER, 1, &[(TupleType::BitGfp, 10_000, 1)]))
        .await
        .unwrap();
    leader.tuple_store.set_available(TupleType::BitGfp, available);
}

fn scheduled_jobs(party: &TestParty) -> Vec<Job> {
    party.state().jobs.into_values().filter(|j| j.owner.as_deref() == Some(SCHEDULER)).collect()
}

async fn wait_for_scheduled(cluster: &TestCluster, count: usize) -> Vec<Job> {
    wait_for(&format!("{count} scheduled jobs"), WAIT, || scheduled_jobs(cluster.leader()).len() == count)
        .await;
    scheduled_jobs(cluster.leader())
}

#[tokio::test]
async fn scheduled_job_runs_everywhere_and_expires() {
    let mut cluster = TestCluster::new(3);
    configure_leader(&cluster, 2_000).await;
    cluster.start();

    let job = wait_for_scheduled(&cluster, 1).await.remove(0);
    cluster.leader().tuple_store.set_available(TupleType::BitGfp, 1_000_000);
    assert_eq!(job.spec.count, 5_000);
    assert_eq!(job.spec.generator.image, "registry.local/mp-spdz:test");

    wait_for("mirrors of the scheduled job", WAIT, || {
        cluster.parties.iter().all(|p| p.state().jobs.get(&job.name).is_some_and(|j| j.spec == job.spec))
    })
    .await;
    run_to_completion(&cluster, &job.name).await;

    cluster.clock.advance(Duration::from_secs(601));

    wait_for("expired job removed from every party", WAIT, || {
        cluster.parties.iter().all(|p| p.state().jobs.is_empty())
    })
    .await;
    wait_for("roster cleared", WAIT, || cluster.store.keys("/tg/roster/").is_empty()).await;
    cluster.shutdown().await;
}

#[tokio::test]
async fn next_job_waits_for_the_active_one() {
    let mut cluster = TestCluster::new(2);
    configure_leader(&cluster, 2_000).await;
    cluster.start();

    let first = wait_for_scheduled(&cluster, 1).await.remove(0);
    tokio::time::sleep(cluster.leader().runtime.config().scheduler_interval * 3).await;
    assert_eq!(scheduled_jobs(cluster.leader()).len(), 1);

    run_to_completion(&cluster, &first.name).await;

    let jobs = wait_for_scheduled(&cluster, 2).await;
    assert!(jobs.iter().any(|j| j.name != first.name));
    cluster.shutdown().await;
}
