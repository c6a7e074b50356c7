// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::time::Duration;
use tg_core::{JobState, StrategyKind};

const SCHEDULER: &str = "sched";

/// Leader with a scheduler for the given policies and one generator per type.
async fn leader_with(cluster: &TestCluster, concurrency: u32, policies: &[(TupleType, u64, u32)]) {
    let resources = &cluster.leader().resources;
    resources
        .apply_scheduler(test_support::scheduler(SCHEDULER, concurrency, policies))
        .await
        .unwrap();
    for (i, (tuple_type, _, _)) in policies.iter().enumerate() {
        resources
            .apply_generator(test_support::generator(&format!("gen-{i}"), &[(*tuple_type, 5_000)]))
            .await
            .unwrap();
    }
}

fn scheduled_jobs(party: &TestParty) -> Vec<Job> {
    party.state().jobs.into_values().filter(|j| j.owner.as_deref() == Some(SCHEDULER)).collect()
}

#[tokio::test]
async fn schedules_below_threshold_type() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 2, &[(TupleType::BitGfp, 10_000, 1)]).await;
    leader.tuple_store.set_available(TupleType::BitGfp, 2_000);

    let requeue = reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    assert_eq!(requeue, Requeue::After(leader.runtime.config().scheduler_interval));
    let jobs = scheduled_jobs(leader);
    assert_eq!(jobs.len(), 1);
    let job = &jobs[0];
    assert_eq!(job.name, format!("{SCHEDULER}-{}", job.spec.id));
    assert_eq!(job.spec.tuple_type, TupleType::BitGfp);
    assert_eq!(job.spec.count, 5_000);
    assert_eq!(job.spec.generator.image, "registry.local/gen-0:test");
    assert_eq!(job.status.state, JobState::Pending);
}

#[tokio::test]
async fn followers_never_schedule() {
    let cluster = TestCluster::new(2);
    let follower = cluster.party(1);
    follower
        .resources
        .apply_scheduler(test_support::scheduler(SCHEDULER, 2, &[(TupleType::BitGfp, 10_000, 1)]))
        .await
        .unwrap();
    follower.resources.apply_generator(test_support::generator("gen", &[(TupleType::BitGfp, 5_000)])).await.unwrap();

    assert_eq!(reconcile(follower, Controller::Scheduler, SCHEDULER).await, Requeue::Done);
    assert!(follower.state().jobs.is_empty());
    assert_eq!(follower.tuple_store.telemetry_calls(), 0);
}

#[tokio::test]
async fn type_missing_from_telemetry_counts_as_empty() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 1, &[(TupleType::SquareTupleGfp, 1, 1)]).await;

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    assert_eq!(scheduled_jobs(leader)[0].spec.tuple_type, TupleType::SquareTupleGfp);
}

#[tokio::test]
async fn concurrency_limit_blocks_new_jobs() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 1, &[(TupleType::BitGfp, 10_000, 1)]).await;
    leader.resources.create_job(job("manual")).await.unwrap();

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    assert!(scheduled_jobs(leader).is_empty());
    assert_eq!(leader.tuple_store.telemetry_calls(), 0);
}

#[tokio::test]
async fn in_flight_jobs_count_as_available() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 5, &[(TupleType::BitGfp, 1_000, 1)]).await;
    leader.tuple_store.set_available(TupleType::BitGfp, 500);
    let running = Job::builder().name("running").tuple_type(TupleType::BitGfp).count(600).state(JobState::Running).build();
    leader.resources.create_job(running).await.unwrap();

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    assert!(scheduled_jobs(leader).is_empty());
}

#[tokio::test]
async fn finished_jobs_do_not_count_as_in_flight() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 1, &[(TupleType::BitGfp, 1_000, 1)]).await;
    leader.tuple_store.set_available(TupleType::BitGfp, 500);
    let done = Job::builder()
        .name("done")
        .count(600)
        .state(JobState::Completed)
        .transitioned_at(cluster.clock.epoch_ms())
        .build();
    leader.resources.create_job(done).await.unwrap();

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    assert_eq!(scheduled_jobs(leader).len(), 1);
}

#[yare::parameterized(
    no_generator = { 0 },
    ambiguous = { 2 },
)]
#[test_macro(tokio::test)]
async fn unserviceable_types_are_skipped(generators: usize) {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader
        .resources
        .apply_scheduler(test_support::scheduler(SCHEDULER, 3, &[(TupleType::BitGfp, 10_000, 1)]))
        .await
        .unwrap();
    for i in 0..generators {
        let generator = test_support::generator(&format!("gen-{i}"), &[(TupleType::BitGfp, 5_000)]);
        leader.resources.apply_generator(generator).await.unwrap();
    }

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    assert!(scheduled_jobs(leader).is_empty());
}

#[tokio::test]
async fn expired_terminal_jobs_are_deleted() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 10, &[]).await;
    let now = cluster.clock.epoch_ms();
    let ttl_ms = 600_000;
    let jobs = [
        ("old-done", JobState::Completed, now - ttl_ms - 1),
        ("old-failed", JobState::Failed, now - ttl_ms - 1),
        ("fresh-done", JobState::Completed, now - 1),
        ("old-running", JobState::Running, now - ttl_ms - 1),
    ];
    for (name, state, at) in jobs {
        let job = Job::builder().name(name).state(state).transitioned_at(at).build();
        leader.resources.create_job(job).await.unwrap();
    }

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    let remaining: Vec<String> = leader.state().jobs.into_keys().collect();
    assert_eq!(remaining, ["fresh-done", "old-running"]);
}

#[tokio::test]
async fn ttl_is_measured_on_the_clock() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 10, &[]).await;
    let done = Job::builder().name("done").state(JobState::Completed).transitioned_at(cluster.clock.epoch_ms()).build();
    leader.resources.create_job(done).await.unwrap();

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;
    assert!(leader.state().jobs.contains_key("done"));

    cluster.clock.advance(Duration::from_secs(601));
    reconcile(leader, Controller::Scheduler, SCHEDULER).await;
    assert!(leader.state().jobs.is_empty());
}

#[tokio::test]
async fn telemetry_failure_is_transient() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    leader_with(&cluster, 2, &[(TupleType::BitGfp, 10_000, 1)]).await;
    leader.tuple_store.set_telemetry_fails(true);

    let err = leader.runtime.reconcile(Controller::Scheduler, SCHEDULER).await.unwrap_err();

    assert!(err.is_transient());
    assert!(scheduled_jobs(leader).is_empty());
}

#[tokio::test]
async fn least_available_first_strategy_is_selectable() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    let policies = [(TupleType::BitGfp, 10_000, 100), (TupleType::InputMaskGfp, 10_000, 1)];
    leader_with(&cluster, 2, &policies).await;
    let mut scheduler = test_support::scheduler(SCHEDULER, 2, &policies);
    scheduler.spec.strategy = StrategyKind::LeastAvailableFirst;
    leader.resources.apply_scheduler(scheduler).await.unwrap();
    leader.tuple_store.set_available(TupleType::BitGfp, 9_000);
    leader.tuple_store.set_available(TupleType::InputMaskGfp, 100);

    reconcile(leader, Controller::Scheduler, SCHEDULER).await;

    assert_eq!(scheduled_jobs(leader)[0].spec.tuple_type, TupleType::InputMaskGfp);
}

#[tokio::test]
async fn removed_scheduler_is_ignored() {
    let cluster = TestCluster::new(2);
    assert_eq!(reconcile(cluster.leader(), Controller::Scheduler, "gone").await, Requeue::Done);
}
