// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tg_adapters::{LauncherCall, WorkloadPhase};

/// Two parties with `job-a` published and each party's local task created.
async fn two_parties() -> TestCluster {
    let cluster = TestCluster::new(2);
    published_job(&cluster, "job-a").await;
    reconcile(cluster.party(1), Controller::Job, "job-a").await;
    cluster
}

async fn entry(party: &TestParty, player: u32) -> Option<TaskStatus> {
    party.runtime.roster().entry("job-a", player).await.unwrap()
}

/// Drive a party's local task from Preparing to Generating with both endpoints known.
async fn launched(cluster: &TestCluster) {
    let leader = cluster.leader();
    leader
        .runtime
        .roster()
        .publish_entry("job-a", 1, &entry_status(TaskState::Preparing, Some("10.0.0.2:5000")))
        .await
        .unwrap();
    cluster.assign_addresses("job-a");
    while reconcile(leader, Controller::Task, "job-a-0").await == Requeue::Now {}
    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Generating));
}

#[tokio::test]
async fn first_pass_publishes_preparing_entry() {
    let cluster = two_parties().await;
    let leader = cluster.leader();

    assert_eq!(reconcile(leader, Controller::Task, "job-a-0").await, Requeue::Now);
    assert_eq!(entry(leader, 0).await, Some(TaskStatus::default()));
}

#[tokio::test]
async fn preparing_polls_until_address_is_assigned() {
    let cluster = two_parties().await;
    let leader = cluster.leader();
    reconcile(leader, Controller::Task, "job-a-0").await;

    let requeue = reconcile(leader, Controller::Task, "job-a-0").await;

    assert_eq!(requeue, Requeue::After(leader.runtime.config().workload_poll));
    assert_eq!(leader.launcher.calls(), vec![LauncherCall::Prepare("job-a-0".into())]);
    assert_eq!(entry(leader, 0).await, Some(TaskStatus::default()));
}

#[tokio::test]
async fn own_endpoint_is_published_then_waits_for_peers() {
    let cluster = two_parties().await;
    let leader = cluster.leader();
    leader.launcher.set_address("job-a-0", "10.0.0.1:5000");
    reconcile(leader, Controller::Task, "job-a-0").await;

    assert_eq!(reconcile(leader, Controller::Task, "job-a-0").await, Requeue::Now);
    let expected = entry_status(TaskState::Preparing, Some("10.0.0.1:5000"));
    assert_eq!(entry(leader, 0).await, Some(expected.clone()));
    assert_eq!(leader.state().tasks["job-a-0"].status, expected);

    assert_eq!(reconcile(leader, Controller::Task, "job-a-0").await, Requeue::Done);
    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Preparing));
}

#[tokio::test]
async fn launch_passes_every_endpoint_in_player_order() {
    let cluster = two_parties().await;
    launched(&cluster).await;
    let leader = cluster.leader();

    let params = leader.launcher.generator_params("job-a-0").unwrap();
    assert_eq!(params.endpoints, ["10.0.0.1:5000", "10.0.0.2:5000"]);
    assert_eq!(params.player, 0);
    assert_eq!(params.count, 1_000);
    assert_eq!(params.tuple_type, TupleType::BitGfp);
    assert_eq!(params.image, test_support::TEST_IMAGE);
    assert_eq!(entry(leader, 0).await.map(|s| s.state), Some(TaskState::Generating));
}

#[tokio::test]
async fn successful_workloads_complete_the_task() {
    let cluster = two_parties().await;
    launched(&cluster).await;
    let leader = cluster.leader();

    assert_eq!(
        reconcile(leader, Controller::Task, "job-a-0").await,
        Requeue::After(leader.runtime.config().workload_poll)
    );

    leader.launcher.set_generator_phase("job-a-0", WorkloadPhase::Succeeded);
    assert_eq!(reconcile(leader, Controller::Task, "job-a-0").await, Requeue::Now);
    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Provisioning));
    assert!(leader.launcher.calls().iter().any(|c| matches!(c, LauncherCall::StartProvisioner(p) if p.task == "job-a-0")));

    leader.launcher.set_provisioner_phase("job-a-0", WorkloadPhase::Succeeded);
    assert_eq!(reconcile(leader, Controller::Task, "job-a-0").await, Requeue::Now);
    assert_eq!(reconcile(leader, Controller::Task, "job-a-0").await, Requeue::Done);
    assert_eq!(entry(leader, 0).await.map(|s| s.state), Some(TaskState::Completed));
    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Completed));
}

#[yare::parameterized(
    failed = { WorkloadPhase::Failed },
    vanished = { WorkloadPhase::Missing },
)]
#[test_macro(tokio::test)]
async fn generator_failure_fails_the_task(phase: WorkloadPhase) {
    let cluster = two_parties().await;
    launched(&cluster).await;
    let leader = cluster.leader();
    leader.launcher.set_generator_phase("job-a-0", phase);

    reconcile(leader, Controller::Task, "job-a-0").await;

    assert_eq!(entry(leader, 0).await.map(|s| s.state), Some(TaskState::Failed));
    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Failed));
    assert!(!leader.launcher.calls().iter().any(|c| matches!(c, LauncherCall::StartProvisioner(_))));
}

#[tokio::test]
async fn provisioner_failure_fails_the_task() {
    let cluster = two_parties().await;
    launched(&cluster).await;
    let leader = cluster.leader();
    leader.launcher.set_generator_phase("job-a-0", WorkloadPhase::Succeeded);
    reconcile(leader, Controller::Task, "job-a-0").await;
    leader.launcher.set_provisioner_phase("job-a-0", WorkloadPhase::Failed);

    reconcile(leader, Controller::Task, "job-a-0").await;

    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Failed));
}

#[tokio::test]
async fn proxy_pass_drives_local_task() {
    let cluster = two_parties().await;
    let leader = cluster.leader();
    leader.resources.create_task(proxy("job-a", 1, TaskState::Preparing)).await.unwrap();

    assert_eq!(reconcile(leader, Controller::Task, "job-a-1").await, Requeue::Now);

    assert_eq!(entry(leader, 0).await, Some(TaskStatus::default()));
    assert_eq!(entry(leader, 1).await, None);
}

#[tokio::test]
async fn missing_local_task_deletes_entry_and_releases_workloads() {
    let cluster = two_parties().await;
    let leader = cluster.leader();
    reconcile(leader, Controller::Task, "job-a-0").await;
    leader.resources.delete_task("job-a-0").await.unwrap();

    assert_eq!(reconcile(leader, Controller::Task, "job-a-0").await, Requeue::Done);

    assert_eq!(entry(leader, 0).await, None);
    assert!(leader.launcher.released("job-a-0"));
}

#[tokio::test]
async fn malformed_task_name_is_not_retried() {
    let cluster = two_parties().await;
    let err = cluster.leader().runtime.reconcile(Controller::Task, "no_player").await.unwrap_err();
    assert!(!err.is_transient());
}

#[tokio::test]
async fn launcher_failure_is_transient() {
    let cluster = two_parties().await;
    let leader = cluster.leader();
    reconcile(leader, Controller::Task, "job-a-0").await;
    leader.launcher.fail_calls(1);

    let err = leader.runtime.reconcile(Controller::Task, "job-a-0").await.unwrap_err();

    assert!(err.is_transient());
    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Preparing));
}
