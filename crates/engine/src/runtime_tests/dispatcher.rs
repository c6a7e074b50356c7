// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::wait_for;
use std::time::Duration;
use tg_storage::{RosterStore, WatchEvent};
use tokio_util::sync::CancellationToken;

const WAIT: Duration = Duration::from_secs(5);

#[tokio::test]
async fn job_key_is_mirrored_and_unmirrored() {
    let cluster = TestCluster::new(2);
    let job = published_job(&cluster, "job-a").await;
    let follower = cluster.party(1);

    let mirror = follower.state().jobs.get("job-a").cloned().unwrap();
    assert_eq!(mirror.spec, job.spec);
    assert_eq!(mirror.owner, None);

    cluster.leader().resources.delete_job("job-a").await.unwrap();
    reconcile(cluster.leader(), Controller::Job, "job-a").await;
    sync_roster(follower).await;
    assert!(follower.state().jobs.is_empty());
}

#[tokio::test]
async fn replayed_job_put_keeps_existing_mirror() {
    let cluster = TestCluster::new(2);
    published_job(&cluster, "job-a").await;
    let follower = cluster.party(1);
    let before = follower.state().jobs["job-a"].clone();

    follower.runtime.roster().set_head(1, 0).await.unwrap();
    sync_roster(follower).await;

    assert_eq!(follower.state().jobs["job-a"], before);
}

#[tokio::test]
async fn remote_entry_creates_then_updates_proxy() {
    let cluster = TestCluster::new(2);
    published_job(&cluster, "job-a").await;
    let leader = cluster.leader();
    let roster = cluster.party(1).runtime.roster();

    roster.publish_entry("job-a", 1, &TaskStatus::default()).await.unwrap();
    sync_roster(leader).await;
    let proxy = leader.state().tasks.get("job-a-1").cloned().unwrap();
    assert_eq!((proxy.job.as_str(), proxy.player), ("job-a", 1));
    assert_eq!(proxy.status.state, TaskState::Preparing);

    let status = entry_status(TaskState::Preparing, Some("10.0.0.2:5000"));
    roster.publish_entry("job-a", 1, &status).await.unwrap();
    sync_roster(leader).await;
    assert_eq!(leader.state().tasks["job-a-1"].status, status);

    roster.delete_entry("job-a", 1).await.unwrap();
    sync_roster(leader).await;
    assert!(!leader.state().tasks.contains_key("job-a-1"));
}

#[tokio::test]
async fn local_entry_is_ignored() {
    let cluster = TestCluster::new(2);
    published_job(&cluster, "job-a").await;
    let leader = cluster.leader();

    leader
        .runtime
        .roster()
        .publish_entry("job-a", 0, &entry_status(TaskState::Failed, None))
        .await
        .unwrap();
    sync_roster(leader).await;

    assert_eq!(task_state(leader, "job-a-0"), Some(TaskState::Preparing));
}

fn put(key: &str, value: &[u8]) -> WatchEvent {
    WatchEvent { kind: tg_storage::EventKind::Put, key: key.to_string(), value: value.to_vec(), revision: 9 }
}

#[yare::parameterized(
    unknown_shape = { put("/tg/roster/default", b"{}") },
    bad_player = { put("/tg/roster/default/job-a/x", b"{}") },
    player_out_of_range = { put("/tg/roster/default/job-a/7", br#"{"state":"Preparing"}"#) },
    bad_job_value = { put("/tg/roster/default/job-b", b"not json") },
    bad_entry_value = { put("/tg/roster/default/job-a/1", br#"{"state":"Exploded"}"#) },
)]
#[test_macro(tokio::test)]
async fn malformed_events_are_dropped(event: WatchEvent) {
    let cluster = TestCluster::new(2);
    published_job(&cluster, "job-a").await;
    let leader = cluster.leader();
    let before = leader.state();

    leader.runtime.dispatch(&event).await.unwrap();

    assert_eq!(leader.state().jobs, before.jobs);
    assert_eq!(leader.state().tasks, before.tasks);
}

#[tokio::test(start_paused = true)]
async fn entry_for_unknown_job_is_dropped_after_lookups() {
    let cluster = TestCluster::new(2);
    let leader = cluster.leader();
    let event = put("/tg/roster/default/ghost/1", br#"{"state":"Preparing"}"#);

    leader.runtime.dispatch(&event).await.unwrap();

    assert!(leader.state().tasks.is_empty());
}

#[tokio::test]
async fn store_failure_while_handling_is_transient() {
    let cluster = TestCluster::new(2);
    let follower = cluster.party(1);
    follower.resources.set_unavailable(true);
    let event = put("/tg/roster/default/job-a", &tg_storage::value::encode_job_spec(&job("job-a").spec).unwrap());

    let err = follower.runtime.dispatch(&event).await.unwrap_err();

    assert!(err.is_transient());
}

#[tokio::test]
async fn head_advances_after_each_batch() {
    let cluster = TestCluster::new(2);
    let follower = cluster.party(1);
    let cancel = CancellationToken::new();
    let dispatcher = tokio::spawn(follower.runtime.clone().run_dispatcher(cancel.clone()));

    cluster.leader().resources.create_job(job("job-a")).await.unwrap();
    reconcile(cluster.leader(), Controller::Job, "job-a").await;
    wait_for_head(follower.runtime.roster(), 1).await;
    assert!(follower.state().jobs.contains_key("job-a"));

    cancel.cancel();
    dispatcher.await.unwrap();
}

async fn wait_for_head<S: RosterStore>(roster: &tg_storage::Roster<S>, player: u32) {
    crate::test_helpers::wait_until("head revision", WAIT, || async {
        roster.head(player).await.unwrap() > 0
    })
    .await;
}

#[tokio::test]
async fn watch_restarts_after_transport_error() {
    let cluster = TestCluster::new(2);
    let follower = cluster.party(1);
    let cancel = CancellationToken::new();
    let dispatcher = tokio::spawn(follower.runtime.clone().run_dispatcher(cancel.clone()));
    wait_for("watch", WAIT, || cluster.store.watcher_count() == 1).await;

    cluster.store.fail_watchers();
    cluster.leader().resources.create_job(job("job-a")).await.unwrap();
    reconcile(cluster.leader(), Controller::Job, "job-a").await;

    wait_for("mirror after restart", WAIT, || follower.state().jobs.contains_key("job-a")).await;
    cancel.cancel();
    dispatcher.await.unwrap();
}

#[tokio::test]
async fn handler_failure_replays_batch_without_advancing_head() {
    let cluster = TestCluster::new(2);
    let follower = cluster.party(1);
    follower.resources.set_unavailable(true);
    let cancel = CancellationToken::new();
    let dispatcher = tokio::spawn(follower.runtime.clone().run_dispatcher(cancel.clone()));

    cluster.leader().resources.create_job(job("job-a")).await.unwrap();
    reconcile(cluster.leader(), Controller::Job, "job-a").await;
    tokio::time::sleep(Duration::from_millis(120)).await;
    assert_eq!(follower.runtime.roster().head(1).await.unwrap(), 0);

    follower.resources.set_unavailable(false);
    wait_for("mirror after recovery", WAIT, || follower.state().jobs.contains_key("job-a")).await;
    wait_for_head(follower.runtime.roster(), 1).await;

    cancel.cancel();
    dispatcher.await.unwrap();
}

#[tokio::test]
async fn restarted_party_replays_missed_events() {
    let cluster = TestCluster::new(2);
    let follower = cluster.party(1);
    published_job(&cluster, "job-a").await;
    let head = follower.runtime.roster().head(1).await.unwrap();

    // Changes while the follower is down
    cluster.leader().resources.create_job(job("job-b")).await.unwrap();
    reconcile(cluster.leader(), Controller::Job, "job-b").await;
    cluster.leader().resources.delete_job("job-a").await.unwrap();
    reconcile(cluster.leader(), Controller::Job, "job-a").await;
    assert!(cluster.store.revision() > head);

    sync_roster(follower).await;

    let jobs: Vec<String> = follower.state().jobs.keys().cloned().collect();
    assert_eq!(jobs, ["job-b"]);
}

#[tokio::test]
async fn empty_store_mirrors_roster_listing_despite_head() {
    let cluster = TestCluster::new(2);
    published_job(&cluster, "job-a").await;
    let roster = cluster.party(1).runtime.roster();
    roster.publish_entry("job-a", 0, &entry_status(TaskState::Preparing, Some("10.0.0.1:5000"))).await.unwrap();
    roster.set_head(1, cluster.store.revision()).await.unwrap();

    // Same player, state lost
    let party = tg_core::Party::new(1, 2).unwrap();
    let fresh = TestParty::new(party, &cluster.store, &cluster.clock, crate::test_helpers::test_config());
    let cancel = CancellationToken::new();
    let dispatcher = tokio::spawn(fresh.runtime.clone().run_dispatcher(cancel.clone()));

    wait_for("job-a mirrored again", WAIT, || fresh.state().jobs.contains_key("job-a")).await;
    wait_for("leader entry mirrored", WAIT, || task_state(&fresh, "job-a-0") == Some(TaskState::Preparing)).await;
    cancel.cancel();
    dispatcher.await.unwrap();
    assert!(fresh.runtime.roster().head(1).await.unwrap() >= cluster.store.revision() - 1);
}
