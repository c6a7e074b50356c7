// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn pending_names_are_deduplicated() {
    let queue = WorkQueue::new();
    queue.enqueue("job-a");
    queue.enqueue("job-b");
    queue.enqueue("job-a");

    assert_eq!(queue.len(), 2);
    assert_eq!(queue.try_next().as_deref(), Some("job-a"));
    assert_eq!(queue.try_next().as_deref(), Some("job-b"));
    assert!(queue.is_empty());
}

#[test]
fn taken_name_can_be_enqueued_again() {
    let queue = WorkQueue::new();
    queue.enqueue("job-a");
    assert_eq!(queue.try_next().as_deref(), Some("job-a"));
    queue.enqueue("job-a");
    assert_eq!(queue.try_next().as_deref(), Some("job-a"));
}

#[tokio::test]
async fn next_waits_for_enqueue() {
    let queue = WorkQueue::new();
    let waiter = {
        let queue = queue.clone();
        tokio::spawn(async move { queue.next().await })
    };
    tokio::task::yield_now().await;
    queue.enqueue("job-a");
    assert_eq!(waiter.await.unwrap(), "job-a");
}

#[tokio::test(start_paused = true)]
async fn enqueue_after_delays_delivery() {
    let queue = WorkQueue::new();
    queue.enqueue_after("job-a", Duration::from_secs(30));

    tokio::time::sleep(Duration::from_secs(29)).await;
    assert!(queue.is_empty());

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(queue.try_next().as_deref(), Some("job-a"));
}
