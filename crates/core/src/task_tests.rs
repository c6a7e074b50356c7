// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    simple = { "job-0", "job", 0 },
    hyphenated_job = { "sched-4f1c-2", "sched-4f1c", 2 },
    large_player = { "j-4294967295", "j", u32::MAX },
)]
fn task_name_splits(name: &str, job: &str, player: u32) {
    assert_eq!(job_name_for_task(name).unwrap(), (job.to_string(), player));
    assert_eq!(task_name(job, player), name);
}

#[yare::parameterized(
    no_hyphen = { "job" },
    empty_job = { "-3" },
    non_numeric = { "job-x" },
    overflow = { "job-4294967296" },
)]
fn task_name_rejects(name: &str) {
    assert!(job_name_for_task(name).is_err());
}

#[test]
fn new_task_starts_preparing_without_endpoint() {
    let task = Task::new("sched-abc", 1);
    assert_eq!(task.name, "sched-abc-1");
    assert_eq!(task.status, TaskStatus { state: TaskState::Preparing, endpoint: None });
}

#[test]
fn status_json_omits_unknown_endpoint() {
    let status = TaskStatus { state: TaskState::Launching, endpoint: None };
    assert_eq!(serde_json::to_string(&status).unwrap(), r#"{"state":"Launching"}"#);

    let with_endpoint = status.with_state(TaskState::Generating);
    assert_eq!(with_endpoint.state, TaskState::Generating);
}

#[test]
fn terminal_states() {
    let done: Vec<_> = [
        TaskState::Preparing,
        TaskState::Launching,
        TaskState::Generating,
        TaskState::Provisioning,
        TaskState::Completed,
        TaskState::Failed,
    ]
    .into_iter()
    .filter(|s| s.is_done())
    .collect();
    assert_eq!(done, vec![TaskState::Completed, TaskState::Failed]);
}
