// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! JSON encoding of roster values.

use tg_core::{JobSpec, TaskStatus};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ValueError {
    #[error("invalid job spec: {0}")]
    JobSpec(#[source] serde_json::Error),
    #[error("invalid task status: {0}")]
    TaskStatus(#[source] serde_json::Error),
}

pub fn encode_job_spec(spec: &JobSpec) -> Result<Vec<u8>, ValueError> {
    serde_json::to_vec(spec).map_err(ValueError::JobSpec)
}

pub fn decode_job_spec(value: &[u8]) -> Result<JobSpec, ValueError> {
    serde_json::from_slice(value).map_err(ValueError::JobSpec)
}

pub fn encode_task_status(status: &TaskStatus) -> Result<Vec<u8>, ValueError> {
    serde_json::to_vec(status).map_err(ValueError::TaskStatus)
}

/// Decode a roster entry. Unknown states are rejected.
pub fn decode_task_status(value: &[u8]) -> Result<TaskStatus, ValueError> {
    serde_json::from_slice(value).map_err(ValueError::TaskStatus)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_core::{TaskState, TupleType};

    #[test]
    fn job_spec_round_trips() {
        let spec = tg_core::test_support::job_spec(TupleType::InputMaskGfp, 10_000);
        let bytes = encode_job_spec(&spec).unwrap();
        assert_eq!(decode_job_spec(&bytes).unwrap(), spec);
    }

    #[test]
    fn task_status_reads_wire_json() {
        let status =
            decode_task_status(br#"{"state":"Generating","endpoint":"10.0.0.7:5000"}"#).unwrap();
        assert_eq!(status.state, TaskState::Generating);
        assert_eq!(status.endpoint.as_deref(), Some("10.0.0.7:5000"));
    }

    #[yare::parameterized(
        unknown_state = { br#"{"state":"Exploded"}"# },
        missing_state = { br#"{}"# },
        not_json = { b"Launching" },
    )]
    fn task_status_rejects(value: &[u8]) {
        assert!(matches!(decode_task_status(value), Err(ValueError::TaskStatus(_))));
    }

    #[test]
    fn job_spec_rejects_bad_uuid() {
        let value = br#"{"id":"nope","type":"BIT_GFP","count":1,"generator":{"image":"x"}}"#;
        assert!(matches!(decode_job_spec(value), Err(ValueError::JobSpec(_))));
    }
}
