// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Engine error type

use tg_adapters::{IdentityError, LaunchError, TupleStoreError};
use tg_core::TaskNameError;
use tg_storage::{KeyError, ResourceError, RosterError, StoreError, ValueError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("roster error: {0}")]
    Roster(#[from] RosterError),
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("resource error: {0}")]
    Resource(#[from] ResourceError),
    #[error("tuple store error: {0}")]
    TupleStore(#[from] TupleStoreError),
    #[error("launch error: {0}")]
    Launch(#[from] LaunchError),
    #[error("identity error: {0}")]
    Identity(#[from] IdentityError),
    #[error("malformed key: {0}")]
    Key(#[from] KeyError),
    #[error("malformed value: {0}")]
    Value(#[from] ValueError),
    #[error("malformed task name: {0}")]
    TaskName(#[from] TaskNameError),
    #[error("malformed input: {0}")]
    Malformed(String),
}

impl EngineError {
    /// Infrastructure failures that clear up on retry.
    ///
    /// Everything else is malformed input: retrying cannot help, so the
    /// event or pass is logged and dropped.
    pub fn is_transient(&self) -> bool {
        match self {
            EngineError::Roster(RosterError::Key(_) | RosterError::Value(_)) => false,
            EngineError::Roster(RosterError::Store(_) | RosterError::Head { .. }) => true,
            EngineError::Store(_)
            | EngineError::Resource(_)
            | EngineError::TupleStore(_)
            | EngineError::Launch(_)
            | EngineError::Identity(_) => true,
            EngineError::Key(_)
            | EngineError::Value(_)
            | EngineError::TaskName(_)
            | EngineError::Malformed(_) => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tg_storage::HeadError;

    #[yare::parameterized(
        store = { EngineError::Store(StoreError::Unavailable("down".into())), true },
        roster_store = { EngineError::Roster(RosterError::Store(StoreError::WatchClosed("x".into()))), true },
        corrupt_head = { EngineError::Roster(RosterError::Head { player: 0, source: HeadError::Truncated }), true },
        conflict = { EngineError::Resource(ResourceError::Unavailable("busy".into())), true },
        tuple_store = { EngineError::TupleStore(TupleStoreError::Status { url: "u".into(), status: 500 }), true },
        key = { EngineError::Key(KeyError::Malformed("/x".into())), false },
        roster_key = { EngineError::Roster(RosterError::Key(KeyError::InvalidPlayerIndex("p".into()))), false },
        task_name = { EngineError::TaskName(TaskNameError::MissingPlayer("job".into())), false },
        malformed = { EngineError::Malformed("player out of range".into()), false },
    )]
    fn transient_classification(error: EngineError, transient: bool) {
        assert_eq!(error.is_transient(), transient);
    }
}
