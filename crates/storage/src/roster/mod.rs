// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Access to the shared coordination store.
//!
//! [`RosterStore`] is the raw get/put/delete/watch surface of a
//! revision-ordered key-value store. [`Roster`] layers the key and value
//! codecs on top, so callers deal in job specs and task statuses rather
//! than bytes.

#[cfg(feature = "etcd")]
mod etcd;
mod memory;

#[cfg(feature = "etcd")]
pub use etcd::EtcdRosterStore;
pub use memory::MemoryRosterStore;

use crate::head::{decode_revision, encode_revision, HeadError};
use crate::key::{head_key, roster_prefix, KeyError, RosterKey};
use crate::value::{self, ValueError};
use async_trait::async_trait;
use tg_core::{JobSpec, TaskStatus};
use thiserror::Error;
use tokio::sync::mpsc;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("watch closed: {0}")]
    WatchClosed(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    Put,
    Delete,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchEvent {
    pub kind: EventKind,
    pub key: String,
    /// Empty for deletes.
    pub value: Vec<u8>,
    pub revision: i64,
}

/// Events delivered together, in revision order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WatchBatch {
    /// Store revision the batch is complete up to.
    pub revision: i64,
    pub events: Vec<WatchEvent>,
}

impl WatchBatch {
    /// Batch complete up to its last event. `None` when there are no events.
    ///
    /// The revision comes from the events themselves: a store catching a
    /// watcher up may deliver history in several responses that all report
    /// the current store revision.
    pub fn from_events(events: Vec<WatchEvent>) -> Option<Self> {
        let revision = events.last()?.revision;
        Some(Self { revision, events })
    }
}

/// Stream of watch batches. An `Err` item or a closed channel ends the watch.
pub type WatchStream = mpsc::UnboundedReceiver<Result<WatchBatch, StoreError>>;

/// Revision-ordered key-value store shared by all parties.
#[async_trait]
pub trait RosterStore: Clone + Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Write `value`, returning the revision the write was applied at.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<i64, StoreError>;

    /// Delete `key`, returning whether it existed.
    async fn delete(&self, key: &str) -> Result<bool, StoreError>;

    /// Every key under `prefix` as puts in revision order. The batch revision
    /// is the store revision the listing was read at.
    async fn list(&self, prefix: &str) -> Result<WatchBatch, StoreError>;

    /// Watch every key under `prefix`, replaying events from `from_revision` on.
    async fn watch(&self, prefix: &str, from_revision: i64) -> Result<WatchStream, StoreError>;
}

#[derive(Debug, Error)]
pub enum RosterError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Key(#[from] KeyError),
    #[error(transparent)]
    Value(#[from] ValueError),
    #[error("corrupt head revision for player {player}: {source}")]
    Head { player: u32, source: HeadError },
}

/// Typed view of one scope of the roster.
#[derive(Clone)]
pub struct Roster<S> {
    store: S,
    scope: String,
}

impl<S: RosterStore> Roster<S> {
    pub fn new(store: S, scope: impl Into<String>) -> Self {
        Self { store, scope: scope.into() }
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn job_key(&self, job: &str) -> Result<RosterKey, KeyError> {
        RosterKey::new(self.scope.as_str(), job)
    }

    pub async fn job_spec(&self, job: &str) -> Result<Option<JobSpec>, RosterError> {
        let key = self.job_key(job)?;
        match self.store.get(&key.to_string()).await? {
            Some(bytes) => Ok(Some(value::decode_job_spec(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn publish_job(&self, job: &str, spec: &JobSpec) -> Result<i64, RosterError> {
        let key = self.job_key(job)?;
        let bytes = value::encode_job_spec(spec)?;
        Ok(self.store.put(&key.to_string(), bytes).await?)
    }

    pub async fn delete_job(&self, job: &str) -> Result<bool, RosterError> {
        let key = self.job_key(job)?;
        Ok(self.store.delete(&key.to_string()).await?)
    }

    pub async fn entry(&self, job: &str, player: u32) -> Result<Option<TaskStatus>, RosterError> {
        let key = self.job_key(job)?.entry(player);
        match self.store.get(&key.to_string()).await? {
            Some(bytes) => Ok(Some(value::decode_task_status(&bytes)?)),
            None => Ok(None),
        }
    }

    pub async fn publish_entry(
        &self,
        job: &str,
        player: u32,
        status: &TaskStatus,
    ) -> Result<i64, RosterError> {
        let key = self.job_key(job)?.entry(player);
        let bytes = value::encode_task_status(status)?;
        Ok(self.store.put(&key.to_string(), bytes).await?)
    }

    pub async fn delete_entry(&self, job: &str, player: u32) -> Result<bool, RosterError> {
        let key = self.job_key(job)?.entry(player);
        Ok(self.store.delete(&key.to_string()).await?)
    }

    /// Last fully processed revision of `player`, 0 when never written.
    pub async fn head(&self, player: u32) -> Result<i64, RosterError> {
        match self.store.get(&head_key(player)).await? {
            Some(bytes) => {
                decode_revision(&bytes).map_err(|source| RosterError::Head { player, source })
            }
            None => Ok(0),
        }
    }

    pub async fn set_head(&self, player: u32, revision: i64) -> Result<(), RosterError> {
        self.store.put(&head_key(player), encode_revision(revision)).await?;
        Ok(())
    }

    /// Current contents of the scope.
    pub async fn list(&self) -> Result<WatchBatch, RosterError> {
        Ok(self.store.list(&roster_prefix(&self.scope)).await?)
    }

    /// Watch the whole scope starting at `from_revision`.
    pub async fn watch(&self, from_revision: i64) -> Result<WatchStream, RosterError> {
        Ok(self.store.watch(&roster_prefix(&self.scope), from_revision).await?)
    }
}

#[cfg(test)]
#[path = "roster_tests.rs"]
mod tests;
