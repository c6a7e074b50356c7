// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-process roster store.
//!
//! Keeps the full event history so watches can replay from any revision,
//! and can inject transport failures for exercising watch restarts.

use super::{EventKind, RosterStore, StoreError, WatchBatch, WatchEvent, WatchStream};
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::mpsc;

struct Watcher {
    prefix: String,
    tx: mpsc::UnboundedSender<Result<WatchBatch, StoreError>>,
}

#[derive(Default)]
struct State {
    revision: i64,
    /// Value and mod revision per key.
    kvs: BTreeMap<String, (Vec<u8>, i64)>,
    history: Vec<WatchEvent>,
    watchers: Vec<Watcher>,
    unavailable: bool,
}

impl State {
    fn check(&self) -> Result<(), StoreError> {
        if self.unavailable {
            return Err(StoreError::Unavailable("memory store marked unavailable".to_string()));
        }
        Ok(())
    }

    fn apply(&mut self, kind: EventKind, key: &str, value: Vec<u8>) -> i64 {
        self.revision += 1;
        let event = WatchEvent { kind, key: key.to_string(), value, revision: self.revision };
        let batch = WatchBatch { revision: self.revision, events: vec![event.clone()] };
        self.watchers.retain(|w| !key.starts_with(&w.prefix) || w.tx.send(Ok(batch.clone())).is_ok());
        self.history.push(event);
        self.revision
    }
}

/// Roster store held in memory, shared between clones.
#[derive(Clone, Default)]
pub struct MemoryRosterStore {
    inner: Arc<Mutex<State>>,
}

impl MemoryRosterStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn revision(&self) -> i64 {
        self.inner.lock().revision
    }

    /// Current keys under `prefix`, in key order.
    pub fn keys(&self, prefix: &str) -> Vec<String> {
        self.inner.lock().kvs.keys().filter(|k| k.starts_with(prefix)).cloned().collect()
    }

    /// Number of open watches.
    pub fn watcher_count(&self) -> usize {
        let mut state = self.inner.lock();
        state.watchers.retain(|w| !w.tx.is_closed());
        state.watchers.len()
    }

    /// Terminate every open watch with a transport error.
    pub fn fail_watchers(&self) {
        let watchers = std::mem::take(&mut self.inner.lock().watchers);
        for w in watchers {
            let _ = w.tx.send(Err(StoreError::WatchClosed("injected failure".to_string())));
        }
    }

    /// Make reads and writes fail until reset.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.inner.lock().unavailable = unavailable;
    }
}

#[async_trait]
impl RosterStore for MemoryRosterStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let state = self.inner.lock();
        state.check()?;
        Ok(state.kvs.get(key).map(|(value, _)| value.clone()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<i64, StoreError> {
        let mut state = self.inner.lock();
        state.check()?;
        let revision = state.apply(EventKind::Put, key, value.clone());
        state.kvs.insert(key.to_string(), (value, revision));
        Ok(revision)
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut state = self.inner.lock();
        state.check()?;
        if state.kvs.remove(key).is_none() {
            return Ok(false);
        }
        state.apply(EventKind::Delete, key, Vec::new());
        Ok(true)
    }

    async fn list(&self, prefix: &str) -> Result<WatchBatch, StoreError> {
        let state = self.inner.lock();
        state.check()?;
        let mut events: Vec<WatchEvent> = state
            .kvs
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, (value, revision))| WatchEvent {
                kind: EventKind::Put,
                key: key.clone(),
                value: value.clone(),
                revision: *revision,
            })
            .collect();
        events.sort_by_key(|e| e.revision);
        Ok(WatchBatch { revision: state.revision, events })
    }

    async fn watch(&self, prefix: &str, from_revision: i64) -> Result<WatchStream, StoreError> {
        let mut state = self.inner.lock();
        state.check()?;
        let (tx, rx) = mpsc::unbounded_channel();

        // Replay and registration happen under one lock so no write slips between them
        let missed: Vec<WatchEvent> = state
            .history
            .iter()
            .filter(|e| e.revision >= from_revision && e.key.starts_with(prefix))
            .cloned()
            .collect();
        if let Some(batch) = WatchBatch::from_events(missed) {
            let _ = tx.send(Ok(batch));
        }
        state.watchers.push(Watcher { prefix: prefix.to_string(), tx });
        Ok(rx)
    }
}
