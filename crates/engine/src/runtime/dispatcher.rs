// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Roster watch dispatcher.
//!
//! Mirrors remote state into local resources. The watch starts one past the
//! party's head revision so anything missed while down is replayed, and the
//! head only advances once a whole batch has been handled. A transient
//! failure tears the watch down without moving the head, so the batch is
//! replayed after the backoff; handlers are idempotent.
//!
//! A party whose local store holds no jobs (a fresh store, or one that lost
//! its state) cannot rely on its head: whatever it mirrored before is gone.
//! It lists the current roster instead and watches on from that listing.

use super::Runtime;
use crate::EngineError;
use std::sync::Arc;
use tg_adapters::{TupleStore, WorkloadLauncher};
use tg_core::{task_name, Clock, Job, Task};
use tg_storage::value;
use tg_storage::{
    EntryKey, EventKind, Key, ResourceStore, RosterKey, RosterStore, StoreError, WatchEvent,
};
use tokio_util::sync::CancellationToken;

impl<S, R, T, L, C> Runtime<S, R, T, L, C>
where
    S: RosterStore,
    R: ResourceStore,
    T: TupleStore,
    L: WorkloadLauncher,
    C: Clock,
{
    pub(crate) async fn run_dispatcher(self: Arc<Self>, cancel: CancellationToken) {
        loop {
            match self.watch_roster(&cancel).await {
                Ok(()) => break,
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        backoff_ms = self.config.backoff.as_millis() as u64,
                        "roster watch torn down"
                    );
                }
            }
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(self.config.backoff) => {}
            }
        }
        tracing::debug!("dispatcher stopped");
    }

    /// Watch until cancelled (`Ok`) or until the watch fails.
    async fn watch_roster(&self, cancel: &CancellationToken) -> Result<(), EngineError> {
        let player = self.party.index();
        let head = if self.resources.list_jobs().await?.is_empty() {
            self.mirror_listing(player).await?
        } else {
            self.roster.head(player).await?
        };
        let mut stream = self.roster.watch(head + 1).await?;
        tracing::info!(head, "watching roster");
        loop {
            let batch = tokio::select! {
                _ = cancel.cancelled() => return Ok(()),
                batch = stream.recv() => batch,
            };
            let batch = match batch {
                Some(batch) => batch?,
                None => return Err(StoreError::WatchClosed("watch stream ended".to_string()).into()),
            };
            for event in &batch.events {
                self.dispatch(event).await?;
            }
            self.roster.set_head(player, batch.revision).await?;
            tracing::debug!(revision = batch.revision, events = batch.events.len(), "advanced head");
        }
    }

    /// Mirror every key currently in the roster and move the head to the
    /// revision the listing was read at.
    async fn mirror_listing(&self, player: u32) -> Result<i64, EngineError> {
        let listing = self.roster.list().await?;
        for event in &listing.events {
            self.dispatch(event).await?;
        }
        self.roster.set_head(player, listing.revision).await?;
        tracing::info!(revision = listing.revision, keys = listing.events.len(), "mirrored roster listing");
        Ok(listing.revision)
    }

    /// Handle one event; malformed input is logged and skipped.
    pub(crate) async fn dispatch(&self, event: &WatchEvent) -> Result<(), EngineError> {
        match self.handle_event(event).await {
            Err(e) if !e.is_transient() => {
                tracing::warn!(key = event.key, revision = event.revision, error = %e, "dropping roster event");
                Ok(())
            }
            result => result,
        }
    }

    async fn handle_event(&self, event: &WatchEvent) -> Result<(), EngineError> {
        match event.key.parse::<Key>()? {
            Key::Roster(key) => self.mirror_job(&key, event).await,
            Key::Entry(key) if self.party.is_local(key.player()) => Ok(()),
            Key::Entry(key) => self.mirror_task(&key, event).await,
        }
    }

    async fn mirror_job(&self, key: &RosterKey, event: &WatchEvent) -> Result<(), EngineError> {
        let name = key.job();
        match event.kind {
            EventKind::Put => {
                let spec = value::decode_job_spec(&event.value)?;
                if self.resources.get_job(name).await?.is_some() {
                    return Ok(());
                }
                let job = Job::new(name, spec, self.clock.epoch_ms());
                match self.resources.create_job(job).await {
                    Ok(()) => tracing::info!(job = name, "mirrored job"),
                    Err(e) if e.is_already_exists() => {}
                    Err(e) => return Err(e.into()),
                }
            }
            EventKind::Delete => {
                if self.resources.delete_job(name).await? {
                    tracing::info!(job = name, "deleted job mirror");
                }
            }
        }
        Ok(())
    }

    async fn mirror_task(&self, key: &EntryKey, event: &WatchEvent) -> Result<(), EngineError> {
        let job = key.job();
        let player = key.player();
        if player >= self.party.count() {
            return Err(EngineError::Malformed(format!(
                "player {player} out of range for {} parties",
                self.party.count()
            )));
        }
        let name = task_name(job, player);
        match event.kind {
            EventKind::Put => {
                let status = value::decode_task_status(&event.value)?;
                if !self.await_job(job).await? {
                    tracing::warn!(job, player, "no local job for roster entry, dropping");
                    return Ok(());
                }
                // A concurrent create turns into an update on the next round
                for _ in 0..2 {
                    if self.resources.get_task(&name).await?.is_some() {
                        self.resources.update_task_status(&name, status.clone()).await?;
                        tracing::debug!(task = name, state = %status.state, "updated proxy task");
                        return Ok(());
                    }
                    let proxy = Task::new(job, player).with_status(status.clone());
                    match self.resources.create_task(proxy).await {
                        Ok(()) => {
                            tracing::info!(task = name, state = %status.state, "created proxy task");
                            return Ok(());
                        }
                        Err(e) if e.is_already_exists() => continue,
                        Err(e) => return Err(e.into()),
                    }
                }
                Ok(())
            }
            EventKind::Delete => {
                if self.resources.delete_task(&name).await? {
                    tracing::info!(task = name, "deleted proxy task");
                }
                Ok(())
            }
        }
    }

    /// Wait briefly for a job published elsewhere to become visible locally.
    async fn await_job(&self, job: &str) -> Result<bool, EngineError> {
        for attempt in 0..self.config.job_lookup_attempts.max(1) {
            if attempt > 0 {
                tokio::time::sleep(self.config.job_lookup_delay).await;
            }
            if self.resources.get_job(job).await?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }
}
