// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Multi-party harness over in-memory stores and fake adapters.

use crate::{EngineConfig, Runtime, RuntimeDeps};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tg_adapters::{FakeLauncher, FakeTupleStore};
use tg_core::{FakeClock, Party};
use tg_storage::{MemoryResourceStore, MemoryRosterStore, ResourceState};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub const TEST_SCOPE: &str = "default";

pub type TestRuntime =
    Runtime<MemoryRosterStore, MemoryResourceStore, FakeTupleStore, FakeLauncher, FakeClock>;

/// Short timings so specs converge quickly.
pub fn test_config() -> EngineConfig {
    EngineConfig::default()
        .backoff(Duration::from_millis(50))
        .workload_poll(Duration::from_millis(20))
        .scheduler_interval(Duration::from_millis(200))
        .job_lookup_attempts(5)
        .job_lookup_delay(Duration::from_millis(10))
}

/// One party: its runtime plus handles on its fakes.
pub struct TestParty {
    pub runtime: Arc<TestRuntime>,
    pub resources: MemoryResourceStore,
    pub tuple_store: FakeTupleStore,
    pub launcher: FakeLauncher,
}

impl TestParty {
    pub fn new(party: Party, store: &MemoryRosterStore, clock: &FakeClock, config: EngineConfig) -> Self {
        let resources = MemoryResourceStore::new();
        let tuple_store = FakeTupleStore::new();
        let launcher = FakeLauncher::new();
        let deps = RuntimeDeps {
            roster: store.clone(),
            resources: resources.clone(),
            tuple_store: tuple_store.clone(),
            launcher: launcher.clone(),
        };
        let runtime = Runtime::new(party, TEST_SCOPE, deps, clock.clone(), config)
            .with_seed(u64::from(party.index()));
        Self { runtime: Arc::new(runtime), resources, tuple_store, launcher }
    }

    pub fn index(&self) -> u32 {
        self.runtime.party().index()
    }

    pub fn state(&self) -> ResourceState {
        self.resources.state()
    }
}

/// Parties sharing one roster store and one clock.
pub struct TestCluster {
    pub store: MemoryRosterStore,
    pub clock: FakeClock,
    pub parties: Vec<TestParty>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl TestCluster {
    pub fn new(count: u32) -> Self {
        Self::with_config(count, test_config())
    }

    pub fn with_config(count: u32, config: EngineConfig) -> Self {
        let store = MemoryRosterStore::new();
        let clock = FakeClock::new();
        let parties = (0..count)
            .filter_map(|i| Party::new(i, count).ok())
            .map(|party| TestParty::new(party, &store, &clock, config.clone()))
            .collect();
        Self { store, clock, parties, cancel: CancellationToken::new(), handles: Vec::new() }
    }

    pub fn party(&self, index: u32) -> &TestParty {
        &self.parties[index as usize]
    }

    pub fn leader(&self) -> &TestParty {
        self.party(0)
    }

    /// Start the loops of every party.
    pub fn start(&mut self) {
        for party in &self.parties {
            let handles = party.runtime.start(&self.cancel);
            self.handles.extend(handles);
        }
    }

    /// Start the loops of one party only, with its own cancellation.
    pub fn start_party(&self, index: u32) -> (CancellationToken, Vec<JoinHandle<()>>) {
        let cancel = self.cancel.child_token();
        let handles = self.party(index).runtime.start(&cancel);
        (cancel, handles)
    }

    /// Give every rendezvous service an address.
    pub fn assign_addresses(&self, job: &str) {
        for party in &self.parties {
            let task = tg_core::task_name(job, party.index());
            party.launcher.set_address(&task, format!("10.0.0.{}:5000", party.index() + 1));
        }
    }

    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        for handle in self.handles.drain(..) {
            let _ = handle.await;
        }
    }
}

/// Poll `check` until it holds, panicking after `timeout`.
#[allow(clippy::panic)]
pub async fn wait_until<F, Fut>(what: &str, timeout: Duration, mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    loop {
        if check().await {
            return;
        }
        if tokio::time::Instant::now() >= deadline {
            panic!("timed out waiting for {what}");
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}

/// Synchronous form of [`wait_until`].
pub async fn wait_for<F>(what: &str, timeout: Duration, mut check: F)
where
    F: FnMut() -> bool,
{
    wait_until(what, timeout, || std::future::ready(check())).await;
}
