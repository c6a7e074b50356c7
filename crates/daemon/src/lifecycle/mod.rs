// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup wiring and graceful shutdown.

mod startup;
pub use startup::{apply_resources, engine_config, startup};

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tg_adapters::{HttpTupleStore, KubeLauncher, TupleStoreError};
use tg_core::{Party, SystemClock};
use tg_engine::Runtime;
use tg_storage::{EtcdRosterStore, MemoryResourceStore, ResourceError, SnapshotError, StoreError};
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::config::FileConfig;

/// Daemon runtime with concrete adapter types
pub type DaemonRuntime =
    Runtime<EtcdRosterStore, MemoryResourceStore, HttpTupleStore, KubeLauncher, SystemClock>;

/// Where the party learns its index and the party count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IdentitySource {
    /// Fixed on the command line.
    Static(Party),
    /// Read from a config map in the launcher namespace.
    ConfigMap { name: String },
}

/// Daemon configuration
#[derive(Debug, Clone)]
pub struct Options {
    /// Roster key scope shared by all parties
    pub scope: String,
    pub etcd_endpoints: Vec<String>,
    pub etcd_dial_timeout: Duration,
    pub tuple_store_url: String,
    /// Overrides the launcher's provisioner image when set
    pub provisioner_image: Option<String>,
    pub identity: IdentitySource,
    pub state_dir: PathBuf,
    pub file: FileConfig,
}

impl Options {
    /// Snapshot named by the config file, else `resources.json` in the state directory.
    pub fn snapshot_path(&self) -> PathBuf {
        self.file.snapshot.clone().unwrap_or_else(|| self.state_dir.join("resources.json"))
    }
}

/// A started party.
pub struct Daemon {
    pub runtime: Arc<DaemonRuntime>,
    cancel: CancellationToken,
    handles: Vec<JoinHandle<()>>,
}

impl Daemon {
    /// Stop every loop and wait for them to finish, up to `drain`.
    ///
    /// Workloads keep running; the next start picks them up again through
    /// the resync and the roster replay.
    pub async fn shutdown(self, drain: Duration) {
        info!("Shutting down daemon...");
        self.cancel.cancel();
        let handles = self.handles;
        let joined = tokio::time::timeout(drain, async move {
            for handle in handles {
                if let Err(e) = handle.await {
                    warn!(error = %e, "runtime task ended abnormally");
                }
            }
        })
        .await;
        if joined.is_err() {
            warn!(drain_ms = drain.as_millis() as u64, "runtime tasks still running after drain timeout");
        }
        info!("Daemon shutdown complete");
    }
}

/// Lifecycle errors
#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("kubernetes client: {0}")]
    Kube(#[from] kube::Error),

    #[error("roster store: {0}")]
    Roster(#[from] StoreError),

    #[error("resource snapshot at {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: SnapshotError,
    },

    #[error("resource store: {0}")]
    Resource(#[from] ResourceError),

    #[error("tuple store: {0}")]
    TupleStore(#[from] TupleStoreError),

    #[error("startup cancelled")]
    Cancelled,
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
