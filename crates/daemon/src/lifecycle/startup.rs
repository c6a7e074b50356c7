// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon startup and initialization logic.

use std::sync::Arc;

use tg_adapters::{ConfigMapIdentity, HttpTupleStore, KubeLauncher, LauncherConfig, StaticIdentity};
use tg_core::SystemClock;
use tg_engine::{resolve_party, EngineConfig, Runtime, RuntimeDeps};
use tg_storage::{EtcdRosterStore, MemoryResourceStore, ResourceError, ResourceStore};
use tokio_util::sync::CancellationToken;
use tracing::info;

use super::{Daemon, IdentitySource, LifecycleError, Options};
use crate::config::FileConfig;
use crate::env;

/// Start the daemon.
///
/// Blocks until the local party is known; a cancelled lookup ends startup
/// with [`LifecycleError::Cancelled`].
pub async fn startup(options: Options, cancel: &CancellationToken) -> Result<Daemon, LifecycleError> {
    // 1. Kubernetes client for identity lookup and workloads
    let client = kube::Client::try_default().await?;

    let mut launcher_config = options
        .file
        .launcher_config(LauncherConfig::default().tuple_store_url(&options.tuple_store_url));
    if let Some(image) = &options.provisioner_image {
        launcher_config = launcher_config.provisioner_image(image);
    }

    // 2. Resolve the local party, retrying until the config map is readable
    let retry = env::identity_retry();
    let party = match &options.identity {
        IdentitySource::Static(party) => resolve_party(&StaticIdentity(*party), retry, cancel).await,
        IdentitySource::ConfigMap { name } => {
            let identity = ConfigMapIdentity::new(client.clone(), &launcher_config.namespace, name);
            resolve_party(&identity, retry, cancel).await
        }
    }
    .ok_or(LifecycleError::Cancelled)?;

    // 3. Shared coordination store
    let roster = EtcdRosterStore::connect(&options.etcd_endpoints, options.etcd_dial_timeout).await?;

    // 4. Party-local resources, restored from and written through to the snapshot
    let snapshot = options.snapshot_path();
    let resources = MemoryResourceStore::open(&snapshot)
        .map_err(|source| LifecycleError::Snapshot { path: snapshot.clone(), source })?;
    info!(path = %snapshot.display(), "opened resource snapshot");
    apply_resources(&resources, &options.file).await?;

    let tuple_store = HttpTupleStore::new(&options.tuple_store_url)?;
    let launcher = KubeLauncher::new(client, launcher_config);

    // 5. Start the loops
    let runtime = Arc::new(Runtime::new(
        party,
        options.scope.clone(),
        RuntimeDeps { roster, resources, tuple_store, launcher },
        SystemClock,
        engine_config(&options.file),
    ));
    let cancel = cancel.child_token();
    let handles = runtime.start(&cancel);

    info!(%party, scope = %options.scope, "daemon started");
    Ok(Daemon { runtime, cancel, handles })
}

/// Make the store's generators and scheduler match the config file.
///
/// Schedulers the file no longer declares are deleted along with their jobs.
pub async fn apply_resources<R: ResourceStore>(
    resources: &R,
    file: &FileConfig,
) -> Result<(), ResourceError> {
    for generator in file.generators() {
        info!(generator = %generator.name, "applying generator");
        resources.apply_generator(generator).await?;
    }

    let declared = file.scheduler();
    for existing in resources.list_schedulers().await? {
        if declared.as_ref().is_some_and(|s| s.name == existing.name) {
            continue;
        }
        info!(scheduler = %existing.name, "removing undeclared scheduler");
        resources.delete_scheduler(&existing.name).await?;
    }
    if let Some(scheduler) = declared {
        info!(scheduler = %scheduler.name, "applying scheduler");
        resources.apply_scheduler(scheduler).await?;
    }
    Ok(())
}

/// Engine timings: defaults, then the config file, then the environment.
pub fn engine_config(file: &FileConfig) -> EngineConfig {
    let mut config = EngineConfig::default();
    if let Some(interval) = file.scheduler_interval() {
        config = config.scheduler_interval(interval);
    }
    if let Some(poll) = env::workload_poll().or(file.workload_poll()) {
        config = config.workload_poll(poll);
    }
    if let Some(backoff) = env::watch_backoff() {
        config = config.backoff(backoff);
    }
    config
}
