// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workload launcher: turns a local task into running compute.
//!
//! A task owns a storage claim and a rendezvous service, created while it
//! prepares, plus a generator and a provisioner workload started in order.
//! The launcher has no change feed; callers poll phases.

mod cluster;
pub mod pod;

pub use cluster::KubeLauncher;

use async_trait::async_trait;
use tg_core::{PullPolicy, TupleType};
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    #[error("{action} {name} failed: {reason}")]
    Api { action: &'static str, name: String, reason: String },
    #[error("invalid manifest for {name}: {reason}")]
    Manifest { name: String, reason: String },
}

/// Observed phase of a workload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkloadPhase {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// No workload exists under the expected name
    Missing,
}

tg_core::simple_display! {
    WorkloadPhase {
        Pending => "pending",
        Running => "running",
        Succeeded => "succeeded",
        Failed => "failed",
        Missing => "missing",
    }
}

impl WorkloadPhase {
    /// Map a pod's `status.phase`. Unknown phases count as pending.
    pub fn from_pod_phase(phase: Option<&str>) -> Self {
        match phase {
            Some("Running") => WorkloadPhase::Running,
            Some("Succeeded") => WorkloadPhase::Succeeded,
            Some("Failed") => WorkloadPhase::Failed,
            _ => WorkloadPhase::Pending,
        }
    }
}

/// Parameters handed to the generator workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorParams {
    pub task: String,
    pub job_id: Uuid,
    pub tuple_type: TupleType,
    pub count: u64,
    pub player: u32,
    /// Rendezvous endpoints indexed by player
    pub endpoints: Vec<String>,
    pub image: String,
    pub pull_policy: PullPolicy,
}

/// Parameters handed to the provisioner workload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionerParams {
    pub task: String,
    pub job_id: Uuid,
    pub tuple_type: TupleType,
}

/// Settings shared by every workload the launcher creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LauncherConfig {
    pub namespace: String,
    pub storage_size: String,
    pub rendezvous_port: u16,
    pub provisioner_image: String,
    pub tuple_store_url: String,
    pub params_config_map: String,
    pub secret_params: String,
    pub extra_params_config_map: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            namespace: "default".to_string(),
            storage_size: "100Mi".to_string(),
            rendezvous_port: 5000,
            provisioner_image: "carbynestack/klyshko-provisioner:latest".to_string(),
            tuple_store_url: "http://cs-castor.default.svc.cluster.local:10100".to_string(),
            params_config_map: "io.carbynestack.engine.params".to_string(),
            secret_params: "io.carbynestack.engine.params.secret".to_string(),
            extra_params_config_map: "io.carbynestack.engine.params.extra".to_string(),
        }
    }
}

impl LauncherConfig {
    tg_core::setters! {
        into {
            namespace: String,
            storage_size: String,
            provisioner_image: String,
            tuple_store_url: String,
            params_config_map: String,
            secret_params: String,
            extra_params_config_map: String,
        }
        set {
            rendezvous_port: u16,
        }
    }
}

/// Creates and observes the workloads of local tasks.
///
/// Every operation is idempotent: creating something that exists and
/// releasing something already gone both succeed.
#[async_trait]
pub trait WorkloadLauncher: Clone + Send + Sync + 'static {
    /// Ensure the task's storage claim and rendezvous service exist.
    async fn prepare(&self, task: &str) -> Result<(), LaunchError>;

    /// Externally reachable `host:port` of the task, once assigned.
    async fn rendezvous_address(&self, task: &str) -> Result<Option<String>, LaunchError>;

    async fn start_generator(&self, params: &GeneratorParams) -> Result<(), LaunchError>;

    async fn generator_phase(&self, task: &str) -> Result<WorkloadPhase, LaunchError>;

    async fn start_provisioner(&self, params: &ProvisionerParams) -> Result<(), LaunchError>;

    async fn provisioner_phase(&self, task: &str) -> Result<WorkloadPhase, LaunchError>;

    /// Delete everything created for the task.
    async fn release(&self, task: &str) -> Result<(), LaunchError>;
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{GeneratorParams, LaunchError, ProvisionerParams, WorkloadLauncher, WorkloadPhase};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Recorded launcher call
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum LauncherCall {
        Prepare(String),
        StartGenerator(GeneratorParams),
        StartProvisioner(ProvisionerParams),
        Release(String),
    }

    #[derive(Default)]
    struct FakeLauncherState {
        calls: Vec<LauncherCall>,
        addresses: HashMap<String, String>,
        generators: HashMap<String, WorkloadPhase>,
        provisioners: HashMap<String, WorkloadPhase>,
        failures: usize,
    }

    impl FakeLauncherState {
        fn check_failure(&mut self, action: &'static str, name: &str) -> Result<(), LaunchError> {
            if self.failures > 0 {
                self.failures -= 1;
                return Err(LaunchError::Api {
                    action,
                    name: name.to_string(),
                    reason: "injected failure".to_string(),
                });
            }
            Ok(())
        }
    }

    /// In-memory launcher whose workloads only change phase when told to.
    ///
    /// Started workloads report `Running` until a test sets another phase.
    #[derive(Clone, Default)]
    pub struct FakeLauncher {
        inner: Arc<Mutex<FakeLauncherState>>,
    }

    impl FakeLauncher {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn calls(&self) -> Vec<LauncherCall> {
            self.inner.lock().calls.clone()
        }

        pub fn set_address(&self, task: &str, address: impl Into<String>) {
            self.inner.lock().addresses.insert(task.to_string(), address.into());
        }

        pub fn set_generator_phase(&self, task: &str, phase: WorkloadPhase) {
            self.inner.lock().generators.insert(task.to_string(), phase);
        }

        pub fn set_provisioner_phase(&self, task: &str, phase: WorkloadPhase) {
            self.inner.lock().provisioners.insert(task.to_string(), phase);
        }

        /// Fail the next `n` calls of any kind.
        pub fn fail_calls(&self, n: usize) {
            self.inner.lock().failures = n;
        }

        pub fn generator_params(&self, task: &str) -> Option<GeneratorParams> {
            self.inner.lock().calls.iter().rev().find_map(|call| match call {
                LauncherCall::StartGenerator(p) if p.task == task => Some(p.clone()),
                _ => None,
            })
        }

        pub fn released(&self, task: &str) -> bool {
            self.inner.lock().calls.iter().any(|c| matches!(c, LauncherCall::Release(t) if t == task))
        }
    }

    #[async_trait]
    impl WorkloadLauncher for FakeLauncher {
        async fn prepare(&self, task: &str) -> Result<(), LaunchError> {
            let mut state = self.inner.lock();
            state.check_failure("prepare", task)?;
            state.calls.push(LauncherCall::Prepare(task.to_string()));
            Ok(())
        }

        async fn rendezvous_address(&self, task: &str) -> Result<Option<String>, LaunchError> {
            let mut state = self.inner.lock();
            state.check_failure("read address of", task)?;
            Ok(state.addresses.get(task).cloned())
        }

        async fn start_generator(&self, params: &GeneratorParams) -> Result<(), LaunchError> {
            let mut state = self.inner.lock();
            state.check_failure("start generator", &params.task)?;
            state.generators.entry(params.task.clone()).or_insert(WorkloadPhase::Running);
            state.calls.push(LauncherCall::StartGenerator(params.clone()));
            Ok(())
        }

        async fn generator_phase(&self, task: &str) -> Result<WorkloadPhase, LaunchError> {
            let mut state = self.inner.lock();
            state.check_failure("read generator of", task)?;
            Ok(state.generators.get(task).copied().unwrap_or(WorkloadPhase::Missing))
        }

        async fn start_provisioner(&self, params: &ProvisionerParams) -> Result<(), LaunchError> {
            let mut state = self.inner.lock();
            state.check_failure("start provisioner", &params.task)?;
            state.provisioners.entry(params.task.clone()).or_insert(WorkloadPhase::Running);
            state.calls.push(LauncherCall::StartProvisioner(params.clone()));
            Ok(())
        }

        async fn provisioner_phase(&self, task: &str) -> Result<WorkloadPhase, LaunchError> {
            let mut state = self.inner.lock();
            state.check_failure("read provisioner of", task)?;
            Ok(state.provisioners.get(task).copied().unwrap_or(WorkloadPhase::Missing))
        }

        async fn release(&self, task: &str) -> Result<(), LaunchError> {
            let mut state = self.inner.lock();
            state.check_failure("release", task)?;
            state.generators.remove(task);
            state.provisioners.remove(task);
            state.addresses.remove(task);
            state.calls.push(LauncherCall::Release(task.to_string()));
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeLauncher, LauncherCall};

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
