// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Kubernetes-backed workload launcher.

use super::pod;
use super::{GeneratorParams, LaunchError, LauncherConfig, ProvisionerParams, WorkloadLauncher, WorkloadPhase};
use async_trait::async_trait;
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use kube::api::{Api, DeleteParams, PostParams};
use kube::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;

const CONFLICT: u16 = 409;
const NOT_FOUND: u16 = 404;

fn api_error(action: &'static str, name: &str, e: kube::Error) -> LaunchError {
    LaunchError::Api { action, name: name.to_string(), reason: e.to_string() }
}

fn has_status(e: &kube::Error, code: u16) -> bool {
    matches!(e, kube::Error::Api(resp) if resp.code == code)
}

/// Launches task workloads as pods in the party's namespace.
#[derive(Clone)]
pub struct KubeLauncher {
    client: Client,
    config: LauncherConfig,
}

impl KubeLauncher {
    pub fn new(client: Client, config: LauncherConfig) -> Self {
        Self { client, config }
    }

    pub fn config(&self) -> &LauncherConfig {
        &self.config
    }

    fn api<K>(&self) -> Api<K>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>,
        <K as kube::Resource>::DynamicType: Default,
    {
        Api::namespaced(self.client.clone(), &self.config.namespace)
    }

    async fn create<K>(&self, name: &str, resource: &K) -> Result<(), LaunchError>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + Debug
            + Serialize
            + DeserializeOwned,
        <K as kube::Resource>::DynamicType: Default,
    {
        match self.api::<K>().create(&PostParams::default(), resource).await {
            Ok(_) => {
                tracing::info!(name, kind = %K::kind(&Default::default()), "created workload resource");
                Ok(())
            }
            Err(e) if has_status(&e, CONFLICT) => Ok(()),
            Err(e) => Err(api_error("create", name, e)),
        }
    }

    async fn delete<K>(&self, name: &str) -> Result<(), LaunchError>
    where
        K: kube::Resource<Scope = k8s_openapi::NamespaceResourceScope>
            + Clone
            + Debug
            + DeserializeOwned,
        <K as kube::Resource>::DynamicType: Default,
    {
        match self.api::<K>().delete(name, &DeleteParams::background()).await {
            Ok(_) => Ok(()),
            Err(e) if has_status(&e, NOT_FOUND) => Ok(()),
            Err(e) => Err(api_error("delete", name, e)),
        }
    }

    async fn pod_phase(&self, name: &str) -> Result<WorkloadPhase, LaunchError> {
        let pod = self.api::<Pod>().get_opt(name).await.map_err(|e| api_error("get", name, e))?;
        Ok(match pod {
            None => WorkloadPhase::Missing,
            Some(pod) => {
                WorkloadPhase::from_pod_phase(pod.status.as_ref().and_then(|s| s.phase.as_deref()))
            }
        })
    }
}

#[async_trait]
impl WorkloadLauncher for KubeLauncher {
    async fn prepare(&self, task: &str) -> Result<(), LaunchError> {
        let claim = pod::claim(&self.config, task)?;
        self.create(&pod::claim_name(task), &claim).await?;
        let service = pod::rendezvous_service(&self.config, task)?;
        self.create(&pod::service_name(task), &service).await
    }

    async fn rendezvous_address(&self, task: &str) -> Result<Option<String>, LaunchError> {
        let name = pod::service_name(task);
        let service =
            self.api::<Service>().get_opt(&name).await.map_err(|e| api_error("get", &name, e))?;
        let ingress = service
            .and_then(|s| s.status)
            .and_then(|s| s.load_balancer)
            .and_then(|lb| lb.ingress)
            .and_then(|ingress| ingress.into_iter().next());
        Ok(ingress
            .and_then(|i| i.ip.or(i.hostname))
            .map(|host| format!("{host}:{}", self.config.rendezvous_port)))
    }

    async fn start_generator(&self, params: &GeneratorParams) -> Result<(), LaunchError> {
        let pod = pod::generator_pod(&self.config, params)?;
        self.create(&pod::generator_pod_name(&params.task), &pod).await
    }

    async fn generator_phase(&self, task: &str) -> Result<WorkloadPhase, LaunchError> {
        self.pod_phase(&pod::generator_pod_name(task)).await
    }

    async fn start_provisioner(&self, params: &ProvisionerParams) -> Result<(), LaunchError> {
        let pod = pod::provisioner_pod(&self.config, params)?;
        self.create(&pod::provisioner_pod_name(&params.task), &pod).await
    }

    async fn provisioner_phase(&self, task: &str) -> Result<WorkloadPhase, LaunchError> {
        self.pod_phase(&pod::provisioner_pod_name(task)).await
    }

    async fn release(&self, task: &str) -> Result<(), LaunchError> {
        self.delete::<Pod>(&pod::provisioner_pod_name(task)).await?;
        self.delete::<Pod>(&pod::generator_pod_name(task)).await?;
        self.delete::<Service>(&pod::service_name(task)).await?;
        self.delete::<PersistentVolumeClaim>(&pod::claim_name(task)).await?;
        tracing::info!(task, "released workloads");
        Ok(())
    }
}
