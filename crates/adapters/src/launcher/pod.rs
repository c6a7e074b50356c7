// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Manifests for the workloads of a task.

use super::{GeneratorParams, LaunchError, LauncherConfig, ProvisionerParams};
use k8s_openapi::api::core::v1::{PersistentVolumeClaim, Pod, Service};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};

/// Label carrying the owning task name; used to find workloads on cleanup.
pub const TASK_LABEL: &str = "tg.carbynestack.io/task";
/// Label distinguishing generator and provisioner pods.
pub const ROLE_LABEL: &str = "tg.carbynestack.io/role";

const SHARED_FOLDER: &str = "/kii";
const TUPLE_FILE: &str = "/kii/tuples";

pub fn claim_name(task: &str) -> String {
    task.to_string()
}

pub fn service_name(task: &str) -> String {
    format!("{task}-rendezvous")
}

pub fn generator_pod_name(task: &str) -> String {
    format!("{task}-generator")
}

pub fn provisioner_pod_name(task: &str) -> String {
    format!("{task}-provisioner")
}

fn env_var(name: impl Into<String>, value: impl ToString) -> Value {
    json!({ "name": name.into(), "value": value.to_string() })
}

fn labels(task: &str, role: Option<&str>) -> Value {
    let mut labels = json!({
        "app.kubernetes.io/managed-by": "tgd",
        TASK_LABEL: task,
    });
    if let (Some(role), Some(map)) = (role, labels.as_object_mut()) {
        map.insert(ROLE_LABEL.to_string(), Value::String(role.to_string()));
    }
    labels
}

fn decode<T: DeserializeOwned>(name: &str, manifest: Value) -> Result<T, LaunchError> {
    serde_json::from_value(manifest)
        .map_err(|e| LaunchError::Manifest { name: name.to_string(), reason: e.to_string() })
}

fn shared_volume(task: &str) -> Value {
    json!({
        "name": "kii",
        "persistentVolumeClaim": { "claimName": claim_name(task) },
    })
}

/// Storage shared by the generator and provisioner of a task.
pub fn claim(config: &LauncherConfig, task: &str) -> Result<PersistentVolumeClaim, LaunchError> {
    let name = claim_name(task);
    decode(
        &name,
        json!({
            "metadata": {
                "name": name,
                "namespace": config.namespace,
                "labels": labels(task, None),
            },
            "spec": {
                "accessModes": ["ReadWriteOnce"],
                "resources": { "requests": { "storage": config.storage_size } },
            },
        }),
    )
}

/// Load balancer through which remote generators reach the local one.
pub fn rendezvous_service(config: &LauncherConfig, task: &str) -> Result<Service, LaunchError> {
    let name = service_name(task);
    decode(
        &name,
        json!({
            "metadata": {
                "name": name,
                "namespace": config.namespace,
                "labels": labels(task, None),
            },
            "spec": {
                "type": "LoadBalancer",
                "selector": labels(task, Some("generator")),
                "ports": [{
                    "name": "rendezvous",
                    "protocol": "TCP",
                    "port": config.rendezvous_port,
                    "targetPort": config.rendezvous_port,
                }],
            },
        }),
    )
}

pub fn generator_env(params: &GeneratorParams) -> Vec<Value> {
    let mut env = vec![
        env_var("KII_JOB_ID", params.job_id),
        env_var("KII_PLAYER_COUNT", params.endpoints.len()),
        env_var("KII_TUPLE_TYPE", params.tuple_type),
        env_var("KII_TUPLES_PER_JOB", params.count),
        env_var("KII_PLAYER_NUMBER", params.player),
        env_var("KII_SHARED_FOLDER", SHARED_FOLDER),
        env_var("KII_TUPLE_FILE", TUPLE_FILE),
    ];
    env.extend(
        params
            .endpoints
            .iter()
            .enumerate()
            .map(|(i, endpoint)| env_var(format!("KII_PLAYER_ENDPOINT_{i}"), endpoint)),
    );
    env
}

pub fn generator_pod(config: &LauncherConfig, params: &GeneratorParams) -> Result<Pod, LaunchError> {
    let name = generator_pod_name(&params.task);
    let param_volume = |volume: &str, config_map: &str| {
        json!({
            "name": volume,
            "configMap": { "name": config_map, "optional": true },
        })
    };
    let param_mount = |volume: &str| {
        json!({ "name": volume, "readOnly": true, "mountPath": format!("/etc/kii/{volume}") })
    };
    decode(
        &name,
        json!({
            "metadata": {
                "name": name,
                "namespace": config.namespace,
                "labels": labels(&params.task, Some("generator")),
            },
            "spec": {
                "restartPolicy": "Never",
                "containers": [{
                    "name": "generator",
                    "image": params.image,
                    "imagePullPolicy": params.pull_policy.to_string(),
                    "command": ["/bin/bash", "-c"],
                    "args": ["./kii-run.sh"],
                    "ports": [{ "containerPort": config.rendezvous_port, "protocol": "TCP" }],
                    "env": generator_env(params),
                    "volumeMounts": [
                        { "name": "kii", "mountPath": SHARED_FOLDER },
                        param_mount("params"),
                        param_mount("secret-params"),
                        param_mount("extra-params"),
                    ],
                }],
                "volumes": [
                    shared_volume(&params.task),
                    param_volume("params", &config.params_config_map),
                    {
                        "name": "secret-params",
                        "secret": { "secretName": config.secret_params, "optional": true },
                    },
                    param_volume("extra-params", &config.extra_params_config_map),
                ],
            },
        }),
    )
}

pub fn provisioner_pod(config: &LauncherConfig, params: &ProvisionerParams) -> Result<Pod, LaunchError> {
    let name = provisioner_pod_name(&params.task);
    decode(
        &name,
        json!({
            "metadata": {
                "name": name,
                "namespace": config.namespace,
                "labels": labels(&params.task, Some("provisioner")),
            },
            "spec": {
                "restartPolicy": "Never",
                "containers": [{
                    "name": "provisioner",
                    "image": config.provisioner_image,
                    "env": [
                        env_var("KII_JOB_ID", params.job_id),
                        env_var("KII_TUPLE_TYPE", params.tuple_type),
                        env_var("KII_TUPLE_FILE", TUPLE_FILE),
                        env_var("KII_TUPLE_STORE_URL", &config.tuple_store_url),
                    ],
                    "volumeMounts": [{ "name": "kii", "mountPath": SHARED_FOLDER }],
                }],
                "volumes": [shared_volume(&params.task)],
            },
        }),
    )
}

#[cfg(test)]
#[path = "pod_tests.rs"]
mod tests;
