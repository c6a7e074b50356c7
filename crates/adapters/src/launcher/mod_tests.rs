// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use tg_core::TupleType;

#[yare::parameterized(
    running = { Some("Running"), WorkloadPhase::Running },
    succeeded = { Some("Succeeded"), WorkloadPhase::Succeeded },
    failed = { Some("Failed"), WorkloadPhase::Failed },
    pending = { Some("Pending"), WorkloadPhase::Pending },
    unknown = { Some("Unknown"), WorkloadPhase::Pending },
    no_status = { None, WorkloadPhase::Pending },
)]
fn pod_phase_mapping(phase: Option<&str>, expected: WorkloadPhase) {
    assert_eq!(WorkloadPhase::from_pod_phase(phase), expected);
}

#[test]
fn config_setters_chain() {
    let config = LauncherConfig::default().namespace("party-a").storage_size("1Gi").rendezvous_port(6000);
    assert_eq!(config.namespace, "party-a");
    assert_eq!(config.storage_size, "1Gi");
    assert_eq!(config.rendezvous_port, 6000);
    assert_eq!(config.provisioner_image, LauncherConfig::default().provisioner_image);
}

fn generator_params(task: &str) -> GeneratorParams {
    GeneratorParams {
        task: task.to_string(),
        job_id: Uuid::nil(),
        tuple_type: TupleType::BitGfp,
        count: 1000,
        player: 0,
        endpoints: vec!["10.0.0.1:5000".into(), "10.0.0.2:5000".into()],
        image: "generator:test".into(),
        pull_policy: PullPolicy::IfNotPresent,
    }
}

#[tokio::test]
async fn fake_workloads_are_missing_until_started() {
    let launcher = FakeLauncher::new();
    assert_eq!(launcher.generator_phase("job-0").await.unwrap(), WorkloadPhase::Missing);

    launcher.start_generator(&generator_params("job-0")).await.unwrap();
    assert_eq!(launcher.generator_phase("job-0").await.unwrap(), WorkloadPhase::Running);

    launcher.set_generator_phase("job-0", WorkloadPhase::Succeeded);
    launcher.start_generator(&generator_params("job-0")).await.unwrap();
    assert_eq!(launcher.generator_phase("job-0").await.unwrap(), WorkloadPhase::Succeeded);
    assert_eq!(launcher.generator_params("job-0"), Some(generator_params("job-0")));
}

#[tokio::test]
async fn fake_release_forgets_workloads() {
    let launcher = FakeLauncher::new();
    launcher.prepare("job-1").await.unwrap();
    launcher.set_address("job-1", "10.0.0.2:5000");
    let provisioner = ProvisionerParams { task: "job-1".into(), job_id: Uuid::nil(), tuple_type: TupleType::BitGfp };
    launcher.start_provisioner(&provisioner).await.unwrap();

    launcher.release("job-1").await.unwrap();

    assert!(launcher.released("job-1"));
    assert_eq!(launcher.rendezvous_address("job-1").await.unwrap(), None);
    assert_eq!(launcher.provisioner_phase("job-1").await.unwrap(), WorkloadPhase::Missing);
    assert_eq!(
        launcher.calls(),
        vec![
            LauncherCall::Prepare("job-1".into()),
            LauncherCall::StartProvisioner(provisioner),
            LauncherCall::Release("job-1".into()),
        ]
    );
}

#[tokio::test]
async fn fake_injected_failures_are_not_recorded() {
    let launcher = FakeLauncher::new();
    launcher.fail_calls(1);
    assert!(matches!(launcher.prepare("job-0").await, Err(LaunchError::Api { action: "prepare", .. })));
    launcher.prepare("job-0").await.unwrap();
    assert_eq!(launcher.calls(), vec![LauncherCall::Prepare("job-0".into())]);
}
