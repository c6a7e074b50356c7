// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;
use tg_core::{Job, StrategyKind};
use tg_engine::EngineConfig;
use tg_storage::ResourceStore;

const CONFIG: &str = r#"
[scheduler]
name = "castor"
concurrency = 3
interval_secs = 15

[[scheduler.policies]]
type = "BIT_GFP"
threshold = 100
priority = 1

[[generators]]
name = "mp-spdz"
image = "carbynestack/klyshko-mp-spdz:1.0"

[[generators.supports]]
type = "BIT_GFP"
batch_size = 1000

[launcher]
poll_interval_secs = 3
"#;

fn owned_job(name: &str, owner: &str) -> Job {
    Job::builder().name(name).owner(owner).build()
}

#[tokio::test]
async fn apply_resources_registers_generators_and_scheduler() {
    let resources = MemoryResourceStore::new();
    let file = FileConfig::parse(CONFIG).unwrap();

    apply_resources(&resources, &file).await.unwrap();

    let generators = resources.list_generators().await.unwrap();
    assert_eq!(generators.len(), 1);
    assert_eq!(generators[0].name, "mp-spdz");
    let scheduler = resources.get_scheduler("castor").await.unwrap().unwrap();
    assert_eq!(scheduler.spec.concurrency, 3);
    assert_eq!(scheduler.spec.strategy, StrategyKind::Lottery);
}

#[tokio::test]
async fn apply_resources_replaces_existing_scheduler_spec() {
    let resources = MemoryResourceStore::new();
    apply_resources(&resources, &FileConfig::parse(CONFIG).unwrap()).await.unwrap();
    resources.create_job(owned_job("castor-1", "castor")).await.unwrap();

    let updated = CONFIG.replace("concurrency = 3", "concurrency = 5");
    apply_resources(&resources, &FileConfig::parse(&updated).unwrap()).await.unwrap();

    let scheduler = resources.get_scheduler("castor").await.unwrap().unwrap();
    assert_eq!(scheduler.spec.concurrency, 5);
    assert!(resources.get_job("castor-1").await.unwrap().is_some());
}

#[tokio::test]
async fn apply_resources_removes_undeclared_scheduler_and_its_jobs() {
    let resources = MemoryResourceStore::new();
    apply_resources(&resources, &FileConfig::parse(CONFIG).unwrap()).await.unwrap();
    resources.create_job(owned_job("castor-1", "castor")).await.unwrap();

    apply_resources(&resources, &FileConfig::default()).await.unwrap();

    assert!(resources.list_schedulers().await.unwrap().is_empty());
    assert!(resources.get_job("castor-1").await.unwrap().is_none());
}

#[test]
#[serial]
fn engine_config_layers_file_over_defaults() {
    std::env::remove_var("TG_WORKLOAD_POLL_MS");
    std::env::remove_var("TG_WATCH_BACKOFF_MS");
    let file = FileConfig::parse(CONFIG).unwrap();

    let config = engine_config(&file);

    assert_eq!(config.scheduler_interval, Duration::from_secs(15));
    assert_eq!(config.workload_poll, Duration::from_secs(3));
    assert_eq!(config.backoff, EngineConfig::default().backoff);
}

#[test]
#[serial]
fn engine_config_env_overrides_file() {
    std::env::set_var("TG_WORKLOAD_POLL_MS", "500");
    std::env::set_var("TG_WATCH_BACKOFF_MS", "750");
    let file = FileConfig::parse(CONFIG).unwrap();

    let config = engine_config(&file);

    std::env::remove_var("TG_WORKLOAD_POLL_MS");
    std::env::remove_var("TG_WATCH_BACKOFF_MS");
    assert_eq!(config.workload_poll, Duration::from_millis(500));
    assert_eq!(config.backoff, Duration::from_millis(750));
}

#[test]
fn engine_config_defaults_without_file() {
    let config = engine_config(&FileConfig::default());

    assert_eq!(config.scheduler_interval, Duration::from_secs(60));
}

fn options(state_dir: &std::path::Path, file: FileConfig) -> Options {
    Options {
        scope: "default".to_string(),
        etcd_endpoints: vec!["127.0.0.1:2379".to_string()],
        etcd_dial_timeout: Duration::from_secs(5),
        tuple_store_url: "http://castor:10100".to_string(),
        provisioner_image: None,
        identity: IdentitySource::Static(Party::new(0, 2).unwrap()),
        state_dir: state_dir.to_path_buf(),
        file,
    }
}

#[test]
fn snapshot_defaults_to_state_dir() {
    let options = options(std::path::Path::new("/var/lib/tgd"), FileConfig::default());
    assert_eq!(options.snapshot_path(), PathBuf::from("/var/lib/tgd/resources.json"));
}

#[test]
fn config_file_snapshot_wins() {
    let file = FileConfig::parse("snapshot = \"/data/party.json\"\n").unwrap();
    let options = options(std::path::Path::new("/var/lib/tgd"), file);
    assert_eq!(options.snapshot_path(), PathBuf::from("/data/party.json"));
}

#[tokio::test]
async fn mirrored_jobs_survive_restart_without_configured_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let options = options(dir.path(), FileConfig::parse(CONFIG).unwrap());
    {
        let resources = MemoryResourceStore::open(&options.snapshot_path()).unwrap();
        apply_resources(&resources, &options.file).await.unwrap();
        resources.create_job(Job::builder().name("mirror").build()).await.unwrap();
    }

    let resources = MemoryResourceStore::open(&options.snapshot_path()).unwrap();
    apply_resources(&resources, &options.file).await.unwrap();

    assert!(resources.get_job("mirror").await.unwrap().is_some());
    assert_eq!(resources.list_schedulers().await.unwrap().len(), 1);
}
