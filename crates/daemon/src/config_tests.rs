// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use yare::parameterized;

const FULL: &str = r#"
snapshot = "/var/lib/tgd/resources.json"

[scheduler]
name = "castor"
concurrency = 2
ttl_secs = 120
interval_secs = 30
strategy = "least-available-first"

[[scheduler.policies]]
type = "BIT_GFP"
threshold = 50000
priority = 1

[[scheduler.policies]]
type = "MULTIPLICATION_TRIPLE_GFP"
threshold = 10000
priority = 8

[[generators]]
name = "mp-spdz"
image = "carbynestack/klyshko-mp-spdz:1.0"
pull_policy = "Always"

[[generators.supports]]
type = "BIT_GFP"
batch_size = 100000

[[generators.supports]]
type = "MULTIPLICATION_TRIPLE_GFP"
batch_size = 5000

[launcher]
namespace = "vcp"
storage_size = "1Gi"
rendezvous_port = 5001
poll_interval_secs = 2
"#;

#[test]
fn parses_full_config() {
    let config = FileConfig::parse(FULL).unwrap();

    assert_eq!(config.snapshot, Some(PathBuf::from("/var/lib/tgd/resources.json")));

    let scheduler = config.scheduler().unwrap();
    assert_eq!(scheduler.name, "castor");
    assert_eq!(scheduler.spec.concurrency, 2);
    assert_eq!(scheduler.spec.ttl_secs, 120);
    assert_eq!(scheduler.spec.strategy, StrategyKind::LeastAvailableFirst);
    assert_eq!(scheduler.spec.policies.len(), 2);
    assert_eq!(scheduler.spec.policies[1].tuple_type, TupleType::MultiplicationTripleGfp);
    assert_eq!(scheduler.spec.policies[1].priority, 8);
    assert_eq!(config.scheduler_interval(), Some(Duration::from_secs(30)));

    let generators = config.generators();
    assert_eq!(generators.len(), 1);
    assert_eq!(generators[0].generator.image_pull_policy, PullPolicy::Always);
    assert_eq!(generators[0].support_for(TupleType::MultiplicationTripleGfp).unwrap().batch_size, 5000);

    assert_eq!(config.workload_poll(), Some(Duration::from_secs(2)));
    let launcher = config.launcher_config(LauncherConfig::default());
    assert_eq!(launcher.namespace, "vcp");
    assert_eq!(launcher.storage_size, "1Gi");
    assert_eq!(launcher.rendezvous_port, 5001);
}

#[test]
fn empty_config_has_no_resources() {
    let config = FileConfig::parse("").unwrap();

    assert!(config.scheduler().is_none());
    assert!(config.generators().is_empty());
    assert_eq!(config.scheduler_interval(), None);
    assert_eq!(config.launcher_config(LauncherConfig::default()), LauncherConfig::default());
}

#[test]
fn scheduler_defaults() {
    let config = FileConfig::parse("[scheduler]\nname = \"s\"\n").unwrap();
    let scheduler = config.scheduler().unwrap();

    assert_eq!(scheduler.spec.concurrency, 1);
    assert_eq!(scheduler.spec.ttl_secs, 600);
    assert_eq!(scheduler.spec.strategy, StrategyKind::Lottery);
    assert!(scheduler.spec.policies.is_empty());
}

#[parameterized(
    zero_priority = { "[scheduler]\nname = \"s\"\n[[scheduler.policies]]\ntype = \"BIT_GFP\"\nthreshold = 1\npriority = 0\n" },
    duplicate_policy = { "[scheduler]\nname = \"s\"\n[[scheduler.policies]]\ntype = \"BIT_GFP\"\nthreshold = 1\npriority = 1\n[[scheduler.policies]]\ntype = \"BIT_GFP\"\nthreshold = 2\npriority = 1\n" },
    empty_image = { "[[generators]]\nname = \"g\"\nimage = \"\"\n" },
    zero_batch = { "[[generators]]\nname = \"g\"\nimage = \"i\"\n[[generators.supports]]\ntype = \"BIT_GFP\"\nbatch_size = 0\n" },
    duplicate_support = { "[[generators]]\nname = \"g\"\nimage = \"i\"\n[[generators.supports]]\ntype = \"BIT_GFP\"\nbatch_size = 1\n[[generators.supports]]\ntype = \"BIT_GFP\"\nbatch_size = 2\n" },
    unknown_tuple_type = { "[[generators]]\nname = \"g\"\nimage = \"i\"\n[[generators.supports]]\ntype = \"NOPE\"\nbatch_size = 1\n" },
    unknown_field = { "[launcher]\nnamespaces = \"x\"\n" },
)]
fn rejects_invalid_config(text: &str) {
    assert!(FileConfig::parse(text).is_err());
}

#[test]
fn load_reports_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("absent.toml");

    let err = FileConfig::load(&path).unwrap_err();

    assert!(matches!(err, ConfigError::Read { .. }));
}

#[test]
fn load_reads_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tgd.toml");
    std::fs::write(&path, FULL).unwrap();

    let config = FileConfig::load(&path).unwrap();

    assert_eq!(config.scheduler().unwrap().name, "castor");
}
