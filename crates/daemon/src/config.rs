// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon config file.
//!
//! Declares the resources a party starts with (its scheduler and the tuple
//! generators it can run) and the launcher settings. Every section is
//! optional; an absent file means no scheduler and no generators.
//!
//! ```toml
//! snapshot = "/var/lib/tgd/resources.json"
//!
//! [scheduler]
//! name = "castor"
//! concurrency = 1
//! ttl_secs = 600
//! interval_secs = 60
//! strategy = "lottery"
//!
//! [[scheduler.policies]]
//! type = "BIT_GFP"
//! threshold = 50000
//! priority = 1
//!
//! [[generators]]
//! name = "mp-spdz-fake"
//! image = "carbynestack/klyshko-mp-spdz:latest"
//!
//! [[generators.supports]]
//! type = "BIT_GFP"
//! batch_size = 100000
//! ```

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tg_adapters::LauncherConfig;
use tg_core::{
    GeneratorSpec, PullPolicy, Scheduler, SchedulerSpec, SchedulerSpecError, SchedulingPolicy,
    StrategyKind, TupleGenerator, TupleType, TupleTypeSpec,
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("scheduler {name}: {source}")]
    Scheduler {
        name: String,
        #[source]
        source: SchedulerSpecError,
    },
    #[error("generator {name}: {reason}")]
    Generator { name: String, reason: String },
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    /// Where the party's resources are persisted. Falls back to the state directory.
    pub snapshot: Option<PathBuf>,
    pub scheduler: Option<SchedulerSection>,
    #[serde(default)]
    pub generators: Vec<GeneratorSection>,
    #[serde(default)]
    pub launcher: LauncherSection,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchedulerSection {
    pub name: String,
    #[serde(default = "default_concurrency")]
    pub concurrency: u32,
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
    pub interval_secs: Option<u64>,
    #[serde(default)]
    pub strategy: StrategyKind,
    #[serde(default)]
    pub policies: Vec<SchedulingPolicy>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneratorSection {
    pub name: String,
    pub image: String,
    #[serde(default)]
    pub pull_policy: PullPolicy,
    #[serde(default)]
    pub supports: Vec<SupportSection>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SupportSection {
    #[serde(rename = "type")]
    pub tuple_type: TupleType,
    pub batch_size: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LauncherSection {
    pub namespace: Option<String>,
    pub storage_size: Option<String>,
    pub rendezvous_port: Option<u16>,
    pub poll_interval_secs: Option<u64>,
    pub params_config_map: Option<String>,
    pub secret_params: Option<String>,
    pub extra_params_config_map: Option<String>,
}

fn default_concurrency() -> u32 {
    1
}

fn default_ttl_secs() -> u64 {
    600
}

impl FileConfig {
    /// Read and validate the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        Self::parse(&text)
    }

    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let config: FileConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(scheduler) = self.scheduler() {
            scheduler
                .spec
                .validate()
                .map_err(|source| ConfigError::Scheduler { name: scheduler.name.clone(), source })?;
        }
        for generator in &self.generators {
            let invalid = |reason: String| ConfigError::Generator { name: generator.name.clone(), reason };
            if generator.image.is_empty() {
                return Err(invalid("image is empty".to_string()));
            }
            for (i, support) in generator.supports.iter().enumerate() {
                if support.batch_size == 0 {
                    return Err(invalid(format!("batch size for {} is zero", support.tuple_type)));
                }
                if generator.supports[..i].iter().any(|s| s.tuple_type == support.tuple_type) {
                    return Err(invalid(format!("{} listed twice", support.tuple_type)));
                }
            }
        }
        Ok(())
    }

    pub fn scheduler(&self) -> Option<Scheduler> {
        self.scheduler.as_ref().map(|s| Scheduler {
            name: s.name.clone(),
            spec: SchedulerSpec {
                concurrency: s.concurrency,
                ttl_secs: s.ttl_secs,
                strategy: s.strategy,
                policies: s.policies.clone(),
            },
        })
    }

    pub fn generators(&self) -> Vec<TupleGenerator> {
        self.generators
            .iter()
            .map(|g| TupleGenerator {
                name: g.name.clone(),
                generator: GeneratorSpec { image: g.image.clone(), image_pull_policy: g.pull_policy },
                supports: g
                    .supports
                    .iter()
                    .map(|s| TupleTypeSpec { tuple_type: s.tuple_type, batch_size: s.batch_size })
                    .collect(),
            })
            .collect()
    }

    pub fn scheduler_interval(&self) -> Option<Duration> {
        self.scheduler.as_ref()?.interval_secs.map(Duration::from_secs)
    }

    pub fn workload_poll(&self) -> Option<Duration> {
        self.launcher.poll_interval_secs.map(Duration::from_secs)
    }

    /// Overlay the launcher section on `base`.
    pub fn launcher_config(&self, base: LauncherConfig) -> LauncherConfig {
        let section = &self.launcher;
        let mut config = base;
        if let Some(namespace) = &section.namespace {
            config = config.namespace(namespace);
        }
        if let Some(size) = &section.storage_size {
            config = config.storage_size(size);
        }
        if let Some(port) = section.rendezvous_port {
            config = config.rendezvous_port(port);
        }
        if let Some(name) = &section.params_config_map {
            config = config.params_config_map(name);
        }
        if let Some(name) = &section.secret_params {
            config = config.secret_params(name);
        }
        if let Some(name) = &section.extra_params_config_map {
            config = config.extra_params_config_map(name);
        }
        config
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
