// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! tgd: tuple generation operator for one MPC party.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use tg_core::Party;
use tg_daemon::{env, logging, startup, FileConfig, IdentitySource, LifecycleError, Options};
use tokio_util::sync::CancellationToken;

#[derive(Debug, Parser)]
#[command(name = "tgd", version, about = "Coordinates tuple generation across MPC parties")]
struct Args {
    /// TOML file declaring the scheduler, generators and launcher settings
    #[arg(long, env = "TG_CONFIG")]
    config: Option<PathBuf>,

    /// Roster scope shared by every party of the cluster
    #[arg(long, env = "TG_SCOPE", default_value = "default")]
    scope: String,

    /// etcd endpoint used for cross-party coordination (repeatable)
    #[arg(long = "etcd-endpoint", env = "TG_ETCD_ENDPOINTS", value_delimiter = ',', default_value = "127.0.0.1:2379")]
    etcd_endpoints: Vec<String>,

    #[arg(long, env = "TG_ETCD_DIAL_TIMEOUT_SECS", default_value_t = 5)]
    etcd_dial_timeout_secs: u64,

    /// Base URL of the tuple store
    #[arg(long, env = "TG_TUPLE_STORE_URL", default_value = "http://cs-castor.default.svc.cluster.local:10100")]
    tuple_store_url: String,

    /// Directory holding the resource snapshot when the config file names none
    #[arg(long, env = "TG_STATE_DIR", default_value = "/var/lib/tgd")]
    state_dir: PathBuf,

    #[arg(long, env = "TG_PROVISIONER_IMAGE")]
    provisioner_image: Option<String>,

    /// Config map holding `playerId` and `playerCount`
    #[arg(long, env = "TG_PARTY_CONFIG_MAP", default_value = "cs-vcp-config")]
    party_config_map: String,

    /// Fixed party index, skipping the config map lookup
    #[arg(long, env = "TG_PLAYER_INDEX", requires = "player_count")]
    player_index: Option<u32>,

    #[arg(long, env = "TG_PLAYER_COUNT", requires = "player_index")]
    player_count: Option<u32>,

    /// Used when neither TG_LOG nor RUST_LOG is set
    #[arg(long, env = "TG_LOG_LEVEL", default_value = "info")]
    log_level: String,

    #[arg(long, env = "TG_LOG_FILE")]
    log_file: Option<PathBuf>,
}

impl Args {
    fn identity(&self) -> Result<IdentitySource> {
        match (self.player_index, self.player_count) {
            (Some(index), Some(count)) => {
                Ok(IdentitySource::Static(Party::new(index, count).context("invalid static identity")?))
            }
            _ => Ok(IdentitySource::ConfigMap { name: self.party_config_map.clone() }),
        }
    }

    fn options(&self) -> Result<Options> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::default(),
        };
        Ok(Options {
            scope: self.scope.clone(),
            etcd_endpoints: self.etcd_endpoints.clone(),
            etcd_dial_timeout: Duration::from_secs(self.etcd_dial_timeout_secs),
            tuple_store_url: self.tuple_store_url.clone(),
            provisioner_image: self.provisioner_image.clone(),
            identity: self.identity()?,
            state_dir: self.state_dir.clone(),
            file,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let _guard = logging::init(&args.log_level, args.log_file.as_deref()).context("failed to open log file")?;
    let options = args.options()?;

    let cancel = CancellationToken::new();
    let signal = cancel.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for shutdown signal");
            return;
        }
        tracing::info!("received shutdown signal");
        signal.cancel();
    });

    let daemon = match startup(options, &cancel).await {
        Ok(daemon) => daemon,
        Err(LifecycleError::Cancelled) => return Ok(()),
        Err(e) => return Err(e).context("startup failed"),
    };

    cancel.cancelled().await;
    daemon.shutdown(env::drain_timeout()).await;
    Ok(())
}
