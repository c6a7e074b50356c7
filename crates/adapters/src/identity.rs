// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Local party identity lookup.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::ConfigMap;
use kube::api::Api;
use kube::Client;
use std::collections::BTreeMap;
use tg_core::{Party, PartyError};
use thiserror::Error;

/// Config map key holding the local party index.
pub const PLAYER_ID_KEY: &str = "playerId";
/// Config map key holding the number of parties.
pub const PLAYER_COUNT_KEY: &str = "playerCount";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    #[error("identity lookup failed: {0}")]
    Lookup(String),
    #[error("identity key missing: {0}")]
    Missing(&'static str),
    #[error("identity key {key} has invalid value {value:?}")]
    Invalid { key: &'static str, value: String },
    #[error(transparent)]
    Party(#[from] PartyError),
}

/// Source of the local party identity.
#[async_trait]
pub trait Identity: Clone + Send + Sync + 'static {
    async fn party(&self) -> Result<Party, IdentityError>;
}

/// Identity fixed at startup.
#[derive(Clone, Copy, Debug)]
pub struct StaticIdentity(pub Party);

#[async_trait]
impl Identity for StaticIdentity {
    async fn party(&self) -> Result<Party, IdentityError> {
        Ok(self.0)
    }
}

fn parse_key(data: &BTreeMap<String, String>, key: &'static str) -> Result<u32, IdentityError> {
    let value = data.get(key).ok_or(IdentityError::Missing(key))?;
    value.trim().parse::<u32>().map_err(|_| IdentityError::Invalid { key, value: value.clone() })
}

/// Build a party from config map data.
pub fn party_from_data(data: &BTreeMap<String, String>) -> Result<Party, IdentityError> {
    let index = parse_key(data, PLAYER_ID_KEY)?;
    let count = parse_key(data, PLAYER_COUNT_KEY)?;
    Ok(Party::new(index, count)?)
}

/// Identity read from a party-local config map.
#[derive(Clone)]
pub struct ConfigMapIdentity {
    client: Client,
    namespace: String,
    name: String,
}

impl ConfigMapIdentity {
    pub fn new(client: Client, namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self { client, namespace: namespace.into(), name: name.into() }
    }
}

#[async_trait]
impl Identity for ConfigMapIdentity {
    async fn party(&self) -> Result<Party, IdentityError> {
        let api: Api<ConfigMap> = Api::namespaced(self.client.clone(), &self.namespace);
        let config = api
            .get(&self.name)
            .await
            .map_err(|e| IdentityError::Lookup(format!("config map {}: {e}", self.name)))?;
        let party = party_from_data(&config.data.unwrap_or_default())?;
        tracing::debug!(%party, config_map = %self.name, "resolved party identity");
        Ok(party)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{Identity, IdentityError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tg_core::Party;

    struct FakeIdentityState {
        party: Party,
        failures: usize,
    }

    /// Identity that can be made to fail a number of times
    #[derive(Clone)]
    pub struct FakeIdentity {
        inner: Arc<Mutex<FakeIdentityState>>,
    }

    impl FakeIdentity {
        pub fn new(party: Party) -> Self {
            Self { inner: Arc::new(Mutex::new(FakeIdentityState { party, failures: 0 })) }
        }

        /// Fail the next `n` lookups.
        pub fn fail_lookups(&self, n: usize) {
            self.inner.lock().failures = n;
        }
    }

    #[async_trait]
    impl Identity for FakeIdentity {
        async fn party(&self) -> Result<Party, IdentityError> {
            let mut state = self.inner.lock();
            if state.failures > 0 {
                state.failures -= 1;
                return Err(IdentityError::Lookup("injected failure".to_string()));
            }
            Ok(state.party)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeIdentity;
