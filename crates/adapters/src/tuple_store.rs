// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuple store client: telemetry and chunk activation.

use async_trait::async_trait;
use std::time::Duration;
use tg_core::Telemetry;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TupleStoreError {
    #[error("request to {url} failed: {reason}")]
    Request { url: String, reason: String },
    #[error("{url} responded with status {status}")]
    Status { url: String, status: u16 },
    #[error("invalid telemetry payload: {0}")]
    Payload(String),
}

/// Tuple inventory of the local party.
#[async_trait]
pub trait TupleStore: Clone + Send + Sync + 'static {
    /// Available tuples per type.
    async fn telemetry(&self) -> Result<Telemetry, TupleStoreError>;

    /// Make the chunk uploaded for job `chunk_id` available for consumption.
    async fn activate_chunk(&self, chunk_id: Uuid) -> Result<(), TupleStoreError>;
}

/// HTTP client for the tuple store's intra-VCP API.
#[derive(Clone, Debug)]
pub struct HttpTupleStore {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTupleStore {
    pub fn new(base_url: impl Into<String>) -> Result<Self, TupleStoreError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(2))
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|e| TupleStoreError::Request { url: base_url.clone(), reason: e.to_string() })?;
        Ok(Self { client, base_url })
    }

    pub fn telemetry_url(&self) -> String {
        format!("{}/intra-vcp/telemetry", self.base_url)
    }

    pub fn activation_url(&self, chunk_id: Uuid) -> String {
        format!("{}/intra-vcp/tuple-chunks/activate/{}", self.base_url, chunk_id)
    }
}

fn request_error(url: &str, e: reqwest::Error) -> TupleStoreError {
    TupleStoreError::Request { url: url.to_string(), reason: e.to_string() }
}

#[async_trait]
impl TupleStore for HttpTupleStore {
    async fn telemetry(&self) -> Result<Telemetry, TupleStoreError> {
        let url = self.telemetry_url();
        let resp = self
            .client
            .get(&url)
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(|e| request_error(&url, e))?;
        if !resp.status().is_success() {
            return Err(TupleStoreError::Status { url, status: resp.status().as_u16() });
        }
        let body = resp.bytes().await.map_err(|e| request_error(&url, e))?;
        let telemetry: Telemetry =
            serde_json::from_slice(&body).map_err(|e| TupleStoreError::Payload(e.to_string()))?;
        tracing::debug!(types = telemetry.metrics.len(), "fetched tuple telemetry");
        Ok(telemetry)
    }

    async fn activate_chunk(&self, chunk_id: Uuid) -> Result<(), TupleStoreError> {
        let url = self.activation_url(chunk_id);
        let resp = self.client.put(&url).send().await.map_err(|e| request_error(&url, e))?;
        if !resp.status().is_success() {
            return Err(TupleStoreError::Status { url, status: resp.status().as_u16() });
        }
        tracing::info!(%chunk_id, "tuple chunk activated");
        Ok(())
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{TupleStore, TupleStoreError};
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;
    use tg_core::{Telemetry, TupleMetrics, TupleType};
    use uuid::Uuid;

    #[derive(Default)]
    struct FakeTupleStoreState {
        telemetry: Telemetry,
        telemetry_calls: usize,
        telemetry_fails: bool,
        activation_failures: usize,
        activation_attempts: Vec<Uuid>,
        activated: Vec<Uuid>,
    }

    /// Fake tuple store for testing
    #[derive(Clone, Default)]
    pub struct FakeTupleStore {
        inner: Arc<Mutex<FakeTupleStoreState>>,
    }

    impl FakeTupleStore {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_available(&self, tuple_type: TupleType, available: u64) {
            let mut state = self.inner.lock();
            state.telemetry.metrics.retain(|m| m.tuple_type != tuple_type);
            state.telemetry.metrics.push(TupleMetrics { tuple_type, available, consumption_rate: 0 });
        }

        pub fn set_telemetry_fails(&self, fails: bool) {
            self.inner.lock().telemetry_fails = fails;
        }

        /// Fail the next `n` activation calls.
        pub fn fail_activations(&self, n: usize) {
            self.inner.lock().activation_failures = n;
        }

        pub fn telemetry_calls(&self) -> usize {
            self.inner.lock().telemetry_calls
        }

        /// Every activation call, including failed ones.
        pub fn activation_attempts(&self) -> Vec<Uuid> {
            self.inner.lock().activation_attempts.clone()
        }

        /// Successfully activated chunks.
        pub fn activated(&self) -> Vec<Uuid> {
            self.inner.lock().activated.clone()
        }
    }

    #[async_trait]
    impl TupleStore for FakeTupleStore {
        async fn telemetry(&self) -> Result<Telemetry, TupleStoreError> {
            let mut state = self.inner.lock();
            state.telemetry_calls += 1;
            if state.telemetry_fails {
                return Err(TupleStoreError::Status { url: "fake://telemetry".into(), status: 503 });
            }
            Ok(state.telemetry.clone())
        }

        async fn activate_chunk(&self, chunk_id: Uuid) -> Result<(), TupleStoreError> {
            let mut state = self.inner.lock();
            state.activation_attempts.push(chunk_id);
            if state.activation_failures > 0 {
                state.activation_failures -= 1;
                return Err(TupleStoreError::Status { url: "fake://activate".into(), status: 500 });
            }
            state.activated.push(chunk_id);
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeTupleStore;

#[cfg(test)]
#[path = "tuple_store_tests.rs"]
mod tests;
