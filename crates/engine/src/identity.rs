// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup identity resolution

use std::time::Duration;
use tg_adapters::Identity;
use tg_core::Party;
use tokio_util::sync::CancellationToken;

/// Look up the local party, retrying every `retry` until it succeeds.
///
/// Returns `None` only when cancelled first.
pub async fn resolve_party<I: Identity>(
    identity: &I,
    retry: Duration,
    cancel: &CancellationToken,
) -> Option<Party> {
    loop {
        match identity.party().await {
            Ok(party) => {
                tracing::info!(%party, "resolved local party");
                return Some(party);
            }
            Err(e) => {
                tracing::warn!(error = %e, retry_ms = retry.as_millis() as u64, "identity lookup failed");
            }
        }
        tokio::select! {
            _ = cancel.cancelled() => return None,
            _ = tokio::time::sleep(retry) => {}
        }
    }
}
