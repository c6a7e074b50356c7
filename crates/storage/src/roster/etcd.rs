// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! etcd-backed roster store.

use super::{EventKind, RosterStore, StoreError, WatchBatch, WatchEvent, WatchStream};
use async_trait::async_trait;
use etcd_client::{Client, ConnectOptions, EventType, GetOptions, WatchOptions};
use std::time::Duration;
use tokio::sync::mpsc;

fn unavailable(e: etcd_client::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[derive(Clone)]
pub struct EtcdRosterStore {
    client: Client,
}

impl EtcdRosterStore {
    pub async fn connect(endpoints: &[String], dial_timeout: Duration) -> Result<Self, StoreError> {
        let options = ConnectOptions::new().with_connect_timeout(dial_timeout);
        let client = Client::connect(endpoints, Some(options)).await.map_err(unavailable)?;
        tracing::info!(?endpoints, "connected to etcd");
        Ok(Self { client })
    }
}

#[async_trait]
impl RosterStore for EtcdRosterStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let mut kv = self.client.kv_client();
        let resp = kv.get(key, None).await.map_err(unavailable)?;
        Ok(resp.kvs().first().map(|kv| kv.value().to_vec()))
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<i64, StoreError> {
        let mut kv = self.client.kv_client();
        let resp = kv.put(key, value, None).await.map_err(unavailable)?;
        Ok(resp.header().map(|h| h.revision()).unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> Result<bool, StoreError> {
        let mut kv = self.client.kv_client();
        let resp = kv.delete(key, None).await.map_err(unavailable)?;
        Ok(resp.deleted() > 0)
    }

    async fn list(&self, prefix: &str) -> Result<WatchBatch, StoreError> {
        let mut kv = self.client.kv_client();
        let resp = kv.get(prefix, Some(GetOptions::new().with_prefix())).await.map_err(unavailable)?;
        let revision = resp.header().map(|h| h.revision()).unwrap_or_default();
        let mut events: Vec<WatchEvent> = resp
            .kvs()
            .iter()
            .filter_map(|kv| {
                let Ok(key) = kv.key_str() else {
                    tracing::warn!(%prefix, "skipping non-utf8 key");
                    return None;
                };
                Some(WatchEvent {
                    kind: EventKind::Put,
                    key: key.to_string(),
                    value: kv.value().to_vec(),
                    revision: kv.mod_revision(),
                })
            })
            .collect();
        events.sort_by_key(|e| e.revision);
        Ok(WatchBatch { revision, events })
    }

    async fn watch(&self, prefix: &str, from_revision: i64) -> Result<WatchStream, StoreError> {
        let mut watch = self.client.watch_client();
        let options = WatchOptions::new().with_prefix().with_start_revision(from_revision);
        let (watcher, mut stream) = watch.watch(prefix, Some(options)).await.map_err(unavailable)?;
        let (tx, rx) = mpsc::unbounded_channel();
        let prefix = prefix.to_string();

        tokio::spawn(async move {
            // Dropping the watcher cancels the server-side watch
            let _watcher = watcher;
            loop {
                let resp = match stream.message().await {
                    Ok(Some(resp)) => resp,
                    Ok(None) => {
                        let _ = tx.send(Err(StoreError::WatchClosed("stream ended".to_string())));
                        break;
                    }
                    Err(e) => {
                        let _ = tx.send(Err(StoreError::WatchClosed(e.to_string())));
                        break;
                    }
                };
                if resp.canceled() {
                    let reason = format!(
                        "watch canceled (compact revision {}): {}",
                        resp.compact_revision(),
                        resp.cancel_reason()
                    );
                    let _ = tx.send(Err(StoreError::WatchClosed(reason)));
                    break;
                }
                let events: Vec<WatchEvent> = resp
                    .events()
                    .iter()
                    .filter_map(|e| {
                        let kv = e.kv()?;
                        let key = match kv.key_str() {
                            Ok(k) => k.to_string(),
                            Err(_) => {
                                tracing::warn!(%prefix, "skipping non-utf8 key");
                                return None;
                            }
                        };
                        let kind = match e.event_type() {
                            EventType::Put => EventKind::Put,
                            EventType::Delete => EventKind::Delete,
                        };
                        Some(WatchEvent {
                            kind,
                            key,
                            value: kv.value().to_vec(),
                            revision: kv.mod_revision(),
                        })
                    })
                    .collect();
                let Some(batch) = WatchBatch::from_events(events) else { continue };
                if tx.send(Ok(batch)).is_err() {
                    break;
                }
            }
        });
        Ok(rx)
    }
}
