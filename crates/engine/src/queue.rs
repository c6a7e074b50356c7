// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deduplicating reconcile queue

use parking_lot::Mutex;
use std::collections::{HashSet, VecDeque};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Notify;

#[derive(Default)]
struct Pending {
    order: VecDeque<String>,
    names: HashSet<String>,
}

#[derive(Default)]
struct Inner {
    pending: Mutex<Pending>,
    notify: Notify,
}

/// FIFO of resource names awaiting reconciliation.
///
/// A name is held at most once while pending; enqueuing it again before it
/// is taken is a no-op.
#[derive(Clone, Default)]
pub struct WorkQueue {
    inner: Arc<Inner>,
}

impl WorkQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn enqueue(&self, name: impl Into<String>) {
        let name = name.into();
        let mut pending = self.inner.pending.lock();
        if pending.names.insert(name.clone()) {
            pending.order.push_back(name);
            drop(pending);
            self.inner.notify.notify_one();
        }
    }

    /// Enqueue `name` once `delay` has elapsed.
    pub fn enqueue_after(&self, name: impl Into<String>, delay: Duration) {
        let queue = self.clone();
        let name = name.into();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            queue.enqueue(name);
        });
    }

    pub fn try_next(&self) -> Option<String> {
        let mut pending = self.inner.pending.lock();
        let name = pending.order.pop_front()?;
        pending.names.remove(&name);
        Some(name)
    }

    /// Wait for the next pending name.
    pub async fn next(&self) -> String {
        loop {
            if let Some(name) = self.try_next() {
                return name;
            }
            self.inner.notify.notified().await;
        }
    }

    pub fn len(&self) -> usize {
        self.inner.pending.lock().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
