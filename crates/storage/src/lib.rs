// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-storage: coordination store access and party-local resource state

pub mod head;
pub mod key;
pub mod resources;
pub mod roster;
pub mod value;

pub use head::{decode_revision, encode_revision, HeadError};
pub use key::{head_key, roster_prefix, EntryKey, Key, KeyError, RosterKey, HEADS_ROOT, ROSTER_ROOT};
pub use resources::{
    MemoryResourceStore, ResourceError, ResourceEvent, ResourceKind, ResourceState, ResourceStore,
    Snapshot, SnapshotError,
};
#[cfg(feature = "etcd")]
pub use roster::EtcdRosterStore;
pub use roster::{
    EventKind, MemoryRosterStore, Roster, RosterError, RosterStore, StoreError, WatchBatch,
    WatchEvent, WatchStream,
};
pub use value::ValueError;
