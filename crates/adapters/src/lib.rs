// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-adapters: external collaborators of the operator

pub mod identity;
pub mod launcher;
pub mod tuple_store;

pub use identity::{ConfigMapIdentity, Identity, IdentityError, StaticIdentity};
pub use launcher::{
    GeneratorParams, KubeLauncher, LaunchError, LauncherConfig, ProvisionerParams, WorkloadLauncher,
    WorkloadPhase,
};
pub use tuple_store::{HttpTupleStore, TupleStore, TupleStoreError};

#[cfg(any(test, feature = "test-support"))]
pub use identity::FakeIdentity;
#[cfg(any(test, feature = "test-support"))]
pub use launcher::{FakeLauncher, LauncherCall};
#[cfg(any(test, feature = "test-support"))]
pub use tuple_store::FakeTupleStore;
