// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! tg-daemon: process wiring for one party's operator

pub mod config;
pub mod env;
pub mod lifecycle;
pub mod logging;

pub use config::{ConfigError, FileConfig};
pub use lifecycle::{startup, Daemon, DaemonRuntime, IdentitySource, LifecycleError, Options};
