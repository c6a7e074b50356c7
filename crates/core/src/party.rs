// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Party identity within the N-party cluster.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Index of the leader party, the only one allowed to originate jobs.
pub const LEADER_INDEX: u32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PartyError {
    #[error("party count must be positive")]
    NoParties,
    #[error("player index {index} out of range for {count} parties")]
    IndexOutOfRange { index: u32, count: u32 },
}

/// Identity of the local party: its index and the size of the cluster.
///
/// Invariant: `index < count`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Party {
    index: u32,
    count: u32,
}

impl Party {
    pub fn new(index: u32, count: u32) -> Result<Self, PartyError> {
        if count == 0 {
            return Err(PartyError::NoParties);
        }
        if index >= count {
            return Err(PartyError::IndexOutOfRange { index, count });
        }
        Ok(Self { index, count })
    }

    pub fn index(&self) -> u32 {
        self.index
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn is_leader(&self) -> bool {
        self.index == LEADER_INDEX
    }

    /// Whether `player` refers to this party.
    pub fn is_local(&self, player: u32) -> bool {
        self.index == player
    }

    /// All party indices of the cluster in ascending order.
    pub fn players(&self) -> impl Iterator<Item = u32> {
        0..self.count
    }
}

impl std::fmt::Display for Party {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.index, self.count)
    }
}

#[cfg(test)]
#[path = "party_tests.rs"]
mod tests;
