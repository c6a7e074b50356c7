// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Coordination store keys.
//!
//! Two shapes live under the roster namespace:
//!
//! - job key: `/tg/roster/<scope>/<job>`
//! - entry key: `/tg/roster/<scope>/<job>/<player>`
//!
//! Head revisions live under `/tg/heads/<player>`.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Root of the roster namespace.
pub const ROSTER_ROOT: &str = "/tg/roster";

/// Root of the per-party head revision namespace.
pub const HEADS_ROOT: &str = "/tg/heads";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    #[error("malformed key: {0}")]
    Malformed(String),
    #[error("invalid player index in key: {0}")]
    InvalidPlayerIndex(String),
}

/// Key of a job's shared record.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RosterKey {
    scope: String,
    job: String,
}

/// Key of one party's status record for a job.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryKey {
    roster: RosterKey,
    player: u32,
}

/// Either key shape, as decoded from a watch event.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Key {
    Roster(RosterKey),
    Entry(EntryKey),
}

fn is_name(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
}

impl RosterKey {
    pub fn new(scope: impl Into<String>, job: impl Into<String>) -> Result<Self, KeyError> {
        let (scope, job) = (scope.into(), job.into());
        if !is_name(&scope) || !is_name(&job) {
            return Err(KeyError::Malformed(format!("{ROSTER_ROOT}/{scope}/{job}")));
        }
        Ok(Self { scope, job })
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn job(&self) -> &str {
        &self.job
    }

    pub fn entry(&self, player: u32) -> EntryKey {
        EntryKey { roster: self.clone(), player }
    }
}

impl EntryKey {
    pub fn roster(&self) -> &RosterKey {
        &self.roster
    }

    pub fn job(&self) -> &str {
        &self.roster.job
    }

    pub fn player(&self) -> u32 {
        self.player
    }
}

impl fmt::Display for RosterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{ROSTER_ROOT}/{}/{}", self.scope, self.job)
    }
}

impl fmt::Display for EntryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.roster, self.player)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Roster(k) => k.fmt(f),
            Key::Entry(k) => k.fmt(f),
        }
    }
}

impl FromStr for Key {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || KeyError::Malformed(s.to_string());
        let rest = s
            .strip_prefix(ROSTER_ROOT)
            .and_then(|r| r.strip_prefix('/'))
            .ok_or_else(malformed)?;

        let segments: Vec<&str> = rest.split('/').collect();
        match segments.as_slice() {
            [scope, job] => Ok(Key::Roster(RosterKey::new(*scope, *job).map_err(|_| malformed())?)),
            [scope, job, player] => {
                let roster = RosterKey::new(*scope, *job).map_err(|_| malformed())?;
                if player.is_empty() {
                    return Err(malformed());
                }
                // Canonical decimal only, so the key re-encodes to the same text
                let canonical = player.bytes().all(|b| b.is_ascii_digit())
                    && (player.len() == 1 || !player.starts_with('0'));
                let player = canonical
                    .then(|| player.parse::<u32>().ok())
                    .flatten()
                    .ok_or_else(|| KeyError::InvalidPlayerIndex(s.to_string()))?;
                Ok(Key::Entry(roster.entry(player)))
            }
            _ => Err(malformed()),
        }
    }
}

impl From<RosterKey> for Key {
    fn from(k: RosterKey) -> Self {
        Key::Roster(k)
    }
}

impl From<EntryKey> for Key {
    fn from(k: EntryKey) -> Self {
        Key::Entry(k)
    }
}

/// Prefix covering every job and entry key of `scope`.
pub fn roster_prefix(scope: &str) -> String {
    format!("{ROSTER_ROOT}/{scope}/")
}

/// Key holding the head revision of `player`.
pub fn head_key(player: u32) -> String {
    format!("{HEADS_ROOT}/{player}")
}

#[cfg(test)]
#[path = "key_tests.rs"]
mod tests;
