// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Head revision encoding.
//!
//! Revisions are stored as zig-zag signed varints, the same layout Go's
//! `binary.PutVarint` produces, so heads written by other implementations
//! of the protocol stay readable.

use thiserror::Error;

const MAX_VARINT_LEN: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeadError {
    #[error("head revision value is empty or truncated")]
    Truncated,
    #[error("head revision value overflows 64 bits")]
    Overflow,
    #[error("head revision value has trailing bytes")]
    TrailingBytes,
}

pub fn encode_revision(revision: i64) -> Vec<u8> {
    let mut ux = (revision as u64) << 1;
    if revision < 0 {
        ux = !ux;
    }
    let mut out = Vec::with_capacity(MAX_VARINT_LEN);
    while ux >= 0x80 {
        out.push((ux as u8) | 0x80);
        ux >>= 7;
    }
    out.push(ux as u8);
    out
}

pub fn decode_revision(buf: &[u8]) -> Result<i64, HeadError> {
    let mut ux: u64 = 0;
    for (i, &b) in buf.iter().enumerate() {
        if i == MAX_VARINT_LEN || (i == MAX_VARINT_LEN - 1 && b > 1) {
            return Err(HeadError::Overflow);
        }
        ux |= u64::from(b & 0x7f) << (7 * i);
        if b < 0x80 {
            if i + 1 != buf.len() {
                return Err(HeadError::TrailingBytes);
            }
            let x = (ux >> 1) as i64;
            return Ok(if ux & 1 != 0 { !x } else { x });
        }
    }
    Err(HeadError::Truncated)
}
