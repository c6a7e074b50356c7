// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuple store telemetry.

use crate::tuple::TupleType;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleMetrics {
    #[serde(rename = "type")]
    pub tuple_type: TupleType,
    pub available: u64,
    /// Tuples consumed per second.
    #[serde(default)]
    pub consumption_rate: u64,
}

/// Metrics reported by the tuple store. Entries for tuple types this
/// build does not know are dropped while parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "WireTelemetry")]
pub struct Telemetry {
    #[serde(default)]
    pub metrics: Vec<TupleMetrics>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireMetrics {
    #[serde(rename = "type")]
    tuple_type: String,
    available: u64,
    #[serde(default)]
    consumption_rate: u64,
}

#[derive(Deserialize)]
struct WireTelemetry {
    #[serde(default)]
    metrics: Vec<WireMetrics>,
}

impl From<WireTelemetry> for Telemetry {
    fn from(wire: WireTelemetry) -> Self {
        let metrics = wire
            .metrics
            .into_iter()
            .filter_map(|m| {
                let tuple_type = m.tuple_type.parse().ok()?;
                Some(TupleMetrics { tuple_type, available: m.available, consumption_rate: m.consumption_rate })
            })
            .collect();
        Self { metrics }
    }
}

impl Telemetry {
    /// Available tuples of `tuple_type`; types the store does not report count as zero.
    pub fn available(&self, tuple_type: TupleType) -> u64 {
        self.metrics
            .iter()
            .filter(|m| m.tuple_type == tuple_type)
            .map(|m| m.available)
            .sum()
    }
}
