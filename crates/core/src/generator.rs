// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuple generators: worker images and the tuple types they produce.

use crate::tuple::TupleType;
use serde::{Deserialize, Serialize};

/// When the container runtime pulls the generator image.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PullPolicy {
    #[default]
    IfNotPresent,
    Always,
    Never,
}

crate::simple_display! {
    PullPolicy {
        IfNotPresent => "IfNotPresent",
        Always => "Always",
        Never => "Never",
    }
}

/// Worker image that runs the generation protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratorSpec {
    pub image: String,
    #[serde(default)]
    pub image_pull_policy: PullPolicy,
}

/// A tuple type a generator supports, with its preferred batch size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TupleTypeSpec {
    #[serde(rename = "type")]
    pub tuple_type: TupleType,
    pub batch_size: u64,
}

/// Registered generator capability.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TupleGenerator {
    pub name: String,
    pub generator: GeneratorSpec,
    #[serde(default)]
    pub supports: Vec<TupleTypeSpec>,
}

impl TupleGenerator {
    pub fn support_for(&self, tuple_type: TupleType) -> Option<&TupleTypeSpec> {
        self.supports.iter().find(|s| s.tuple_type == tuple_type)
    }
}

/// The single generator supporting `tuple_type`, if exactly one does.
///
/// Zero or several candidates make the type unserviceable.
pub fn serviceable_generator(
    generators: &[TupleGenerator],
    tuple_type: TupleType,
) -> Option<(&TupleGenerator, &TupleTypeSpec)> {
    let mut candidates =
        generators.iter().filter_map(|g| g.support_for(tuple_type).map(|spec| (g, spec)));
    let first = candidates.next()?;
    match candidates.next() {
        Some(_) => None,
        None => Some(first),
    }
}

#[cfg(test)]
#[path = "generator_tests.rs"]
mod tests;
