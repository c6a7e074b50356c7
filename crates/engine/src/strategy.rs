// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Scheduling strategies: which tuple type to generate next.

use rand::Rng;
use tg_core::{StrategyKind, TupleType};

/// A serviceable tuple type with its policy and current inventory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Candidate {
    pub tuple_type: TupleType,
    /// Available tuples plus those already being generated.
    pub available: u64,
    pub threshold: u64,
    pub priority: u32,
}

impl Candidate {
    pub fn below_threshold(&self) -> bool {
        self.available < self.threshold
    }
}

pub trait SchedulingStrategy {
    /// Pick the type to generate next, or `None` when nothing is needed.
    fn select<R: Rng + ?Sized>(&self, candidates: &[Candidate], rng: &mut R) -> Option<TupleType>;
}

/// Weighted draw over the types below threshold; each type holds as many
/// tickets as its priority.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lottery;

impl SchedulingStrategy for Lottery {
    fn select<R: Rng + ?Sized>(&self, candidates: &[Candidate], rng: &mut R) -> Option<TupleType> {
        let eligible: Vec<&Candidate> =
            candidates.iter().filter(|c| c.below_threshold() && c.priority > 0).collect();
        let tickets: u64 = eligible.iter().map(|c| u64::from(c.priority)).sum();
        if tickets == 0 {
            return None;
        }
        let mut draw = rng.gen_range(0..tickets);
        for candidate in eligible {
            let held = u64::from(candidate.priority);
            if draw < held {
                return Some(candidate.tuple_type);
            }
            draw -= held;
        }
        None
    }
}

/// The type below threshold with the fewest available tuples; ties go to
/// the first declared policy.
#[derive(Debug, Clone, Copy, Default)]
pub struct LeastAvailableFirst;

impl SchedulingStrategy for LeastAvailableFirst {
    fn select<R: Rng + ?Sized>(&self, candidates: &[Candidate], _rng: &mut R) -> Option<TupleType> {
        candidates
            .iter()
            .filter(|c| c.below_threshold())
            .min_by_key(|c| c.available)
            .map(|c| c.tuple_type)
    }
}

impl SchedulingStrategy for StrategyKind {
    fn select<R: Rng + ?Sized>(&self, candidates: &[Candidate], rng: &mut R) -> Option<TupleType> {
        match self {
            StrategyKind::Lottery => Lottery.select(candidates, rng),
            StrategyKind::LeastAvailableFirst => LeastAvailableFirst.select(candidates, rng),
        }
    }
}

#[cfg(test)]
#[path = "strategy_tests.rs"]
mod tests;
