// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashMap;

fn candidate(tuple_type: TupleType, available: u64, threshold: u64, priority: u32) -> Candidate {
    Candidate { tuple_type, available, threshold, priority }
}

#[test]
fn lottery_frequencies_follow_priorities() {
    let candidates = [
        candidate(TupleType::BitGfp, 0, 10_000, 1),
        candidate(TupleType::InputMaskGfp, 0, 10_000, 9),
    ];
    let mut rng = StdRng::seed_from_u64(7);
    let draws = 10_000;
    let mut counts: HashMap<TupleType, usize> = HashMap::new();
    for _ in 0..draws {
        let picked = Lottery.select(&candidates, &mut rng).unwrap();
        *counts.entry(picked).or_default() += 1;
    }

    let share = |t: TupleType| counts.get(&t).copied().unwrap_or(0) as f64 / draws as f64;
    assert!((share(TupleType::BitGfp) - 0.1).abs() < 0.01, "bit share {}", share(TupleType::BitGfp));
    assert!(
        (share(TupleType::InputMaskGfp) - 0.9).abs() < 0.01,
        "input mask share {}",
        share(TupleType::InputMaskGfp)
    );
}

#[test]
fn lottery_skips_types_at_or_above_threshold() {
    let candidates = [
        candidate(TupleType::BitGfp, 10_000, 10_000, 50),
        candidate(TupleType::SquareTupleGfp, 20_000, 10_000, 50),
        candidate(TupleType::InverseTupleGfp, 9_999, 10_000, 1),
    ];
    let mut rng = StdRng::seed_from_u64(1);
    for _ in 0..100 {
        assert_eq!(Lottery.select(&candidates, &mut rng), Some(TupleType::InverseTupleGfp));
    }
}

#[yare::parameterized(
    none = { &[] },
    all_full = { &[(TupleType::BitGfp, 100, 100, 1), (TupleType::BitGf2n, 500, 100, 3)] },
    zero_priority = { &[(TupleType::BitGfp, 0, 100, 0)] },
)]
fn lottery_selects_nothing(rows: &[(TupleType, u64, u64, u32)]) {
    let candidates: Vec<Candidate> = rows.iter().map(|&(t, a, th, p)| candidate(t, a, th, p)).collect();
    let mut rng = StdRng::seed_from_u64(3);
    assert_eq!(Lottery.select(&candidates, &mut rng), None);
}

#[test]
fn least_available_first_picks_smallest_inventory() {
    let candidates = [
        candidate(TupleType::BitGfp, 400, 1_000, 1),
        candidate(TupleType::SquareTupleGfp, 100, 1_000, 1),
        candidate(TupleType::InverseTupleGfp, 50, 10, 1),
        candidate(TupleType::MultiplicationTripleGfp, 100, 1_000, 1),
    ];
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(LeastAvailableFirst.select(&candidates, &mut rng), Some(TupleType::SquareTupleGfp));
}

#[test]
fn strategy_kind_dispatches() {
    let candidates = [
        candidate(TupleType::BitGfp, 10, 1_000, 1),
        candidate(TupleType::SquareTupleGfp, 5, 1_000, 0),
    ];
    let mut rng = StdRng::seed_from_u64(0);
    assert_eq!(StrategyKind::LeastAvailableFirst.select(&candidates, &mut rng), Some(TupleType::SquareTupleGfp));
    assert_eq!(StrategyKind::Lottery.select(&candidates, &mut rng), Some(TupleType::BitGfp));
}
