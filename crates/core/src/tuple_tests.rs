// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[yare::parameterized(
    bit = { TupleType::BitGfp, "BIT_GFP" },
    mask = { TupleType::InputMaskGf2n, "INPUT_MASK_GF2N" },
    triple = { TupleType::MultiplicationTripleGfp, "MULTIPLICATION_TRIPLE_GFP" },
)]
fn display_matches_wire_name(t: TupleType, name: &str) {
    assert_eq!(t.to_string(), name);
    assert_eq!(serde_json::to_string(&t).unwrap(), format!("\"{name}\""));
    assert_eq!(name.parse::<TupleType>().unwrap(), t);
}

#[test]
fn every_type_parses_back() {
    for t in TupleType::ALL {
        assert_eq!(t.to_string().parse::<TupleType>().unwrap(), t);
    }
}

#[test]
fn unknown_name_is_rejected() {
    assert_eq!(
        "bit_gfp".parse::<TupleType>().unwrap_err(),
        UnknownTupleType("bit_gfp".to_string())
    );
}
