// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tuple types known to the tuple store.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TupleType {
    BitGfp,
    BitGf2n,
    InputMaskGfp,
    InputMaskGf2n,
    InverseTupleGfp,
    InverseTupleGf2n,
    SquareTupleGfp,
    SquareTupleGf2n,
    MultiplicationTripleGfp,
    MultiplicationTripleGf2n,
}

crate::simple_display! {
    TupleType {
        BitGfp => "BIT_GFP",
        BitGf2n => "BIT_GF2N",
        InputMaskGfp => "INPUT_MASK_GFP",
        InputMaskGf2n => "INPUT_MASK_GF2N",
        InverseTupleGfp => "INVERSE_TUPLE_GFP",
        InverseTupleGf2n => "INVERSE_TUPLE_GF2N",
        SquareTupleGfp => "SQUARE_TUPLE_GFP",
        SquareTupleGf2n => "SQUARE_TUPLE_GF2N",
        MultiplicationTripleGfp => "MULTIPLICATION_TRIPLE_GFP",
        MultiplicationTripleGf2n => "MULTIPLICATION_TRIPLE_GF2N",
    }
}

impl TupleType {
    pub const ALL: [TupleType; 10] = [
        TupleType::BitGfp,
        TupleType::BitGf2n,
        TupleType::InputMaskGfp,
        TupleType::InputMaskGf2n,
        TupleType::InverseTupleGfp,
        TupleType::InverseTupleGf2n,
        TupleType::SquareTupleGfp,
        TupleType::SquareTupleGf2n,
        TupleType::MultiplicationTripleGfp,
        TupleType::MultiplicationTripleGf2n,
    ];
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown tuple type: {0}")]
pub struct UnknownTupleType(pub String);

impl FromStr for TupleType {
    type Err = UnknownTupleType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.to_string() == s)
            .ok_or_else(|| UnknownTupleType(s.to_string()))
    }
}

#[cfg(test)]
#[path = "tuple_tests.rs"]
mod tests;
