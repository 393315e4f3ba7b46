//! Plaintext arithmetic replayed alongside the ciphertext.
//!
//! The expected value is never derived from a decryption. It wraps at 64 bits
//! exactly like native unsigned arithmetic, and that wraparound is reported as
//! divergence rather than prevented.

use core::{
    fmt::{self, Display},
    num::NonZeroU64,
};

/// A homomorphic operation applied to the tracked ciphertext.
///
/// `Mul`, `Add` and `Sub` combine the ciphertext with an encrypted constant,
/// `Square` multiplies it by itself and `Div(k)` multiplies it by an
/// encrypted `k^-1 mod t` while the expectation performs integer division.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Op {
    Square,
    Mul(u64),
    Add(u64),
    Sub(u64),
    Div(NonZeroU64),
}

impl Op {
    pub fn eval(self, value: u64) -> u64 {
        match self {
            Self::Square => value.wrapping_mul(value),
            Self::Mul(k) => value.wrapping_mul(k),
            Self::Add(k) => value.wrapping_add(k),
            Self::Sub(k) => value.wrapping_sub(k),
            Self::Div(k) => value / k,
        }
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Square => write!(f, "square"),
            Self::Mul(k) => write!(f, "× {k}"),
            Self::Add(k) => write!(f, "+ {k}"),
            Self::Sub(k) => write!(f, "- {k}"),
            Self::Div(k) => write!(f, "÷ {k}"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Expectation(u64);

impl Expectation {
    pub fn new(seed: u64) -> Self {
        Self(seed)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn apply(&mut self, op: Op) -> u64 {
        self.0 = op.eval(self.0);
        self.0
    }
}
