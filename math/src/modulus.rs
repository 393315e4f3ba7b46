use core::fmt::{self, Display};
use num_bigint_dig::prime::probably_prime;
use num_integer::Integer;
use num_traits::ToPrimitive;

/// Plaintext modulus `t`.
///
/// Every plaintext value and every decrypted residue lives in `[0, t)`.
/// Values that leave this range wrap, which is the overflow a ciphertext
/// carries silently until it is decrypted and compared.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "u64", into = "u64"))]
pub struct PlainModulus(u64);

impl PlainModulus {
    pub const fn new(t: u64) -> Self {
        assert!(t > 1);
        Self(t)
    }

    /// Largest prime of `bits` bits with `t = 1 mod 2 * poly_degree`, which
    /// is what SIMD batching requires.
    pub fn batching(poly_degree: usize, bits: usize) -> Option<Self> {
        batching_primes(poly_degree, bits).next().map(Self)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn bits(&self) -> usize {
        (u64::BITS - self.0.leading_zeros()) as _
    }

    pub fn log2(&self) -> f64 {
        (self.0 as f64).log2()
    }

    pub fn is_prime(&self) -> bool {
        is_prime(self.0)
    }

    pub fn supports_batching(&self, poly_degree: usize) -> bool {
        self.is_prime() && self.0 % (2 * poly_degree as u64) == 1
    }

    pub fn reduce(&self, a: u64) -> u64 {
        a % self.0
    }

    pub fn contains(&self, a: u64) -> bool {
        a < self.0
    }

    pub fn add(&self, a: u64, b: u64) -> u64 {
        add_mod(a, b, self.0)
    }

    pub fn sub(&self, a: u64, b: u64) -> u64 {
        sub_mod(a, b, self.0)
    }

    pub fn mul(&self, a: u64, b: u64) -> u64 {
        mul_mod(a, b, self.0)
    }

    pub fn inv(&self, a: u64) -> Option<u64> {
        inv_mod(a, self.0)
    }
}

impl Display for PlainModulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u64> for PlainModulus {
    type Error = InvalidModulus;

    fn try_from(t: u64) -> Result<Self, Self::Error> {
        (t > 1).then_some(Self(t)).ok_or(InvalidModulus(t))
    }
}

impl From<PlainModulus> for u64 {
    fn from(PlainModulus(t): PlainModulus) -> Self {
        t
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InvalidModulus(pub u64);

impl Display for InvalidModulus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "plaintext modulus must be at least 2, got {}", self.0)
    }
}

impl std::error::Error for InvalidModulus {}

/// Primes of exactly `bits` bits congruent to `1 mod 2 * poly_degree`, largest
/// first.
pub fn batching_primes(poly_degree: usize, bits: usize) -> impl Iterator<Item = u64> {
    assert!(poly_degree.is_power_of_two());
    let two_adicity = poly_degree.ilog2() as usize + 1;
    assert!(bits > two_adicity && bits <= 63);
    let min = 1u64 << (bits - two_adicity - 1);
    let max = min << 1;
    (min..max)
        .rev()
        .map(move |hi| (hi << two_adicity) + 1)
        .filter(|v| is_prime(*v))
}

pub(crate) fn is_prime(q: u64) -> bool {
    q > 1 && probably_prime(&q.into(), 20)
}

pub fn add_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 + b as u128) % q as u128) as u64
}

pub fn neg_mod(a: u64, q: u64) -> u64 {
    let a = a % q;
    if a == 0 {
        0
    } else {
        q - a
    }
}

pub fn sub_mod(a: u64, b: u64, q: u64) -> u64 {
    add_mod(a % q, neg_mod(b, q), q)
}

pub fn mul_mod(a: u64, b: u64, q: u64) -> u64 {
    ((a as u128 * b as u128) % q as u128) as u64
}

/// Inverse of `a` modulo any `q`, prime or not. `None` when `gcd(a, q) != 1`.
pub fn inv_mod(a: u64, q: u64) -> Option<u64> {
    if q < 2 {
        return None;
    }
    let (a, q) = (i128::from(a % q), i128::from(q));
    let egcd = a.extended_gcd(&q);
    if egcd.gcd != 1 {
        return None;
    }
    egcd.x.rem_euclid(q).to_u64()
}
