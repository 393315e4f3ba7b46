use crate::provider::ProviderError;
use core::fmt::{self, Display};
use noise_trap_math::modulus::PlainModulus;

/// Invariant noise of a fresh public-key encryption on top of `log2 t + log2 n / 2`.
const FRESH_NOISE_BITS: f64 = 12.0;
/// Noise added by one ciphertext multiplication on top of `log2 t + log2 n / 2`.
const MUL_NOISE_BITS: f64 = 4.0;

pub const BFV_2048: BfvParam = BfvParam {
    poly_degree: 2048,
    coeff_modulus_bits: 54,
    plain_modulus: PlainModulus::new(1032193),
    max_ciphertext_size: 256,
    seed: 0,
};

pub const BFV_8192: BfvParam = BfvParam {
    poly_degree: 8192,
    coeff_modulus_bits: 218,
    plain_modulus: PlainModulus::new(1032193),
    max_ciphertext_size: 256,
    seed: 0,
};

#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BfvParam {
    pub poly_degree: usize,
    pub coeff_modulus_bits: usize,
    pub plain_modulus: PlainModulus,
    /// Number of polynomials a ciphertext may grow to before multiplication
    /// is refused.
    pub max_ciphertext_size: usize,
    /// Seeds the garbage returned when decrypting an exhausted ciphertext.
    pub seed: u64,
}

impl BfvParam {
    pub fn plain_modulus(mut self, plain_modulus: PlainModulus) -> Self {
        self.plain_modulus = plain_modulus;
        self
    }

    pub fn max_ciphertext_size(mut self, max_ciphertext_size: usize) -> Self {
        self.max_ciphertext_size = max_ciphertext_size;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn validate(&self) -> Result<(), ProviderError> {
        let invalid = |msg: String| Err(ProviderError::InvalidParameters(msg));
        if !self.poly_degree.is_power_of_two() || self.poly_degree < 2 {
            return invalid(format!(
                "polynomial degree {} is not a power of two",
                self.poly_degree
            ));
        }
        if self.max_ciphertext_size < 2 {
            return invalid(format!(
                "maximum ciphertext size {} is below a fresh ciphertext",
                self.max_ciphertext_size
            ));
        }
        if self.fresh_noise_bits() + 1.0 >= self.coeff_modulus_bits as f64 {
            return invalid(format!(
                "{}-bit coefficient modulus leaves no noise budget for plaintext modulus {}",
                self.coeff_modulus_bits, self.plain_modulus
            ));
        }
        Ok(())
    }

    pub fn build(self) -> Result<super::NoisyBfv, ProviderError> {
        super::NoisyBfv::new(self)
    }

    pub(crate) fn log_q(&self) -> f64 {
        self.coeff_modulus_bits as f64
    }

    fn half_log_n(&self) -> f64 {
        (self.poly_degree as f64).log2() / 2.0
    }

    pub fn fresh_noise_bits(&self) -> f64 {
        self.plain_modulus.log2() + self.half_log_n() + FRESH_NOISE_BITS
    }

    pub fn mul_noise_bits(&self) -> f64 {
        self.plain_modulus.log2() + self.half_log_n() + MUL_NOISE_BITS
    }
}

impl Display for BfvParam {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Encryption parameters:")?;
        writeln!(f, "- Scheme: BFV (noise simulation)")?;
        writeln!(f, "- Polynomial modulus degree: {}", self.poly_degree)?;
        writeln!(f, "- Plain modulus (p): {}", self.plain_modulus)?;
        write!(f, "- Coefficient modulus size: {} bits", self.coeff_modulus_bits)
    }
}
