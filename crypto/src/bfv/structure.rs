use core::fmt::{self, Debug};

/// Simulated BFV ciphertext.
///
/// The plaintext residue is only reachable through
/// [`HeProvider::decrypt`](crate::provider::HeProvider::decrypt), which is
/// where noise exhaustion turns it into garbage.
#[derive(Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BfvCiphertext {
    pub(crate) context: u64,
    pub(crate) residue: u64,
    pub(crate) noise_bits: f64,
    pub(crate) size: usize,
}

impl BfvCiphertext {
    /// Number of polynomials. Fresh ciphertexts have two, every
    /// multiplication without relinearization adds `size(b) - 1`.
    pub fn size(&self) -> usize {
        self.size
    }

    /// `log2` of the invariant noise scaled by the coefficient modulus.
    pub fn noise_bits(&self) -> f64 {
        self.noise_bits
    }
}

impl Debug for BfvCiphertext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BfvCiphertext")
            .field("context", &self.context)
            .field("noise_bits", &self.noise_bits)
            .field("size", &self.size)
            .finish_non_exhaustive()
    }
}
