use core::fmt::Debug;
use noise_trap_math::modulus::PlainModulus;
use thiserror::Error;

/// Failures raised by a homomorphic encryption backend.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ProviderError {
    #[error("value {value} is outside the plaintext domain [0, {modulus})")]
    Encoding { value: u64, modulus: u64 },
    #[error("decryption failed: {0}")]
    Decryption(String),
    #[error("noise budget unavailable: {0}")]
    BudgetUnavailable(String),
    #[error("homomorphic operation failed: {0}")]
    Operation(String),
    #[error("invalid encryption parameters: {0}")]
    InvalidParameters(String),
}

/// Boundary to a homomorphic encryption scheme supporting integer arithmetic
/// over [`HeProvider::plain_modulus`].
///
/// Assigning operations leave `a` untouched when they fail.
pub trait HeProvider {
    type Ciphertext: Clone + Debug;

    fn plain_modulus(&self) -> PlainModulus;

    /// Encrypts `m`, failing with [`ProviderError::Encoding`] when `m` is not
    /// below the plaintext modulus.
    fn encrypt(&self, m: u64) -> Result<Self::Ciphertext, ProviderError>;

    /// Decrypts `ct`. A successful decryption is not necessarily a correct
    /// one: once the noise budget is gone the returned residue is garbage.
    fn decrypt(&self, ct: &Self::Ciphertext) -> Result<u64, ProviderError>;

    /// Remaining invariant noise budget of `ct` in bits.
    fn noise_budget(&self, ct: &Self::Ciphertext) -> Result<u32, ProviderError>;

    fn add_assign(
        &self,
        a: &mut Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<(), ProviderError>;

    fn sub_assign(
        &self,
        a: &mut Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<(), ProviderError>;

    fn mul_assign(
        &self,
        a: &mut Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<(), ProviderError>;

    fn square_assign(&self, a: &mut Self::Ciphertext) -> Result<(), ProviderError> {
        let b = a.clone();
        self.mul_assign(a, &b)
    }

    fn add(
        &self,
        a: &Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext, ProviderError> {
        let mut a = a.clone();
        self.add_assign(&mut a, b)?;
        Ok(a)
    }

    fn sub(
        &self,
        a: &Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext, ProviderError> {
        let mut a = a.clone();
        self.sub_assign(&mut a, b)?;
        Ok(a)
    }

    fn mul(
        &self,
        a: &Self::Ciphertext,
        b: &Self::Ciphertext,
    ) -> Result<Self::Ciphertext, ProviderError> {
        let mut a = a.clone();
        self.mul_assign(&mut a, b)?;
        Ok(a)
    }
}
