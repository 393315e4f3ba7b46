use crate::{
    bfv::{BfvCiphertext, BfvParam},
    provider::{HeProvider, ProviderError},
};
use core::sync::atomic::{AtomicU64, Ordering};
use noise_trap_math::modulus::PlainModulus;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

static NEXT_CONTEXT_ID: AtomicU64 = AtomicU64::new(1);

/// A simulated BFV context. Ciphertexts are bound to the context that
/// encrypted them, so independent scenarios should each build their own.
#[derive(Debug)]
pub struct NoisyBfv {
    param: BfvParam,
    id: u64,
}

impl NoisyBfv {
    pub fn new(param: BfvParam) -> Result<Self, ProviderError> {
        param.validate()?;
        Ok(Self {
            param,
            id: NEXT_CONTEXT_ID.fetch_add(1, Ordering::Relaxed),
        })
    }

    pub fn param(&self) -> &BfvParam {
        &self.param
    }

    fn owns(&self, ct: &BfvCiphertext) -> bool {
        ct.context == self.id
    }

    fn check_operands(&self, a: &BfvCiphertext, b: &BfvCiphertext) -> Result<(), ProviderError> {
        if self.owns(a) && self.owns(b) {
            Ok(())
        } else {
            Err(ProviderError::Operation(
                "operands were encrypted under different encryption parameters".into(),
            ))
        }
    }

    fn budget_bits(&self, ct: &BfvCiphertext) -> f64 {
        self.param.log_q() - 1.0 - ct.noise_bits
    }

    /// A residue guaranteed to differ from the true one, deterministic in the
    /// context seed and the ciphertext state.
    fn garbage(&self, ct: &BfvCiphertext) -> u64 {
        let t = self.param.plain_modulus;
        let seed = self.param.seed
            ^ ct.residue.rotate_left(17)
            ^ ct.noise_bits.to_bits()
            ^ (ct.size as u64).rotate_left(48);
        let offset = ChaCha8Rng::seed_from_u64(seed).gen_range(1..t.value());
        t.add(ct.residue, offset)
    }
}

/// `log2(2^a + 2^b)`
fn log2_sum(a: f64, b: f64) -> f64 {
    let (hi, lo) = if a >= b { (a, b) } else { (b, a) };
    hi + (1.0 + (lo - hi).exp2()).log2()
}

impl HeProvider for NoisyBfv {
    type Ciphertext = BfvCiphertext;

    fn plain_modulus(&self) -> PlainModulus {
        self.param.plain_modulus
    }

    fn encrypt(&self, m: u64) -> Result<BfvCiphertext, ProviderError> {
        let t = self.param.plain_modulus;
        if !t.contains(m) {
            return Err(ProviderError::Encoding {
                value: m,
                modulus: t.value(),
            });
        }
        Ok(BfvCiphertext {
            context: self.id,
            residue: m,
            noise_bits: self.param.fresh_noise_bits(),
            size: 2,
        })
    }

    fn decrypt(&self, ct: &BfvCiphertext) -> Result<u64, ProviderError> {
        if !self.owns(ct) {
            return Err(ProviderError::Decryption(
                "ciphertext is not valid for these encryption parameters".into(),
            ));
        }
        if self.budget_bits(ct) < 1.0 {
            Ok(self.garbage(ct))
        } else {
            Ok(ct.residue)
        }
    }

    fn noise_budget(&self, ct: &BfvCiphertext) -> Result<u32, ProviderError> {
        if !self.owns(ct) {
            return Err(ProviderError::BudgetUnavailable(
                "ciphertext is not valid for these encryption parameters".into(),
            ));
        }
        if ct.noise_bits >= self.param.log_q() {
            return Err(ProviderError::BudgetUnavailable(format!(
                "noise of {:.1} bits exceeds the {}-bit coefficient modulus",
                ct.noise_bits, self.param.coeff_modulus_bits
            )));
        }
        Ok(self.budget_bits(ct).max(0.0).floor() as u32)
    }

    fn add_assign(&self, a: &mut BfvCiphertext, b: &BfvCiphertext) -> Result<(), ProviderError> {
        self.check_operands(a, b)?;
        a.residue = self.param.plain_modulus.add(a.residue, b.residue);
        a.noise_bits = log2_sum(a.noise_bits, b.noise_bits);
        a.size = a.size.max(b.size);
        Ok(())
    }

    fn sub_assign(&self, a: &mut BfvCiphertext, b: &BfvCiphertext) -> Result<(), ProviderError> {
        self.check_operands(a, b)?;
        a.residue = self.param.plain_modulus.sub(a.residue, b.residue);
        a.noise_bits = log2_sum(a.noise_bits, b.noise_bits);
        a.size = a.size.max(b.size);
        Ok(())
    }

    fn mul_assign(&self, a: &mut BfvCiphertext, b: &BfvCiphertext) -> Result<(), ProviderError> {
        self.check_operands(a, b)?;
        let size = a.size + b.size - 1;
        if size > self.param.max_ciphertext_size {
            return Err(ProviderError::Operation(format!(
                "product would have {size} polynomials, more than the supported {}",
                self.param.max_ciphertext_size
            )));
        }
        a.residue = self.param.plain_modulus.mul(a.residue, b.residue);
        a.noise_bits = a.noise_bits.max(b.noise_bits) + self.param.mul_noise_bits();
        a.size = size;
        Ok(())
    }
}
