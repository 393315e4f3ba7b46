//! Noise-tracking simulation of a BFV context.
//!
//! [`NoisyBfv`] is not a cryptosystem: ciphertexts carry their plaintext in
//! the clear. What it models faithfully is the bookkeeping an attacker
//! exploits, namely plaintext wraparound modulo `t`, invariant noise growth
//! per operation, ciphertext size growth without relinearization, and the
//! silent corruption of decryption once the noise budget is spent.

mod method;
mod param;
mod structure;


pub use method::NoisyBfv;
pub use param::{BfvParam, BFV_2048, BFV_8192};
pub use structure::BfvCiphertext;
