pub mod modulus;

pub mod prelude {
    pub use crate::modulus::{add_mod, batching_primes, inv_mod, mul_mod, neg_mod, sub_mod, PlainModulus};
}
