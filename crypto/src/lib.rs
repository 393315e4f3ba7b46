pub mod bfv;
pub mod provider;

pub use noise_trap_math as math;

pub mod prelude {
    pub use crate::{
        bfv::{BfvCiphertext, BfvParam, NoisyBfv, BFV_2048, BFV_8192},
        provider::{HeProvider, ProviderError},
    };
    pub use noise_trap_math::prelude::*;
}
