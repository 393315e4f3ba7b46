//! The attack state machine.
//!
//! A scenario starts `Running` with a freshly encrypted seed and its mirrored
//! expectation, observes the ciphertext once before the attack plan and once
//! after every batch, and ends `Completed`, `HaltedCorrupted` or
//! `HaltedError`. Provider failures never escape a running scenario: they
//! become statuses and halts in the [`ScenarioReport`]. Only configuration
//! problems detected before the first observation surface as [`SetupError`].

mod method;
mod structure;

#[cfg(test)]
pub(crate) mod test;

pub use method::AttackDriver;
pub use structure::{
    DriverState, Halt, HaltReason, ScenarioHeader, ScenarioReport, SetupError, StepRecord,
};
