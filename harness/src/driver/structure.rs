use crate::{detector::Status, expectation::Op, zone::Zone};
use core::fmt::{self, Display};
use noise_trap_crypto::provider::ProviderError;
use noise_trap_math::modulus::PlainModulus;
use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DriverState {
    Running,
    HaltedCorrupted,
    HaltedError,
    Completed,
}

impl DriverState {
    pub fn is_halted(&self) -> bool {
        matches!(self, Self::HaltedCorrupted | Self::HaltedError)
    }
}

/// One observation of the tracked ciphertext.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct StepRecord {
    pub step: usize,
    pub label: String,
    pub decrypted: Result<u64, ProviderError>,
    pub expected: u64,
    /// Zero when the provider could not measure the budget.
    pub noise_budget: u32,
    pub budget_percent: f64,
    pub zone: Zone,
    pub status: Status,
    /// Homomorphic operations applied by the attack plan so far.
    pub operations: usize,
}

/// What the driver knows once setup is done, before the first observation.
#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioHeader {
    pub name: String,
    pub plain_modulus: PlainModulus,
    pub seed: u64,
    pub setup: Option<Op>,
    pub fresh_budget: u32,
    pub baseline_budget: u32,
    pub halt_on_danger_zone: bool,
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum HaltReason {
    Corrupted,
    DangerZone,
    DecryptionFailed(ProviderError),
    OperationFailed(ProviderError),
}

impl Display for HaltReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Corrupted => write!(f, "decrypted value diverged from the expected value"),
            Self::DangerZone => write!(f, "noise budget reached the danger zone"),
            Self::DecryptionFailed(err) | Self::OperationFailed(err) => write!(f, "{err}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Halt {
    /// Index of the step the scenario stopped at. For a failed operation this
    /// is the step that was never observed.
    pub step: usize,
    pub label: String,
    pub reason: HaltReason,
}

#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ScenarioReport {
    pub header: ScenarioHeader,
    pub records: Vec<StepRecord>,
    pub state: DriverState,
    pub operations: usize,
    pub halt: Option<Halt>,
}

impl ScenarioReport {
    pub fn name(&self) -> &str {
        &self.header.name
    }

    pub fn steps_succeeded(&self) -> usize {
        self.records
            .iter()
            .filter(|record| !record.status.is_terminal())
            .count()
    }

    pub fn statuses(&self) -> Vec<Status> {
        self.records.iter().map(|record| record.status).collect()
    }

    pub fn last(&self) -> Option<&StepRecord> {
        self.records.last()
    }
}

/// Configuration problems found before the scenario starts running.
#[derive(Debug, Error)]
pub enum SetupError {
    #[error("scenario targets plaintext modulus {scenario} but the provider uses {provider}")]
    ModulusMismatch {
        scenario: PlainModulus,
        provider: PlainModulus,
    },
    #[error("{divisor} has no inverse modulo {modulus}, division cannot be simulated")]
    NoModularInverse { divisor: u64, modulus: PlainModulus },
    #[error("stage `{0}` has an empty batch")]
    EmptyBatch(String),
    #[error("failed to encrypt scenario input")]
    Encrypt(#[from] ProviderError),
    #[error("setup operation {op} failed")]
    SetupOperation {
        op: Op,
        #[source]
        source: ProviderError,
    },
}
