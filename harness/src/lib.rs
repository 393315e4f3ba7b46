pub mod detector;
pub mod driver;
pub mod expectation;
pub mod preset;
pub mod report;
pub mod scenario;
pub mod zone;

pub use noise_trap_crypto as crypto;

pub mod prelude {
    pub use crate::{
        detector::{Detector, Status},
        driver::{
            AttackDriver, DriverState, Halt, HaltReason, ScenarioHeader, ScenarioReport,
            SetupError, StepRecord,
        },
        expectation::{Expectation, Op},
        preset::Preset,
        report::{ColumnSpec, ReportSink, TableSink},
        scenario::{AttackStage, BaselinePolicy, ScenarioConfig},
        zone::Zone,
    };
    pub use noise_trap_crypto::prelude::*;
}
