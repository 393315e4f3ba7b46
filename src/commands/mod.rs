//! CLI command implementations

pub mod list;
pub mod run;

use anyhow::{Context, Result};
use noise_trap_crypto::bfv::BfvParam;
use noise_trap_harness::{
    driver::{AttackDriver, ScenarioReport, StepRecord},
    report::TableSink,
    scenario::ScenarioConfig,
};
use serde::{Deserialize, Serialize};
use std::io::{self, Write};

/// Scenario file read by `noise-trap config`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ScenarioFile {
    pub bfv: BfvParam,
    pub scenario: ScenarioConfig,
}

/// Builds a fresh context for `scenario` and runs it, rendering a table to
/// stdout unless `json` is set.
pub fn execute(param: BfvParam, scenario: &ScenarioConfig, json: bool) -> Result<ScenarioReport> {
    let bfv = param
        .build()
        .with_context(|| format!("invalid parameters for scenario `{}`", scenario.name))?;
    let driver = AttackDriver::new(&bfv, scenario);
    let setup_failed = || format!("scenario `{}` could not be set up", scenario.name);

    if json {
        return driver.run(&mut Vec::<StepRecord>::new()).with_context(setup_failed);
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();
    writeln!(out)?;
    writeln!(out, "{param}")?;
    let mut sink = TableSink::new(out);
    let report = driver.run(&mut sink).with_context(setup_failed)?;
    sink.into_inner().context("failed to write report")?;
    Ok(report)
}

pub fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let stdout = io::stdout();
    let mut out = stdout.lock();
    serde_json::to_writer_pretty(&mut out, value)?;
    writeln!(out)?;
    Ok(())
}
