//! Rendering of scenario records.

use crate::driver::{DriverState, ScenarioHeader, ScenarioReport, StepRecord};
use itertools::Itertools;
use std::io::{self, Write};

/// Consumer of the records a scenario produces, in order.
pub trait ReportSink {
    fn begin(&mut self, _header: &ScenarioHeader) {}

    fn record(&mut self, record: &StepRecord);

    fn finish(&mut self, _report: &ScenarioReport) {}
}

impl ReportSink for Vec<StepRecord> {
    fn record(&mut self, record: &StepRecord) {
        self.push(record.clone());
    }
}

impl<S: ReportSink + ?Sized> ReportSink for &mut S {
    fn begin(&mut self, header: &ScenarioHeader) {
        (**self).begin(header)
    }

    fn record(&mut self, record: &StepRecord) {
        (**self).record(record)
    }

    fn finish(&mut self, report: &ScenarioReport) {
        (**self).finish(report)
    }
}

/// Right-aligned column widths of [`TableSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ColumnSpec {
    pub operation: usize,
    pub value: usize,
    pub expected: usize,
    pub noise_budget: usize,
    pub noise_percent: usize,
    pub zone: usize,
    pub status: usize,
}

impl Default for ColumnSpec {
    fn default() -> Self {
        Self {
            operation: 20,
            value: 15,
            expected: 15,
            noise_budget: 20,
            noise_percent: 15,
            zone: 15,
            status: 15,
        }
    }
}

impl ColumnSpec {
    pub fn width(&self) -> usize {
        // The percentage column is followed by its `%` sign.
        self.operation
            + self.value
            + self.expected
            + self.noise_budget
            + self.noise_percent
            + 1
            + self.zone
            + self.status
    }

    fn header(&self) -> String {
        [
            ("Operation", self.operation),
            ("Value", self.value),
            ("Expected", self.expected),
            ("Noise Budget", self.noise_budget),
            ("Noise %", self.noise_percent + 1),
            ("Zone", self.zone),
            ("Status", self.status),
        ]
        .into_iter()
        .map(|(title, width)| format!("{title:>width$}"))
        .join("")
    }

    fn row(&self, record: &StepRecord) -> String {
        let value = match &record.decrypted {
            Ok(value) => value.to_string(),
            Err(_) => "FAILED".to_string(),
        };
        format!(
            "{:>w0$}{:>w1$}{:>w2$}{:>w3$}{:>w4$.1}%{:>w5$}{:>w6$}",
            record.label,
            value,
            record.expected,
            format!("{} bits", record.noise_budget),
            record.budget_percent,
            record.zone.as_str(),
            record.status.as_str(),
            w0 = self.operation,
            w1 = self.value,
            w2 = self.expected,
            w3 = self.noise_budget,
            w4 = self.noise_percent,
            w5 = self.zone,
            w6 = self.status,
        )
    }
}

/// Writes a fixed-width table per scenario followed by a short narration of
/// how it ended.
///
/// Write errors are held back until [`TableSink::into_inner`] so that a
/// broken pipe never interrupts a running scenario.
pub struct TableSink<W: Write> {
    out: W,
    columns: ColumnSpec,
    error: Option<io::Error>,
}

impl<W: Write> TableSink<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            columns: ColumnSpec::default(),
            error: None,
        }
    }

    pub fn columns(mut self, columns: ColumnSpec) -> Self {
        self.columns = columns;
        self
    }

    /// Returns the writer, or the first write error encountered.
    pub fn into_inner(self) -> io::Result<W> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.out),
        }
    }

    fn line(&mut self, line: &str) {
        if self.error.is_none() {
            if let Err(err) = writeln!(self.out, "{line}") {
                self.error = Some(err);
            }
        }
    }

    fn rule(&mut self) {
        let rule = "-".repeat(self.columns.width());
        self.line(&rule);
    }
}

impl<W: Write> ReportSink for TableSink<W> {
    fn begin(&mut self, header: &ScenarioHeader) {
        self.line("");
        self.line(&format!("Scenario: {}", header.name));
        self.line(&format!(
            "Plain modulus {}, seed {}, fresh budget {} bits, baseline {} bits ({})",
            header.plain_modulus,
            header.seed,
            header.fresh_budget,
            header.baseline_budget,
            if header.halt_on_danger_zone {
                "halting on danger zone"
            } else {
                "report only"
            },
        ));
        self.rule();
        let header = self.columns.header();
        self.line(&header);
        self.rule();
    }

    fn record(&mut self, record: &StepRecord) {
        let row = self.columns.row(record);
        self.line(&row);
    }

    fn finish(&mut self, report: &ScenarioReport) {
        self.rule();
        let summary = match (&report.state, &report.halt) {
            (DriverState::Completed, _) => format!(
                "Completed: {} steps observed after {} attack operations.",
                report.records.len(),
                report.operations
            ),
            (_, Some(halt)) => format!(
                "Halted at step {} ({}): {}. {} of {} steps succeeded after {} attack operations.",
                halt.step,
                halt.label,
                halt.reason,
                report.steps_succeeded(),
                report.records.len(),
                report.operations
            ),
            (state, None) => format!("Stopped in state {state:?}."),
        };
        self.line(&summary);
        if let Some(last) = report.last() {
            let consumed = report.header.fresh_budget.saturating_sub(last.noise_budget);
            self.line(&format!(
                "Noise budget: {} bits fresh, {} bits baseline, {} bits at the last step ({} bits consumed).",
                report.header.fresh_budget, report.header.baseline_budget, last.noise_budget, consumed
            ));
        }
    }
}
