use crate::{
    detector::{Detector, Status},
    driver::{
        DriverState, Halt, HaltReason, ScenarioHeader, ScenarioReport, SetupError, StepRecord,
    },
    expectation::{Expectation, Op},
    report::ReportSink,
    scenario::{BaselinePolicy, ScenarioConfig},
    zone::{budget_percentage, Zone},
};
use noise_trap_crypto::provider::{HeProvider, ProviderError};
use noise_trap_math::modulus::PlainModulus;
use std::collections::HashMap;
use tracing::{debug, info, instrument, warn};

/// Runs one [`ScenarioConfig`] against a provider context.
///
/// The driver borrows both and owns nothing across runs; every call to
/// [`AttackDriver::run`] encrypts its own ciphertext and expectation.
pub struct AttackDriver<'a, P: HeProvider> {
    provider: &'a P,
    config: &'a ScenarioConfig,
    detector: Detector,
}

/// Encrypted constants, one per operation that needs one.
struct Operands<C> {
    setup: Option<C>,
    stages: Vec<Option<C>>,
}

/// Mutable payload of a running scenario.
struct Run<C> {
    ct: C,
    expectation: Expectation,
    corrupted: bool,
    baseline_budget: u32,
    records: Vec<StepRecord>,
    operations: usize,
    state: DriverState,
    halt: Option<Halt>,
}

impl<'a, P: HeProvider> AttackDriver<'a, P> {
    pub fn new(provider: &'a P, config: &'a ScenarioConfig) -> Self {
        Self {
            provider,
            config,
            detector: Detector::new(config.halt_on_danger_zone),
        }
    }

    pub fn config(&self) -> &ScenarioConfig {
        self.config
    }

    #[instrument(skip(self, sink), fields(scenario = %self.config.name))]
    pub fn run<S: ReportSink + ?Sized>(&self, sink: &mut S) -> Result<ScenarioReport, SetupError> {
        let config = self.config;
        let operands = self.prepare()?;

        let mut ct = self.provider.encrypt(config.seed)?;
        let mut expectation = Expectation::new(config.seed);
        let fresh_budget = self.noise_budget(&ct);
        if let Some(op) = config.setup {
            ct = self
                .apply(op, &ct, operands.setup.as_ref())
                .map_err(|source| SetupError::SetupOperation { op, source })?;
            expectation.apply(op);
        }
        let baseline_budget = match config.baseline {
            BaselinePolicy::Fresh => fresh_budget,
            BaselinePolicy::AfterSetup => self.noise_budget(&ct),
        };

        let header = ScenarioHeader {
            name: config.name.clone(),
            plain_modulus: config.plain_modulus,
            seed: config.seed,
            setup: config.setup,
            fresh_budget,
            baseline_budget,
            halt_on_danger_zone: self.detector.halt_on_danger_zone(),
        };
        info!(fresh_budget, baseline_budget, "scenario started");
        sink.begin(&header);

        let mut run = Run {
            ct,
            expectation,
            corrupted: false,
            baseline_budget,
            records: Vec::new(),
            operations: 0,
            state: DriverState::Running,
            halt: None,
        };
        self.observe(&mut run, config.initial_label(), sink);

        'plan: for (stage, operand) in config.stages.iter().zip(&operands.stages) {
            let label = stage.display_label();
            let single = stage.batches() == 1;
            let mut done = 0;
            while run.state == DriverState::Running && done < stage.count {
                let step_label = if single {
                    label.clone()
                } else {
                    format!("{label} #{}", done + 1)
                };
                let n = stage.batch.min(stage.count - done);
                for _ in 0..n {
                    if let Err(err) = self.apply_assign(stage.op, &mut run.ct, operand.as_ref()) {
                        self.operation_failed(&mut run, step_label, err, sink);
                        break 'plan;
                    }
                    run.expectation.apply(stage.op);
                    run.operations += 1;
                }
                done += n;
                self.observe(&mut run, step_label, sink);
            }
            if run.state != DriverState::Running {
                break;
            }
        }

        if run.state == DriverState::Running {
            run.state = DriverState::Completed;
            info!(steps = run.records.len(), operations = run.operations, "scenario completed");
        }

        let report = ScenarioReport {
            header,
            records: run.records,
            state: run.state,
            operations: run.operations,
            halt: run.halt,
        };
        sink.finish(&report);
        Ok(report)
    }

    /// Validates the plan against the provider and encrypts every constant
    /// operand, so that encoding problems surface before anything runs.
    fn prepare(&self) -> Result<Operands<P::Ciphertext>, SetupError> {
        let config = self.config;
        let t = self.provider.plain_modulus();
        if t != config.plain_modulus {
            return Err(SetupError::ModulusMismatch {
                scenario: config.plain_modulus,
                provider: t,
            });
        }
        if let Some(stage) = config.stages.iter().find(|stage| stage.batch == 0) {
            return Err(SetupError::EmptyBatch(stage.display_label()));
        }

        let mut cache: HashMap<u64, P::Ciphertext> = HashMap::new();
        let mut encrypt = |op: Op| -> Result<Option<P::Ciphertext>, SetupError> {
            let Some(m) = operand_plaintext(op, t)? else {
                return Ok(None);
            };
            if let Some(ct) = cache.get(&m) {
                return Ok(Some(ct.clone()));
            }
            let ct = self.provider.encrypt(m)?;
            cache.insert(m, ct.clone());
            Ok(Some(ct))
        };
        let setup = match config.setup {
            Some(op) => encrypt(op)?,
            None => None,
        };
        let stages = config
            .stages
            .iter()
            .map(|stage| encrypt(stage.op))
            .collect::<Result<_, _>>()?;
        Ok(Operands { setup, stages })
    }

    fn noise_budget(&self, ct: &P::Ciphertext) -> u32 {
        self.provider.noise_budget(ct).unwrap_or_else(|err| {
            warn!(error = %err, "noise budget unavailable, reporting 0 bits");
            0
        })
    }

    fn apply(
        &self,
        op: Op,
        ct: &P::Ciphertext,
        operand: Option<&P::Ciphertext>,
    ) -> Result<P::Ciphertext, ProviderError> {
        match (op, operand) {
            (Op::Square, _) => self.provider.mul(ct, ct),
            (Op::Mul(_) | Op::Div(_), Some(b)) => self.provider.mul(ct, b),
            (Op::Add(_), Some(b)) => self.provider.add(ct, b),
            (Op::Sub(_), Some(b)) => self.provider.sub(ct, b),
            (_, None) => Err(missing_operand(op)),
        }
    }

    fn apply_assign(
        &self,
        op: Op,
        ct: &mut P::Ciphertext,
        operand: Option<&P::Ciphertext>,
    ) -> Result<(), ProviderError> {
        match (op, operand) {
            (Op::Square, _) => self.provider.square_assign(ct),
            (Op::Mul(_) | Op::Div(_), Some(b)) => self.provider.mul_assign(ct, b),
            (Op::Add(_), Some(b)) => self.provider.add_assign(ct, b),
            (Op::Sub(_), Some(b)) => self.provider.sub_assign(ct, b),
            (_, None) => Err(missing_operand(op)),
        }
    }

    /// Records a failed operation as an ERROR step and halts. The ciphertext
    /// is neither decrypted nor passed to the detector.
    fn operation_failed<S: ReportSink + ?Sized>(
        &self,
        run: &mut Run<P::Ciphertext>,
        label: String,
        err: ProviderError,
        sink: &mut S,
    ) {
        let step = run.records.len();
        warn!(error = %err, step, label = %label, "homomorphic operation failed, halting");
        let noise_budget = self.noise_budget(&run.ct);
        let record = StepRecord {
            step,
            label,
            decrypted: Err(err.clone()),
            expected: run.expectation.value(),
            noise_budget,
            budget_percent: budget_percentage(noise_budget, run.baseline_budget),
            zone: Zone::classify(noise_budget, run.baseline_budget),
            status: Status::Error,
            operations: run.operations,
        };
        sink.record(&record);

        run.corrupted = true;
        run.state = DriverState::HaltedError;
        run.halt = Some(Halt {
            step,
            label: record.label.clone(),
            reason: HaltReason::OperationFailed(err),
        });
        run.records.push(record);
    }

    /// Measures, decrypts and classifies the current ciphertext, then hands
    /// the record to the sink. Moves the run into a halted state when the
    /// detector reports a terminal status.
    fn observe<S: ReportSink + ?Sized>(&self, run: &mut Run<P::Ciphertext>, label: String, sink: &mut S) {
        let noise_budget = self.noise_budget(&run.ct);
        let decrypted = self.provider.decrypt(&run.ct);
        let expected = run.expectation.value();
        let zone = Zone::classify(noise_budget, run.baseline_budget);
        let (status, corrupted) = self.detector.detect(&decrypted, expected, zone, run.corrupted);
        run.corrupted = corrupted;

        let record = StepRecord {
            step: run.records.len(),
            label,
            decrypted,
            expected,
            noise_budget,
            budget_percent: budget_percentage(noise_budget, run.baseline_budget),
            zone,
            status,
            operations: run.operations,
        };
        debug!(
            step = record.step,
            label = %record.label,
            decrypted = ?record.decrypted,
            expected,
            noise_budget,
            %zone,
            %status,
            "observed"
        );
        sink.record(&record);

        if status.is_terminal() {
            let reason = match (&record.decrypted, status) {
                (Err(err), _) => HaltReason::DecryptionFailed(err.clone()),
                (Ok(_), Status::Danger) => HaltReason::DangerZone,
                (Ok(_), _) => HaltReason::Corrupted,
            };
            run.state = match status {
                Status::Error => DriverState::HaltedError,
                _ => DriverState::HaltedCorrupted,
            };
            info!(step = record.step, label = %record.label, %reason, "scenario halted");
            run.halt = Some(Halt {
                step: record.step,
                label: record.label.clone(),
                reason,
            });
        }
        run.records.push(record);
    }
}

/// Plaintext of the encrypted constant `op` combines the ciphertext with.
fn operand_plaintext(op: Op, t: PlainModulus) -> Result<Option<u64>, SetupError> {
    match op {
        Op::Square => Ok(None),
        Op::Mul(k) | Op::Add(k) | Op::Sub(k) => Ok(Some(k)),
        Op::Div(k) => t
            .inv(k.get())
            .map(Some)
            .ok_or(SetupError::NoModularInverse {
                divisor: k.get(),
                modulus: t,
            }),
    }
}

fn missing_operand(op: Op) -> ProviderError {
    ProviderError::Operation(format!("no encrypted operand prepared for {op}"))
}
