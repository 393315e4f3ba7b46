use crate::{
    detector::Status,
    driver::{AttackDriver, DriverState, HaltReason, ScenarioReport, SetupError, StepRecord},
    expectation::Op,
    preset::{self, Preset},
    report::TableSink,
    scenario::{AttackStage, BaselinePolicy, ScenarioConfig},
    zone::Zone,
};
use core::{cell::Cell, num::NonZeroU64};
use noise_trap_crypto::{
    bfv::BFV_8192,
    provider::{HeProvider, ProviderError},
};
use noise_trap_math::modulus::PlainModulus;
use proptest::prelude::*;

const T: PlainModulus = PlainModulus::new(1032193);

fn run_preset(preset: Preset) -> ScenarioReport {
    let bfv = preset.param.build().unwrap();
    let mut sink: Vec<StepRecord> = Vec::new();
    let report = AttackDriver::new(&bfv, &preset.scenario).run(&mut sink).unwrap();
    assert_eq!(sink, report.records);
    report
}

fn run_bfv(config: &ScenarioConfig) -> Result<ScenarioReport, SetupError> {
    let bfv = BFV_8192.plain_modulus(config.plain_modulus).build().unwrap();
    AttackDriver::new(&bfv, config).run(&mut Vec::<StepRecord>::new())
}

fn labels(report: &ScenarioReport) -> Vec<&str> {
    report.records.iter().map(|r| r.label.as_str()).collect()
}

fn budgets(report: &ScenarioReport) -> Vec<u32> {
    report.records.iter().map(|r| r.noise_budget).collect()
}

/// Provider over plain residues whose failures are scripted by call count.
#[derive(Debug, Default)]
struct Script {
    /// 1-based index of the homomorphic operation that fails.
    fail_op: Option<usize>,
    /// 1-based index of the decryption that fails.
    fail_decrypt: Option<usize>,
    /// `None` makes every budget query fail.
    budget: Option<u32>,
}

struct ScriptedProvider {
    t: PlainModulus,
    script: Script,
    ops: Cell<usize>,
    decrypts: Cell<usize>,
}

impl ScriptedProvider {
    fn new(t: PlainModulus, script: Script) -> Self {
        Self {
            t,
            script,
            ops: Cell::new(0),
            decrypts: Cell::new(0),
        }
    }

    fn tick(counter: &Cell<usize>, fail_at: Option<usize>) -> bool {
        counter.set(counter.get() + 1);
        fail_at == Some(counter.get())
    }

    fn op(&self) -> Result<(), ProviderError> {
        if Self::tick(&self.ops, self.script.fail_op) {
            return Err(ProviderError::Operation(format!(
                "scripted failure of operation {}",
                self.ops.get()
            )));
        }
        Ok(())
    }
}

impl HeProvider for ScriptedProvider {
    type Ciphertext = u64;

    fn plain_modulus(&self) -> PlainModulus {
        self.t
    }

    fn encrypt(&self, m: u64) -> Result<u64, ProviderError> {
        if self.t.contains(m) {
            Ok(m)
        } else {
            Err(ProviderError::Encoding {
                value: m,
                modulus: self.t.value(),
            })
        }
    }

    fn decrypt(&self, ct: &u64) -> Result<u64, ProviderError> {
        if Self::tick(&self.decrypts, self.script.fail_decrypt) {
            return Err(ProviderError::Decryption("scripted".into()));
        }
        Ok(*ct)
    }

    fn noise_budget(&self, _: &u64) -> Result<u32, ProviderError> {
        self.script
            .budget
            .ok_or_else(|| ProviderError::BudgetUnavailable("scripted".into()))
    }

    fn add_assign(&self, a: &mut u64, b: &u64) -> Result<(), ProviderError> {
        self.op()?;
        *a = self.t.add(*a, *b);
        Ok(())
    }

    fn sub_assign(&self, a: &mut u64, b: &u64) -> Result<(), ProviderError> {
        self.op()?;
        *a = self.t.sub(*a, *b);
        Ok(())
    }

    fn mul_assign(&self, a: &mut u64, b: &u64) -> Result<(), ProviderError> {
        self.op()?;
        *a = self.t.mul(*a, *b);
        Ok(())
    }
}

fn scripted(config: &ScenarioConfig, script: Script) -> ScenarioReport {
    let provider = ScriptedProvider::new(config.plain_modulus, script);
    let mut sink: Vec<StepRecord> = Vec::new();
    let report = AttackDriver::new(&provider, config).run(&mut sink).unwrap();
    assert_eq!(sink, report.records);
    report
}

#[test]
fn squaring_overflow() {
    let report = run_preset(preset::squaring_overflow());
    assert_eq!(
        report.statuses(),
        [Status::Ok, Status::Ok, Status::Ok, Status::Ok, Status::Corrupted]
    );
    assert_eq!(budgets(&report), [182, 155, 129, 102, 76]);
    assert_eq!(report.state, DriverState::HaltedCorrupted);
    assert_eq!(report.operations, 4);
    assert_eq!(report.steps_succeeded(), 4);

    let last = report.last().unwrap();
    assert_eq!(last.decrypted, Ok(54449));
    assert_eq!(last.expected, 43046721);

    let halt = report.halt.unwrap();
    assert_eq!((halt.step, halt.label.as_str()), (4, "Square #4"));
    assert_eq!(halt.reason, HaltReason::Corrupted);
}

#[test]
fn overflow_trap() {
    let report = run_preset(preset::overflow_trap());
    assert_eq!(labels(&report), ["Initial (2)", "Square #1", "Square #2", "Square #3", "Square #4"]);
    assert_eq!(report.last().unwrap().decrypted, Ok(0));
    assert_eq!(report.last().unwrap().expected, 65536);
    assert_eq!(report.last().unwrap().status, Status::Corrupted);
    // Report-only: the warning zone is echoed in the record but not the status.
    assert_eq!(report.records[3].zone, Zone::Warning);
    assert_eq!(report.records[3].status, Status::Ok);
}

#[test]
fn injection_exhausts_before_overflow() {
    let report = run_preset(preset::multiplication_injection());
    assert_eq!(report.records.len(), 10);
    assert!(report.records[..9].iter().all(|r| r.status == Status::Ok));
    assert_eq!(report.records[8].zone, Zone::Danger);
    assert_eq!(report.records[8].noise_budget, 6);

    let last = report.last().unwrap();
    assert_eq!(last.expected, 1536);
    assert_ne!(last.decrypted, Ok(1536));
    assert_eq!((last.noise_budget, last.status), (0, Status::Corrupted));
}

#[test]
fn baseline_after_legitimate_multiply() {
    let report = run_preset(preset::noise_budget_attack());
    assert_eq!(report.header.fresh_budget, 178);
    assert_eq!(report.header.baseline_budget, 148);

    let first = &report.records[0];
    assert_eq!(first.label, "100 × 10");
    assert_eq!(first.decrypted, Ok(1000));
    assert_eq!(first.budget_percent, 100.0);
    assert_eq!(first.zone, Zone::Safe);
}

#[test]
fn multiplying_by_one_diverges() {
    let report = run_preset(preset::noise_budget_attack());
    assert!(report.records.iter().all(|r| r.expected == 1000));
    assert_eq!(labels(&report), ["100 × 10", "Attack #1"]);

    let attacked = &report.records[1];
    assert_ne!(attacked.decrypted, Ok(1000));
    assert_eq!(attacked.status, Status::Corrupted);
    assert_eq!(attacked.operations, 10);
    assert_eq!(report.steps_succeeded(), 1);
}

#[test]
fn division_by_inverse() {
    let report = run_preset(preset::division_attack());
    let first = &report.records[0];
    assert_eq!(first.label, "100 ÷ 10");
    assert_eq!(first.decrypted, Ok(10));
    assert_eq!((first.zone, first.status), (Zone::Safe, Status::Ok));

    // Five more multiplications by the inverse leave the expectation at 0.
    let halt = report.halt.unwrap();
    assert_eq!(halt.label, "Div Attack #1");
    assert_eq!(halt.reason, HaltReason::Corrupted);
}

#[test]
fn division_without_inverse() {
    let ten = NonZeroU64::new(10).unwrap();
    let config = ScenarioConfig::new("no_inverse", PlainModulus::new(4096), 100).setup(Op::Div(ten));
    let bfv = BFV_8192.plain_modulus(PlainModulus::new(4096)).build().unwrap();
    let mut sink: Vec<StepRecord> = Vec::new();
    let err = AttackDriver::new(&bfv, &config).run(&mut sink).unwrap_err();
    assert!(matches!(err, SetupError::NoModularInverse { divisor: 10, .. }));
    assert!(sink.is_empty());
}

fn danger_config(halt: bool) -> ScenarioConfig {
    ScenarioConfig::new("danger", T, 100)
        .setup(Op::Mul(10))
        .baseline(BaselinePolicy::AfterSetup)
        .halt_on_danger_zone(halt)
        .stage(AttackStage::new(Op::Mul(1), 4).label("× 1"))
}

#[test]
fn danger_zone_halts() {
    let report = run_bfv(&danger_config(true)).unwrap();
    assert_eq!(
        report.statuses(),
        [Status::Ok, Status::Ok, Status::Warning, Status::Warning, Status::Danger]
    );
    assert_eq!(budgets(&report), [148, 117, 87, 56, 26]);
    assert_eq!(report.state, DriverState::HaltedCorrupted);
    assert_eq!(report.steps_succeeded(), 4);
    assert_eq!(report.halt.unwrap().reason, HaltReason::DangerZone);
}

#[test]
fn report_only_runs_through_danger() {
    let report = run_bfv(&danger_config(false)).unwrap();
    assert!(report.records.iter().all(|r| r.status == Status::Ok));
    assert_eq!(report.last().unwrap().zone, Zone::Danger);
    assert_eq!(report.state, DriverState::Completed);
    assert!(report.halt.is_none());
}

#[test]
fn addition_completes() {
    let report = run_preset(preset::addition_attack());
    assert_eq!(report.state, DriverState::Completed);
    assert_eq!(report.records.len(), 21);
    assert_eq!(report.operations, 100);
    assert!(report.records.iter().all(|r| r.status == Status::Ok));
    assert_eq!(report.records[1].label, "Add Attack #1");
    assert_eq!(report.records[2].label, "Add Attack #6");
    assert_eq!(report.last().unwrap().expected, 1110);
    assert_eq!(report.last().unwrap().noise_budget, 171);
}

#[test]
fn subtraction_wraps() {
    let report = run_preset(preset::subtraction_attack());
    let last = report.last().unwrap();
    assert_eq!(last.label, "Sub Attack #6");
    assert_eq!(last.expected, u64::MAX - 9);
    assert_eq!(last.decrypted, Ok(1032183));
    assert_eq!(last.status, Status::Corrupted);
}

#[test]
fn restore_attempt() {
    let report = run_preset(preset::multiply_by_two());
    assert_eq!(labels(&report), ["100 × 10", "After × 2", "After restore attempt"]);
    assert_eq!(budgets(&report), [148, 117, 87]);
    assert_eq!(report.last().unwrap().decrypted, Ok(2000));
    assert_eq!(report.state, DriverState::Completed);
}

#[test]
fn simple_add() {
    let report = run_preset(preset::simple_add());
    assert_eq!(report.records.len(), 1);
    assert_eq!(report.records[0].decrypted, Ok(12));
    assert_eq!(report.header.fresh_budget, 15);
    assert_eq!(report.records[0].noise_budget, 14);
    assert_eq!(report.state, DriverState::Completed);
}

#[test]
fn size_limit_halts_with_error() {
    let config = ScenarioConfig::new("size", PlainModulus::new(65537), 3)
        .stage(AttackStage::new(Op::Square, 9).label("Square"));
    let bfv = BFV_8192
        .plain_modulus(PlainModulus::new(65537))
        .max_ciphertext_size(8)
        .build()
        .unwrap();
    let report = AttackDriver::new(&bfv, &config).run(&mut Vec::<StepRecord>::new()).unwrap();

    // Sizes 2, 3, 5 fit, the third square would need 9 polynomials.
    assert_eq!(
        report.statuses(),
        [Status::Ok, Status::Ok, Status::Ok, Status::Error]
    );
    let failed = report.last().unwrap();
    assert!(matches!(failed.decrypted, Err(ProviderError::Operation(_))));
    assert_eq!(failed.expected, 81);
    assert_eq!(report.state, DriverState::HaltedError);
    assert_eq!(report.steps_succeeded(), 3);
    let halt = report.halt.unwrap();
    assert_eq!((halt.step, halt.label.as_str()), (3, "Square #3"));
    assert!(matches!(halt.reason, HaltReason::OperationFailed(ProviderError::Operation(_))));
}

#[test]
fn operation_failure_mid_batch() {
    let config = ScenarioConfig::new("mid_batch", T, 1).stage(AttackStage::new(Op::Add(1), 9).batch(3));
    let report = scripted(
        &config,
        Script {
            fail_op: Some(5),
            budget: Some(100),
            ..Default::default()
        },
    );
    assert_eq!(labels(&report), ["Initial (1)", "+ 1 #1", "+ 1 #4"]);
    assert_eq!(report.statuses(), [Status::Ok, Status::Ok, Status::Error]);
    assert_eq!(report.operations, 4);
    // The expectation includes the operation that succeeded in the failing batch.
    assert_eq!(report.last().unwrap().expected, 5);
    assert_eq!(report.state, DriverState::HaltedError);
    let halt = report.halt.unwrap();
    assert_eq!((halt.step, halt.label.as_str()), (2, "+ 1 #4"));
}

#[test]
fn failed_operation_reaches_the_sink() {
    let config = ScenarioConfig::new("sink", T, 1).stage(AttackStage::new(Op::Add(1), 3));
    let provider = ScriptedProvider::new(
        T,
        Script {
            fail_op: Some(2),
            budget: Some(100),
            ..Default::default()
        },
    );
    let mut sink: Vec<StepRecord> = Vec::new();
    let report = AttackDriver::new(&provider, &config).run(&mut sink).unwrap();

    assert_eq!(
        sink.iter().map(|r| r.status).collect::<Vec<_>>(),
        [Status::Ok, Status::Ok, Status::Error]
    );
    let failed = &sink[2];
    assert_eq!(failed.label, "+ 1 #2");
    assert!(matches!(failed.decrypted, Err(ProviderError::Operation(_))));
    assert_eq!((failed.expected, failed.operations), (2, 1));
    assert_eq!(report.halt.unwrap().step, 2);
}

#[test]
fn failed_setup_operation() {
    let config = ScenarioConfig::new("setup", T, 100).setup(Op::Mul(10));
    let provider = ScriptedProvider::new(
        T,
        Script {
            fail_op: Some(1),
            budget: Some(100),
            ..Default::default()
        },
    );
    let err = AttackDriver::new(&provider, &config).run(&mut Vec::<StepRecord>::new()).unwrap_err();
    assert!(matches!(err, SetupError::SetupOperation { op: Op::Mul(10), .. }));
}

#[test]
fn decryption_failure_is_error() {
    let config = ScenarioConfig::new("decrypt", T, 2).stage(AttackStage::new(Op::Square, 3));
    let report = scripted(
        &config,
        Script {
            fail_decrypt: Some(2),
            budget: Some(100),
            ..Default::default()
        },
    );
    assert_eq!(report.statuses(), [Status::Ok, Status::Error]);
    assert_eq!(report.state, DriverState::HaltedError);
    assert!(report.records[1].decrypted.is_err());
    assert!(matches!(
        report.halt.unwrap().reason,
        HaltReason::DecryptionFailed(ProviderError::Decryption(_))
    ));
}

#[test]
fn unavailable_budget_reads_as_zero() {
    let config = ScenarioConfig::new("budget", T, 2).stage(AttackStage::new(Op::Mul(3), 2));
    let report = scripted(&config, Script::default());
    assert_eq!(report.header.fresh_budget, 0);
    assert!(report
        .records
        .iter()
        .all(|r| r.noise_budget == 0 && r.zone == Zone::Danger && r.status == Status::Ok));
    assert_eq!(report.last().unwrap().expected, 18);
    assert_eq!(report.state, DriverState::Completed);
}

#[test]
fn setup_errors() {
    let mismatch = ScenarioConfig::new("mismatch", PlainModulus::new(65537), 3);
    let bfv = BFV_8192.build().unwrap();
    let err = AttackDriver::new(&bfv, &mismatch).run(&mut Vec::<StepRecord>::new()).unwrap_err();
    assert!(matches!(err, SetupError::ModulusMismatch { .. }));

    let too_large = ScenarioConfig::new("encoding", T, 3).stage(AttackStage::new(Op::Mul(2_000_000), 1));
    let err = run_bfv(&too_large).unwrap_err();
    assert!(matches!(
        err,
        SetupError::Encrypt(ProviderError::Encoding { value: 2_000_000, .. })
    ));

    let empty = ScenarioConfig::new("batch", T, 3).stage(AttackStage::new(Op::Square, 1).batch(0));
    assert!(matches!(run_bfv(&empty).unwrap_err(), SetupError::EmptyBatch(_)));
}

#[test]
fn contexts_are_independent() {
    let preset = preset::squaring_overflow();
    let first = run_preset(preset.clone());
    let second = run_preset(preset);
    assert_eq!(first, second);
}

#[test]
fn table_narration() {
    let preset = preset::squaring_overflow();
    let bfv = preset.param.build().unwrap();
    let mut sink = TableSink::new(Vec::new());
    AttackDriver::new(&bfv, &preset.scenario).run(&mut sink).unwrap();
    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    assert!(out.contains("Scenario: squaring_overflow"));
    assert!(out.contains("Halted at step 4 (Square #4)"));
    assert!(out.contains("4 of 5 steps succeeded after 4 attack operations"));
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Square),
        (0u64..8).prop_map(Op::Mul),
        (0u64..100).prop_map(Op::Add),
        (0u64..100).prop_map(Op::Sub),
        (1u64..100).prop_map(|k| Op::Div(NonZeroU64::new(k).unwrap())),
    ]
}

fn stage() -> impl Strategy<Value = AttackStage> {
    (op(), 0usize..12, 1usize..4).prop_map(|(op, count, batch)| AttackStage::new(op, count).batch(batch))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn records_grow_until_halt(
        seed in 0u64..65537,
        halt in any::<bool>(),
        stages in prop::collection::vec(stage(), 0..4),
    ) {
        let mut config = ScenarioConfig::new("random", PlainModulus::new(65537), seed)
            .halt_on_danger_zone(halt);
        config.stages = stages;
        let report = run_bfv(&config).unwrap();
        let records = &report.records;

        prop_assert!(!records.is_empty());
        for (i, record) in records.iter().enumerate() {
            prop_assert_eq!(record.step, i);
        }
        // Only the last record may carry a terminal status.
        prop_assert!(records[..records.len() - 1].iter().all(|r| !r.status.is_terminal()));

        match (&report.state, &report.halt) {
            (DriverState::Completed, None) => {
                let batches: usize = config.stages.iter().map(AttackStage::batches).sum();
                prop_assert_eq!(records.len(), 1 + batches);
                prop_assert_eq!(report.operations, config.attack_ops());
            }
            (state, Some(halt)) if state.is_halted() => match halt.reason {
                HaltReason::OperationFailed(_) => {
                    prop_assert_eq!(halt.step, records.len() - 1);
                    prop_assert_eq!(records[halt.step].status, Status::Error);
                    prop_assert_eq!(*state, DriverState::HaltedError);
                }
                _ => {
                    prop_assert_eq!(halt.step, records.len() - 1);
                    prop_assert!(records[halt.step].status.is_terminal());
                }
            },
            other => prop_assert!(false, "inconsistent end state {:?}", other),
        }
    }
}
