//! Ready-made scenarios, each paired with the encryption parameters it was
//! designed for.

use crate::{
    expectation::Op,
    scenario::{AttackStage, BaselinePolicy, ScenarioConfig},
};
use core::num::NonZeroU64;
use noise_trap_crypto::bfv::{BfvParam, BFV_2048, BFV_8192};
use noise_trap_math::modulus::PlainModulus;

const TEN: NonZeroU64 = match NonZeroU64::new(10) {
    Some(ten) => ten,
    None => unreachable!(),
};

#[derive(Clone, Debug, PartialEq)]
pub struct Preset {
    pub name: &'static str,
    pub about: &'static str,
    pub param: BfvParam,
    pub scenario: ScenarioConfig,
}

impl Preset {
    fn new(name: &'static str, about: &'static str, param: BfvParam, seed: u64) -> Self {
        Self {
            name,
            about,
            param,
            scenario: ScenarioConfig::new(name, param.plain_modulus, seed),
        }
    }

    fn scenario(mut self, f: impl FnOnce(ScenarioConfig) -> ScenarioConfig) -> Self {
        self.scenario = f(self.scenario);
        self
    }
}

pub fn overflow_trap() -> Preset {
    Preset::new(
        "overflow_trap",
        "Square 2 seven times under t = 4096 until the plaintext wraps.",
        BFV_8192.plain_modulus(PlainModulus::new(4096)),
        2,
    )
    .scenario(|s| s.stage(AttackStage::new(Op::Square, 7).label("Square")))
}

pub fn squaring_overflow() -> Preset {
    Preset::new(
        "squaring_overflow",
        "Square 3 up to nine times under t = 65537; 3^16 no longer fits.",
        BFV_8192.plain_modulus(PlainModulus::new(65537)),
        3,
    )
    .scenario(|s| s.stage(AttackStage::new(Op::Square, 9).label("Square")))
}

pub fn multiplication_injection() -> Preset {
    Preset::new(
        "multiplication_injection",
        "Multiply 3 by an encrypted 2 nine times under t = 4096.",
        BFV_8192.plain_modulus(PlainModulus::new(4096)),
        3,
    )
    .scenario(|s| s.stage(AttackStage::new(Op::Mul(2), 9).label("Injection")))
}

pub fn noise_budget_attack() -> Preset {
    Preset::new(
        "noise_budget_attack",
        "After 100 × 10, multiply by an encrypted 1 a hundred times in batches of ten.",
        BFV_8192,
        100,
    )
    .scenario(|s| {
        s.setup(Op::Mul(10))
            .baseline(BaselinePolicy::AfterSetup)
            .stage(AttackStage::new(Op::Mul(1), 100).batch(10).label("Attack"))
    })
}

/// The threshold attacks halt once the budget falls below a third of what
/// the legitimate operation left.
fn threshold_attack(
    name: &'static str,
    about: &'static str,
    setup: Op,
    attack: Op,
    label: &str,
) -> Preset {
    Preset::new(name, about, BFV_8192, 100).scenario(|s| {
        s.setup(setup)
            .baseline(BaselinePolicy::AfterSetup)
            .halt_on_danger_zone(true)
            .stage(AttackStage::new(attack, 100).batch(5).label(label))
    })
}

pub fn division_attack() -> Preset {
    threshold_attack(
        "division_attack",
        "Divide 100 by 10 through the inverse of 10, then keep dividing in batches of five.",
        Op::Div(TEN),
        Op::Div(TEN),
        "Div Attack",
    )
}

pub fn multiplication_attack() -> Preset {
    threshold_attack(
        "multiplication_attack",
        "After 100 × 10, multiply by an encrypted 1 in batches of five.",
        Op::Mul(10),
        Op::Mul(1),
        "Mult Attack",
    )
}

pub fn addition_attack() -> Preset {
    threshold_attack(
        "addition_attack",
        "After 100 + 10, keep adding an encrypted 10 in batches of five.",
        Op::Add(10),
        Op::Add(10),
        "Add Attack",
    )
}

pub fn subtraction_attack() -> Preset {
    threshold_attack(
        "subtraction_attack",
        "After 100 - 10, keep subtracting an encrypted 10 in batches of five.",
        Op::Sub(10),
        Op::Sub(10),
        "Sub Attack",
    )
}

pub fn multiply_by_two() -> Preset {
    Preset::new(
        "multiply_by_two",
        "After 100 × 10, multiply by 2 and then by 1 in an attempt to restore the value.",
        BFV_8192,
        100,
    )
    .scenario(|s| {
        s.setup(Op::Mul(10))
            .baseline(BaselinePolicy::AfterSetup)
            .stage(AttackStage::new(Op::Mul(2), 1).label("After × 2"))
            .stage(AttackStage::new(Op::Mul(1), 1).label("After restore attempt"))
    })
}

pub fn simple_add() -> Preset {
    Preset::new(
        "simple_add",
        "Encrypt 5 and 7 under a 2048-degree ring and add them.",
        BFV_2048,
        5,
    )
    .scenario(|s| s.setup(Op::Add(7)))
}

pub fn all() -> Vec<Preset> {
    vec![
        overflow_trap(),
        squaring_overflow(),
        multiplication_injection(),
        noise_budget_attack(),
        division_attack(),
        multiplication_attack(),
        addition_attack(),
        subtraction_attack(),
        multiply_by_two(),
        simple_add(),
    ]
}

pub fn by_name(name: &str) -> Option<Preset> {
    all().into_iter().find(|preset| preset.name == name)
}
